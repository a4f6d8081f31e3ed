//! Command line stand-in for the GUI's buttons.
//!
//! Sends `play`, `stop` or `quit` to a running `loc_exec`, or prints its telemetry with `watch`.

use std::time::{Duration, Instant};

use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use comms_if::net::zmq;
use loc_lib::gui::{GuiClient, GuiCmd, GuiTm};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "loc_cmd", about = "Commands a running loc_exec")]
struct Opts {
    /// One of play, stop, quit or watch
    command: String,

    #[structopt(long, default_value = "tcp://localhost:5111")]
    cmd_endpoint: String,

    #[structopt(long, default_value = "tcp://localhost:5110")]
    tm_endpoint: String,

    /// Seconds to wait for a response
    #[structopt(long, default_value = "2.0")]
    timeout_s: f64,
}

/// Longest accepted response timeout, in seconds.
const MAX_TIMEOUT_S: f64 = 3600.0;

fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opts = Opts::from_args();
    let ctx = zmq::Context::new();

    if !(opts.timeout_s > 0.0 && opts.timeout_s <= MAX_TIMEOUT_S) {
        return Err(eyre!(
            "--timeout-s must be in (0, {}], found {}",
            MAX_TIMEOUT_S,
            opts.timeout_s
        ));
    }
    let timeout = Duration::from_secs_f64(opts.timeout_s);

    let cmd = match opts.command.as_str() {
        "play" => GuiCmd::Play,
        "stop" => GuiCmd::Stop,
        "quit" => GuiCmd::Quit,
        "watch" => return watch(&ctx, &opts.tm_endpoint),
        c => return Err(eyre!("Unknown command \"{}\"", c)),
    };

    let mut client =
        GuiClient::new(&ctx, &opts.cmd_endpoint).wrap_err("Failed to create the GUI client")?;

    client.send_cmd(cmd).wrap_err("Failed to send the command")?;

    let start = Instant::now();
    while start.elapsed() < timeout {
        if let Some(r) = client
            .recv_response()
            .wrap_err("Failed to recieve the response")?
        {
            println!("{:?}: {:?}", cmd, r);
            return Ok(());
        }
    }

    Err(eyre!("No response from {}", opts.cmd_endpoint))
}

/// Print a one line summary of every telemetry packet.
fn watch(ctx: &zmq::Context, tm_endpoint: &str) -> Result<(), Report> {
    let socket = ctx.socket(zmq::SUB)?;
    socket.connect(tm_endpoint)?;
    socket.set_subscribe(b"")?;

    loop {
        let msg = socket.recv_bytes(0)?;
        let tm: GuiTm = match serde_json::from_slice(&msg) {
            Ok(t) => t,
            Err(e) => {
                println!("Bad telemetry packet: {}", e);
                continue;
            }
        };

        println!(
            "[{:8.3}] {:?} pose ({:.2}, {:.2}, {:.2}) cmd (v {:.2}, w {:.2}) {} ranges",
            tm.elapsed_s,
            tm.algorithm_state,
            tm.pose3d.x,
            tm.pose3d.y,
            tm.pose3d.yaw,
            tm.cmd_vel.vx,
            tm.cmd_vel.az,
            tm.laser.values.len()
        );
    }
}
