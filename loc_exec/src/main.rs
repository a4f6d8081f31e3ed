//! Laser localisation executable entry point.
//!
//! # Architecture
//!
//! The executable glues the robot's topics to a localisation algorithm and a GUI:
//!
//!     - Motors publisher: republishes the current velocity command
//!     - Pose and laser listeners: keep the latest odometry and scan
//!     - Sensors thread: refreshes a snapshot of the above for the GUI
//!     - Algorithm thread: iterates the algorithm while the GUI has it playing
//!     - GUI loop (main thread): publishes telemetry and handles GUI commands
//!
//! Usage: `loc_exec [--log-level <level>] <params file>`

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{info, warn};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use structopt::StructOpt;

// Internal
use loc_lib::{
    algorithm::{AlgorithmIo, AlgorithmRunner, TemplateAlgorithm},
    gui::{GuiServer, GuiThread},
    listener::{ListenerLaser, ListenerPose3d},
    map::MapImage,
    motors::PublisherMotors,
    params::LaserLocParams,
    sensors::{Sensors, SensorsThread},
};
use util::{
    host,
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "loc_exec", about = "Laser localisation executable")]
struct Opts {
    /// Path to the parameter file
    #[structopt(parse(from_os_str))]
    params: PathBuf,

    /// Minimum level to log at, one of info, debug or trace
    #[structopt(long, default_value = "info")]
    log_level: LevelFilter,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opts = Opts::from_args();

    // ---- EARLY INITIALISATION ----

    // The node name names the session, so the params are read before anything else
    let params: LaserLocParams = util::params::load_file(&opts.params)
        .wrap_err_with(|| format!("Could not load params from {:?}", opts.params))?;

    // Initialise session
    let session = Session::new(&params.node_name, "sessions")
        .wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(opts.log_level, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Laser Localisation Executable\n");
    info!("Node: {}", params.node_name);
    if let Some(h) = host::get_hostname() {
        info!("Running on: {}", h);
    }
    info!("Session directory: {:?}", session.session_root);
    info!("Parameters loaded from {:?}\n", opts.params);

    // ---- INITIALISE NETWORK ----

    let zmq_ctx = comms_if::net::zmq::Context::new();

    info!(
        "Publishing LaserLoc.Motors on {} ({})",
        params.motors.topic, params.motors.endpoint
    );
    let motors = Arc::new(Mutex::new(
        PublisherMotors::new(
            &zmq_ctx,
            &params.motors.endpoint,
            &params.motors.topic,
            params.motors.max_v,
            params.motors.max_w,
        )
        .wrap_err("Failed to initialise the motors publisher")?,
    ));

    info!(
        "Receiving LaserLoc.Pose3D from {} ({})",
        params.pose3d.topic, params.pose3d.endpoint
    );
    let pose3d = Arc::new(Mutex::new(
        ListenerPose3d::new(&zmq_ctx, &params.pose3d.endpoint, &params.pose3d.topic)
            .wrap_err("Failed to initialise the pose listener")?,
    ));

    info!(
        "Receiving LaserLoc.Laser LaserData from {} ({})",
        params.laser.topic, params.laser.endpoint
    );
    let laser = Arc::new(Mutex::new(
        ListenerLaser::new(&zmq_ctx, &params.laser.endpoint, &params.laser.topic)
            .wrap_err("Failed to initialise the laser listener")?,
    ));

    // ---- LOAD MAP ----

    let mut map_path = PathBuf::from(&params.map.img);
    if map_path.is_relative() {
        map_path = host::get_sw_root()
            .wrap_err("Could not find the software root")?
            .join(map_path);
    }

    let map = Arc::new(
        MapImage::load(&map_path).wrap_err("Failed to load the map image")?,
    );
    info!(
        "Map {:?} loaded ({}x{} px)",
        map.path(),
        map.width(),
        map.height()
    );

    // ---- ALGORITHM ----

    let io = AlgorithmIo {
        pose3d: pose3d.clone(),
        laser: laser.clone(),
        motors: motors.clone(),
        map: Some(map.clone()),
    };

    let mut runner = AlgorithmRunner::new(
        Box::new(TemplateAlgorithm::new()),
        io,
        params.algorithm_period(),
    );
    info!("Algorithm {} ready, waiting for play", runner.name());

    // ---- SENSORS ----

    let sensors = Arc::new(Sensors::new(motors.clone(), pose3d.clone(), laser.clone()));
    let mut sensors_thread = SensorsThread::start(sensors.clone(), params.sensors_period());
    info!("Sensors thread started");

    // ---- GUI ----

    let gui_server = GuiServer::new(&zmq_ctx, &params.gui.tm_endpoint, &params.gui.cmd_endpoint)
        .wrap_err("Failed to initialise the GUI server")?;
    info!(
        "GUI telemetry on {}, commands on {}\n",
        params.gui.tm_endpoint, params.gui.cmd_endpoint
    );

    let gui = GuiThread::new(gui_server, sensors, Some(map), params.gui_period());

    info!("Begining GUI loop\n");

    let gui_result = gui.run(&runner);

    // ---- SHUTDOWN ----

    info!("Shutting down");

    runner.kill();
    sensors_thread.stop();

    {
        let mut m = motors.lock().expect("Motors mutex poisoned");
        m.send_v(0.0);
        m.send_w(0.0);
        if let Err(e) = m.publish() {
            warn!("Could not send the final stop command: {}", e);
        }
        m.stop();
    }
    pose3d.lock().expect("Pose3d mutex poisoned").stop();
    laser.lock().expect("Laser mutex poisoned").stop();

    session.exit();

    gui_result.wrap_err("GUI loop failed")
}
