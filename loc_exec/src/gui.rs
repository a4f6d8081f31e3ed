//! # GUI Feed
//!
//! The robot side of the GUI. The [`GuiServer`] publishes a [`GuiTm`] packet holding everything
//! the GUI draws, and answers [`GuiCmd`]s sent from the GUI's buttons. The [`GuiThread`] ties it to
//! the sensors and the algorithm runner, and is run on the main thread until the GUI quits.
//!
//! A [`GuiClient`] is provided for anything wanting to command the executable, such as the
//! `loc_cmd` binary.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use comms_if::net::{zmq, MonitoredSocket, MonitoredSocketError, SocketOptions};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    algorithm::{AlgorithmRunner, AlgorithmState},
    map::MapImage,
    sensors::Sensors,
    types::{CmdVel, LaserData, Pose3d},
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Default period of the GUI loop.
pub const DEFAULT_GUI_PERIOD: Duration = Duration::from_millis(80);

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// GUI server, publishes telemetry and receives commands.
pub struct GuiServer {
    tm_socket: MonitoredSocket,
    cmd_socket: MonitoredSocket,
}

/// Telemetry packet published to the GUI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuiTm {
    /// Seconds since the start of the session, zero if there is no session.
    pub elapsed_s: f64,

    pub pose3d: Pose3d,

    pub laser: LaserData,

    pub cmd_vel: CmdVel,

    pub algorithm_state: AlgorithmState,

    pub map_path: Option<String>,

    /// Size of the map in pixels, `(width, height)`.
    pub map_size: Option<(u32, u32)>,
}

/// Drives the GUI server from the main thread.
pub struct GuiThread {
    server: GuiServer,
    sensors: Arc<Sensors>,
    map: Option<Arc<MapImage>>,
    period: Duration,
}

/// Client for the GUI server's command socket.
pub struct GuiClient {
    socket: MonitoredSocket,
    awaiting_response: bool,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Commands the GUI can send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GuiCmd {
    Play,
    Stop,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GuiCmdResponse {
    Ok,
    Invalid,
}

#[derive(Debug, thiserror::Error)]
pub enum GuiServerError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("Could not send telemetry: {0}")]
    SendError(zmq::Error),

    #[error("Could not recieve a command: {0}")]
    RecvError(zmq::Error),

    #[error("Could not serialize the data: {0}")]
    SerializationError(serde_json::Error),

    #[error("Could not parse the recieved command: {0}")]
    CmdParseError(serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum GuiClientError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("Could not send the command: {0}")]
    SendError(zmq::Error),

    #[error("Could not recieve a response from the server: {0}")]
    RecvError(zmq::Error),

    #[error("Could not serialize the command: {0}")]
    SerializationError(serde_json::Error),

    #[error("Could not deserialize the response from the server: {0}")]
    DeserializeError(serde_json::Error),

    #[error(
        "Could not send another command since the client is still waiting for the response to \
        the last one"
    )]
    WaitingForResponse,

    #[error("Cannot recieve a response as no command has been sent")]
    NoCmdSent,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl GuiServer {
    /// Bind the telemetry and command sockets.
    pub fn new(
        ctx: &zmq::Context,
        tm_endpoint: &str,
        cmd_endpoint: &str,
    ) -> Result<Self, GuiServerError> {
        let tm_socket = MonitoredSocket::new(ctx, zmq::PUB, SocketOptions::publisher(), tm_endpoint)
            .map_err(GuiServerError::SocketError)?;

        let cmd_options = SocketOptions {
            bind: true,
            block_on_first_connect: false,
            linger: 1,
            recv_timeout: 10,
            send_timeout: 10,
            ..Default::default()
        };

        let cmd_socket = MonitoredSocket::new(ctx, zmq::REP, cmd_options, cmd_endpoint)
            .map_err(GuiServerError::SocketError)?;

        Ok(Self {
            tm_socket,
            cmd_socket,
        })
    }

    /// Publish a telemetry packet.
    pub fn send_tm(&self, tm: &GuiTm) -> Result<(), GuiServerError> {
        let tm_str = serde_json::to_string(tm).map_err(GuiServerError::SerializationError)?;

        self.tm_socket
            .send(&tm_str, 0)
            .map_err(GuiServerError::SendError)
    }

    /// Recieve a single command.
    ///
    /// Returns `Ok(None)` if no command is pending. A valid command must be answered with
    /// [`GuiServer::send_response`] before the next one can be received. Invalid commands are
    /// answered here.
    pub fn recv_cmd(&self) -> Result<Option<GuiCmd>, GuiServerError> {
        let msg = match self.cmd_socket.recv_bytes(0) {
            Ok(m) => m,
            Err(zmq::Error::EAGAIN) => return Ok(None),
            Err(e) => return Err(GuiServerError::RecvError(e)),
        };

        serde_json::from_slice(&msg)
            .map_err(|e| {
                self.send_response(GuiCmdResponse::Invalid).ok();

                GuiServerError::CmdParseError(e)
            })
            .map(Some)
    }

    pub fn send_response(&self, response: GuiCmdResponse) -> Result<(), GuiServerError> {
        let response_str =
            serde_json::to_string(&response).map_err(GuiServerError::SerializationError)?;

        self.cmd_socket
            .send(&response_str, 0)
            .map_err(GuiServerError::SendError)
    }
}

impl GuiTm {
    /// Build a packet from the current sensor snapshot.
    pub fn new(sensors: &Sensors, algorithm_state: AlgorithmState, map: Option<&MapImage>) -> Self {
        Self {
            elapsed_s: util::session::try_get_elapsed_seconds().unwrap_or(0.0),
            pose3d: sensors.get_pose3d(),
            laser: sensors.get_laser_data(),
            cmd_vel: sensors.get_cmd_vel(),
            algorithm_state,
            map_path: map.map(|m| m.path().display().to_string()),
            map_size: map.map(|m| (m.width(), m.height())),
        }
    }
}

impl GuiThread {
    pub fn new(
        server: GuiServer,
        sensors: Arc<Sensors>,
        map: Option<Arc<MapImage>>,
        period: Duration,
    ) -> Self {
        Self {
            server,
            sensors,
            map,
            period,
        }
    }

    /// Handle all pending commands then publish telemetry.
    ///
    /// Returns `true` once the GUI has asked to quit.
    pub fn step(&self, runner: &AlgorithmRunner) -> Result<bool, GuiServerError> {
        let mut quit = false;

        loop {
            let cmd = match self.server.recv_cmd() {
                Ok(Some(c)) => c,
                Ok(None) => break,
                Err(e @ GuiServerError::CmdParseError(_)) => {
                    warn!("{}", e);
                    continue;
                }
                Err(e) => return Err(e),
            };

            info!("GUI command: {:?}", cmd);

            match cmd {
                GuiCmd::Play => runner.play(),
                GuiCmd::Stop => runner.stop(),
                GuiCmd::Quit => quit = true,
            }

            self.server.send_response(GuiCmdResponse::Ok)?;

            if quit {
                break;
            }
        }

        let tm = GuiTm::new(&self.sensors, runner.state(), self.map.as_deref());
        self.server.send_tm(&tm)?;

        Ok(quit)
    }

    /// Run the GUI loop until a [`GuiCmd::Quit`] is received.
    pub fn run(&self, runner: &AlgorithmRunner) -> Result<(), GuiServerError> {
        loop {
            let cycle_start_instant = Instant::now();

            if self.step(runner)? {
                info!("Quit requested by the GUI");
                return Ok(());
            }

            let cycle_dur = Instant::now() - cycle_start_instant;

            match self.period.checked_sub(cycle_dur) {
                Some(d) => thread::sleep(d),
                None => warn!(
                    "GUI cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - self.period.as_secs_f64()
                ),
            }
        }
    }
}

impl GuiClient {
    /// Connect to the GUI server's command socket.
    pub fn new(ctx: &zmq::Context, cmd_endpoint: &str) -> Result<Self, GuiClientError> {
        let socket_options = SocketOptions {
            block_on_first_connect: false,
            linger: 1,
            recv_timeout: 10,
            send_timeout: 10,
            req_correlate: true,
            req_relaxed: true,
            ..Default::default()
        };

        let socket = MonitoredSocket::new(ctx, zmq::REQ, socket_options, cmd_endpoint)
            .map_err(GuiClientError::SocketError)?;

        Ok(Self {
            socket,
            awaiting_response: false,
        })
    }

    pub fn connected(&self) -> bool {
        self.socket.connected()
    }

    /// Send a command to the server. The response must be collected with
    /// [`GuiClient::recv_response`] before another command is sent.
    pub fn send_cmd(&mut self, cmd: GuiCmd) -> Result<(), GuiClientError> {
        self.send_raw(
            serde_json::to_string(&cmd)
                .map_err(GuiClientError::SerializationError)?
                .as_bytes(),
        )
    }

    /// Send a raw message in place of a command.
    pub fn send_raw(&mut self, msg: &[u8]) -> Result<(), GuiClientError> {
        if self.awaiting_response {
            return Err(GuiClientError::WaitingForResponse);
        }

        self.socket
            .send(msg, 0)
            .map_err(GuiClientError::SendError)?;

        self.awaiting_response = true;

        Ok(())
    }

    /// Recieve the response to the last command, `Ok(None)` if it hasn't arrived yet.
    pub fn recv_response(&mut self) -> Result<Option<GuiCmdResponse>, GuiClientError> {
        if !self.awaiting_response {
            return Err(GuiClientError::NoCmdSent);
        }

        let msg = match self.socket.recv_bytes(0) {
            Ok(m) => m,
            Err(zmq::Error::EAGAIN) => return Ok(None),
            Err(e) => return Err(GuiClientError::RecvError(e)),
        };

        self.awaiting_response = false;

        serde_json::from_slice(&msg)
            .map(Some)
            .map_err(GuiClientError::DeserializeError)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_cmd_json() {
        assert_eq!(serde_json::to_string(&GuiCmd::Play).unwrap(), "\"Play\"");
        assert_eq!(
            serde_json::from_str::<GuiCmd>("\"Quit\"").unwrap(),
            GuiCmd::Quit
        );
        assert!(serde_json::from_str::<GuiCmd>("\"Jump\"").is_err());
    }

    #[test]
    fn test_client_request_order() {
        let ctx = zmq::Context::new();
        let mut client = GuiClient::new(&ctx, "inproc://gui_unit_order").unwrap();

        assert!(matches!(
            client.recv_response(),
            Err(GuiClientError::NoCmdSent)
        ));
    }

    #[test]
    fn test_client_refuses_second_cmd() {
        let ctx = zmq::Context::new();
        let _server = GuiServer::new(
            &ctx,
            "inproc://gui_unit_second_tm",
            "inproc://gui_unit_second_cmd",
        )
        .unwrap();
        let mut client = GuiClient::new(&ctx, "inproc://gui_unit_second_cmd").unwrap();

        client.send_cmd(GuiCmd::Play).unwrap();

        assert!(matches!(
            client.send_cmd(GuiCmd::Stop),
            Err(GuiClientError::WaitingForResponse)
        ));
        assert!(matches!(
            client.send_raw(b"\"Stop\""),
            Err(GuiClientError::WaitingForResponse)
        ));
    }
}
