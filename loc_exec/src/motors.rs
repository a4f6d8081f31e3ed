//! # Motors Publisher
//!
//! Holds the velocity command for the robot's motors and publishes it on the command topic. The
//! command is republished at a fixed rate so that the robot keeps moving while the algorithm
//! thinks, and so that a late subscriber still picks it up.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use comms_if::{
    msgs::Twist,
    net::{zmq, SocketOptions},
    topic::{TopicError, TopicPublisher},
};
use log::{error, info, warn};

use crate::types::CmdVel;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Period at which the current command is republished.
pub const PUBLISH_PERIOD: Duration = Duration::from_millis(80);

/// Linear velocity limit used when none is configured.
///
/// Units: meters/second
pub const DEFAULT_MAX_V: f64 = 5.0;

/// Angular velocity limit used when none is configured.
///
/// Units: radians/second
pub const DEFAULT_MAX_W: f64 = 0.5;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Publishes velocity commands to the robot's motors.
pub struct PublisherMotors {
    ctx: zmq::Context,
    endpoint: String,
    topic: String,

    max_v: f64,
    max_w: f64,

    cmd_vel: Arc<Mutex<CmdVel>>,
    publisher: Arc<Mutex<Option<TopicPublisher<Twist>>>>,

    bg_run: Arc<AtomicBool>,
    bg_jh: Option<JoinHandle<()>>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum MotorsError {
    #[error("Could not create the publisher: {0}")]
    PublisherError(TopicError),

    #[error("Could not publish the command: {0}")]
    PublishError(TopicError),

    #[error("The motors publisher is not running")]
    NotRunning,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl PublisherMotors {
    /// Create a new motors publisher and start it.
    ///
    /// A velocity limit which is `None` or zero is replaced by its default.
    pub fn new(
        ctx: &zmq::Context,
        endpoint: &str,
        topic: &str,
        max_v: Option<f64>,
        max_w: Option<f64>,
    ) -> Result<Self, MotorsError> {
        let mut motors = Self {
            ctx: ctx.clone(),
            endpoint: endpoint.into(),
            topic: topic.into(),
            max_v: limit_or_default("maxV", max_v, DEFAULT_MAX_V),
            max_w: limit_or_default("maxW", max_w, DEFAULT_MAX_W),
            cmd_vel: Arc::new(Mutex::new(CmdVel::default())),
            publisher: Arc::new(Mutex::new(None)),
            bg_run: Arc::new(AtomicBool::new(false)),
            bg_jh: None,
        };

        motors.start()?;

        Ok(motors)
    }

    /// Bind the publisher and start republishing the command in the background.
    ///
    /// Does nothing if already running.
    pub fn start(&mut self) -> Result<(), MotorsError> {
        if self.is_running() {
            return Ok(());
        }

        let publisher = TopicPublisher::new(
            &self.ctx,
            &self.endpoint,
            &self.topic,
            SocketOptions::publisher(),
        )
        .map_err(MotorsError::PublisherError)?;

        *self
            .publisher
            .lock()
            .expect("PublisherMotors: publisher mutex poisoned") = Some(publisher);

        self.bg_run.store(true, Ordering::Relaxed);

        let bg_run_clone = self.bg_run.clone();
        let cmd_vel_clone = self.cmd_vel.clone();
        let publisher_clone = self.publisher.clone();

        self.bg_jh = Some(thread::spawn(move || {
            bg_thread(bg_run_clone, cmd_vel_clone, publisher_clone)
        }));

        Ok(())
    }

    /// Stop publishing and unbind the publisher.
    pub fn stop(&mut self) {
        self.bg_run.store(false, Ordering::Relaxed);

        if let Some(jh) = self.bg_jh.take() {
            if jh.join().is_err() {
                error!("Motors publish thread panicked");
            }
        }

        *self
            .publisher
            .lock()
            .expect("PublisherMotors: publisher mutex poisoned") = None;
    }

    pub fn is_running(&self) -> bool {
        self.bg_jh.is_some()
    }

    /// Publish the current command immediately.
    pub fn publish(&self) -> Result<(), MotorsError> {
        let twist = Twist::from(&self.get_cmd_vel());

        match *self
            .publisher
            .lock()
            .expect("PublisherMotors: publisher mutex poisoned")
        {
            Some(ref p) => p.publish(&twist).map_err(MotorsError::PublishError),
            None => Err(MotorsError::NotRunning),
        }
    }

    /// Replace the whole command.
    pub fn send_velocities(&self, vel: CmdVel) {
        *self.lock_cmd() = vel;
    }

    /// Set the forward velocity, an alias of [`PublisherMotors::send_vx`].
    pub fn send_v(&self, v: f64) {
        self.send_vx(v);
    }

    /// Set the lateral velocity, an alias of [`PublisherMotors::send_vy`].
    pub fn send_l(&self, l: f64) {
        self.send_vy(l);
    }

    /// Set the turn rate, an alias of [`PublisherMotors::send_az`].
    pub fn send_w(&self, w: f64) {
        self.send_az(w);
    }

    pub fn send_vx(&self, vx: f64) {
        self.lock_cmd().vx = vx;
    }

    pub fn send_vy(&self, vy: f64) {
        self.lock_cmd().vy = vy;
    }

    pub fn send_az(&self, az: f64) {
        self.lock_cmd().az = az;
    }

    pub fn get_max_v(&self) -> f64 {
        self.max_v
    }

    pub fn get_max_w(&self) -> f64 {
        self.max_w
    }

    /// Return a copy of the current command.
    pub fn get_cmd_vel(&self) -> CmdVel {
        *self.lock_cmd()
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn lock_cmd(&self) -> std::sync::MutexGuard<'_, CmdVel> {
        self.cmd_vel
            .lock()
            .expect("PublisherMotors: cmd_vel mutex poisoned")
    }
}

impl Drop for PublisherMotors {
    fn drop(&mut self) {
        self.bg_run.store(false, Ordering::Relaxed);

        if let Some(jh) = self.bg_jh.take() {
            jh.join().ok();
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Use `value` if it is set and non-zero, otherwise the default with a notice.
fn limit_or_default(name: &str, value: Option<f64>, default: f64) -> f64 {
    match value {
        Some(v) if v != 0.0 => v,
        _ => {
            info!(
                "LaserLoc.Motors.{} not provided, the default value is used: {}",
                name, default
            );
            default
        }
    }
}

/// Background thread, publishes the current command every [`PUBLISH_PERIOD`].
fn bg_thread(
    run: Arc<AtomicBool>,
    cmd_vel: Arc<Mutex<CmdVel>>,
    publisher: Arc<Mutex<Option<TopicPublisher<Twist>>>>,
) {
    while run.load(Ordering::Relaxed) {
        let twist = {
            let c = cmd_vel
                .lock()
                .expect("PublisherMotors: cmd_vel mutex poisoned");
            Twist::from(&*c)
        };

        if let Some(ref p) = *publisher
            .lock()
            .expect("PublisherMotors: publisher mutex poisoned")
        {
            if let Err(e) = p.publish(&twist) {
                warn!("{}", e);
            }
        }

        thread::sleep(PUBLISH_PERIOD);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_limit_or_default() {
        assert_eq!(limit_or_default("maxV", Some(2.0), DEFAULT_MAX_V), 2.0);
        assert_eq!(limit_or_default("maxV", Some(0.0), DEFAULT_MAX_V), 5.0);
        assert_eq!(limit_or_default("maxW", None, DEFAULT_MAX_W), 0.5);
    }

    #[test]
    fn test_setters_only_touch_their_field() {
        let ctx = zmq::Context::new();
        let motors = PublisherMotors::new(
            &ctx,
            "inproc://motors_unit_setters",
            "/cmd_vel",
            None,
            Some(1.5),
        )
        .unwrap();

        assert_eq!(motors.get_max_v(), DEFAULT_MAX_V);
        assert_eq!(motors.get_max_w(), 1.5);

        motors.send_velocities(CmdVel {
            vx: 1.0,
            vy: 2.0,
            vz: 3.0,
            ax: 4.0,
            ay: 5.0,
            az: 6.0,
            timestamp: 7.0,
        });
        motors.send_v(0.5);
        motors.send_w(-0.25);
        motors.send_l(0.1);

        assert_eq!(
            motors.get_cmd_vel(),
            CmdVel {
                vx: 0.5,
                vy: 0.1,
                vz: 3.0,
                ax: 4.0,
                ay: 5.0,
                az: -0.25,
                timestamp: 7.0,
            }
        );
    }

    #[test]
    fn test_publish_when_stopped() {
        let ctx = zmq::Context::new();
        let mut motors = PublisherMotors::new(
            &ctx,
            "inproc://motors_unit_stopped",
            "/cmd_vel",
            None,
            None,
        )
        .unwrap();

        assert!(motors.publish().is_ok());

        motors.stop();

        assert!(!motors.is_running());
        assert!(matches!(motors.publish(), Err(MotorsError::NotRunning)));
    }
}
