//! # Localisation Algorithm
//!
//! The localisation algorithm is supplied by the user through the [`Algorithm`] trait. The
//! [`AlgorithmRunner`] calls it periodically on its own thread once the GUI asks it to play.
//!
//! The algorithm sees the robot through an [`AlgorithmIo`], which gives it the latest pose and
//! laser scan, the motors, and the map.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod template;

pub use template::{nearest_return, TemplateAlgorithm};

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    sync::{Arc, Mutex, MutexGuard},
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    listener::{ListenerLaser, ListenerPose3d},
    map::MapImage,
    motors::PublisherMotors,
    types::{LaserData, Pose3d},
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Default period between two iterations of the algorithm.
pub const DEFAULT_ALGORITHM_PERIOD: Duration = Duration::from_millis(80);

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A localisation algorithm.
pub trait Algorithm: Send {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Run one iteration of the algorithm.
    fn iterate(&mut self, io: &AlgorithmIo) -> Result<(), AlgorithmError>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Handles to everything an algorithm may read or command.
#[derive(Clone)]
pub struct AlgorithmIo {
    pub pose3d: Arc<Mutex<ListenerPose3d>>,
    pub laser: Arc<Mutex<ListenerLaser>>,
    pub motors: Arc<Mutex<PublisherMotors>>,
    pub map: Option<Arc<MapImage>>,
}

/// Runs an [`Algorithm`] on a background thread.
pub struct AlgorithmRunner {
    name: String,
    io: AlgorithmIo,
    state: Arc<Mutex<AlgorithmState>>,
    bg_jh: Option<JoinHandle<()>>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlgorithmState {
    Running,
    Paused,
    Killed,
}

#[derive(Debug, thiserror::Error)]
pub enum AlgorithmError {
    #[error("No map has been loaded")]
    NoMap,

    #[error("Algorithm failed: {0}")]
    Failed(String),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl AlgorithmIo {
    pub fn get_pose3d(&self) -> Pose3d {
        self.pose3d
            .lock()
            .expect("AlgorithmIo: pose3d mutex poisoned")
            .get_pose3d()
    }

    pub fn get_laser_data(&self) -> LaserData {
        self.laser
            .lock()
            .expect("AlgorithmIo: laser mutex poisoned")
            .get_laser_data()
    }

    /// Lock the motors publisher to send commands.
    pub fn motors(&self) -> MutexGuard<'_, PublisherMotors> {
        self.motors
            .lock()
            .expect("AlgorithmIo: motors mutex poisoned")
    }

    pub fn map(&self) -> Result<&MapImage, AlgorithmError> {
        self.map.as_deref().ok_or(AlgorithmError::NoMap)
    }
}

impl AlgorithmRunner {
    /// Start the runner thread. The algorithm is paused until [`AlgorithmRunner::play`] is called.
    pub fn new(algorithm: Box<dyn Algorithm>, io: AlgorithmIo, period: Duration) -> Self {
        let name = algorithm.name().to_string();
        let state = Arc::new(Mutex::new(AlgorithmState::Paused));

        let io_clone = io.clone();
        let state_clone = state.clone();

        let bg_jh = Some(thread::spawn(move || {
            bg_thread(algorithm, io_clone, state_clone, period)
        }));

        Self {
            name,
            io,
            state,
            bg_jh,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> AlgorithmState {
        *self.lock_state()
    }

    /// Start iterating the algorithm.
    pub fn play(&self) {
        let mut s = self.lock_state();

        if *s == AlgorithmState::Paused {
            info!("Playing algorithm {}", self.name);
            *s = AlgorithmState::Running;
        }
    }

    /// Pause the algorithm and bring the robot to a halt.
    pub fn stop(&self) {
        {
            let mut s = self.lock_state();

            if *s == AlgorithmState::Running {
                info!("Stopping algorithm {}", self.name);
                *s = AlgorithmState::Paused;
            }
        }

        halt(&self.io);
    }

    /// End the runner thread. The runner cannot be restarted.
    pub fn kill(&mut self) {
        *self.lock_state() = AlgorithmState::Killed;

        if let Some(jh) = self.bg_jh.take() {
            if jh.join().is_err() {
                error!("Algorithm {} thread panicked", self.name);
            }
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, AlgorithmState> {
        self.state
            .lock()
            .expect("AlgorithmRunner: state mutex poisoned")
    }
}

impl Drop for AlgorithmRunner {
    fn drop(&mut self) {
        self.kill();
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Command zero linear and angular velocity.
fn halt(io: &AlgorithmIo) {
    let motors = io.motors();
    motors.send_v(0.0);
    motors.send_w(0.0);
}

/// Background thread, iterates the algorithm while the state is `Running`.
fn bg_thread(
    mut algorithm: Box<dyn Algorithm>,
    io: AlgorithmIo,
    state: Arc<Mutex<AlgorithmState>>,
    period: Duration,
) {
    loop {
        let cycle_start_instant = Instant::now();

        // Copied out so the lock is free while the algorithm runs
        let current = *state
            .lock()
            .expect("AlgorithmRunner: state mutex poisoned");

        match current {
            AlgorithmState::Killed => break,
            AlgorithmState::Paused => (),
            AlgorithmState::Running => {
                if let Err(e) = algorithm.iterate(&io) {
                    error!("Algorithm {} error: {}", algorithm.name(), e);
                }

                // A stop which landed mid-iteration may have been overwritten by the algorithm
                let after = *state
                    .lock()
                    .expect("AlgorithmRunner: state mutex poisoned");
                if after != AlgorithmState::Running {
                    halt(&io);
                }
            }
        }

        let cycle_dur = Instant::now() - cycle_start_instant;

        match period.checked_sub(cycle_dur) {
            Some(d) => thread::sleep(d),
            None => warn!(
                "Algorithm {} cycle overran by {:.06} s",
                algorithm.name(),
                cycle_dur.as_secs_f64() - period.as_secs_f64()
            ),
        }
    }

    info!("Algorithm {} killed", algorithm.name());
}

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::net::zmq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts iterations and drives forwards.
    struct Counter(Arc<AtomicUsize>);

    impl Algorithm for Counter {
        fn name(&self) -> &str {
            "counter"
        }

        fn iterate(&mut self, io: &AlgorithmIo) -> Result<(), AlgorithmError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            io.motors().send_v(1.0);
            io.motors().send_w(0.2);
            io.map().map(|_| ())
        }
    }

    fn io(ctx: &zmq::Context, name: &str) -> AlgorithmIo {
        AlgorithmIo {
            pose3d: Arc::new(Mutex::new(
                ListenerPose3d::new(ctx, &format!("inproc://{}_sensors", name), "/odom").unwrap(),
            )),
            laser: Arc::new(Mutex::new(
                ListenerLaser::new(ctx, &format!("inproc://{}_sensors", name), "/scan").unwrap(),
            )),
            motors: Arc::new(Mutex::new(
                PublisherMotors::new(ctx, &format!("inproc://{}_motors", name), "/cmd_vel", None, None)
                    .unwrap(),
            )),
            map: None,
        }
    }

    #[test]
    fn test_runner_lifecycle() {
        let ctx = zmq::Context::new();
        let io = io(&ctx, "runner_lifecycle");
        let count = Arc::new(AtomicUsize::new(0));

        let mut runner = AlgorithmRunner::new(
            Box::new(Counter(count.clone())),
            io.clone(),
            Duration::from_millis(5),
        );

        assert_eq!(runner.name(), "counter");
        assert_eq!(runner.state(), AlgorithmState::Paused);

        thread::sleep(Duration::from_millis(50));
        assert_eq!(count.load(Ordering::SeqCst), 0);

        runner.play();
        assert_eq!(runner.state(), AlgorithmState::Running);

        // Iterations keep coming even though each one errors on the missing map
        let start = Instant::now();
        while count.load(Ordering::SeqCst) < 3 && start.elapsed() < Duration::from_secs(5) {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(count.load(Ordering::SeqCst) >= 3);

        runner.stop();
        assert_eq!(runner.state(), AlgorithmState::Paused);

        let cmd = io.motors().get_cmd_vel();
        assert_eq!((cmd.vx, cmd.az), (0.0, 0.0));

        // No iteration runs once paused
        let paused_count = count.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(50));
        assert_eq!(count.load(Ordering::SeqCst), paused_count);

        runner.kill();
        assert_eq!(runner.state(), AlgorithmState::Killed);

        runner.play();
        assert_eq!(runner.state(), AlgorithmState::Killed);
    }

    /// Takes far longer than the runner period and drives forwards.
    struct Slow(Arc<AtomicUsize>);

    impl Algorithm for Slow {
        fn name(&self) -> &str {
            "slow"
        }

        fn iterate(&mut self, io: &AlgorithmIo) -> Result<(), AlgorithmError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(400));
            io.motors().send_v(1.0);
            io.motors().send_w(0.2);
            Ok(())
        }
    }

    #[test]
    fn test_controls_responsive_during_slow_iteration() {
        let ctx = zmq::Context::new();
        let io = io(&ctx, "runner_slow");
        let count = Arc::new(AtomicUsize::new(0));
        let period = Duration::from_millis(80);

        let mut runner = AlgorithmRunner::new(Box::new(Slow(count.clone())), io.clone(), period);
        runner.play();

        // Wait until an iteration is in progress
        let start = Instant::now();
        while count.load(Ordering::SeqCst) == 0 && start.elapsed() < Duration::from_secs(5) {
            thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(count.load(Ordering::SeqCst), 1);

        let call = Instant::now();
        assert_eq!(runner.state(), AlgorithmState::Running);
        assert!(call.elapsed() < period);

        let call = Instant::now();
        runner.stop();
        assert!(call.elapsed() < period);
        assert_eq!(runner.state(), AlgorithmState::Paused);

        // The in-flight iteration ends by driving, the runner must undo that
        thread::sleep(Duration::from_millis(600));
        let cmd = io.motors().get_cmd_vel();
        assert_eq!((cmd.vx, cmd.az), (0.0, 0.0));
        assert_eq!(count.load(Ordering::SeqCst), 1);

        runner.kill();
    }
}
