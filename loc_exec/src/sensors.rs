//! # Sensors
//!
//! Aggregates the pose and laser listeners, and the motors publisher, into a single snapshot which
//! is refreshed at a fixed period by [`SensorsThread`].

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use log::{error, warn};

use crate::{
    listener::{ListenerLaser, ListenerPose3d},
    motors::PublisherMotors,
    types::{CmdVel, LaserData, Pose3d},
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Default period of the sensors thread.
pub const DEFAULT_SENSORS_PERIOD: Duration = Duration::from_millis(80);

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Snapshot of the robot's sensors.
pub struct Sensors {
    motors: Arc<Mutex<PublisherMotors>>,
    pose3d: Arc<Mutex<ListenerPose3d>>,
    laser: Arc<Mutex<ListenerLaser>>,

    snapshot: Mutex<Snapshot>,
}

/// Periodically calls [`Sensors::update`].
pub struct SensorsThread {
    bg_run: Arc<AtomicBool>,
    bg_jh: Option<JoinHandle<()>>,
}

#[derive(Default)]
struct Snapshot {
    pose3d: Pose3d,
    laser: LaserData,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Sensors {
    pub fn new(
        motors: Arc<Mutex<PublisherMotors>>,
        pose3d: Arc<Mutex<ListenerPose3d>>,
        laser: Arc<Mutex<ListenerLaser>>,
    ) -> Self {
        Self {
            motors,
            pose3d,
            laser,
            snapshot: Mutex::new(Snapshot::default()),
        }
    }

    /// Copy the latest pose and laser scan into the snapshot.
    pub fn update(&self) {
        let pose3d = self
            .pose3d
            .lock()
            .expect("Sensors: pose3d mutex poisoned")
            .get_pose3d();
        let laser = self
            .laser
            .lock()
            .expect("Sensors: laser mutex poisoned")
            .get_laser_data();

        let mut s = self.snapshot.lock().expect("Sensors: snapshot mutex poisoned");
        s.pose3d = pose3d;
        s.laser = laser;
    }

    pub fn get_pose3d(&self) -> Pose3d {
        self.snapshot
            .lock()
            .expect("Sensors: snapshot mutex poisoned")
            .pose3d
    }

    pub fn get_laser_data(&self) -> LaserData {
        self.snapshot
            .lock()
            .expect("Sensors: snapshot mutex poisoned")
            .laser
            .clone()
    }

    /// The command currently held by the motors publisher.
    pub fn get_cmd_vel(&self) -> CmdVel {
        self.motors
            .lock()
            .expect("Sensors: motors mutex poisoned")
            .get_cmd_vel()
    }
}

impl SensorsThread {
    /// Start updating `sensors` every `period`.
    pub fn start(sensors: Arc<Sensors>, period: Duration) -> Self {
        let bg_run = Arc::new(AtomicBool::new(true));
        let bg_run_clone = bg_run.clone();

        let bg_jh = Some(thread::spawn(move || {
            bg_thread(sensors, bg_run_clone, period)
        }));

        Self { bg_run, bg_jh }
    }

    /// Stop the thread and wait for it to finish.
    pub fn stop(&mut self) {
        self.bg_run.store(false, Ordering::Relaxed);

        if let Some(jh) = self.bg_jh.take() {
            if jh.join().is_err() {
                error!("Sensors thread panicked");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.bg_jh.is_some()
    }
}

impl Drop for SensorsThread {
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

fn bg_thread(sensors: Arc<Sensors>, run: Arc<AtomicBool>, period: Duration) {
    while run.load(Ordering::Relaxed) {
        let cycle_start_instant = Instant::now();

        sensors.update();

        let cycle_dur = Instant::now() - cycle_start_instant;

        match period.checked_sub(cycle_dur) {
            Some(d) => thread::sleep(d),
            None => warn!(
                "Sensors cycle overran by {:.06} s",
                cycle_dur.as_secs_f64() - period.as_secs_f64()
            ),
        }
    }
}
