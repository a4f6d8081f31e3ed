//! # Template Algorithm
//!
//! Starting point for a localisation algorithm. It reads the sensors and reports what it sees but
//! never moves the robot.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, info};

use super::{Algorithm, AlgorithmError, AlgorithmIo};
use crate::types::LaserData;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct TemplateAlgorithm {
    num_iterations: u64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TemplateAlgorithm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_iterations(&self) -> u64 {
        self.num_iterations
    }
}

impl Algorithm for TemplateAlgorithm {
    fn name(&self) -> &str {
        "template"
    }

    fn iterate(&mut self, io: &AlgorithmIo) -> Result<(), AlgorithmError> {
        if self.num_iterations == 0 {
            match io.map() {
                Ok(m) => info!(
                    "Localising in map {:?} ({}x{} px)",
                    m.path(),
                    m.width(),
                    m.height()
                ),
                Err(e) => info!("{}", e),
            }
        }
        self.num_iterations += 1;

        let pose = io.get_pose3d();
        let laser = io.get_laser_data();

        debug!(
            "Pose: x = {:.03} m, y = {:.03} m, yaw = {:.03} rad",
            pose.x, pose.y, pose.yaw
        );

        match nearest_return(&laser) {
            Some((angle, range)) => debug!(
                "Nearest return: {:.03} m at {:.03} rad ({} values)",
                range,
                angle,
                laser.values.len()
            ),
            None => debug!("No valid laser returns"),
        }

        // Insert localisation code here

        let motors = io.motors();
        motors.send_v(0.0);
        motors.send_w(0.0);

        Ok(())
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Find the `(angle, range)` of the closest valid return in a scan.
pub fn nearest_return(laser: &LaserData) -> Option<(f32, f32)> {
    laser
        .valid_points()
        .fold(None, |best: Option<(f32, f32)>, p| match best {
            Some(b) if b.1 <= p.1 => Some(b),
            _ => Some(p),
        })
}
