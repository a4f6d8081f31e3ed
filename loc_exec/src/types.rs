//! # Framework Data Types
//!
//! Plain data types handed to the localisation algorithm and the GUI. They are independent of the
//! middleware message layout, see [`crate::convert`] for the translations.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A laser scan in the framework's angle convention.
///
/// Angles are measured counter-clockwise from the robot's right hand side, so that straight ahead
/// is at pi/2:
///
/// ```text
///   Middleware           Framework
///        0                  pi/2
///        |                   |
///  pi/2 ---- -pi/2     pi ------- 0
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LaserData {
    /// Range measurements, first value at `min_angle`.
    ///
    /// Units: meters
    pub values: Vec<f32>,

    /// Angle of the first measurement.
    ///
    /// Units: radians
    pub min_angle: f32,

    /// Angle of the last measurement.
    ///
    /// Units: radians
    pub max_angle: f32,

    /// Minimum valid range.
    ///
    /// Units: meters
    pub min_range: f32,

    /// Maximum valid range.
    ///
    /// Units: meters
    pub max_range: f32,

    /// Acquisition time of the scan.
    ///
    /// Units: seconds
    pub timestamp: f64,
}

/// Full pose of the robot, position plus attitude as both Euler angles and a quaternion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose3d {
    /// Position, units: meters
    pub x: f64,
    pub y: f64,
    pub z: f64,

    /// Homogeneous coordinate of the position, always 1
    pub h: f64,

    /// Attitude, units: radians
    pub yaw: f64,
    pub pitch: f64,
    pub roll: f64,

    /// Attitude quaternion in `[w, x, y, z]` order
    pub q: [f64; 4],

    /// Time of the estimate.
    ///
    /// Units: seconds
    pub timestamp: f64,
}

/// A velocity command for the robot's motors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CmdVel {
    /// Linear velocity, units: meters/second
    pub vx: f64,
    pub vy: f64,
    pub vz: f64,

    /// Angular velocity, units: radians/second
    pub ax: f64,
    pub ay: f64,
    pub az: f64,

    /// Time of the command.
    ///
    /// Units: seconds
    pub timestamp: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl LaserData {
    /// Angular step between consecutive measurements, or zero if there are fewer than two.
    pub fn angle_increment(&self) -> f32 {
        match self.values.len() {
            0 | 1 => 0.0,
            n => (self.max_angle - self.min_angle) / (n - 1) as f32,
        }
    }

    /// Iterate over `(angle, range)` pairs for every measurement inside the valid range.
    pub fn valid_points(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        let inc = self.angle_increment();
        let (min, max) = (self.min_range, self.max_range);

        self.values
            .iter()
            .enumerate()
            .filter(move |&(_, &r)| r.is_finite() && r >= min && r <= max)
            .map(move |(i, &r)| (self.min_angle + i as f32 * inc, r))
    }
}

impl Default for Pose3d {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            h: 1.0,
            yaw: 0.0,
            pitch: 0.0,
            roll: 0.0,
            q: [1.0, 0.0, 0.0, 0.0],
            timestamp: 0.0,
        }
    }
}
