//! Geometry message definitions.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of elements in a row-major 6x6 covariance matrix.
pub const COVARIANCE_LEN: usize = 36;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A vector in free space, always anchored at the origin.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// The position of a point in free space.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// An orientation in free space in quaternion form.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Quaternion {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

/// A pose in free space, composed of position and orientation.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq)]
pub struct Pose {
    pub position: Point,
    pub orientation: Quaternion,
}

/// A pose with uncertainty.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PoseWithCovariance {
    pub pose: Pose,

    /// Row-major 6x6 covariance matrix over (x, y, z, rot x, rot y, rot z).
    pub covariance: Vec<f64>,
}

/// Velocity in free space broken into its linear and angular parts.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq)]
pub struct Twist {
    pub linear: Vector3,
    pub angular: Vector3,
}

/// A twist with uncertainty.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TwistWithCovariance {
    pub twist: Twist,

    /// Row-major 6x6 covariance matrix over (x, y, z, rot x, rot y, rot z).
    pub covariance: Vec<f64>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Quaternion {
    /// Build a quaternion representing a pure rotation of `yaw` radians about the Z axis.
    pub fn from_yaw(yaw: f64) -> Self {
        let half = 0.5 * yaw;
        Self {
            x: 0.0,
            y: 0.0,
            z: half.sin(),
            w: half.cos(),
        }
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            w: 1.0,
        }
    }
}

impl Default for PoseWithCovariance {
    fn default() -> Self {
        Self {
            pose: Pose::default(),
            covariance: vec![0.0; COVARIANCE_LEN],
        }
    }
}

impl Default for TwistWithCovariance {
    fn default() -> Self {
        Self {
            twist: Twist::default(),
            covariance: vec![0.0; COVARIANCE_LEN],
        }
    }
}
