//! # Middleware Messages
//!
//! Plain message structures mirroring the robotics middleware's `std_msgs`, `geometry_msgs`,
//! `sensor_msgs` and `nav_msgs` packages. Messages are serialised as JSON on the wire.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod geometry_msgs;
pub mod nav_msgs;
pub mod sensor_msgs;
pub mod std_msgs;

// ------------------------------------------------------------------------------------------------
// REEXPORTS
// ------------------------------------------------------------------------------------------------

pub use geometry_msgs::{
    Point, Pose, PoseWithCovariance, Quaternion, Twist, TwistWithCovariance, Vector3,
};
pub use nav_msgs::Odometry;
pub use sensor_msgs::LaserScan;
pub use std_msgs::{Header, Time};
