//! Navigation message definitions.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::{
    geometry_msgs::{PoseWithCovariance, TwistWithCovariance},
    std_msgs::Header,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// An estimate of a position and velocity in free space.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Odometry {
    pub header: Header,

    /// Frame id the pose points to
    pub child_frame_id: String,

    /// Estimated pose, relative to `header.frame_id`
    pub pose: PoseWithCovariance,

    /// Estimated linear and angular velocity, relative to `child_frame_id`
    pub twist: TwistWithCovariance,
}
