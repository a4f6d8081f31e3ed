//! Sensor message definitions.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::std_msgs::Header;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A single scan from a planar laser range-finder.
///
/// Angles are measured around the sensor's Z axis, with zero pointing forward along X and
/// positive angles counter-clockwise.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct LaserScan {
    /// Timestamp of the first ray in the scan
    pub header: Header,

    /// Start angle of the scan.
    ///
    /// Units: radians
    pub angle_min: f32,

    /// End angle of the scan.
    ///
    /// Units: radians
    pub angle_max: f32,

    /// Angular distance between measurements.
    ///
    /// Units: radians
    pub angle_increment: f32,

    /// Time between measurements.
    ///
    /// Units: seconds
    pub time_increment: f32,

    /// Time between scans.
    ///
    /// Units: seconds
    pub scan_time: f32,

    /// Minimum range value.
    ///
    /// Units: meters
    pub range_min: f32,

    /// Maximum range value.
    ///
    /// Units: meters
    pub range_max: f32,

    /// Range data, values outside `[range_min, range_max]` should be discarded.
    ///
    /// Units: meters
    pub ranges: Vec<f32>,

    /// Intensity data, device specific units. May be empty.
    pub intensities: Vec<f32>,
}
