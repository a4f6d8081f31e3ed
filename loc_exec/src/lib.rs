//! # Laser localisation library.
//!
//! This library allows the executable and the integration tests to access items defined inside
//! the localisation crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Algorithm seam - the user's localisation algorithm and the thread that runs it
pub mod algorithm;

/// Conversions between middleware messages and framework types
pub mod convert;

/// GUI feed - telemetry out to the GUI, commands in from it
pub mod gui;

/// Topic listeners - keep the latest laser scan and pose
pub mod listener;

/// Map image the robot localises against
pub mod map;

/// Motors publisher - sends velocity commands to the robot
pub mod motors;

/// Executable parameters
pub mod params;

/// Sensors snapshot and the thread that refreshes it
pub mod sensors;

/// Framework data types
pub mod types;
