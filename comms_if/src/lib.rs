//! # Communications interface crate.
//!
//! Provides all common communications interfaces for the software: the middleware message types
//! exchanged with the robot, and the network abstractions used to move them around.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Middleware message definitions (laser scans, odometry, velocity commands)
pub mod msgs;

/// Network module
pub mod net;

/// Topic based publish/subscribe on top of the network module
pub mod topic;
