//! # Localisation Executable Parameters
//!
//! This module provides the parameters for the localisation executable, which are loaded from a
//! TOML file such as `params/laser_loc.toml`.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{algorithm, gui, sensors};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Longest accepted thread period.
///
/// Units: seconds
pub const MAX_PERIOD_S: f64 = 60.0;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaserLocParams {
    /// Name of this node, used to name the session
    pub node_name: String,

    pub motors: MotorsParams,

    pub pose3d: TopicParams,

    pub laser: TopicParams,

    pub map: MapParams,

    pub gui: GuiParams,

    #[serde(default)]
    pub sensors: PeriodParams,

    #[serde(default)]
    pub algorithm: PeriodParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotorsParams {
    pub topic: String,

    /// Network endpoint the command publisher binds to
    pub endpoint: String,

    /// Linear velocity limit, units: meters/second
    #[serde(default)]
    pub max_v: Option<f64>,

    /// Angular velocity limit, units: radians/second
    #[serde(default)]
    pub max_w: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicParams {
    pub topic: String,

    /// Network endpoint of the publisher to connect to
    pub endpoint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapParams {
    /// Path to the map image
    pub img: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuiParams {
    pub tm_endpoint: String,

    pub cmd_endpoint: String,

    #[serde(default)]
    pub period_s: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PeriodParams {
    #[serde(default)]
    pub period_s: Option<f64>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl LaserLocParams {
    pub fn sensors_period(&self) -> Duration {
        period_or(self.sensors.period_s, sensors::DEFAULT_SENSORS_PERIOD)
    }

    pub fn algorithm_period(&self) -> Duration {
        period_or(self.algorithm.period_s, algorithm::DEFAULT_ALGORITHM_PERIOD)
    }

    pub fn gui_period(&self) -> Duration {
        period_or(self.gui.period_s, gui::DEFAULT_GUI_PERIOD)
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Use `period_s` if it is positive and no longer than [`MAX_PERIOD_S`], otherwise the default.
fn period_or(period_s: Option<f64>, default: Duration) -> Duration {
    match period_s {
        Some(p) if p > 0.0 && p <= MAX_PERIOD_S => Duration::from_secs_f64(p),
        _ => default,
    }
}
