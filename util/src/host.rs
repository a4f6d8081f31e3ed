//! Host platform utility functions

use std::env;
use std::path::PathBuf;

/// Environment variable pointing at the root of the software installation.
pub const SW_ROOT_ENV_VAR: &str = "LASER_LOC_ROOT";

/// Get the software root directory.
///
/// This is the value of the `LASER_LOC_ROOT` environment variable, or the current working
/// directory if it is not set.
pub fn get_sw_root() -> std::io::Result<PathBuf> {
    match env::var_os(SW_ROOT_ENV_VAR) {
        Some(root) => Ok(PathBuf::from(root)),
        None => env::current_dir(),
    }
}

/// Get the name of the host this executable is running on, if it can be determined.
pub fn get_hostname() -> Option<String> {
    env::var("HOSTNAME")
        .ok()
        .or_else(|| std::fs::read_to_string("/etc/hostname").ok())
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty())
}
