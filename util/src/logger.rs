//! Session logging
//!
//! Records are written twice: coloured to the terminal, and as plain text to the session's log
//! file so that it can be grepped after a run. Every line is prefixed with the number of seconds
//! since the session started and a three letter level tag.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use colored::Colorize;
use log::{info, Level};
use thiserror::Error;

// Internal imports
use crate::session;

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("Expected a log level of at least `INFO`, found `{0}`")]
    InvalidMinLogLevel(LevelFilter),

    #[error("Error opening the log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("A logger has already been set: {0}")]
    FernInitError(log::SetLoggerError),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise logging for the given session.
///
/// `min_level` must be at least `Info`. Warnings and errors are always
/// recorded, and the zmq crate is held at `Info` whatever the level.
///
/// Only the first call in a process can succeed.
pub fn logger_init(
    min_level: LevelFilter,
    session: &session::Session,
) -> Result<(), LoggerInitError> {
    if min_level < Level::Info {
        return Err(LoggerInitError::InvalidMinLogLevel(min_level));
    }

    let log_file = fern::log_file(&session.log_file_path)
        .map_err(LoggerInitError::LogFileInitError)?;

    let terminal = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} {}",
                record_prefix(
                    session::try_get_elapsed_seconds(),
                    record.level(),
                    record.target(),
                    true
                ),
                message
            ))
        })
        .chain(std::io::stdout());

    let file = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} {}",
                record_prefix(
                    session::try_get_elapsed_seconds(),
                    record.level(),
                    record.target(),
                    false
                ),
                message
            ))
        })
        .chain(log_file);

    fern::Dispatch::new()
        .level(min_level)
        .level_for("zmq", LevelFilter::Info)
        .chain(terminal)
        .chain(file)
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    info!("Logging initialised for {}", session.exec_name);
    info!("    Session epoch: {}", session::get_epoch());
    info!("    Log level: {:?}", min_level);
    info!("    Log file path: {:?}", session.log_file_path);

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Build the prefix of a log line.
///
/// Debug and trace lines also name the module that logged them. Before a
/// session exists the elapsed time is shown as `-`.
fn record_prefix(elapsed_s: Option<f64>, level: Level, target: &str, colour: bool) -> String {
    let time = match elapsed_s {
        Some(s) => format!("{:10.6}", s),
        None => format!("{:>10}", "-"),
    };

    let tag = if colour {
        level_tag_coloured(level)
    } else {
        level_tag(level).to_string()
    };

    if level > Level::Info {
        format!("[{} {}] {}:", time, tag, target)
    } else {
        format!("[{} {}]", time, tag)
    }
}

fn level_tag(level: Level) -> &'static str {
    match level {
        Level::Trace => "TRC",
        Level::Debug => "DBG",
        Level::Info => "INF",
        Level::Warn => "WRN",
        Level::Error => "ERR",
    }
}

fn level_tag_coloured(level: Level) -> String {
    let tag = level_tag(level);

    match level {
        Level::Trace => tag.dimmed().italic(),
        Level::Debug => tag.dimmed(),
        Level::Info => tag.normal(),
        Level::Warn => tag.yellow(),
        Level::Error => tag.red().bold(),
    }
    .to_string()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_plain_prefix() {
        assert_eq!(
            record_prefix(Some(1.5), Level::Info, "loc_lib::motors", false),
            "[  1.500000 INF]"
        );
        assert_eq!(
            record_prefix(Some(12.25), Level::Debug, "loc_lib::motors", false),
            "[ 12.250000 DBG] loc_lib::motors:"
        );
        assert_eq!(
            record_prefix(None, Level::Warn, "loc_lib::gui", false),
            "[         - WRN]"
        );
    }

    #[test]
    fn test_coloured_prefix_keeps_tag() {
        let prefix = record_prefix(Some(0.0), Level::Error, "x", true);
        assert!(prefix.contains("ERR"));
        assert!(prefix.starts_with("[  0.000000 "));
    }
}
