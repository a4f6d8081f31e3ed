//! Standard message definitions: time stamps and headers.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::convert::TryFrom;

use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A point in time, split into whole seconds and nanoseconds.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq)]
pub struct Time {
    pub secs: i32,
    pub nsecs: u32,
}

/// Standard metadata for higher-level stamped data types.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Header {
    /// Consecutively increasing ID
    pub seq: u32,

    /// Acquisition time of the data
    pub stamp: Time,

    /// Frame this data is associated with
    pub frame_id: String,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Time {
    /// Get the current wall clock time.
    pub fn now() -> Self {
        Self::from(Utc::now())
    }

    /// Return the time as a number of seconds.
    pub fn to_secs_f64(&self) -> f64 {
        self.secs as f64 + (self.nsecs as f64 * 1e-9)
    }
}

impl From<DateTime<Utc>> for Time {
    fn from(dt: DateTime<Utc>) -> Self {
        let ts = dt.timestamp();

        match i32::try_from(ts) {
            Ok(secs) => Self {
                secs,
                nsecs: dt.timestamp_subsec_nanos(),
            },
            // Saturate rather than wrap once past the range of the wire format
            Err(_) => {
                warn!("Timestamp {} s does not fit in a message stamp", ts);
                Self {
                    secs: if ts < 0 { i32::MIN } else { i32::MAX },
                    nsecs: 0,
                }
            }
        }
    }
}

impl Header {
    /// Create a new header stamped with the current time.
    pub fn now(seq: u32, frame_id: &str) -> Self {
        Self {
            seq,
            stamp: Time::now(),
            frame_id: frame_id.into(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_time_to_secs() {
        let t = Time {
            secs: 12,
            nsecs: 500_000_000,
        };
        assert!((t.to_secs_f64() - 12.5).abs() < 1e-12);

        assert_eq!(Time::default().to_secs_f64(), 0.0);
    }

    #[test]
    fn test_stamp_saturates() {
        use chrono::TimeZone;

        let t = Time::from(Utc.timestamp_opt(1_600_000_000, 250).unwrap());
        assert_eq!(
            t,
            Time {
                secs: 1_600_000_000,
                nsecs: 250
            }
        );

        let t = Time::from(Utc.timestamp_opt(3_000_000_000, 250).unwrap());
        assert_eq!(
            t,
            Time {
                secs: i32::MAX,
                nsecs: 0
            }
        );

        let t = Time::from(Utc.timestamp_opt(-3_000_000_000, 0).unwrap());
        assert_eq!(t.secs, i32::MIN);
    }
}
