//! Line protocol spoken to the attached dive computer.
//!
//! Two frames, both plain ASCII without a trailing newline:
//!
//! - `T <hour> <minute> <second> <day> <month> <year>`: clock sync, UTC,
//!   sent once when the link opens.
//! - `D <decimeters>`: current depth rounded to the nearest decimetre,
//!   sent every tick.

use arrayvec::ArrayString;
use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Timelike, Utc};
use core::fmt::Write;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_FRAME_SIZE: usize = 48;

pub const CLOCK_SYNC_TAG: &str = "T";
pub const DEPTH_REPORT_TAG: &str = "D";

pub type FrameBuffer = ArrayString<MAX_FRAME_SIZE>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TelemetryFrame {
    ClockSync {
        hour: u32,
        minute: u32,
        second: u32,
        day: u32,
        month: u32,
        year: i32,
    },
    DepthReport {
        decimeters: i64,
    },
}

impl TelemetryFrame {
    pub fn clock_sync(now: DateTime<Utc>) -> Self {
        TelemetryFrame::ClockSync {
            hour: now.hour(),
            minute: now.minute(),
            // Leap seconds surface as nanosecond overflow, not second 60
            second: now.second(),
            day: now.day(),
            month: now.month(),
            year: now.year(),
        }
    }

    pub fn depth_report(current_depth: f64) -> Self {
        TelemetryFrame::DepthReport {
            decimeters: depth_to_decimeters(current_depth),
        }
    }

    pub fn encode(&self) -> FrameBuffer {
        let mut buffer = FrameBuffer::new();
        // Every field is bounded, so the widest frame fits MAX_FRAME_SIZE
        let written = match *self {
            TelemetryFrame::ClockSync {
                hour,
                minute,
                second,
                day,
                month,
                year,
            } => write!(
                buffer,
                "{} {} {} {} {} {} {}",
                CLOCK_SYNC_TAG, hour, minute, second, day, month, year
            ),
            TelemetryFrame::DepthReport { decimeters } => {
                write!(buffer, "{} {}", DEPTH_REPORT_TAG, decimeters)
            }
        };
        debug_assert!(written.is_ok(), "Frame exceeded {} bytes", MAX_FRAME_SIZE);

        buffer
    }

    /// Parses a single frame. Surrounding whitespace, including a line
    /// terminator, is ignored.
    pub fn decode(line: &str) -> Result<Self, ProtocolError> {
        let mut fields = line.split_whitespace();
        let tag = fields.next().ok_or(ProtocolError::EmptyFrame)?;
        let values: Vec<&str> = fields.collect();

        match tag {
            CLOCK_SYNC_TAG => {
                if values.len() != 6 {
                    return Err(ProtocolError::FieldCount {
                        tag: tag.to_string(),
                        expected: 6,
                        got: values.len(),
                    });
                }
                let hour = parse_field::<u32>(values[0])?;
                let minute = parse_field::<u32>(values[1])?;
                let second = parse_field::<u32>(values[2])?;
                let day = parse_field::<u32>(values[3])?;
                let month = parse_field::<u32>(values[4])?;
                let year = parse_field::<i32>(values[5])?;

                let time = civil_datetime(hour, minute, second, day, month, year)?;
                Ok(TelemetryFrame::clock_sync(time))
            }
            DEPTH_REPORT_TAG => {
                if values.len() != 1 {
                    return Err(ProtocolError::FieldCount {
                        tag: tag.to_string(),
                        expected: 1,
                        got: values.len(),
                    });
                }
                Ok(TelemetryFrame::DepthReport {
                    decimeters: parse_field::<i64>(values[0])?,
                })
            }
            other => Err(ProtocolError::UnknownTag(other.to_string())),
        }
    }

    /// Depth in metres carried by a depth report.
    pub fn depth_meters(&self) -> Option<f64> {
        match *self {
            TelemetryFrame::DepthReport { decimeters } => Some(decimeters as f64 / 10.0),
            TelemetryFrame::ClockSync { .. } => None,
        }
    }

    /// Civil time carried by a clock sync.
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        match *self {
            TelemetryFrame::ClockSync {
                hour,
                minute,
                second,
                day,
                month,
                year,
            } => civil_datetime(hour, minute, second, day, month, year).ok(),
            TelemetryFrame::DepthReport { .. } => None,
        }
    }
}

pub fn encode_clock_sync(now: DateTime<Utc>) -> FrameBuffer {
    TelemetryFrame::clock_sync(now).encode()
}

pub fn encode_depth_report(current_depth: f64) -> FrameBuffer {
    TelemetryFrame::depth_report(current_depth).encode()
}

/// Nearest decimetre, ties away from zero. Out-of-range values saturate.
pub fn depth_to_decimeters(depth_m: f64) -> i64 {
    (depth_m * 10.0).round() as i64
}

fn parse_field<T: core::str::FromStr>(field: &str) -> Result<T, ProtocolError> {
    field
        .parse::<T>()
        .map_err(|_| ProtocolError::InvalidField(field.to_string()))
}

fn civil_datetime(
    hour: u32,
    minute: u32,
    second: u32,
    day: u32,
    month: u32,
    year: i32,
) -> Result<DateTime<Utc>, ProtocolError> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, second))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or(ProtocolError::InvalidDateTime {
            hour,
            minute,
            second,
            day,
            month,
            year,
        })
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("empty frame")]
    EmptyFrame,

    #[error("unknown frame tag: {0}")]
    UnknownTag(String),

    #[error("frame {tag} expects {expected} fields, got {got}")]
    FieldCount {
        tag: String,
        expected: usize,
        got: usize,
    },

    #[error("invalid integer field: {0}")]
    InvalidField(String),

    #[error("invalid clock sync {hour}:{minute}:{second} {day}/{month}/{year}")]
    InvalidDateTime {
        hour: u32,
        minute: u32,
        second: u32,
        day: u32,
        month: u32,
        year: i32,
    },
}
