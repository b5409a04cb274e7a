//! Event and sample types for the detector boundary.
//!
//! Platform capture plumbing (camera frame pipelines, headset attitude
//! callbacks) lives outside this crate; it pushes raw samples into a
//! detector, which classifies them against the active calibration and
//! emits these types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One classified posture reading.
///
/// Produced per detector callback and consumed immediately by the
/// evaluator; never stored beyond the current tick.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PostureReading {
    /// Timestamp when the reading was classified
    pub timestamp: DateTime<Utc>,
    /// Whether the reading exceeds the calibrated deviation threshold
    pub is_bad_posture: bool,
    /// How far a bad reading exceeds the threshold, normalized to 0.0-1.0.
    /// Always 0.0 for good readings.
    pub severity: f64,
}

impl PostureReading {
    /// Create a good-posture reading.
    pub fn good(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            is_bad_posture: false,
            severity: 0.0,
        }
    }

    /// Create a bad-posture reading with the given severity (clamped to 0-1).
    pub fn bad(timestamp: DateTime<Utc>, severity: f64) -> Self {
        Self {
            timestamp,
            is_bad_posture: true,
            severity: severity.clamp(0.0, 1.0),
        }
    }
}

/// A motion-headset attitude sample, in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Attitude {
    pub pitch: f64,
    pub roll: f64,
    pub yaw: f64,
}

impl Attitude {
    pub fn new(pitch: f64, roll: f64, yaw: f64) -> Self {
        Self { pitch, roll, yaw }
    }
}

/// Unified event stream emitted by a detector.
#[derive(Debug, Clone, Copy)]
pub enum DetectorEvent {
    /// A classified posture reading
    Reading(PostureReading),
    /// The sensing device came into range (true) or dropped out (false)
    Connectivity(bool),
    /// The user left (true) or returned to (false) the sensing field
    Presence { is_away: bool },
}

/// Errors that can occur while controlling a detector.
#[derive(Debug)]
pub enum DetectorError {
    AlreadyRunning,
    NotAvailable,
    PermissionDenied(String),
}

impl std::fmt::Display for DetectorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DetectorError::AlreadyRunning => write!(f, "Detector is already running"),
            DetectorError::NotAvailable => write!(f, "Sensing device is not available"),
            DetectorError::PermissionDenied(msg) => write!(f, "Permission denied: {msg}"),
        }
    }
}

impl std::error::Error for DetectorError {}
