//! The detector boundary.
//!
//! A detector wraps one sensing modality: platform capture plumbing
//! pushes raw samples into it over a channel, and the control loop drains
//! classified [`DetectorEvent`]s back out. Classification against the
//! active calibration happens here, so severity is produced exactly once,
//! at the boundary. Exactly one detector is started at a time.

pub mod camera;
pub mod motion;
pub mod types;

// Re-export commonly used types
pub use camera::{classify_camera_sample, CameraDetector, CameraObservation};
pub use motion::{classify_motion_sample, MotionDetector, MotionSignal};
pub use types::{Attitude, DetectorError, DetectorEvent, PostureReading};

use crate::core::calibration::CalibrationData;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The sensing modality in use. Selecting one stops the other's detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingSource {
    Camera,
    MotionHeadset,
}

impl TrackingSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackingSource::Camera => "camera",
            TrackingSource::MotionHeadset => "motion_headset",
        }
    }
}

impl std::fmt::Display for TrackingSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Common surface of the two detectors.
///
/// The sample type is associated, not erased: calibration samples stay
/// typed per source all the way through a [`crate::core::CalibrationSession`].
pub trait Detector {
    type Sample: Copy;

    fn source(&self) -> TrackingSource;

    /// Begin emitting events. Fails when the device is gone or capture is
    /// already running.
    fn start(&mut self) -> Result<(), DetectorError>;

    fn stop(&mut self);

    fn is_running(&self) -> bool;

    /// The sensing device exists (plugged in / paired).
    fn is_available(&self) -> bool;

    /// The device is ready to sample (camera: same as available; headset:
    /// in the ear).
    fn is_connected(&self) -> bool;

    /// Drain pending raw samples, classify them, and return the resulting
    /// events. Called from the control thread only.
    fn poll_events(&mut self, now: DateTime<Utc>) -> Vec<DetectorEvent>;

    /// The most recent raw sample, for calibration capture.
    fn current_sample(&self) -> Option<Self::Sample>;

    /// Reduce a completed session's samples into calibration data.
    fn reduce_samples(&self, samples: &[Self::Sample]) -> Option<CalibrationData>;
}
