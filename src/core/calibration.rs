//! Calibration sessions and sample reduction.
//!
//! A session walks the user through a fixed sequence of look-at-target
//! steps (four canonical corners per display surface), collects one raw
//! sample per step, and reduces the samples into a calibration profile.
//! A session never produces a partially-valid profile: reduction refuses
//! anything below the sample minimum.

use crate::detector::types::Attitude;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Minimum number of samples a reduction will accept.
pub const MIN_CALIBRATION_SAMPLES: usize = 4;

/// Camera calibration thresholds, in normalized head-height units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraCalibration {
    /// Head height when sitting upright (max of the samples)
    pub good_y: f64,
    /// Head height at the worst sampled posture (min of the samples)
    pub bad_y: f64,
    /// Mean sampled head height
    pub neutral_y: f64,
    /// Span between best and worst samples
    pub range: f64,
}

impl CameraCalibration {
    pub fn is_valid(&self) -> bool {
        [self.good_y, self.bad_y, self.neutral_y, self.range]
            .iter()
            .all(|v| v.is_finite())
            && self.range > f64::EPSILON
    }
}

/// Motion-headset calibration: the neutral attitude, in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionCalibration {
    pub pitch: f64,
    pub roll: f64,
    pub yaw: f64,
}

impl MotionCalibration {
    pub fn is_valid(&self) -> bool {
        [self.pitch, self.roll, self.yaw].iter().all(|v| v.is_finite())
    }
}

/// Calibration data, polymorphic over the tracking source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CalibrationData {
    Camera(CameraCalibration),
    Motion(MotionCalibration),
}

impl CalibrationData {
    /// True iff every field came from a completed reduction.
    pub fn is_valid(&self) -> bool {
        match self {
            CalibrationData::Camera(c) => c.is_valid(),
            CalibrationData::Motion(m) => m.is_valid(),
        }
    }
}

/// The four canonical corner targets, in capture order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
}

pub const CORNERS: [Corner; 4] = [
    Corner::TopLeft,
    Corner::TopRight,
    Corner::BottomRight,
    Corner::BottomLeft,
];

/// One look-at-target step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalibrationStep {
    pub display_id: String,
    pub corner: Corner,
}

/// Session lifecycle. A session object only exists between start and
/// completion/cancellation, so there is no separate idle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// The sensing device was not connected when the session started;
    /// capture is blocked (cancellation is not) until connectivity arrives.
    WaitingForDevice,
    Running,
    Complete,
    Cancelled,
}

/// Outcome of a successful sample capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// Advanced to the next step
    Advanced,
    /// That was the final step; the session is complete
    Complete,
}

/// Errors from invalid capture attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureError {
    /// The session already completed or was cancelled
    NotRunning,
    /// Still waiting for the device to connect
    DeviceNotReady,
}

impl std::fmt::Display for CaptureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureError::NotRunning => write!(f, "Calibration session is not running"),
            CaptureError::DeviceNotReady => write!(f, "Sensing device is not connected"),
        }
    }
}

impl std::error::Error for CaptureError {}

/// Collects one raw sample per step across all display surfaces.
///
/// Generic over the sample type so each tracking source keeps its own
/// sample representation end to end.
#[derive(Debug)]
pub struct CalibrationSession<S> {
    steps: Vec<CalibrationStep>,
    samples: Vec<S>,
    phase: SessionPhase,
}

impl<S> CalibrationSession<S> {
    /// Start a session over the given display surfaces.
    ///
    /// If the device is not connected yet, the session starts in
    /// [`SessionPhase::WaitingForDevice`] and no step is consumed until
    /// a connectivity-change event arrives.
    pub fn new(display_ids: &[String], device_connected: bool) -> Self {
        Self {
            steps: Self::build_steps(display_ids),
            samples: Vec::new(),
            phase: if device_connected {
                SessionPhase::Running
            } else {
                SessionPhase::WaitingForDevice
            },
        }
    }

    /// Enumerate the step sequence: four corners per display, in display
    /// order. Deterministic and independent of how many samples have been
    /// collected.
    pub fn build_steps(display_ids: &[String]) -> Vec<CalibrationStep> {
        display_ids
            .iter()
            .flat_map(|display_id| {
                CORNERS.iter().map(move |corner| CalibrationStep {
                    display_id: display_id.clone(),
                    corner: *corner,
                })
            })
            .collect()
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Index of the step awaiting a sample.
    pub fn step_index(&self) -> usize {
        self.samples.len()
    }

    /// The step awaiting a sample, if the session is still collecting.
    pub fn current_step(&self) -> Option<&CalibrationStep> {
        match self.phase {
            SessionPhase::Running | SessionPhase::WaitingForDevice => {
                self.steps.get(self.samples.len())
            }
            _ => None,
        }
    }

    /// Append the detector's instantaneous sample for the current step.
    pub fn capture_sample(&mut self, sample: S) -> Result<CaptureOutcome, CaptureError> {
        match self.phase {
            SessionPhase::Running => {}
            SessionPhase::WaitingForDevice => return Err(CaptureError::DeviceNotReady),
            SessionPhase::Complete | SessionPhase::Cancelled => {
                return Err(CaptureError::NotRunning)
            }
        }

        self.samples.push(sample);
        if self.samples.len() == self.steps.len() {
            self.phase = SessionPhase::Complete;
            Ok(CaptureOutcome::Complete)
        } else {
            Ok(CaptureOutcome::Advanced)
        }
    }

    /// React to a device connectivity change. Does not consume a step.
    pub fn device_connectivity_changed(&mut self, connected: bool) {
        match (self.phase, connected) {
            (SessionPhase::WaitingForDevice, true) => self.phase = SessionPhase::Running,
            (SessionPhase::Running, false) => self.phase = SessionPhase::WaitingForDevice,
            _ => {}
        }
    }

    /// Abort the session. Allowed in any collecting phase.
    pub fn cancel(&mut self) {
        if matches!(
            self.phase,
            SessionPhase::Running | SessionPhase::WaitingForDevice
        ) {
            self.phase = SessionPhase::Cancelled;
        }
    }

    pub fn samples(&self) -> &[S] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<S> {
        self.samples
    }
}

/// Reduce camera samples (normalized head heights) to calibration
/// thresholds. Returns `None` below the sample minimum.
pub fn reduce_camera_samples(samples: &[f64]) -> Option<CameraCalibration> {
    if samples.len() < MIN_CALIBRATION_SAMPLES {
        return None;
    }
    let good_y = Statistics::max(samples.iter());
    let bad_y = Statistics::min(samples.iter());
    let neutral_y = Statistics::mean(samples.iter());
    Some(CameraCalibration {
        good_y,
        bad_y,
        neutral_y,
        range: (good_y - bad_y).abs(),
    })
}

/// Reduce attitude samples to a neutral attitude by component-wise mean.
/// Returns `None` below the sample minimum.
pub fn reduce_motion_samples(samples: &[Attitude]) -> Option<MotionCalibration> {
    if samples.len() < MIN_CALIBRATION_SAMPLES {
        return None;
    }
    Some(MotionCalibration {
        pitch: Statistics::mean(samples.iter().map(|a| a.pitch)),
        roll: Statistics::mean(samples.iter().map(|a| a.roll)),
        yaw: Statistics::mean(samples.iter().map(|a| a.yaw)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn displays(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("DISPLAY-{i}")).collect()
    }

    #[test]
    fn test_build_steps_four_per_display_in_order() {
        let steps = CalibrationSession::<f64>::build_steps(&displays(2));
        assert_eq!(steps.len(), 8);
        assert_eq!(steps[0].display_id, "DISPLAY-0");
        assert_eq!(steps[0].corner, Corner::TopLeft);
        assert_eq!(steps[3].corner, Corner::BottomLeft);
        assert_eq!(steps[4].display_id, "DISPLAY-1");

        // Deterministic across invocations.
        assert_eq!(steps, CalibrationSession::<f64>::build_steps(&displays(2)));
    }

    #[test]
    fn test_capture_advances_and_completes() {
        let mut session = CalibrationSession::new(&displays(1), true);
        assert_eq!(session.step_count(), 4);

        for i in 0..3 {
            assert_eq!(
                session.capture_sample(0.5 + i as f64 * 0.01),
                Ok(CaptureOutcome::Advanced)
            );
        }
        assert_eq!(session.step_index(), 3);
        assert_eq!(session.capture_sample(0.6), Ok(CaptureOutcome::Complete));
        assert_eq!(session.phase(), SessionPhase::Complete);
        assert!(session.current_step().is_none());
        assert_eq!(session.capture_sample(0.6), Err(CaptureError::NotRunning));
    }

    #[test]
    fn test_waiting_blocks_capture_but_allows_cancel() {
        let mut session = CalibrationSession::new(&displays(1), false);
        assert_eq!(session.phase(), SessionPhase::WaitingForDevice);
        assert_eq!(
            session.capture_sample(0.5),
            Err(CaptureError::DeviceNotReady)
        );
        // Still pointing at step 0: waiting consumed nothing.
        assert_eq!(session.step_index(), 0);

        session.cancel();
        assert_eq!(session.phase(), SessionPhase::Cancelled);
    }

    #[test]
    fn test_connectivity_unblocks_waiting_session() {
        let mut session = CalibrationSession::new(&displays(1), false);
        session.device_connectivity_changed(true);
        assert_eq!(session.phase(), SessionPhase::Running);
        assert_eq!(session.capture_sample(0.5), Ok(CaptureOutcome::Advanced));
    }

    #[test]
    fn test_dropout_mid_session_returns_to_waiting() {
        let mut session = CalibrationSession::new(&displays(1), true);
        session.capture_sample(0.5).unwrap();
        session.device_connectivity_changed(false);
        assert_eq!(
            session.capture_sample(0.5),
            Err(CaptureError::DeviceNotReady)
        );
        session.device_connectivity_changed(true);
        assert_eq!(session.capture_sample(0.5), Ok(CaptureOutcome::Advanced));
    }

    #[test]
    fn test_camera_reduction_needs_four_samples() {
        assert!(reduce_camera_samples(&[0.5, 0.6, 0.7]).is_none());

        let calib = reduce_camera_samples(&[0.50, 0.62, 0.70, 0.58]).unwrap();
        assert_eq!(calib.good_y, 0.70);
        assert_eq!(calib.bad_y, 0.50);
        assert!((calib.neutral_y - 0.60).abs() < 1e-9);
        assert!((calib.range - 0.20).abs() < 1e-9);
        assert!(calib.is_valid());
    }

    #[test]
    fn test_motion_reduction_component_wise_mean() {
        let samples = vec![
            Attitude::new(0.1, 0.0, 0.2),
            Attitude::new(0.3, 0.0, 0.2),
            Attitude::new(0.1, 0.4, 0.2),
            Attitude::new(0.3, 0.4, 0.2),
        ];
        let calib = reduce_motion_samples(&samples).unwrap();
        assert!((calib.pitch - 0.2).abs() < 1e-9);
        assert!((calib.roll - 0.2).abs() < 1e-9);
        assert!((calib.yaw - 0.2).abs() < 1e-9);
        assert!(calib.is_valid());

        assert!(reduce_motion_samples(&samples[..3]).is_none());
    }

    #[test]
    fn test_degenerate_camera_reduction_is_invalid() {
        // All samples identical: zero range cannot classify anything.
        let calib = reduce_camera_samples(&[0.5, 0.5, 0.5, 0.5]).unwrap();
        assert!(!calib.is_valid());
        assert!(!CalibrationData::Camera(calib).is_valid());
    }
}
