//! Application state, pause reasons, and the effect vocabulary.
//!
//! The whole decision core is a reducer: state transitions return a list
//! of [`Effect`]s, and the control loop in the binary is the only place
//! that executes them. UI, detector, and blur state are derived from the
//! current [`AppState`] plus a small set of flags, never mutated on their
//! own.

use crate::core::resolver::ConfigKey;
use crate::detector::TrackingSource;
use crate::profile::ProfileRecord;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Why monitoring is paused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PauseReason {
    /// No calibration profile applies to the current configuration
    NoProfile,
    /// Laptop-only display setup with pause-on-the-go enabled
    OnTheGo,
    /// The sensing device is gone
    DeviceDisconnected,
    /// The screen is locked
    ScreenLocked,
    /// The motion headset was taken out of the ear
    InputRemoved,
}

/// Top-level application state. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppState {
    Disabled,
    Calibrating,
    Monitoring,
    Paused(PauseReason),
}

impl AppState {
    /// True while the app is actively consuming sensor input.
    pub fn is_active(&self) -> bool {
        matches!(self, AppState::Monitoring | AppState::Calibrating)
    }

    pub fn is_paused(&self) -> bool {
        matches!(self, AppState::Paused(_))
    }
}

/// Alerts surfaced through the external alert collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertKind {
    /// The platform refused sensor access for the given source
    PermissionDenied(TrackingSource),
}

/// Side effects requested by the decision core.
///
/// The core never performs I/O; the control loop executes these in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Reconcile which detector (if any) should be running.
    /// At most one flag is ever set; the other source is stopped first.
    SyncDetectors { run_camera: bool, run_motion: bool },
    /// Push current state + flags to the UI surface
    UpdateUi,
    /// Recompute the warning visual (blur) intensity, 0.0-1.0
    UpdateWarningVisual(f64),
    /// A new slouching episode began
    RecordSlouchEvent,
    /// Attribute an evaluation interval to the pre-update slouch state
    TrackAnalytics {
        interval: Duration,
        was_slouching: bool,
    },
    /// Persist a calibration profile for a display configuration
    SaveProfile {
        key: ConfigKey,
        record: ProfileRecord,
    },
    /// Surface an alert to the user
    Alert(AlertKind),
}

/// Mutable accumulator for the monitoring loop.
///
/// Owned by the state machine on the control thread; reset to zero
/// whenever monitoring starts or fully stops.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonitoringState {
    pub consecutive_bad_frames: u32,
    pub consecutive_good_frames: u32,
    pub is_slouching: bool,
    pub is_away: bool,
    /// Set when the frame threshold is first met; cleared by any good frame
    pub bad_posture_start: Option<DateTime<Utc>>,
    pub warning_intensity: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_states() {
        assert!(AppState::Monitoring.is_active());
        assert!(AppState::Calibrating.is_active());
        assert!(!AppState::Disabled.is_active());
        assert!(!AppState::Paused(PauseReason::NoProfile).is_active());
    }

    #[test]
    fn test_paused_states() {
        assert!(AppState::Paused(PauseReason::OnTheGo).is_paused());
        assert!(!AppState::Monitoring.is_paused());
    }

    #[test]
    fn test_monitoring_state_default_is_zeroed() {
        let state = MonitoringState::default();
        assert_eq!(state.consecutive_bad_frames, 0);
        assert_eq!(state.consecutive_good_frames, 0);
        assert!(!state.is_slouching);
        assert!(!state.is_away);
        assert!(state.bad_posture_start.is_none());
        assert_eq!(state.warning_intensity, 0.0);
    }
}
