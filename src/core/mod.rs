//! The decision core.
//!
//! This module contains:
//! - The application state machine and its effect vocabulary
//! - Pure posture evaluation (hysteresis + onset delay)
//! - Configuration resolution for display/device changes
//! - Calibration sessions and sample reduction
//! - Derived UI state and the control-loop event plumbing

pub mod calibration;
pub mod evaluator;
pub mod events;
pub mod machine;
pub mod resolver;
pub mod state;
pub mod status;

// Re-export commonly used types
pub use calibration::{
    CalibrationData, CalibrationSession, CameraCalibration, MotionCalibration, SessionPhase,
    MIN_CALIBRATION_SAMPLES,
};
pub use events::{AppEvent, Debouncer, ReadingThrottle, UserCommand};
pub use machine::{should_detector_run, state_when_enabling, AppStateMachine};
pub use resolver::{compute_config_key, resolve_on_configuration_change, ConfigKey};
pub use state::{AppState, Effect, MonitoringState, PauseReason};
pub use status::{derive_ui_state, StatusIcon, UiState};
