//! Derived UI state.
//!
//! Everything the rendering layer shows is a pure function of the current
//! app state plus the monitoring flags. Away takes precedence over
//! slouching: a user who left the frame is not warned about posture.

use crate::core::state::{AppState, MonitoringState, PauseReason};

/// Menu-bar icon variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusIcon {
    Disabled,
    Calibrating,
    Monitoring,
    Warning,
    Away,
    Paused,
}

/// Snapshot handed to the rendering/UI collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct UiState {
    pub status_text: &'static str,
    pub icon: StatusIcon,
    pub enabled: bool,
    pub can_recalibrate: bool,
    /// Blur/warning intensity, 0.0-1.0, refreshed every tick
    pub warning_intensity: f64,
}

/// Derive the UI surface for the current state and flags.
pub fn derive_ui_state(
    state: &AppState,
    monitoring: &MonitoringState,
    device_available: bool,
) -> UiState {
    let (status_text, icon) = match state {
        AppState::Disabled => ("Posture monitoring off", StatusIcon::Disabled),
        AppState::Calibrating => ("Calibrating...", StatusIcon::Calibrating),
        AppState::Monitoring => {
            if monitoring.is_away {
                ("Away", StatusIcon::Away)
            } else if monitoring.is_slouching {
                ("Sit up straight", StatusIcon::Warning)
            } else {
                ("Posture looks good", StatusIcon::Monitoring)
            }
        }
        AppState::Paused(reason) => match reason {
            PauseReason::NoProfile => ("Calibration needed", StatusIcon::Paused),
            PauseReason::OnTheGo => ("Paused on the go", StatusIcon::Paused),
            PauseReason::DeviceDisconnected => ("Sensing device disconnected", StatusIcon::Paused),
            PauseReason::ScreenLocked => ("Paused while locked", StatusIcon::Paused),
            PauseReason::InputRemoved => ("Headset removed", StatusIcon::Paused),
        },
    };

    UiState {
        status_text,
        icon,
        enabled: *state != AppState::Disabled,
        can_recalibrate: device_available && *state != AppState::Calibrating,
        warning_intensity: if *state == AppState::Monitoring {
            monitoring.warning_intensity
        } else {
            0.0
        },
    }
}
