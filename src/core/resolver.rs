//! Configuration resolution: which saved profile applies right now.
//!
//! Profiles are anchored to the *display* configuration, not the sensing
//! device: plugging the same monitor back in restores its calibration.
//! The recorded device identity is still checked, and fails closed into
//! `Paused(NoProfile)`, so thresholds calibrated against one camera's
//! field of view are never silently reused with another camera.

use crate::core::state::{AppState, PauseReason};
use crate::profile::ProfileRecord;
use serde::{Deserialize, Serialize};

const KEY_NAMESPACE: &str = "displays";
const KEY_SEPARATOR: &str = "+";

/// Stable, order-independent identifier for a display arrangement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigKey(String);

impl ConfigKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute the profile key for a set of display identifiers.
///
/// Identifiers are sorted before joining so that connection order never
/// produces distinct keys for the same physical configuration.
pub fn compute_config_key(display_ids: &[String]) -> ConfigKey {
    let mut ids: Vec<&str> = display_ids.iter().map(String::as_str).collect();
    ids.sort_unstable();
    ConfigKey(format!(
        "{KEY_NAMESPACE}:{}",
        ids.join(KEY_SEPARATOR)
    ))
}

/// Decide the app state after a display-configuration change.
///
/// The decision table, in order:
/// 1. laptop-only with pause-on-the-go enabled short-circuits everything;
/// 2. no devices at all;
/// 3. a stored profile whose recorded device is present applies;
/// 4. everything else is a missing profile (including "profile exists but
///    its device is gone").
pub fn resolve_on_configuration_change(
    stored: Option<&ProfileRecord>,
    available_devices: &[String],
    pause_on_the_go: bool,
    is_laptop_only: bool,
) -> AppState {
    if pause_on_the_go && is_laptop_only {
        return AppState::Paused(PauseReason::OnTheGo);
    }
    if available_devices.is_empty() {
        return AppState::Paused(PauseReason::DeviceDisconnected);
    }
    match stored {
        Some(record) if available_devices.iter().any(|d| d == &record.device_id) => {
            AppState::Monitoring
        }
        _ => AppState::Paused(PauseReason::NoProfile),
    }
}

/// Result of reconciling a device hot-plug event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceChangeOutcome {
    /// The device selection after reconciliation
    pub selected: Option<String>,
    /// The state to move to, or `None` when only the device listing needs
    /// refreshing
    pub state: Option<AppState>,
}

/// Reconcile the loss of a device.
///
/// Losing a non-selected device is a listing-only refresh. Losing the
/// selected device auto-selects a remaining device (preferring the stored
/// profile's device when present) and re-runs the profile-match check
/// against that selection.
pub fn on_device_disconnected(
    lost: &str,
    selected: Option<&str>,
    remaining: &[String],
    stored: Option<&ProfileRecord>,
) -> DeviceChangeOutcome {
    if selected != Some(lost) {
        return DeviceChangeOutcome {
            selected: selected.map(str::to_string),
            state: None,
        };
    }

    let preferred = stored
        .map(|record| record.device_id.as_str())
        .filter(|id| remaining.iter().any(|d| d == id));
    let new_selected = preferred
        .map(str::to_string)
        .or_else(|| remaining.first().cloned());

    let state = match &new_selected {
        None => AppState::Paused(PauseReason::DeviceDisconnected),
        Some(device) => match stored {
            Some(record) if &record.device_id == device => AppState::Monitoring,
            _ => AppState::Paused(PauseReason::NoProfile),
        },
    };

    DeviceChangeOutcome {
        selected: new_selected,
        state: Some(state),
    }
}

/// Reconcile the arrival of a device.
///
/// Only relevant while paused for a missing device or a missing profile;
/// in any other state the listing refresh is all that happens.
pub fn on_device_connected(
    connected: &str,
    selected: Option<&str>,
    available: &[String],
    stored: Option<&ProfileRecord>,
    current: &AppState,
) -> DeviceChangeOutcome {
    let reconsider = matches!(
        current,
        AppState::Paused(PauseReason::DeviceDisconnected) | AppState::Paused(PauseReason::NoProfile)
    );
    if !reconsider {
        return DeviceChangeOutcome {
            selected: selected.map(str::to_string),
            state: None,
        };
    }

    match stored {
        Some(record) if available.iter().any(|d| d == &record.device_id) => DeviceChangeOutcome {
            selected: Some(record.device_id.clone()),
            state: Some(AppState::Monitoring),
        },
        _ => DeviceChangeOutcome {
            selected: selected.map(str::to_string).or_else(|| Some(connected.to_string())),
            state: Some(AppState::Paused(PauseReason::NoProfile)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::calibration::CameraCalibration;
    use chrono::Utc;

    fn record(device_id: &str) -> ProfileRecord {
        ProfileRecord {
            calibration: CameraCalibration {
                good_y: 0.7,
                bad_y: 0.5,
                neutral_y: 0.6,
                range: 0.2,
            },
            device_id: device_id.to_string(),
            saved_at: Utc::now(),
        }
    }

    fn devices(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_config_key_is_order_independent() {
        let a = compute_config_key(&devices(&["UUID-A", "UUID-B"]));
        let b = compute_config_key(&devices(&["UUID-B", "UUID-A"]));
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "displays:UUID-A+UUID-B");
    }

    #[test]
    fn test_config_key_single_display() {
        let key = compute_config_key(&devices(&["UUID1"]));
        assert_eq!(key.as_str(), "displays:UUID1");
    }

    #[test]
    fn test_on_the_go_short_circuits_everything() {
        let rec = record("camA");
        let state =
            resolve_on_configuration_change(Some(&rec), &devices(&["camA"]), true, true);
        assert_eq!(state, AppState::Paused(PauseReason::OnTheGo));

        // Even with no devices and no profile.
        let state = resolve_on_configuration_change(None, &[], true, true);
        assert_eq!(state, AppState::Paused(PauseReason::OnTheGo));
    }

    #[test]
    fn test_no_devices_pauses_disconnected() {
        let rec = record("camA");
        let state = resolve_on_configuration_change(Some(&rec), &[], false, false);
        assert_eq!(state, AppState::Paused(PauseReason::DeviceDisconnected));
    }

    #[test]
    fn test_matching_profile_resumes_monitoring() {
        let rec = record("camA");
        let state =
            resolve_on_configuration_change(Some(&rec), &devices(&["camB", "camA"]), false, false);
        assert_eq!(state, AppState::Monitoring);
    }

    #[test]
    fn test_device_mismatch_fails_closed_into_no_profile() {
        // Profile recorded against camA; only camB present.
        let rec = record("camA");
        let state =
            resolve_on_configuration_change(Some(&rec), &devices(&["camB"]), false, false);
        assert_eq!(state, AppState::Paused(PauseReason::NoProfile));
    }

    #[test]
    fn test_missing_profile_pauses_no_profile() {
        let state = resolve_on_configuration_change(None, &devices(&["camA"]), false, false);
        assert_eq!(state, AppState::Paused(PauseReason::NoProfile));
    }

    #[test]
    fn test_losing_non_selected_device_is_a_no_op() {
        let rec = record("camA");
        let outcome =
            on_device_disconnected("camB", Some("camA"), &devices(&["camA"]), Some(&rec));
        assert_eq!(outcome.selected.as_deref(), Some("camA"));
        assert!(outcome.state.is_none());
    }

    #[test]
    fn test_losing_selected_device_with_no_remaining() {
        let outcome = on_device_disconnected("camA", Some("camA"), &[], None);
        assert!(outcome.selected.is_none());
        assert_eq!(
            outcome.state,
            Some(AppState::Paused(PauseReason::DeviceDisconnected))
        );
    }

    #[test]
    fn test_losing_selected_device_prefers_profile_device() {
        let rec = record("camC");
        let outcome = on_device_disconnected(
            "camA",
            Some("camA"),
            &devices(&["camB", "camC"]),
            Some(&rec),
        );
        assert_eq!(outcome.selected.as_deref(), Some("camC"));
        assert_eq!(outcome.state, Some(AppState::Monitoring));
    }

    #[test]
    fn test_losing_selected_device_without_profile_match() {
        let rec = record("camA");
        let outcome =
            on_device_disconnected("camA", Some("camA"), &devices(&["camB"]), Some(&rec));
        assert_eq!(outcome.selected.as_deref(), Some("camB"));
        assert_eq!(outcome.state, Some(AppState::Paused(PauseReason::NoProfile)));
    }

    #[test]
    fn test_connect_while_disconnected_restores_monitoring_on_match() {
        let rec = record("camA");
        let outcome = on_device_connected(
            "camA",
            None,
            &devices(&["camA"]),
            Some(&rec),
            &AppState::Paused(PauseReason::DeviceDisconnected),
        );
        assert_eq!(outcome.selected.as_deref(), Some("camA"));
        assert_eq!(outcome.state, Some(AppState::Monitoring));
    }

    #[test]
    fn test_connect_while_no_profile_without_match_stays_paused() {
        let outcome = on_device_connected(
            "camB",
            None,
            &devices(&["camB"]),
            None,
            &AppState::Paused(PauseReason::NoProfile),
        );
        assert_eq!(outcome.selected.as_deref(), Some("camB"));
        assert_eq!(outcome.state, Some(AppState::Paused(PauseReason::NoProfile)));
    }

    #[test]
    fn test_connect_while_monitoring_only_refreshes_listing() {
        let rec = record("camA");
        let outcome = on_device_connected(
            "camB",
            Some("camA"),
            &devices(&["camA", "camB"]),
            Some(&rec),
            &AppState::Monitoring,
        );
        assert_eq!(outcome.selected.as_deref(), Some("camA"));
        assert!(outcome.state.is_none());
    }
}
