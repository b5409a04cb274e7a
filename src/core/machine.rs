//! The application state machine.
//!
//! Single source of truth for the app state. All mutation goes through
//! [`AppStateMachine::set_state`]; every transition decides which detector
//! should run, resets monitoring side state when leaving an active state,
//! and requests a UI sync. The machine is pure — it returns effects and
//! never touches a detector, the store, or the UI itself.

use crate::config::PostureConfig;
use crate::core::calibration::{CameraCalibration, MotionCalibration};
use crate::core::evaluator;
use crate::core::resolver::ConfigKey;
use crate::core::state::{AlertKind, AppState, Effect, MonitoringState, PauseReason};
use crate::core::status::{derive_ui_state, UiState};
use crate::detector::types::PostureReading;
use crate::detector::TrackingSource;
use crate::profile::ProfileRecord;
use chrono::{DateTime, Duration, Utc};

/// Whether the detector for `source` should be running in `state`.
///
/// The headset detector keeps running while `Paused(InputRemoved)` so it
/// can notice re-insertion; the camera has no equivalent.
pub fn should_detector_run(state: &AppState, source: TrackingSource) -> bool {
    match state {
        AppState::Calibrating | AppState::Monitoring => true,
        AppState::Paused(PauseReason::InputRemoved) => source == TrackingSource::MotionHeadset,
        _ => false,
    }
}

/// The single authority for what "turning the feature on" resolves to.
/// Also re-run after hot-plug and reconnect events.
pub fn state_when_enabling(is_calibrated: bool, device_available: bool) -> AppState {
    if !is_calibrated {
        AppState::Paused(PauseReason::NoProfile)
    } else if !device_available {
        AppState::Paused(PauseReason::DeviceDisconnected)
    } else {
        AppState::Monitoring
    }
}

pub struct AppStateMachine {
    state: AppState,
    tracking_source: TrackingSource,
    is_calibrated: bool,
    monitoring: MonitoringState,
    config: PostureConfig,
}

impl AppStateMachine {
    /// Create the machine in `Disabled`, the process-start state.
    pub fn new(config: PostureConfig, tracking_source: TrackingSource, is_calibrated: bool) -> Self {
        Self {
            state: AppState::Disabled,
            tracking_source,
            is_calibrated,
            monitoring: MonitoringState::default(),
            config,
        }
    }

    pub fn state(&self) -> AppState {
        self.state
    }

    pub fn tracking_source(&self) -> TrackingSource {
        self.tracking_source
    }

    pub fn is_calibrated(&self) -> bool {
        self.is_calibrated
    }

    pub fn monitoring(&self) -> &MonitoringState {
        &self.monitoring
    }

    pub fn config(&self) -> &PostureConfig {
        &self.config
    }

    /// Transition to `new`. Same-state calls are a no-op; otherwise the
    /// transition handler runs exactly once, synchronously.
    pub fn set_state(&mut self, new: AppState) -> Vec<Effect> {
        if new == self.state {
            return Vec::new();
        }
        self.state = new;

        let mut effects = vec![self.sync_detectors_effect()];
        if !self.state.is_active() {
            self.monitoring = MonitoringState::default();
            effects.push(Effect::UpdateWarningVisual(0.0));
        }
        effects.push(Effect::UpdateUi);
        effects
    }

    fn sync_detectors_effect(&self) -> Effect {
        let run = should_detector_run(&self.state, self.tracking_source);
        Effect::SyncDetectors {
            run_camera: run && self.tracking_source == TrackingSource::Camera,
            run_motion: run && self.tracking_source == TrackingSource::MotionHeadset,
        }
    }

    /// Turn the feature on.
    pub fn enable(&mut self, device_available: bool) -> Vec<Effect> {
        self.set_state(state_when_enabling(self.is_calibrated, device_available))
    }

    /// Turn the feature off entirely.
    pub fn disable(&mut self) -> Vec<Effect> {
        self.set_state(AppState::Disabled)
    }

    /// Switch tracking source. Stops the other source's detector even when
    /// the app state itself does not change. Each source carries its own
    /// calibration, so the calibrated flag is re-seeded for the new source.
    pub fn set_tracking_source(
        &mut self,
        source: TrackingSource,
        source_calibrated: bool,
        device_available: bool,
    ) -> Vec<Effect> {
        if source == self.tracking_source {
            return Vec::new();
        }
        self.tracking_source = source;
        self.is_calibrated = source_calibrated;
        if self.state == AppState::Disabled {
            return vec![self.sync_detectors_effect(), Effect::UpdateUi];
        }
        let mut effects = self.set_state(state_when_enabling(self.is_calibrated, device_available));
        if effects.is_empty() {
            // Same state, different source: detectors still need syncing.
            effects = vec![self.sync_detectors_effect(), Effect::UpdateUi];
        }
        effects
    }

    /// Feed one classified reading through the evaluator.
    ///
    /// Ignored outside `Monitoring` — late readings from a detector that
    /// is winding down must not mutate anything.
    pub fn handle_reading(
        &mut self,
        reading: &PostureReading,
        elapsed: Duration,
        now: DateTime<Utc>,
    ) -> Vec<Effect> {
        if self.state != AppState::Monitoring {
            return Vec::new();
        }
        let (next, effects) = evaluator::process(reading, &self.monitoring, &self.config, elapsed, now);
        self.monitoring = next;
        effects
    }

    /// Presence change from the active detector.
    pub fn handle_away_change(&mut self, is_away: bool) -> Vec<Effect> {
        if self.state != AppState::Monitoring {
            return Vec::new();
        }
        let (next, update_ui) = evaluator::process_away_change(is_away, &self.monitoring);
        self.monitoring = next;
        if update_ui {
            vec![Effect::UpdateUi]
        } else {
            Vec::new()
        }
    }

    /// Connectivity change for the motion headset (in-ear / out-of-ear).
    pub fn handle_motion_connectivity(&mut self, connected: bool) -> Vec<Effect> {
        if self.tracking_source != TrackingSource::MotionHeadset {
            return Vec::new();
        }
        if !connected && self.state == AppState::Monitoring {
            return self.set_state(AppState::Paused(PauseReason::InputRemoved));
        }
        if connected && self.state == AppState::Paused(PauseReason::InputRemoved) {
            return self.set_state(state_when_enabling(self.is_calibrated, true));
        }
        Vec::new()
    }

    /// Screen lock gating.
    pub fn handle_screen_lock(&mut self, locked: bool, device_available: bool) -> Vec<Effect> {
        if locked {
            if self.state == AppState::Disabled {
                return Vec::new();
            }
            return self.set_state(AppState::Paused(PauseReason::ScreenLocked));
        }
        if self.state == AppState::Paused(PauseReason::ScreenLocked) {
            return self.set_state(state_when_enabling(self.is_calibrated, device_available));
        }
        Vec::new()
    }

    /// The Detector collaborator failed to start. Never fatal; recoverable
    /// by reconnection or recalibration.
    pub fn detector_start_failed(&mut self) -> Vec<Effect> {
        self.set_state(AppState::Paused(PauseReason::DeviceDisconnected))
    }

    /// The platform refused sensor access. Falls back to the prior valid
    /// state when calibrated, else parks on the missing-profile pause.
    pub fn permission_denied(&mut self) -> Vec<Effect> {
        let mut effects = vec![Effect::Alert(AlertKind::PermissionDenied(
            self.tracking_source,
        ))];
        if !self.is_calibrated {
            effects.extend(self.set_state(AppState::Paused(PauseReason::NoProfile)));
        }
        effects
    }

    /// Apply a resolver decision (display change or hot-plug outcome).
    ///
    /// Ignored while disabled or calibrating: a monitor plugged in
    /// mid-calibration must not yank the session out from under the user.
    pub fn apply_resolved_state(&mut self, resolved: AppState, profile_applied: bool) -> Vec<Effect> {
        if self.state == AppState::Disabled || self.state == AppState::Calibrating {
            return Vec::new();
        }
        if profile_applied {
            self.is_calibrated = true;
        }
        self.set_state(resolved)
    }

    /// Start a calibration session.
    pub fn begin_calibration(&mut self, device_available: bool) -> Vec<Effect> {
        if !device_available {
            return Vec::new();
        }
        self.set_state(AppState::Calibrating)
    }

    /// A camera calibration session completed and reduced successfully.
    pub fn complete_camera_calibration(
        &mut self,
        calibration: CameraCalibration,
        key: ConfigKey,
        device_id: String,
        now: DateTime<Utc>,
    ) -> Vec<Effect> {
        self.is_calibrated = true;
        let mut effects = vec![Effect::SaveProfile {
            key,
            record: ProfileRecord {
                calibration,
                device_id,
                saved_at: now,
            },
        }];
        effects.extend(self.set_state(AppState::Monitoring));
        effects
    }

    /// A motion calibration session completed and reduced successfully.
    /// Headset calibration is not display-keyed; the shell persists it in
    /// settings.
    pub fn complete_motion_calibration(&mut self, _calibration: MotionCalibration) -> Vec<Effect> {
        self.is_calibrated = true;
        self.set_state(AppState::Monitoring)
    }

    /// A session was cancelled or reduced below the sample minimum. Falls
    /// back to the prior calibration when one is valid.
    pub fn cancel_calibration(&mut self) -> Vec<Effect> {
        let fallback = if self.is_calibrated {
            AppState::Monitoring
        } else {
            AppState::Paused(PauseReason::NoProfile)
        };
        self.set_state(fallback)
    }

    /// Record that a previously completed calibration no longer applies
    /// (e.g. the profile's device is gone for good).
    pub fn invalidate_calibration(&mut self) {
        self.is_calibrated = false;
    }

    /// Derive the UI surface for the current state.
    pub fn ui_state(&self, device_available: bool) -> UiState {
        derive_ui_state(&self.state, &self.monitoring, device_available)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine(calibrated: bool) -> AppStateMachine {
        AppStateMachine::new(PostureConfig::default(), TrackingSource::Camera, calibrated)
    }

    fn bad(severity: f64) -> PostureReading {
        PostureReading::bad(Utc::now(), severity)
    }

    #[test]
    fn test_set_state_is_idempotent() {
        let mut m = machine(true);
        let first = m.set_state(AppState::Monitoring);
        assert!(!first.is_empty());
        let second = m.set_state(AppState::Monitoring);
        assert!(second.is_empty());
    }

    #[test]
    fn test_should_detector_run_matrix() {
        use TrackingSource::*;
        assert!(should_detector_run(&AppState::Monitoring, Camera));
        assert!(should_detector_run(&AppState::Calibrating, MotionHeadset));
        assert!(should_detector_run(
            &AppState::Paused(PauseReason::InputRemoved),
            MotionHeadset
        ));
        assert!(!should_detector_run(
            &AppState::Paused(PauseReason::InputRemoved),
            Camera
        ));
        assert!(!should_detector_run(&AppState::Disabled, Camera));
        assert!(!should_detector_run(
            &AppState::Paused(PauseReason::ScreenLocked),
            MotionHeadset
        ));
    }

    #[test]
    fn test_state_when_enabling_matrix() {
        assert_eq!(
            state_when_enabling(false, true),
            AppState::Paused(PauseReason::NoProfile)
        );
        assert_eq!(
            state_when_enabling(false, false),
            AppState::Paused(PauseReason::NoProfile)
        );
        assert_eq!(
            state_when_enabling(true, false),
            AppState::Paused(PauseReason::DeviceDisconnected)
        );
        assert_eq!(state_when_enabling(true, true), AppState::Monitoring);
    }

    #[test]
    fn test_transition_out_of_active_resets_monitoring() {
        let mut m = machine(true);
        m.enable(true);
        m.handle_reading(&bad(0.9), Duration::milliseconds(100), Utc::now());
        assert_eq!(m.monitoring().consecutive_bad_frames, 1);

        let effects = m.set_state(AppState::Paused(PauseReason::ScreenLocked));
        assert_eq!(*m.monitoring(), MonitoringState::default());
        assert!(effects.contains(&Effect::UpdateWarningVisual(0.0)));
        assert!(effects.contains(&Effect::UpdateUi));
    }

    #[test]
    fn test_sync_effect_runs_only_selected_source() {
        let mut m = machine(true);
        let effects = m.enable(true);
        assert!(effects.contains(&Effect::SyncDetectors {
            run_camera: true,
            run_motion: false
        }));

        let mut m = AppStateMachine::new(
            PostureConfig::default(),
            TrackingSource::MotionHeadset,
            true,
        );
        let effects = m.enable(true);
        assert!(effects.contains(&Effect::SyncDetectors {
            run_camera: false,
            run_motion: true
        }));
    }

    #[test]
    fn test_readings_ignored_outside_monitoring() {
        let mut m = machine(false);
        m.enable(true); // Paused(NoProfile)
        let effects = m.handle_reading(&bad(0.9), Duration::milliseconds(100), Utc::now());
        assert!(effects.is_empty());
        assert_eq!(m.monitoring().consecutive_bad_frames, 0);
    }

    #[test]
    fn test_slouch_scenario_through_machine() {
        let mut m = AppStateMachine::new(
            PostureConfig {
                frame_threshold: 3,
                good_frame_threshold: 2,
                onset_delay_ms: 0,
                ..Default::default()
            },
            TrackingSource::Camera,
            true,
        );
        m.enable(true);
        let now = Utc::now();
        for _ in 0..3 {
            m.handle_reading(&PostureReading::bad(now, 0.7), Duration::milliseconds(100), now);
        }
        assert!(m.monitoring().is_slouching);
        for _ in 0..2 {
            m.handle_reading(&PostureReading::good(now), Duration::milliseconds(100), now);
        }
        assert!(!m.monitoring().is_slouching);
        assert_eq!(m.monitoring().warning_intensity, 0.0);
    }

    #[test]
    fn test_headset_removal_and_reinsertion() {
        let mut m = AppStateMachine::new(
            PostureConfig::default(),
            TrackingSource::MotionHeadset,
            true,
        );
        m.enable(true);
        assert_eq!(m.state(), AppState::Monitoring);

        m.handle_motion_connectivity(false);
        assert_eq!(m.state(), AppState::Paused(PauseReason::InputRemoved));
        // Detector keeps running while removed so re-insertion is seen.
        assert!(should_detector_run(&m.state(), TrackingSource::MotionHeadset));

        m.handle_motion_connectivity(true);
        assert_eq!(m.state(), AppState::Monitoring);
    }

    #[test]
    fn test_motion_connectivity_ignored_for_camera_source() {
        let mut m = machine(true);
        m.enable(true);
        assert!(m.handle_motion_connectivity(false).is_empty());
        assert_eq!(m.state(), AppState::Monitoring);
    }

    #[test]
    fn test_detector_start_failure_is_recoverable() {
        let mut m = machine(true);
        m.enable(true);
        m.detector_start_failed();
        assert_eq!(m.state(), AppState::Paused(PauseReason::DeviceDisconnected));

        // Reconnect resolves back through the same enabling authority.
        let resolved = state_when_enabling(m.is_calibrated(), true);
        m.apply_resolved_state(resolved, false);
        assert_eq!(m.state(), AppState::Monitoring);
    }

    #[test]
    fn test_permission_denied_falls_back() {
        let mut m = machine(false);
        m.enable(true);
        let effects = m.permission_denied();
        assert!(effects.contains(&Effect::Alert(AlertKind::PermissionDenied(
            TrackingSource::Camera
        ))));
        assert_eq!(m.state(), AppState::Paused(PauseReason::NoProfile));

        let mut m = machine(true);
        m.enable(true);
        m.permission_denied();
        // Calibrated: prior state is kept.
        assert_eq!(m.state(), AppState::Monitoring);
    }

    #[test]
    fn test_screen_lock_round_trip() {
        let mut m = machine(true);
        m.enable(true);
        m.handle_screen_lock(true, true);
        assert_eq!(m.state(), AppState::Paused(PauseReason::ScreenLocked));
        m.handle_screen_lock(false, true);
        assert_eq!(m.state(), AppState::Monitoring);
    }

    #[test]
    fn test_screen_lock_ignored_while_disabled() {
        let mut m = machine(true);
        assert!(m.handle_screen_lock(true, true).is_empty());
        assert_eq!(m.state(), AppState::Disabled);
    }

    #[test]
    fn test_calibration_completion_saves_profile_and_monitors() {
        let mut m = machine(false);
        m.enable(true);
        m.begin_calibration(true);
        assert_eq!(m.state(), AppState::Calibrating);

        let calibration = CameraCalibration {
            good_y: 0.7,
            bad_y: 0.5,
            neutral_y: 0.6,
            range: 0.2,
        };
        let key = crate::core::resolver::compute_config_key(&["D1".to_string()]);
        let effects =
            m.complete_camera_calibration(calibration, key.clone(), "camA".into(), Utc::now());
        assert!(matches!(
            &effects[0],
            Effect::SaveProfile { key: k, record } if *k == key && record.device_id == "camA"
        ));
        assert_eq!(m.state(), AppState::Monitoring);
        assert!(m.is_calibrated());
    }

    #[test]
    fn test_cancelled_calibration_falls_back() {
        let mut m = machine(false);
        m.enable(true);
        m.begin_calibration(true);
        m.cancel_calibration();
        assert_eq!(m.state(), AppState::Paused(PauseReason::NoProfile));

        let mut m = machine(true);
        m.enable(true);
        m.begin_calibration(true);
        m.cancel_calibration();
        assert_eq!(m.state(), AppState::Monitoring);
    }

    #[test]
    fn test_resolver_outcomes_ignored_while_calibrating() {
        let mut m = machine(false);
        m.enable(true);
        m.begin_calibration(true);
        let effects = m.apply_resolved_state(AppState::Paused(PauseReason::NoProfile), false);
        assert!(effects.is_empty());
        assert_eq!(m.state(), AppState::Calibrating);
    }

    #[test]
    fn test_source_switch_stops_other_detector() {
        let mut m = machine(true);
        m.enable(true);
        let effects = m.set_tracking_source(TrackingSource::MotionHeadset, true, true);
        assert!(effects.iter().any(|e| matches!(
            e,
            Effect::SyncDetectors {
                run_camera: false,
                run_motion: true
            }
        )));
    }
}
