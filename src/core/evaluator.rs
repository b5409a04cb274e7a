//! Pure posture evaluation.
//!
//! Converts one classified reading plus the prior monitoring state into a
//! new state and a list of requested effects. Entry into slouching is
//! gated twice (sustained bad frames AND elapsed onset delay); exit only
//! needs sustained good frames. The asymmetry is deliberate hysteresis:
//! slow, gated entry avoids flicker at the threshold boundary while
//! recovery stays responsive.

use crate::config::PostureConfig;
use crate::core::state::{Effect, MonitoringState};
use crate::detector::types::PostureReading;
use chrono::{DateTime, Duration, Utc};

/// Process one reading.
///
/// `elapsed` is the interval since the previous evaluation tick; it is
/// attributed to the pre-update slouch state so analytics accrue against
/// the state the interval was actually spent in.
pub fn process(
    reading: &PostureReading,
    prev: &MonitoringState,
    config: &PostureConfig,
    elapsed: Duration,
    now: DateTime<Utc>,
) -> (MonitoringState, Vec<Effect>) {
    let mut next = prev.clone();
    let mut effects = vec![Effect::TrackAnalytics {
        interval: elapsed,
        was_slouching: prev.is_slouching,
    }];

    if reading.is_bad_posture {
        next.consecutive_bad_frames += 1;
        next.consecutive_good_frames = 0;

        if next.consecutive_bad_frames >= config.frame_threshold {
            let onset = *next.bad_posture_start.get_or_insert(now);
            if now - onset >= config.onset_delay() {
                if !next.is_slouching {
                    next.is_slouching = true;
                    effects.push(Effect::RecordSlouchEvent);
                    effects.push(Effect::UpdateUi);
                }
                // Recomputed every qualifying tick, not just on entry, so
                // the warning visual keeps tracking severity.
                next.warning_intensity = reading
                    .severity
                    .powf(1.0 / config.intensity_exponent)
                    .clamp(0.0, 1.0);
            }
        }
    } else {
        next.consecutive_good_frames += 1;
        next.consecutive_bad_frames = 0;
        next.bad_posture_start = None;
        // Recovery starts fading the instant a good frame arrives,
        // independent of the frame-count threshold.
        next.warning_intensity = 0.0;

        if next.consecutive_good_frames >= config.good_frame_threshold && next.is_slouching {
            next.is_slouching = false;
            effects.push(Effect::UpdateUi);
        }
    }

    effects.push(Effect::UpdateWarningVisual(next.warning_intensity));
    (next, effects)
}

/// Presence sub-state machine.
///
/// Returns the new state and whether the UI should refresh. No-op when
/// the flag is unchanged.
pub fn process_away_change(is_away: bool, prev: &MonitoringState) -> (MonitoringState, bool) {
    if is_away == prev.is_away {
        return (prev.clone(), false);
    }
    let mut next = prev.clone();
    next.is_away = is_away;
    (next, true)
}
