//! Event plumbing for the single-threaded control loop.
//!
//! Platform callbacks (sensor threads, display reconfiguration, hotkeys)
//! push [`AppEvent`]s onto one channel; the control loop is the only
//! consumer, so no core state ever sees concurrent access. The
//! [`Debouncer`] and [`ReadingThrottle`] are deadline checks, not timers:
//! they decide on each poll whether enough quiet time has passed.

use crate::detector::types::PostureReading;
use crate::detector::TrackingSource;
use std::time::{Duration, Instant};

/// Base interval between reading evaluations.
pub const READING_INTERVAL: Duration = Duration::from_millis(100);

/// Shortened interval while actively slouching, so recovery is noticed
/// quickly.
pub const SLOUCHING_READING_INTERVAL: Duration = Duration::from_millis(50);

/// Quiet window after which a burst of display/hot-plug events settles.
pub const RECONFIGURE_DEBOUNCE_WINDOW: Duration = Duration::from_millis(500);

/// Commands originating from the user (menu, hotkey, CLI).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    Enable,
    Disable,
    SelectSource(TrackingSource),
    StartCalibration,
    CaptureCalibrationSample,
    CancelCalibration,
}

/// Everything that can reach the control loop.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// A classified reading from the named source's detector
    Reading(TrackingSource, PostureReading),
    /// Device came into range / dropped out for the named source
    Connectivity(TrackingSource, bool),
    /// The user left or returned to the sensing field
    Presence { is_away: bool },
    /// A sensing device was plugged in
    DeviceAttached(String),
    /// A sensing device was unplugged
    DeviceDetached(String),
    /// The display arrangement changed; payload is the new identifier set
    DisplayConfigurationChanged(Vec<String>),
    /// Screen lock state changed
    ScreenLock(bool),
    Command(UserCommand),
}

/// Collapses bursts of events into one settled value.
///
/// Each recorded value replaces the previous one and pushes the deadline
/// out by the window; `poll` releases the value once the window elapses
/// with no further events.
#[derive(Debug)]
pub struct Debouncer<T> {
    window: Duration,
    pending: Option<T>,
    deadline: Option<Instant>,
}

impl<T> Debouncer<T> {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
            deadline: None,
        }
    }

    /// Record an event at `now`, restarting the quiet window.
    pub fn record(&mut self, value: T, now: Instant) {
        self.pending = Some(value);
        self.deadline = Some(now + self.window);
    }

    /// Release the settled value if the quiet window has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                self.pending.take()
            }
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// Bounds evaluation cost: raw frames arrive far faster than posture can
/// meaningfully change, so readings are processed at a fixed interval.
#[derive(Debug)]
pub struct ReadingThrottle {
    base: Duration,
    slouching: Duration,
    last: Option<Instant>,
}

impl ReadingThrottle {
    pub fn new(base: Duration, slouching: Duration) -> Self {
        Self {
            base,
            slouching,
            last: None,
        }
    }

    /// Returns the elapsed interval to attribute when this reading should
    /// be evaluated, or `None` to drop it.
    pub fn tick(&mut self, now: Instant, is_slouching: bool) -> Option<Duration> {
        let interval = if is_slouching {
            self.slouching
        } else {
            self.base
        };
        match self.last {
            Some(last) => {
                let elapsed = now.duration_since(last);
                if elapsed < interval {
                    return None;
                }
                self.last = Some(now);
                Some(elapsed)
            }
            None => {
                self.last = Some(now);
                Some(interval)
            }
        }
    }

    /// Forget the last tick, e.g. when monitoring stops.
    pub fn reset(&mut self) {
        self.last = None;
    }
}

impl Default for ReadingThrottle {
    fn default() -> Self {
        Self::new(READING_INTERVAL, SLOUCHING_READING_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debouncer_holds_until_quiet() {
        let t0 = Instant::now();
        let mut debouncer: Debouncer<Vec<String>> =
            Debouncer::new(Duration::from_millis(500));

        debouncer.record(vec!["A".into()], t0);
        assert!(debouncer.poll(t0 + Duration::from_millis(100)).is_none());

        // A second event inside the window restarts it.
        debouncer.record(vec!["A".into(), "B".into()], t0 + Duration::from_millis(200));
        assert!(debouncer.poll(t0 + Duration::from_millis(600)).is_none());

        // Settled: the latest payload wins, and only once.
        let settled = debouncer.poll(t0 + Duration::from_millis(700)).unwrap();
        assert_eq!(settled.len(), 2);
        assert!(debouncer.poll(t0 + Duration::from_millis(800)).is_none());
    }

    #[test]
    fn test_throttle_drops_fast_readings() {
        let t0 = Instant::now();
        let mut throttle =
            ReadingThrottle::new(Duration::from_millis(100), Duration::from_millis(50));

        assert!(throttle.tick(t0, false).is_some());
        assert!(throttle.tick(t0 + Duration::from_millis(30), false).is_none());
        let elapsed = throttle.tick(t0 + Duration::from_millis(120), false).unwrap();
        assert_eq!(elapsed, Duration::from_millis(120));
    }

    #[test]
    fn test_throttle_shortens_while_slouching() {
        let t0 = Instant::now();
        let mut throttle =
            ReadingThrottle::new(Duration::from_millis(100), Duration::from_millis(50));

        assert!(throttle.tick(t0, true).is_some());
        // 60ms is too fast when upright but fast enough while slouching.
        assert!(throttle.tick(t0 + Duration::from_millis(60), true).is_some());

        throttle.reset();
        assert!(throttle.tick(t0 + Duration::from_millis(61), false).is_some());
    }
}
