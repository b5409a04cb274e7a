//! Posture analytics log.
//!
//! Tracks how much time the user spends monitored vs. slouching, plus
//! event counts, across agent sessions. Counters are atomic so detector
//! threads can record without touching the control thread; persistence is
//! best-effort and never blocks the decision core.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Analytics counters for the agent.
#[derive(Debug)]
pub struct AnalyticsLog {
    /// Number of readings evaluated
    readings_processed: AtomicU64,
    /// Number of slouching episodes recorded
    slouch_events: AtomicU64,
    /// Milliseconds spent monitored with good posture
    upright_ms: AtomicU64,
    /// Milliseconds spent monitored while slouching
    slouching_ms: AtomicU64,
    /// Number of completed calibration sessions
    calibrations_completed: AtomicU64,
    /// Unique id for this agent installation's log
    instance_id: Uuid,
    /// Session start time
    session_start: DateTime<Utc>,
    /// Path for persisting stats
    persist_path: Option<PathBuf>,
}

impl AnalyticsLog {
    /// Create a new analytics log.
    pub fn new() -> Self {
        Self {
            readings_processed: AtomicU64::new(0),
            slouch_events: AtomicU64::new(0),
            upright_ms: AtomicU64::new(0),
            slouching_ms: AtomicU64::new(0),
            calibrations_completed: AtomicU64::new(0),
            instance_id: Uuid::new_v4(),
            session_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Create an analytics log with persistence.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut log = Self::new();
        log.persist_path = Some(path);

        // Try to load existing stats
        if let Err(e) = log.load() {
            tracing::warn!("Could not load previous analytics: {e}");
        }

        log
    }

    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    /// Record one evaluated reading.
    pub fn record_reading(&self) {
        self.readings_processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the start of a slouching episode.
    pub fn record_slouch_event(&self) {
        self.slouch_events.fetch_add(1, Ordering::Relaxed);
    }

    /// Attribute an evaluation interval to the state it was spent in.
    pub fn record_interval(&self, interval_ms: u64, was_slouching: bool) {
        if was_slouching {
            self.slouching_ms.fetch_add(interval_ms, Ordering::Relaxed);
        } else {
            self.upright_ms.fetch_add(interval_ms, Ordering::Relaxed);
        }
    }

    /// Record a completed calibration session.
    pub fn record_calibration_completed(&self) {
        self.calibrations_completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn stats(&self) -> AnalyticsStats {
        AnalyticsStats {
            readings_processed: self.readings_processed.load(Ordering::Relaxed),
            slouch_events: self.slouch_events.load(Ordering::Relaxed),
            upright_ms: self.upright_ms.load(Ordering::Relaxed),
            slouching_ms: self.slouching_ms.load(Ordering::Relaxed),
            calibrations_completed: self.calibrations_completed.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds() as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        let monitored_secs = (stats.upright_ms + stats.slouching_ms) / 1000;
        format!(
            "Posture Statistics:\n\
             - Readings evaluated: {}\n\
             - Slouching episodes: {}\n\
             - Time monitored: {} seconds\n\
             - Time slouching: {} seconds\n\
             - Calibrations completed: {}\n\
             - Session duration: {} seconds",
            stats.readings_processed,
            stats.slouch_events,
            monitored_secs,
            stats.slouching_ms / 1000,
            stats.calibrations_completed,
            stats.session_duration_secs
        )
    }

    /// Save stats to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            // Ensure parent directory exists
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let stats = self.stats();
            let persisted = PersistedStats {
                readings_processed: stats.readings_processed,
                slouch_events: stats.slouch_events,
                upright_ms: stats.upright_ms,
                slouching_ms: stats.slouching_ms,
                calibrations_completed: stats.calibrations_completed,
                last_updated: Utc::now(),
            };

            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;

            std::fs::write(path, json)?;
        }
        Ok(())
    }

    /// Load stats from disk.
    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let persisted: PersistedStats =
                    serde_json::from_str(&content).map_err(std::io::Error::other)?;

                self.readings_processed
                    .store(persisted.readings_processed, Ordering::Relaxed);
                self.slouch_events
                    .store(persisted.slouch_events, Ordering::Relaxed);
                self.upright_ms.store(persisted.upright_ms, Ordering::Relaxed);
                self.slouching_ms
                    .store(persisted.slouching_ms, Ordering::Relaxed);
                self.calibrations_completed
                    .store(persisted.calibrations_completed, Ordering::Relaxed);
            }
        }
        Ok(())
    }

    /// Reset all counters.
    pub fn reset(&self) {
        self.readings_processed.store(0, Ordering::Relaxed);
        self.slouch_events.store(0, Ordering::Relaxed);
        self.upright_ms.store(0, Ordering::Relaxed);
        self.slouching_ms.store(0, Ordering::Relaxed);
        self.calibrations_completed.store(0, Ordering::Relaxed);
    }
}

impl Default for AnalyticsLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of analytics statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsStats {
    pub readings_processed: u64,
    pub slouch_events: u64,
    pub upright_ms: u64,
    pub slouching_ms: u64,
    pub calibrations_completed: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

/// Stats format for persistence.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedStats {
    readings_processed: u64,
    slouch_events: u64,
    upright_ms: u64,
    slouching_ms: u64,
    calibrations_completed: u64,
    last_updated: DateTime<Utc>,
}

/// Thread-safe shared analytics log.
pub type SharedAnalyticsLog = Arc<AnalyticsLog>;

/// Create a new shared analytics log.
pub fn create_shared_log() -> SharedAnalyticsLog {
    Arc::new(AnalyticsLog::new())
}

/// Create a new shared analytics log with persistence.
pub fn create_shared_log_with_persistence(path: PathBuf) -> SharedAnalyticsLog {
    Arc::new(AnalyticsLog::with_persistence(path))
}
