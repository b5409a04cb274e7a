//! Calibration profile persistence.
//!
//! Profiles are stored as one JSON map from config key to record. A
//! record is written on calibration completion, overwritten on
//! recalibration for the same key, and never deleted automatically. The
//! generation counter lets the control loop flush only when something
//! actually changed since the last durable write.

use crate::core::calibration::CameraCalibration;
use crate::core::resolver::ConfigKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Persisted form of a camera calibration for one display configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub calibration: CameraCalibration,
    /// Identity of the camera the calibration was captured with. A
    /// different camera must never reuse these thresholds.
    pub device_id: String,
    pub saved_at: DateTime<Utc>,
}

/// Store errors.
#[derive(Debug)]
pub enum StoreError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::IoError(e) => write!(f, "IO error: {e}"),
            StoreError::ParseError(e) => write!(f, "Parse error: {e}"),
            StoreError::SerializeError(e) => write!(f, "Serialize error: {e}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// JSON-backed map from [`ConfigKey`] to [`ProfileRecord`].
pub struct ProfileStore {
    path: PathBuf,
    profiles: HashMap<ConfigKey, ProfileRecord>,
    generation: u64,
    saved_generation: u64,
}

impl ProfileStore {
    /// Default store location.
    pub fn default_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("slouchguard")
            .join("profiles.json")
    }

    /// Load the store, or start empty when no file exists yet.
    pub fn load(path: PathBuf) -> Result<Self, StoreError> {
        let profiles = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .map_err(|e| StoreError::IoError(e.to_string()))?;
            serde_json::from_str(&content).map_err(|e| StoreError::ParseError(e.to_string()))?
        } else {
            HashMap::new()
        };
        Ok(Self {
            path,
            profiles,
            generation: 0,
            saved_generation: 0,
        })
    }

    pub fn get(&self, key: &ConfigKey) -> Option<&ProfileRecord> {
        self.profiles.get(key)
    }

    /// Insert or overwrite the record for a configuration.
    pub fn insert(&mut self, key: ConfigKey, record: ProfileRecord) {
        self.profiles.insert(key, record);
        self.generation += 1;
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// True when the store mutated since the last durable write.
    pub fn is_dirty(&self) -> bool {
        self.generation != self.saved_generation
    }

    /// Write the store to disk unconditionally.
    pub fn save(&mut self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::IoError(e.to_string()))?;
        }
        let content = serde_json::to_string_pretty(&self.profiles)
            .map_err(|e| StoreError::SerializeError(e.to_string()))?;
        std::fs::write(&self.path, content).map_err(|e| StoreError::IoError(e.to_string()))?;
        self.saved_generation = self.generation;
        Ok(())
    }

    /// Write only when dirty. Returns whether a write happened.
    pub fn flush_if_dirty(&mut self) -> Result<bool, StoreError> {
        if !self.is_dirty() {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }
}
