//! Configuration for the posture agent.

use crate::core::calibration::MotionCalibration;
use crate::detector::TrackingSource;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Immutable per-session posture evaluation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PostureConfig {
    /// Consecutive bad frames required before a slouch can begin
    pub frame_threshold: u32,
    /// Consecutive good frames required to end a slouch
    pub good_frame_threshold: u32,
    /// Minimum sustained bad-posture duration before a slouch is surfaced
    pub onset_delay_ms: u64,
    /// Warning intensity is severity^(1/exponent); higher ramps faster
    pub intensity_exponent: f64,
    /// Tolerance band (fraction of calibrated range) before a reading
    /// counts as bad
    pub dead_zone: f64,
}

impl Default for PostureConfig {
    fn default() -> Self {
        Self {
            frame_threshold: 5,
            good_frame_threshold: 3,
            onset_delay_ms: 2_000,
            intensity_exponent: 2.0,
            dead_zone: 0.15,
        }
    }
}

impl PostureConfig {
    pub fn onset_delay(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.onset_delay_ms as i64)
    }
}

/// Main configuration for the agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Whether posture monitoring is turned on at all
    pub enabled: bool,
    /// Whether monitoring is currently paused from the CLI
    pub paused: bool,
    /// Which sensing modality to use
    pub tracking_source: TrackingSource,
    /// Last selected sensing device, if any
    pub selected_device: Option<String>,
    /// Pause automatically when only the built-in display is present
    pub pause_on_the_go: bool,
    /// Posture evaluation tuning
    pub posture: PostureConfig,
    /// Persisted headset calibration (not display-keyed, unlike camera
    /// profiles)
    pub motion_calibration: Option<MotionCalibration>,
    /// Path for storing profiles and analytics
    pub data_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("slouchguard");

        Self {
            enabled: true,
            paused: false,
            tracking_source: TrackingSource::Camera,
            selected_device: None,
            pause_on_the_go: false,
            posture: PostureConfig::default(),
            motion_calibration: None,
            data_path: data_dir,
        }
    }
}

impl Settings {
    /// Load settings from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::IoError(e.to_string()))?;
            let settings: Settings = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            Ok(settings)
        } else {
            Ok(Self::default())
        }
    }

    /// Save settings to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(&config_path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("slouchguard")
            .join("config.json")
    }

    /// Ensure all required directories exist.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.data_path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}
