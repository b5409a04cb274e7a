//! Slouchguard - posture monitoring agent.
//!
//! This library judges a user's posture from noisy, intermittent sensor
//! input and turns that judgement into a small set of discrete
//! application states, tolerating sensor dropout, device hot-plug, and
//! per-display-configuration calibration profiles.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Slouchguard                          │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐   ┌────────────┐   ┌──────────────────┐      │
//! │  │ Detector  │──▶│ Evaluator  │──▶│ AppStateMachine  │      │
//! │  │ (camera / │   │ (hysteresis│   │ (states+effects) │      │
//! │  │  headset) │   │  + onset)  │   └──────────────────┘      │
//! │  └───────────┘   └────────────┘        │         │          │
//! │        │                               ▼         ▼          │
//! │  ┌───────────┐                  ┌───────────┐ ┌──────────┐  │
//! │  │Calibration│                  │ Resolver/ │ │Analytics │  │
//! │  │  Session  │                  │ Profiles  │ │   Log    │  │
//! │  └───────────┘                  └───────────┘ └──────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! All state mutation happens on one control thread: platform capture
//! plumbing pushes raw samples into a detector's ingress channel, and the
//! control loop drains classified events, feeds them through the pure
//! evaluator, and executes the effects the state machine returns.
//!
//! # Example
//!
//! ```
//! use slouchguard::config::PostureConfig;
//! use slouchguard::core::AppStateMachine;
//! use slouchguard::detector::TrackingSource;
//!
//! let mut machine = AppStateMachine::new(
//!     PostureConfig::default(),
//!     TrackingSource::Camera,
//!     false,
//! );
//! machine.enable(true);
//! // Not calibrated yet: the machine parks on the missing-profile pause.
//! assert!(machine.state().is_paused());
//! ```

pub mod analytics;
pub mod config;
pub mod core;
pub mod detector;
pub mod profile;

// Re-export key types at crate root for convenience
pub use analytics::{AnalyticsLog, AnalyticsStats, SharedAnalyticsLog};
pub use config::{PostureConfig, Settings};
pub use core::{
    AppState, AppStateMachine, CalibrationData, CalibrationSession, Effect, MonitoringState,
    PauseReason, UiState,
};
pub use detector::{CameraDetector, Detector, MotionDetector, PostureReading, TrackingSource};
pub use profile::{ProfileRecord, ProfileStore};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
