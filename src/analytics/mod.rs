//! Analytics for the posture agent.
//!
//! Tracks slouching episodes and monitored time so the user can see what
//! the agent observed, without storing any raw sensor data.

pub mod log;

// Re-export commonly used types
pub use log::{
    create_shared_log, create_shared_log_with_persistence, AnalyticsLog, AnalyticsStats,
    SharedAnalyticsLog,
};
