//! Configuration sections.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which classifier scores notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// JSON logistic model. When unset the keyboard split heuristic is used.
    #[serde(default)]
    pub model: Option<PathBuf>,

    /// Lowest pitch played by the right hand under the split heuristic.
    /// Default: 60 (middle C)
    #[serde(default = "ClassifierConfig::default_split_point")]
    pub split_point: u8,
}

impl ClassifierConfig {
    fn default_split_point() -> u8 {
        60
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model: None,
            split_point: Self::default_split_point(),
        }
    }
}

/// Assignment engine settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Process tracks concurrently (needs the `parallel` build feature).
    /// Default: false
    #[serde(default)]
    pub parallel: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log level or `EnvFilter` directive (trace, debug, info, warn, error).
    /// Default: info
    #[serde(default = "TelemetryConfig::default_log_level")]
    pub log_level: String,
}

impl TelemetryConfig {
    fn default_log_level() -> String {
        "info".to_string()
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
        }
    }
}
