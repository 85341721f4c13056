//! Configuration loading for midi2hands.
//!
//! # Usage
//!
//! ```rust,no_run
//! use handsconf::HandsConfig;
//!
//! let config = HandsConfig::load().expect("Failed to load config");
//! match &config.classifier.model {
//!     Some(model) => println!("model: {}", model.display()),
//!     None => println!("split at pitch {}", config.classifier.split_point),
//! }
//! ```
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins):
//! 1. `/etc/midi2hands/config.toml` (system)
//! 2. `~/.config/midi2hands/config.toml` (user)
//! 3. `./midi2hands.toml`, or the path given with `--config`
//! 4. Environment variables (`MIDI2HANDS_*`, `RUST_LOG`)
//!
//! # Example Config
//!
//! ```toml
//! [classifier]
//! model = "~/models/hands.json"
//! split_point = 60
//!
//! [engine]
//! parallel = false
//!
//! [telemetry]
//! log_level = "info"
//! ```

pub mod loader;
pub mod sections;

pub use loader::{discover_config_files_with_override, ConfigSources};
pub use sections::{ClassifierConfig, EngineConfig, TelemetryConfig};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {message}")]
    Invalid { key: String, message: String },
}

/// Complete midi2hands configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct HandsConfig {
    #[serde(default)]
    pub classifier: ClassifierConfig,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl HandsConfig {
    /// Load configuration from all sources.
    pub fn load() -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(None)?;
        Ok(config)
    }

    /// Load configuration, letting `config_path` stand in for the local
    /// `./midi2hands.toml`. System and user configs still load first.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(config_path)?;
        Ok(config)
    }

    /// Load configuration from optional path and return information about sources.
    pub fn load_with_sources_from(
        config_path: Option<&Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut config = HandsConfig::default();

        for path in loader::discover_config_files_with_override(config_path) {
            loader::load_from_file(&path, &mut config)?;
            sources.files.push(path);
        }

        loader::apply_env_overrides(&mut config, &mut sources)?;

        Ok((config, sources))
    }

    /// Serialize config to TOML string.
    pub fn to_toml(&self) -> String {
        let mut output = String::new();

        output.push_str("# midi2hands configuration\n\n");

        output.push_str("[classifier]\n");
        match &self.classifier.model {
            Some(model) => output.push_str(&format!(
                "model = {}\n",
                toml::Value::String(model.display().to_string())
            )),
            None => output.push_str("# model = \"path/to/model.json\"\n"),
        }
        output.push_str(&format!(
            "split_point = {}\n",
            self.classifier.split_point
        ));

        output.push_str("\n[engine]\n");
        output.push_str(&format!("parallel = {}\n", self.engine.parallel));

        output.push_str("\n[telemetry]\n");
        output.push_str(&format!(
            "log_level = {}\n",
            toml::Value::String(self.telemetry.log_level.clone())
        ));

        output
    }
}
