//! Config file discovery, loading, and environment variable overlay.

use crate::{ConfigError, HandsConfig};
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files in standard locations.
///
/// Returns paths in load order (system, user, local). Only returns files
/// that exist.
pub fn discover_config_files() -> Vec<PathBuf> {
    discover_config_files_with_override(None)
}

/// Discover config files, optionally with a CLI override path.
///
/// If `cli_path` is provided it replaces the local `./midi2hands.toml`. A CLI
/// path is returned even when missing so that loading it reports the error.
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/midi2hands/config.toml");
    if system.exists() {
        files.push(system);
    }

    // XDG_CONFIG_HOME or ~/.config
    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("midi2hands/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    if let Some(path) = cli_path {
        files.push(path.to_path_buf());
        return files;
    }

    let local = PathBuf::from("midi2hands.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Overlay the values of a TOML file onto `config`.
pub fn load_from_file(path: &Path, config: &mut HandsConfig) -> Result<(), ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    apply_toml(&contents, path, config)
}

/// Overlay TOML contents onto `config`. Keys absent from the file keep
/// their current value, so later files only override what they mention.
pub fn apply_toml(contents: &str, path: &Path, config: &mut HandsConfig) -> Result<(), ConfigError> {
    let table: toml::Table = contents.parse().map_err(|e: toml::de::Error| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let invalid = |key: &str, message: &str| ConfigError::Invalid {
        key: key.to_string(),
        message: format!("{} (in {})", message, path.display()),
    };

    if let Some(classifier) = table.get("classifier").and_then(|v| v.as_table()) {
        if let Some(v) = classifier.get("model") {
            let model = v
                .as_str()
                .ok_or_else(|| invalid("classifier.model", "expected a path string"))?;
            config.classifier.model = if model.is_empty() {
                None
            } else {
                Some(expand_path(model))
            };
        }
        if let Some(v) = classifier.get("split_point") {
            let split = v
                .as_integer()
                .ok_or_else(|| invalid("classifier.split_point", "expected an integer"))?;
            config.classifier.split_point = parse_pitch(split)
                .ok_or_else(|| invalid("classifier.split_point", "must be a MIDI pitch 0-127"))?;
        }
    }

    if let Some(engine) = table.get("engine").and_then(|v| v.as_table()) {
        if let Some(v) = engine.get("parallel") {
            config.engine.parallel = v
                .as_bool()
                .ok_or_else(|| invalid("engine.parallel", "expected true or false"))?;
        }
    }

    if let Some(telemetry) = table.get("telemetry").and_then(|v| v.as_table()) {
        if let Some(v) = telemetry.get("log_level") {
            config.telemetry.log_level = v
                .as_str()
                .ok_or_else(|| invalid("telemetry.log_level", "expected a string"))?
                .to_string();
        }
    }

    Ok(())
}

/// Apply `MIDI2HANDS_*` and `RUST_LOG` environment overrides.
pub fn apply_env_overrides(
    config: &mut HandsConfig,
    sources: &mut ConfigSources,
) -> Result<(), ConfigError> {
    apply_overrides(config, sources, utf8_vars(env::vars_os()))
}

/// Drop variables whose name or value is not valid UTF-8. None of the keys
/// we read can be spelled that way, and `env::vars` would panic on them.
fn utf8_vars<I>(vars: I) -> impl Iterator<Item = (String, String)>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    vars.into_iter()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
}

/// Apply overrides from an explicit set of variables.
pub fn apply_overrides<I>(
    config: &mut HandsConfig,
    sources: &mut ConfigSources,
    vars: I,
) -> Result<(), ConfigError>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut rust_log = None;

    for (key, value) in vars {
        match key.as_str() {
            "MIDI2HANDS_MODEL" => {
                config.classifier.model = if value.is_empty() {
                    None
                } else {
                    Some(expand_path(&value))
                };
            }
            "MIDI2HANDS_SPLIT_POINT" => {
                config.classifier.split_point = value
                    .trim()
                    .parse::<i64>()
                    .ok()
                    .and_then(parse_pitch)
                    .ok_or_else(|| ConfigError::Invalid {
                        key: key.clone(),
                        message: format!("{value:?} is not a MIDI pitch 0-127"),
                    })?;
            }
            "MIDI2HANDS_PARALLEL" => {
                config.engine.parallel =
                    parse_bool(&value).ok_or_else(|| ConfigError::Invalid {
                        key: key.clone(),
                        message: format!("{value:?} is not a boolean"),
                    })?;
            }
            "MIDI2HANDS_LOG_LEVEL" => {
                config.telemetry.log_level = value;
            }
            // RUST_LOG wins over MIDI2HANDS_LOG_LEVEL regardless of order
            "RUST_LOG" => {
                rust_log = Some(value);
            }
            _ => continue,
        }
        sources.env_overrides.push(key);
    }

    if let Some(level) = rust_log {
        config.telemetry.log_level = level;
    }

    Ok(())
}

fn parse_pitch(value: i64) -> Option<u8> {
    u8::try_from(value).ok().filter(|p| *p <= 127)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Expand `~/` and a leading `$VAR/` in a path.
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            return home.join(stripped);
        }
    } else if let Some(stripped) = path.strip_prefix('$') {
        let (var_name, rest) = match stripped.find('/') {
            Some(slash_pos) => (&stripped[..slash_pos], Some(&stripped[slash_pos + 1..])),
            None => (stripped, None),
        };
        if let Ok(var_value) = env::var(var_name) {
            let base = PathBuf::from(var_value);
            return match rest {
                Some(rest) => base.join(rest),
                None => base,
            };
        }
    }

    PathBuf::from(path)
}
