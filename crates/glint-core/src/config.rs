//! Configuration loading and parsing for glint
//!
//! Provides functionality to load and parse `glint.toml` configuration files.

use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::rules::Severity;

pub const CONFIG_FILENAME: &str = "glint.toml";

/// Files in flight when `concurrency` is not set.
pub const DEFAULT_CONCURRENCY: usize = 16;

const KNOWN_TOP_LEVEL_KEYS: &[&str] = &[
    "include",
    "exclude",
    "catalog",
    "concurrency",
    "rules",
    "classify",
];
const KNOWN_RULES_KEYS: &[&str] = &["disabled", "severity", "security", "lint", "a11y"];
const KNOWN_CLASSIFY_KEYS: &[&str] = &["server_only", "test", "config"];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid TOML in '{path}': {message}")]
    ParseError { path: PathBuf, message: String },
    #[error("Invalid glob pattern '{pattern}': {message}")]
    InvalidGlob { pattern: String, message: String },
}

#[derive(Debug, Clone, Default)]
pub struct ConfigResult {
    pub config: Config,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    /// Rule catalog replacing the built-in one. Relative paths resolve against
    /// the directory holding the config file.
    pub catalog: Option<PathBuf>,
    pub concurrency: Option<usize>,
    pub rules: RulesConfig,
    pub classify: ClassifyConfig,
}

impl Config {
    pub fn concurrency(&self) -> usize {
        self.concurrency
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_CONCURRENCY)
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct RulesConfig {
    pub disabled: Vec<String>,
    #[serde(default)]
    pub severity: HashMap<String, SeverityValue>,
    pub security: Option<bool>,
    pub lint: Option<bool>,
    pub a11y: Option<bool>,
}

/// Glob lists for file classes. An unset list keeps the built-in defaults.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClassifyConfig {
    pub server_only: Option<Vec<String>>,
    pub test: Option<Vec<String>>,
    pub config: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum SeverityValue {
    Error,
    Warning,
    Info,
}

impl From<SeverityValue> for Severity {
    fn from(value: SeverityValue) -> Self {
        match value {
            SeverityValue::Error => Severity::Error,
            SeverityValue::Warning => Severity::Warning,
            SeverityValue::Info => Severity::Info,
        }
    }
}

pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    loop {
        let config_path = current.join(CONFIG_FILENAME);
        if config_path.exists() {
            return Some(config_path);
        }
        if !current.pop() {
            return None;
        }
    }
}

fn read_config(path: &Path) -> Result<(Config, String), ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e.message().to_string(),
    })?;

    config.catalog = config.catalog.map(|catalog| match path.parent() {
        Some(base) if catalog.is_relative() => base.join(catalog),
        _ => catalog,
    });

    Ok((config, content))
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    read_config(path).map(|(config, _)| config)
}

pub fn load_config_with_warnings(path: &Path) -> Result<ConfigResult, ConfigError> {
    let (config, content) = read_config(path)?;
    let warnings = detect_unknown_keys(&content);

    Ok(ConfigResult { config, warnings })
}

fn detect_unknown_keys(content: &str) -> Vec<String> {
    let mut warnings = Vec::new();

    let table: toml::Table = match content.parse() {
        Ok(t) => t,
        Err(_) => return warnings,
    };

    let known_top: HashSet<&str> = KNOWN_TOP_LEVEL_KEYS.iter().copied().collect();
    for key in table.keys() {
        if !known_top.contains(key.as_str()) {
            warnings.push(format!("Unknown config option: '{}'", key));
        }
    }

    for (section, known) in [("rules", KNOWN_RULES_KEYS), ("classify", KNOWN_CLASSIFY_KEYS)] {
        if let Some(toml::Value::Table(inner)) = table.get(section) {
            for key in inner.keys() {
                if !known.contains(&key.as_str()) {
                    warnings.push(format!("Unknown config option in [{}]: '{}'", section, key));
                }
            }
        }
    }

    warnings
}

/// Finds and loads `glint.toml` from `start_dir` or its ancestors. Only a
/// missing file falls back to defaults; a file that fails to read or parse is
/// an error.
pub fn discover_config(start_dir: &Path) -> Result<ConfigResult, ConfigError> {
    match find_config_file(start_dir) {
        Some(path) => load_config_with_warnings(&path),
        None => Ok(ConfigResult::default()),
    }
}
