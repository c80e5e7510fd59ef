use std::{
    fmt, fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_OUTPUT_FORMAT: &str = "table";
pub const OUTPUT_FORMATS: [&str; 3] = ["table", "json", "plain"];

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown config key '{0}' (valid keys: organization, project, output_format)")]
    UnknownKey(String),

    #[error("invalid output format '{0}' (valid formats: table, json, plain)")]
    InvalidOutputFormat(String),
}

/// The settings a user can change with `ado config set`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    Organization,
    Project,
    OutputFormat,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 3] = [
        ConfigKey::Organization,
        ConfigKey::Project,
        ConfigKey::OutputFormat,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ConfigKey::Organization => "organization",
            ConfigKey::Project => "project",
            ConfigKey::OutputFormat => "output_format",
        }
    }

    /// Environment variable that overrides the stored value.
    pub fn env_var(self) -> &'static str {
        match self {
            ConfigKey::Organization => "ADO_ORGANIZATION",
            ConfigKey::Project => "ADO_PROJECT",
            ConfigKey::OutputFormat => "ADO_OUTPUT_FORMAT",
        }
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ConfigKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents the full CLI configuration stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default = "default_output_format")]
    pub output_format: String,
}

fn default_output_format() -> String {
    DEFAULT_OUTPUT_FORMAT.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            organization: None,
            project: None,
            output_format: default_output_format(),
        }
    }
}

impl Config {
    /// Load configuration from the provided path or the default config file.
    pub fn load<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let path = path
            .map(|p| p.as_ref().to_path_buf())
            .unwrap_or_else(Config::default_path);

        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Config::default());
        }

        let raw = fs::read_to_string(&path)
            .with_context(|| format!("Unable to read config file at {}", path.display()))?;

        if raw.trim().is_empty() {
            return Ok(Config::default());
        }

        serde_yaml::from_str(&raw)
            .with_context(|| format!("Malformed YAML in config file {}", path.display()))
    }

    /// Persist the configuration to disk, creating parent directories if needed.
    pub fn save<P: AsRef<Path>>(&self, path: Option<P>) -> Result<()> {
        let path = path
            .map(|p| p.as_ref().to_path_buf())
            .unwrap_or_else(Config::default_path);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Unable to create config directory {}", parent.display())
            })?;
        }

        let serialized = serde_yaml::to_string(self)?;
        fs::write(&path, serialized)
            .with_context(|| format!("Unable to write config file {}", path.display()))?;

        debug!(path = %path.display(), "Config saved");
        Ok(())
    }

    pub fn get(&self, key: ConfigKey) -> Option<&str> {
        match key {
            ConfigKey::Organization => self.organization.as_deref(),
            ConfigKey::Project => self.project.as_deref(),
            ConfigKey::OutputFormat => Some(self.output_format.as_str()),
        }
    }

    pub fn set(&mut self, key: ConfigKey, value: &str) -> std::result::Result<(), ConfigError> {
        let value = value.trim();
        match key {
            ConfigKey::Organization => self.organization = non_empty(value),
            ConfigKey::Project => self.project = non_empty(value),
            ConfigKey::OutputFormat => self.output_format = validate_output_format(value)?,
        }
        Ok(())
    }

    /// Every key with its current value, in display order.
    pub fn entries(&self) -> Vec<(ConfigKey, Option<&str>)> {
        ConfigKey::ALL
            .into_iter()
            .map(|key| (key, self.get(key)))
            .collect()
    }

    /// Overlay non-empty values from `env`. An unusable output format from
    /// the environment is ignored with a warning.
    pub fn apply_env<F>(&mut self, env: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for key in ConfigKey::ALL {
            let Some(value) = env(key.env_var()).filter(|v| !v.trim().is_empty()) else {
                continue;
            };
            match self.set(key, &value) {
                Ok(()) => debug!(key = %key, var = key.env_var(), "Config overridden from environment"),
                Err(err) => warn!(var = key.env_var(), error = %err, "Ignoring environment override"),
            }
        }
    }

    /// [`Config::apply_env`] with the process environment.
    pub fn with_env_overrides(mut self) -> Self {
        self.apply_env(|name| std::env::var(name).ok());
        self
    }

    pub fn default_path() -> PathBuf {
        let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(".config");
        path.push("ado");
        path.push("config.yaml");
        path
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

pub fn validate_output_format(value: &str) -> std::result::Result<String, ConfigError> {
    let lowered = value.to_ascii_lowercase();
    if OUTPUT_FORMATS.contains(&lowered.as_str()) {
        Ok(lowered)
    } else {
        Err(ConfigError::InvalidOutputFormat(value.to_string()))
    }
}
