//! TOML-based application configuration.
//!
//! Stores:
//! - The blocklist (exact hostnames)
//! - Overlay timing and the offered unlock durations
//! - Unlock monitor poll period
//! - Navigation watcher throttling
//!
//! Configuration is stored at `~/.config/focus-overlay/config.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::blocklist::{Blocklist, DEFAULT_BLOCKED_SITES};
use crate::controller::ControllerSettings;
use crate::error::ConfigError;

/// Overlay configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayConfig {
    /// Seconds the "Continue Anyway" control stays disabled.
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
    /// Unlock durations offered by the picker, in display order.
    #[serde(default = "default_durations_min")]
    pub durations_min: Vec<u64>,
}

/// Unlock monitor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

/// Navigation watcher configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationConfig {
    #[serde(default = "default_mutation_throttle_ms")]
    pub mutation_throttle_ms: u64,
    #[serde(default = "default_history_check_delay_ms")]
    pub history_check_delay_ms: u64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/focus-overlay/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_blocklist")]
    pub blocklist: Vec<String>,
    #[serde(default)]
    pub overlay: OverlayConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub navigation: NavigationConfig,
}

// Default functions
fn default_blocklist() -> Vec<String> {
    DEFAULT_BLOCKED_SITES.iter().map(|s| s.to_string()).collect()
}
fn default_cooldown_secs() -> u64 {
    10
}
fn default_durations_min() -> Vec<u64> {
    vec![1, 10, 20]
}
fn default_poll_interval_secs() -> u64 {
    5
}
fn default_mutation_throttle_ms() -> u64 {
    300
}
fn default_history_check_delay_ms() -> u64 {
    50
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: default_cooldown_secs(),
            durations_min: default_durations_min(),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            mutation_throttle_ms: default_mutation_throttle_ms(),
            history_check_delay_ms: default_history_check_delay_ms(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            blocklist: default_blocklist(),
            overlay: OverlayConfig::default(),
            monitor: MonitorConfig::default(),
            navigation: NavigationConfig::default(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        let n = value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?;
                        serde_json::Value::Number(n.into())
                    }
                    serde_json::Value::Array(_) => Self::parse_list(value)
                        .map_err(|e| invalid(e.to_string()))?,
                    serde_json::Value::Object(_) => serde_json::from_str(value)
                        .map_err(|e| invalid(e.to_string()))?,
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Accept either a JSON array or a comma-separated list.
    fn parse_list(value: &str) -> Result<serde_json::Value, serde_json::Error> {
        let trimmed = value.trim();
        if trimmed.starts_with('[') {
            return serde_json::from_str(trimmed);
        }
        let items: Vec<serde_json::Value> = trimmed
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| match item.parse::<u64>() {
                Ok(n) => serde_json::Value::Number(n.into()),
                Err(_) => serde_json::Value::String(item.to_string()),
            })
            .collect();
        Ok(serde_json::Value::Array(items))
    }

    /// `<data_dir>/config.toml`.
    pub fn path() -> Result<PathBuf, Box<dyn std::error::Error>> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let path = Self::path()?;
        Ok(Self::load_from(&path)?)
    }

    /// Load from an explicit path, writing defaults there if it is missing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.save_to(&Self::path()?)?;
        Ok(())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Reject values the controller cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.overlay.durations_min.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "overlay.durations_min".into(),
                message: "at least one duration is required".into(),
            });
        }
        if self.overlay.durations_min.iter().any(|&m| m == 0) {
            return Err(ConfigError::InvalidValue {
                key: "overlay.durations_min".into(),
                message: "durations must be positive".into(),
            });
        }
        if self.monitor.poll_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "monitor.poll_interval_secs".into(),
                message: "poll interval must be positive".into(),
            });
        }
        if self.blocklist.iter().any(|host| host.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                key: "blocklist".into(),
                message: "hostnames must not be empty".into(),
            });
        }
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without persisting it.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the result fails validation. `self` is unchanged on error.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a config value by key and persist. Returns error if key is unknown.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), Box<dyn std::error::Error>> {
        self.apply(key, value)?;
        self.save()?;
        Ok(())
    }

    pub fn blocklist(&self) -> Blocklist {
        Blocklist::new(self.blocklist.iter().map(|h| h.trim().to_string()))
    }

    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            cooldown_ms: self.overlay.cooldown_secs.saturating_mul(1_000),
            durations_min: self.overlay.durations_min.clone(),
            poll_interval_ms: self.monitor.poll_interval_secs.saturating_mul(1_000),
            mutation_throttle_ms: self.navigation.mutation_throttle_ms,
            history_check_delay_ms: self.navigation.history_check_delay_ms,
        }
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}
