//! TOML-based application configuration.
//!
//! Stores planner preferences:
//! - Horizon length and project weekly cap
//! - Re-sync protection thresholds and the user id written on slot rows
//!
//! Configuration is stored at `<data dir>/config.toml`. Capacity settings
//! live in the database instead, next to the entities they constrain.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::ConfigError;
use crate::scheduler::{PlannerConfig, MAX_HORIZON_DAYS};
use crate::sync::SyncPolicy;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerSettings {
    #[serde(default = "default_horizon_days")]
    pub horizon_days: u32,
    #[serde(default = "default_project_weekly_cap")]
    pub project_weekly_cap_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncSettings {
    #[serde(default = "default_user_id")]
    pub user_id: String,
    /// Resync starts tomorrow when fewer minutes than this remain today.
    #[serde(default = "default_min_remaining")]
    pub min_remaining_minutes: u32,
    /// Resync starts tomorrow once this share of today is consumed.
    #[serde(default = "default_max_consumed_ratio")]
    pub max_consumed_ratio: f64,
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub planner: PlannerSettings,
    #[serde(default)]
    pub sync: SyncSettings,
}

fn default_horizon_days() -> u32 {
    7
}
fn default_project_weekly_cap() -> u32 {
    300
}
fn default_user_id() -> String {
    "local".into()
}
fn default_min_remaining() -> u32 {
    90
}
fn default_max_consumed_ratio() -> f64 {
    0.25
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            horizon_days: default_horizon_days(),
            project_weekly_cap_minutes: default_project_weekly_cap(),
        }
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            user_id: default_user_id(),
            min_remaining_minutes: default_min_remaining(),
            max_consumed_ratio: default_max_consumed_ratio(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(root: &'a serde_json::Value, key: &str) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }
        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(root: &mut serde_json::Value, key: &str, value: &str) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let (parent_path, leaf) = match key.rsplit_once('.') {
            Some((parent, leaf)) => (Some(parent), leaf),
            None => (None, key),
        };
        if leaf.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        if let Some(parent_path) = parent_path {
            for part in parent_path.split('.') {
                current = current.get_mut(part).ok_or_else(unknown)?;
            }
        }
        let obj = current.as_object_mut().ok_or_else(unknown)?;
        let existing = obj.get(leaf).ok_or_else(unknown)?;

        let new_value = match existing {
            serde_json::Value::Bool(_) => {
                serde_json::Value::Bool(value.parse::<bool>().map_err(|e| invalid(e.to_string()))?)
            }
            serde_json::Value::Number(n) if n.is_u64() => {
                let parsed = value
                    .parse::<u64>()
                    .map_err(|_| invalid(format!("cannot parse '{value}' as a whole number")))?;
                serde_json::Value::Number(parsed.into())
            }
            serde_json::Value::Number(_) => {
                let parsed = value
                    .parse::<f64>()
                    .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?;
                serde_json::Number::from_f64(parsed)
                    .map(serde_json::Value::Number)
                    .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
            }
            serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
            }
            _ => serde_json::Value::String(value.into()),
        };

        obj.insert(leaf.to_string(), new_value);
        Ok(())
    }

    /// Default location of the config file.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        match Self::get_json_value_by_path(&json, key)? {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without saving. Returns error if key is unknown.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Reject values the planner cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let days = self.planner.horizon_days;
        if days == 0 || days > MAX_HORIZON_DAYS {
            return Err(ConfigError::InvalidValue {
                key: "planner.horizon_days".into(),
                message: format!("expected 1 to {MAX_HORIZON_DAYS}, got {days}"),
            });
        }
        Ok(())
    }

    pub fn planner_config(&self) -> PlannerConfig {
        PlannerConfig {
            horizon_days: self.planner.horizon_days,
            project_weekly_cap_minutes: self.planner.project_weekly_cap_minutes,
        }
    }

    pub fn sync_policy(&self) -> SyncPolicy {
        SyncPolicy {
            min_remaining_minutes: self.sync.min_remaining_minutes,
            max_consumed_ratio: self.sync.max_consumed_ratio,
        }
    }
}
