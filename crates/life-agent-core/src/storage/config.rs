//! TOML-based engine configuration.
//!
//! Holds the tunable thresholds of the engine:
//! - Analysis windows and the trend noise band
//! - Missed-deadline and avoidance thresholds
//! - Trigger windows for level resolution and display
//! - The completion streak that resolves an intervention
//!
//! Configuration is stored at `~/.config/life-agent/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::error::{ConfigError, Result};

/// Pattern analysis windows and trend classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_window_days")]
    pub default_window_days: u32,
    #[serde(default = "default_decline_window_days")]
    pub decline_window_days: u32,
    #[serde(default = "default_short_window_days")]
    pub cascade_window_days: u32,
    #[serde(default = "default_short_window_days")]
    pub success_window_days: u32,
    /// Half-width of the "stable" band around the earlier completion rate.
    #[serde(default = "default_trend_band")]
    pub trend_band: f64,
    /// Below this many records a domain's trend is always stable.
    #[serde(default = "default_min_trend_records")]
    pub min_trend_records: usize,
}

/// Trigger detection thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerConfig {
    /// Hours an incomplete commitment may age before it counts as missed.
    #[serde(default = "default_deadline_hours")]
    pub deadline_hours: f64,
    /// Avoidance scores must exceed this to record a trigger.
    #[serde(default = "default_avoidance_threshold")]
    pub avoidance_threshold: f64,
}

/// Trigger windows used by the level resolver and for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationConfig {
    #[serde(default = "default_resolution_window_hours")]
    pub resolution_window_hours: i64,
    #[serde(default = "default_display_window_hours")]
    pub display_window_hours: i64,
}

/// Intervention closing policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecycleConfig {
    /// Consecutive completions after an intervention opens that resolve it.
    #[serde(default = "default_resolution_streak")]
    pub resolution_streak: usize,
}

/// Engine configuration.
///
/// Serialized to/from TOML at `~/.config/life-agent/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub triggers: TriggerConfig,
    #[serde(default)]
    pub escalation: EscalationConfig,
    #[serde(default)]
    pub lifecycle: LifecycleConfig,
}

fn default_window_days() -> u32 {
    30
}
fn default_decline_window_days() -> u32 {
    14
}
fn default_short_window_days() -> u32 {
    7
}
fn default_trend_band() -> f64 {
    0.1
}
fn default_min_trend_records() -> usize {
    4
}
fn default_deadline_hours() -> f64 {
    2.0
}
fn default_avoidance_threshold() -> f64 {
    0.3
}
fn default_resolution_window_hours() -> i64 {
    24
}
fn default_display_window_hours() -> i64 {
    48
}
fn default_resolution_streak() -> usize {
    3
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            default_window_days: default_window_days(),
            decline_window_days: default_decline_window_days(),
            cascade_window_days: default_short_window_days(),
            success_window_days: default_short_window_days(),
            trend_band: default_trend_band(),
            min_trend_records: default_min_trend_records(),
        }
    }
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            deadline_hours: default_deadline_hours(),
            avoidance_threshold: default_avoidance_threshold(),
        }
    }
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            resolution_window_hours: default_resolution_window_hours(),
            display_window_hours: default_display_window_hours(),
        }
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            resolution_streak: default_resolution_streak(),
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
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) => return Err(unknown()),
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing the defaults on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|e| {
                ConfigError::LoadFailed {
                    path,
                    message: e.to_string(),
                }
                .into()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path,
                message: e.to_string(),
            }
            .into()),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<()> {
        let path = Self::path()?;
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Object(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without persisting it.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not fit the field.
    pub fn update(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Set a config value by key and persist it.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.update(key, value)?;
        self.save()
    }

    /// Load from disk, returning default on error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to default configuration");
            Self::default()
        })
    }
}
