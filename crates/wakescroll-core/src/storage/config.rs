//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Retention caps for every ledger
//! - Nudge scheduling (interval, window size, sleep window)
//! - XP awarded per activity
//!
//! Configuration is stored at `<data dir>/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;
use crate::notify::{SchedulerConfig, SleepWindow};

/// Per-collection retention caps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionConfig {
    #[serde(default = "default_500")]
    pub task_completions: usize,
    #[serde(default = "default_500")]
    pub goal_completions: usize,
    #[serde(default = "default_100")]
    pub breathing_sessions: usize,
    #[serde(default = "default_100")]
    pub reflections: usize,
    #[serde(default = "default_100")]
    pub reminder_fires: usize,
    #[serde(default = "default_xp_days")]
    pub xp_days: usize,
}

/// Longest gap between two nudges: one day.
pub const MAX_INTERVAL_MINUTES: u32 = 24 * 60;
/// Most nudges kept scheduled ahead: one day at 5-minute spacing.
pub const MAX_WINDOW_SIZE: u32 = 288;

/// Nudge scheduling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u32,
    #[serde(default = "default_window_size")]
    pub window_size: u32,
    #[serde(default = "default_id_prefix")]
    pub id_prefix: String,
    #[serde(default = "default_recent_category_memory")]
    pub recent_category_memory: usize,
    #[serde(default = "default_true")]
    pub sleep_window_enabled: bool,
    /// Local wall-clock start of the sleep window, "HH:MM".
    #[serde(default = "default_sleep_start")]
    pub sleep_start: String,
    /// Local wall-clock end of the sleep window, "HH:MM". May be earlier
    /// than `sleep_start` for windows that wrap past midnight.
    #[serde(default = "default_sleep_end")]
    pub sleep_end: String,
}

/// XP awarded per activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XpConfig {
    #[serde(default = "default_task_xp")]
    pub default_task_xp: u32,
    #[serde(default = "default_goal_xp")]
    pub default_goal_xp: u32,
    #[serde(default = "default_breathing_xp")]
    pub breathing_xp: u32,
    #[serde(default = "default_reflection_xp")]
    pub reflection_xp: u32,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data dir>/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub retention: RetentionConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub xp: XpConfig,
}

// Default functions
fn default_500() -> usize {
    500
}
fn default_100() -> usize {
    100
}
fn default_xp_days() -> usize {
    365
}
fn default_true() -> bool {
    true
}
fn default_interval_minutes() -> u32 {
    45
}
fn default_window_size() -> u32 {
    12
}
fn default_id_prefix() -> String {
    "wakescroll-nudge".into()
}
fn default_recent_category_memory() -> usize {
    5
}
fn default_sleep_start() -> String {
    "22:00".into()
}
fn default_sleep_end() -> String {
    "07:00".into()
}
fn default_task_xp() -> u32 {
    5
}
fn default_goal_xp() -> u32 {
    10
}
fn default_breathing_xp() -> u32 {
    3
}
fn default_reflection_xp() -> u32 {
    4
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            task_completions: 500,
            goal_completions: 500,
            breathing_sessions: 100,
            reflections: 100,
            reminder_fires: 100,
            xp_days: default_xp_days(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_minutes: default_interval_minutes(),
            window_size: default_window_size(),
            id_prefix: default_id_prefix(),
            recent_category_memory: default_recent_category_memory(),
            sleep_window_enabled: true,
            sleep_start: default_sleep_start(),
            sleep_end: default_sleep_end(),
        }
    }
}

impl Default for XpConfig {
    fn default() -> Self {
        Self {
            default_task_xp: default_task_xp(),
            default_goal_xp: default_goal_xp(),
            breathing_xp: default_breathing_xp(),
            reflection_xp: default_reflection_xp(),
        }
    }
}

impl NotificationsConfig {
    /// Parsed sleep window, `None` when disabled.
    pub fn sleep_window(&self) -> Result<Option<SleepWindow>, ConfigError> {
        if !self.sleep_window_enabled {
            return Ok(None);
        }
        SleepWindow::parse(&self.sleep_start, &self.sleep_end)
            .map(Some)
            .map_err(|message| ConfigError::InvalidValue {
                key: "notifications.sleep_start".into(),
                message,
            })
    }

    /// Scheduler settings derived from this section.
    pub fn scheduler_config(&self) -> Result<SchedulerConfig, ConfigError> {
        if !(1..=MAX_INTERVAL_MINUTES).contains(&self.interval_minutes) {
            return Err(ConfigError::InvalidValue {
                key: "notifications.interval_minutes".into(),
                message: format!("must be between 1 and {MAX_INTERVAL_MINUTES}"),
            });
        }
        if !(1..=MAX_WINDOW_SIZE).contains(&self.window_size) {
            return Err(ConfigError::InvalidValue {
                key: "notifications.window_size".into(),
                message: format!("must be between 1 and {MAX_WINDOW_SIZE}"),
            });
        }
        Ok(SchedulerConfig {
            interval: chrono::Duration::minutes(i64::from(self.interval_minutes)),
            window_size: self.window_size as usize,
            id_prefix: self.id_prefix.clone(),
            sleep_window: self.sleep_window()?,
            recent_category_memory: self.recent_category_memory,
        })
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
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(ConfigError::UnknownKey(key.to_string()));
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
                let existing = obj
                    .get(part)
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

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
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current
                .get_mut(part)
                .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        }

        Err(ConfigError::UnknownKey(key.to_string()))
    }

    /// Default location of the config file.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("config.toml"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from the default location, writing defaults if missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::default_path()?)
    }

    /// Load from `path`, writing defaults there if the file is missing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config =
                    toml::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
                cfg.validate()?;
                Ok(cfg)
            }
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
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::default_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Reject values that would parse but cannot drive the core.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.notifications.scheduler_config()?;
        let retention = &self.retention;
        for (key, cap) in [
            ("retention.task_completions", retention.task_completions),
            ("retention.goal_completions", retention.goal_completions),
            ("retention.breathing_sessions", retention.breathing_sessions),
            ("retention.reflections", retention.reflections),
            ("retention.reminder_fires", retention.reminder_fires),
            ("retention.xp_days", retention.xp_days),
        ] {
            if cap == 0 {
                return Err(ConfigError::InvalidValue {
                    key: key.into(),
                    message: "retention cap must be at least 1".into(),
                });
            }
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

    /// Set a value by key in memory. Returns error if the key is unknown or
    /// the resulting config is invalid; `self` is left untouched on error.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
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

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to default configuration");
            Self::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.retention.task_completions, 500);
        assert_eq!(parsed.notifications.window_size, 12);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let parsed: Config = toml::from_str("[notifications]\ninterval_minutes = 30\n").unwrap();
        assert_eq!(parsed.notifications.interval_minutes, 30);
        assert_eq!(parsed.notifications.window_size, 12);
        assert_eq!(parsed.retention.reflections, 100);
        assert_eq!(parsed.xp.default_task_xp, 5);
    }

    #[test]
    fn scheduler_limits_are_enforced() {
        let mut cfg = Config::default();
        cfg.set("notifications.interval_minutes", "1440").unwrap();
        cfg.set("notifications.window_size", "288").unwrap();

        assert!(cfg.set("notifications.interval_minutes", "1441").is_err());
        assert!(cfg.set("notifications.interval_minutes", "4000000000").is_err());
        assert!(cfg.set("notifications.window_size", "289").is_err());
        assert_eq!(cfg.notifications.interval_minutes, 1440);
        assert_eq!(cfg.notifications.window_size, 288);

        let parsed: Config =
            toml::from_str("[notifications]\ninterval_minutes = 4000000000\n").unwrap();
        let err = parsed.validate().unwrap_err();
        let ConfigError::InvalidValue { key, .. } = err else {
            panic!("expected InvalidValue, got {err:?}");
        };
        assert_eq!(key, "notifications.interval_minutes");
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("notifications.enabled").as_deref(), Some("true"));
        assert_eq!(cfg.get("notifications.interval_minutes").as_deref(), Some("45"));
        assert_eq!(cfg.get("notifications.sleep_start").as_deref(), Some("22:00"));
        assert!(cfg.get("notifications.missing_key").is_none());
    }

    #[test]
    fn set_updates_nested_number() {
        let mut cfg = Config::default();
        cfg.set("notifications.interval_minutes", "30").unwrap();
        assert_eq!(cfg.notifications.interval_minutes, 30);
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        let result = cfg.set("notifications.nonexistent_key", "value");
        assert!(matches!(result, Err(ConfigError::UnknownKey(_))));
    }

    #[test]
    fn set_rejects_invalid_type() {
        let mut cfg = Config::default();
        assert!(cfg.set("notifications.enabled", "not_a_bool").is_err());
        assert!(cfg.set("retention.reflections", "-3").is_err());
    }

    #[test]
    fn set_rejects_invalid_sleep_time_and_keeps_old_value() {
        let mut cfg = Config::default();
        assert!(cfg.set("notifications.sleep_start", "25:99").is_err());
        assert_eq!(cfg.notifications.sleep_start, "22:00");
    }

    #[test]
    fn set_rejects_zero_cap() {
        let mut cfg = Config::default();
        assert!(cfg.set("retention.task_completions", "0").is_err());
        assert_eq!(cfg.retention.task_completions, 500);
    }

    #[test]
    fn scheduler_config_from_defaults() {
        let cfg = Config::default();
        let sched = cfg.notifications.scheduler_config().unwrap();
        assert_eq!(sched.interval, chrono::Duration::minutes(45));
        assert_eq!(sched.window_size, 12);
        assert_eq!(sched.recent_category_memory, 5);
        assert!(sched.sleep_window.is_some());
    }

    #[test]
    fn disabled_sleep_window_is_none() {
        let mut cfg = Config::default();
        cfg.set("notifications.sleep_window_enabled", "false").unwrap();
        assert!(cfg.notifications.sleep_window().unwrap().is_none());
    }

    #[test]
    fn load_from_missing_file_writes_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(cfg.notifications.interval_minutes, 45);
    }

    #[test]
    fn save_then_load_preserves_changes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let mut cfg = Config::default();
        cfg.set("xp.default_task_xp", "8").unwrap();
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.xp.default_task_xp, 8);
    }

    #[test]
    fn load_from_malformed_file_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "retention = [").unwrap();
        assert!(matches!(Config::load_from(&path), Err(ConfigError::ParseFailed(_))));
    }
}
