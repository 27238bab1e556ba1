//! TOML-based user settings.
//!
//! Stores the auto-continue flags consumed by the timer engine and the
//! cue/notification preferences consumed by the side-effect dispatcher.
//! Stored at `~/.config/restbell/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::dispatch::DispatchSettings;
use crate::error::{ConfigError, CoreError};
use crate::timer::AutoBehavior;

/// Timer behavior flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerConfig {
    /// Auto-run the rest interval when a timed set finishes.
    #[serde(default = "default_true")]
    pub auto_start_rest_after_set: bool,
    /// Auto-run the next set when a rest interval finishes.
    #[serde(default)]
    pub auto_start_set_after_rest: bool,
    /// Rewind the timer to set 1 once an exercise completes.
    #[serde(default)]
    pub auto_reset_timer: bool,
}

/// Cue and notification preferences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Cue sound id played as a phase nears expiry; 0 is silent.
    #[serde(default = "default_cue_sound")]
    pub cue_sound: u32,
}

/// Application configuration, serialized to/from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

fn default_true() -> bool {
    true
}

fn default_cue_sound() -> u32 {
    1
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            auto_start_rest_after_set: true,
            auto_start_set_after_rest: false,
            auto_reset_timer: false,
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cue_sound: default_cue_sound(),
        }
    }
}

impl Config {
    fn path() -> Result<PathBuf, CoreError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing defaults on first run.
    pub fn load() -> Result<Self, CoreError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let cfg = toml::from_str(&content).map_err(|err| ConfigError::LoadFailed {
                    path,
                    message: err.to_string(),
                })?;
                Ok(cfg)
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    pub fn save(&self) -> Result<(), CoreError> {
        let path = Self::path()?;
        let content = toml::to_string_pretty(self).map_err(|err| ConfigError::SaveFailed {
            path: path.clone(),
            message: err.to_string(),
        })?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Load from disk, returning defaults on any error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Get a value as a string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let value = match key {
            "timer.auto_start_rest_after_set" => self.timer.auto_start_rest_after_set.to_string(),
            "timer.auto_start_set_after_rest" => self.timer.auto_start_set_after_rest.to_string(),
            "timer.auto_reset_timer" => self.timer.auto_reset_timer.to_string(),
            "notifications.enabled" => self.notifications.enabled.to_string(),
            "notifications.cue_sound" => self.notifications.cue_sound.to_string(),
            _ => return None,
        };
        Some(value)
    }

    /// Set a value by dot-separated key and persist.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), CoreError> {
        let parse_bool = |value: &str| {
            value.parse::<bool>().map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("expected true/false, got '{value}'"),
            })
        };
        match key {
            "timer.auto_start_rest_after_set" => {
                self.timer.auto_start_rest_after_set = parse_bool(value)?;
            }
            "timer.auto_start_set_after_rest" => {
                self.timer.auto_start_set_after_rest = parse_bool(value)?;
            }
            "timer.auto_reset_timer" => {
                self.timer.auto_reset_timer = parse_bool(value)?;
            }
            "notifications.enabled" => {
                self.notifications.enabled = parse_bool(value)?;
            }
            "notifications.cue_sound" => {
                self.notifications.cue_sound =
                    value.parse().map_err(|_| ConfigError::InvalidValue {
                        key: key.to_string(),
                        message: format!("expected a sound id, got '{value}'"),
                    })?;
            }
            _ => return Err(ConfigError::UnknownKey(key.to_string()).into()),
        }
        self.save()?;
        Ok(())
    }

    pub fn auto_behavior(&self) -> AutoBehavior {
        AutoBehavior {
            auto_start_rest_after_set: self.timer.auto_start_rest_after_set,
            auto_start_set_after_rest: self.timer.auto_start_set_after_rest,
            auto_reset: self.timer.auto_reset_timer,
        }
    }

    pub fn dispatch_settings(&self) -> DispatchSettings {
        DispatchSettings {
            notifications_enabled: self.notifications.enabled,
            cue_sound: self.notifications.cue_sound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert!(parsed.timer.auto_start_rest_after_set);
        assert!(!parsed.timer.auto_start_set_after_rest);
        assert!(parsed.notifications.enabled);
        assert_eq!(parsed.notifications.cue_sound, 1);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(
            cfg.get("timer.auto_start_rest_after_set").as_deref(),
            Some("true")
        );
        assert_eq!(cfg.get("notifications.cue_sound").as_deref(), Some("1"));
        assert!(cfg.get("timer.missing").is_none());
    }

    #[test]
    fn empty_toml_uses_section_defaults() {
        let parsed: Config = toml::from_str("").unwrap();
        assert!(parsed.timer.auto_start_rest_after_set);
        assert_eq!(parsed.notifications.cue_sound, 1);
    }

    #[test]
    fn auto_behavior_mirrors_timer_section() {
        let mut cfg = Config::default();
        cfg.timer.auto_start_set_after_rest = true;
        cfg.timer.auto_reset_timer = true;
        let behavior = cfg.auto_behavior();
        assert!(behavior.auto_start_rest_after_set);
        assert!(behavior.auto_start_set_after_rest);
        assert!(behavior.auto_reset);
    }
}
