use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::core::utils::{ensure_dir, write_atomic, PathResolver};
use crate::errors::{ProfileError, Result};

pub const DEFAULT_COUNTRY_DISPLAY: &str = "Perú";
pub const DEFAULT_MASK: &str = "•••";
pub const DEFAULT_SAVE_RETRIES: u32 = 1;

/// Page-level settings persisted as JSON under the application directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Literal rendered for the `country` field, whatever the backend holds.
    pub country_display: String,
    /// Placeholder shown for sensitive payment fields outside edit mode.
    pub mask: String,
    /// Enables the empty `name`/`email` rule. Off by default; see DESIGN.md.
    pub require_non_empty: bool,
    /// Extra attempts after a failed update call.
    pub save_retries: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            country_display: DEFAULT_COUNTRY_DISPLAY.into(),
            mask: DEFAULT_MASK.into(),
            require_non_empty: false,
            save_retries: DEFAULT_SAVE_RETRIES,
            data_file: None,
        }
    }
}

impl Config {
    /// Keys accepted by [`Config::set`], in display order.
    pub const KEYS: [&'static str; 5] = [
        "country_display",
        "mask",
        "require_non_empty",
        "save_retries",
        "data_file",
    ];

    /// Updates a single setting from its textual form.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "country_display" => self.country_display = value.to_string(),
            "mask" => self.mask = value.to_string(),
            "require_non_empty" => {
                self.require_non_empty = parse_flag(value).ok_or_else(|| {
                    ProfileError::Config(format!("`{}` is not a boolean (use true/false)", value))
                })?;
            }
            "save_retries" => {
                self.save_retries = value.trim().parse().map_err(|_| {
                    ProfileError::Config(format!("`{}` is not a retry count", value))
                })?;
            }
            "data_file" => {
                let trimmed = value.trim();
                self.data_file = if trimmed.is_empty() || trimmed == "none" {
                    None
                } else {
                    Some(PathBuf::from(trimmed))
                };
            }
            other => {
                return Err(ProfileError::Config(format!(
                    "unknown setting `{}` (expected one of: {})",
                    other,
                    Self::KEYS.join(", ")
                )))
            }
        }
        Ok(())
    }

    /// Returns `(key, value)` pairs for display.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("country_display", self.country_display.clone()),
            ("mask", self.mask.clone()),
            ("require_non_empty", self.require_non_empty.to_string()),
            ("save_retries", self.save_retries.to_string()),
            (
                "data_file",
                self.data_file
                    .as_ref()
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "(default)".into()),
            ),
        ]
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self> {
        Self::with_base_dir(PathResolver::resolve_base(None))
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self> {
        ensure_dir(&base)?;
        ensure_dir(&PathResolver::config_dir_in(&base))?;
        Ok(Self {
            path: PathResolver::config_file_in(&base),
        })
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn load(&self) -> Result<Config> {
        if !self.path.exists() {
            return Ok(Config::default());
        }
        let data = fs::read_to_string(&self.path)?;
        serde_json::from_str(&data).map_err(|err| {
            ProfileError::Config(format!("{}: {}", self.path.display(), err))
        })
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        let json = serde_json::to_string_pretty(config)?;
        write_atomic(&self.path, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).unwrap();
        let config = manager.load().unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.country_display, "Perú");
        assert_eq!(config.save_retries, 1);
        assert!(!config.require_non_empty);
    }

    #[test]
    fn saved_settings_are_reloaded() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).unwrap();
        let mut config = Config::default();
        config.set("mask", "****").unwrap();
        config.set("require_non_empty", "yes").unwrap();
        config.set("save_retries", "3").unwrap();
        manager.save(&config).unwrap();

        let loaded = manager.load().unwrap();
        assert_eq!(loaded.mask, "****");
        assert!(loaded.require_non_empty);
        assert_eq!(loaded.save_retries, 3);
    }

    #[test]
    fn partial_files_fall_back_to_defaults() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).unwrap();
        fs::write(manager.path(), r#"{ "mask": "xx" }"#).unwrap();

        let loaded = manager.load().unwrap();
        assert_eq!(loaded.mask, "xx");
        assert_eq!(loaded.country_display, DEFAULT_COUNTRY_DISPLAY);
    }

    #[test]
    fn rejects_unknown_keys_and_bad_values() {
        let mut config = Config::default();
        assert!(config.set("theme", "dark").is_err());
        assert!(config.set("save_retries", "many").is_err());
        assert!(config.set("require_non_empty", "maybe").is_err());
        config.set("data_file", "none").unwrap();
        assert!(config.data_file.is_none());
    }
}
