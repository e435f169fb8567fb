//! Configuration file support.
//!
//! Settings are stored as versioned JSON. The file is optional: missing
//! sections and fields take their defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::keybindings::KeyBindings;
use crate::palette::{self, ClassPalette, Rgb};

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Get the display name for this log level.
    pub fn name(&self) -> &'static str {
        match self {
            LogLevel::Error => "Error",
            LogLevel::Warn => "Warn",
            LogLevel::Info => "Info",
            LogLevel::Debug => "Debug",
            LogLevel::Trace => "Trace",
        }
    }

    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version of the configuration file format
    pub version: u32,

    /// User preferences
    #[serde(default)]
    pub preferences: UserPreferences,

    /// Keybinding configuration
    #[serde(default)]
    pub keybindings: KeyBindingsConfig,

    /// Overlay colours
    #[serde(default)]
    pub colors: ColorsConfig,
}

/// User preferences section of the config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Width of the screen images are shrunk to fit
    #[serde(default = "default_screen_width")]
    pub screen_width: u32,

    /// Height of the screen images are shrunk to fit
    #[serde(default = "default_screen_height")]
    pub screen_height: u32,

    /// Number of classes when no names are given
    #[serde(default = "default_class_count")]
    pub default_class_count: u32,

    /// Output directory name created next to the images
    #[serde(default = "default_output_dir_name")]
    pub output_dir_name: String,

    /// Longest wait for input per loop iteration, in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_screen_width() -> u32 {
    constants::DEFAULT_SCREEN_WIDTH
}

fn default_screen_height() -> u32 {
    constants::DEFAULT_SCREEN_HEIGHT
}

fn default_class_count() -> u32 {
    constants::DEFAULT_CLASS_COUNT
}

fn default_output_dir_name() -> String {
    constants::DEFAULT_OUTPUT_DIR_NAME.to_string()
}

fn default_poll_interval_ms() -> u64 {
    constants::DEFAULT_POLL_INTERVAL_MS
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            screen_width: default_screen_width(),
            screen_height: default_screen_height(),
            default_class_count: default_class_count(),
            output_dir_name: default_output_dir_name(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

/// Keybinding configuration section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBindingsConfig {
    pub previous_image: Vec<char>,
    pub next_image: Vec<char>,
    pub previous_class: Vec<char>,
    pub next_class: Vec<char>,
    pub new_box: Vec<char>,
}

impl Default for KeyBindingsConfig {
    fn default() -> Self {
        Self::from(&KeyBindings::default())
    }
}

impl From<&KeyBindings> for KeyBindingsConfig {
    fn from(bindings: &KeyBindings) -> Self {
        Self {
            previous_image: bindings.previous_image.clone(),
            next_image: bindings.next_image.clone(),
            previous_class: bindings.previous_class.clone(),
            next_class: bindings.next_class.clone(),
            new_box: bindings.new_box.clone(),
        }
    }
}

impl KeyBindingsConfig {
    /// Convert back to KeyBindings, warning about keys bound twice.
    pub fn to_keybindings(&self) -> KeyBindings {
        let bindings = KeyBindings {
            previous_image: self.previous_image.clone(),
            next_image: self.next_image.clone(),
            previous_class: self.previous_class.clone(),
            next_class: self.next_class.clone(),
            new_box: self.new_box.clone(),
        };
        for (key, first, second) in bindings.conflicts() {
            log::warn!(
                "Key '{}' is bound to both '{}' and '{}'; '{}' wins",
                key,
                first.name(),
                second.name(),
                first.name()
            );
        }
        bindings
    }
}

/// Explicit colour of one class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassColorConfig {
    pub id: u32,
    pub color: Rgb,
}

/// Colour section of the config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorsConfig {
    #[serde(default)]
    pub classes: Vec<ClassColorConfig>,
    #[serde(default = "default_unknown_color")]
    pub unknown: Rgb,
    #[serde(default = "default_selected_color")]
    pub selected: Rgb,
    #[serde(default = "default_editing_color")]
    pub editing: Rgb,
    #[serde(default = "default_preview_color")]
    pub preview: Rgb,
}

fn default_unknown_color() -> Rgb {
    palette::MAGENTA
}

fn default_selected_color() -> Rgb {
    palette::WHITE
}

fn default_editing_color() -> Rgb {
    palette::ORANGE
}

fn default_preview_color() -> Rgb {
    palette::BRIGHT_GREEN
}

impl Default for ColorsConfig {
    fn default() -> Self {
        Self::from(&ClassPalette::default())
    }
}

impl From<&ClassPalette> for ColorsConfig {
    fn from(palette: &ClassPalette) -> Self {
        Self {
            classes: palette
                .entries()
                .into_iter()
                .map(|(id, color)| ClassColorConfig { id, color })
                .collect(),
            unknown: palette.unknown,
            selected: palette.selected,
            editing: palette.editing,
            preview: palette.preview,
        }
    }
}

impl ColorsConfig {
    pub fn to_palette(&self) -> ClassPalette {
        let mut palette = ClassPalette::empty(self.unknown);
        for entry in &self.classes {
            palette.set_class(entry.id, entry.color);
        }
        palette.selected = self.selected;
        palette.editing = self.editing;
        palette.preview = self.preview;
        palette
    }
}

impl AppConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            preferences: UserPreferences::default(),
            keybindings: KeyBindingsConfig::default(),
            colors: ColorsConfig::default(),
        }
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        // Validate version compatibility
        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }

        Ok(config)
    }

    /// Get the default filename for the config file.
    pub fn default_filename() -> &'static str {
        "boxfix-config.json"
    }

    /// Get the default config file path.
    pub fn default_path() -> Option<PathBuf> {
        // Try to use XDG config directory, fall back to home directory
        if let Some(config_dir) = dirs::config_dir() {
            Some(config_dir.join("boxfix").join(Self::default_filename()))
        } else {
            dirs::home_dir().map(|home_dir| {
                home_dir
                    .join(".config")
                    .join("boxfix")
                    .join(Self::default_filename())
            })
        }
    }

    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Try to load configuration from the default path.
    /// Returns None if the file doesn't exist or can't be read.
    pub fn load_from_default_path() -> Option<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            log::debug!("No config file found at {:?}", path);
            return None;
        }

        match Self::load(&path) {
            Ok(config) => Some(config),
            Err(e) => {
                log::warn!("Failed to load config file {:?}: {}", path, e);
                None
            }
        }
    }

    /// Save configuration to a file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = self.to_json()?;
        std::fs::write(path, json)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Save configuration to the default path.
    pub fn save_to_default_path(&self) -> Result<PathBuf, ConfigError> {
        let path = Self::default_path().ok_or_else(|| {
            ConfigError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine config directory",
            ))
        })?;
        self.save(&path)?;
        Ok(path)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Configuration version is newer than supported
    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    /// I/O error when reading/writing config
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.version, CONFIG_VERSION);
        assert_eq!(config.preferences.screen_width, 2560);
        assert_eq!(config.preferences.screen_height, 1440);
        assert_eq!(config.preferences.default_class_count, 2);
        assert_eq!(config.preferences.output_dir_name, "annotations");
        assert_eq!(config.keybindings.next_image, vec!['p', 'm']);
        assert_eq!(config.colors.to_palette(), ClassPalette::default());
    }

    #[test]
    fn test_json_preserves_settings() {
        let mut config = AppConfig::default();
        config.preferences.log_level = LogLevel::Debug;
        config.keybindings.new_box = vec!['x'];
        config.colors.classes.push(ClassColorConfig {
            id: 5,
            color: [1, 2, 3],
        });

        let json = config.to_json().unwrap();
        let loaded = AppConfig::from_json(&json).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.colors.to_palette().color_for(5), [1, 2, 3]);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config = AppConfig::from_json(r#"{"version": 1, "preferences": {"log_level": "warn"}}"#)
            .unwrap();
        assert_eq!(config.preferences.log_level, LogLevel::Warn);
        assert_eq!(config.preferences.poll_interval_ms, 10);
        assert_eq!(config.keybindings, KeyBindingsConfig::default());
    }

    #[test]
    fn test_rejects_newer_version() {
        let err = AppConfig::from_json(r#"{"version": 99}"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::VersionTooNew {
                file_version: 99,
                ..
            }
        ));
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("boxfix-config.json");
        let config = AppConfig::default();
        config.save(&path).unwrap();
        assert_eq!(AppConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_log_level_filter() {
        assert_eq!(LogLevel::Trace.to_level_filter(), log::LevelFilter::Trace);
        assert_eq!(LogLevel::default().name(), "Info");
    }
}
