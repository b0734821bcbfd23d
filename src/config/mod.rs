//! Application Configuration
//!
//! User settings and preferences stored in TOML format.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Main window settings
    pub window: WindowSettings,
    /// Image picker settings
    pub picker: PickerSettings,
    /// OCR engine settings
    pub recognition: RecognitionSettings,
}

/// Main window settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    /// Initial window width in points
    pub width: f32,
    /// Initial window height in points
    pub height: f32,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            width: 480.0,
            height: 760.0,
        }
    }
}

/// Image picker settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PickerSettings {
    /// Directory the picker opens in (home directory when unset)
    pub start_dir: Option<PathBuf>,
    /// Write the directory of the last picked image back to `start_dir`
    pub remember_last_dir: bool,
    /// List dot-files and dot-directories
    pub show_hidden: bool,
}

impl Default for PickerSettings {
    fn default() -> Self {
        Self {
            start_dir: None,
            remember_last_dir: true,
            show_hidden: false,
        }
    }
}

/// OCR engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionSettings {
    /// Override for the model cache directory
    pub models_dir: Option<PathBuf>,
    /// Never download missing models
    pub offline: bool,
    /// Larger images are downscaled to this size on their longest side
    pub max_image_dimension: u32,
}

impl Default for RecognitionSettings {
    fn default() -> Self {
        Self {
            models_dir: None,
            offline: false,
            max_image_dimension: 2560,
        }
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {:?}", path))?;
    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file {:?}", path))?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write config file {:?}", path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_app_config() {
        let config = AppConfig::default();

        assert!((config.window.width - 480.0).abs() < 0.01);
        assert!((config.window.height - 760.0).abs() < 0.01);

        assert!(config.picker.start_dir.is_none());
        assert!(config.picker.remember_last_dir);
        assert!(!config.picker.show_hidden);

        assert!(config.recognition.models_dir.is_none());
        assert!(!config.recognition.offline);
        assert_eq!(config.recognition.max_image_dimension, 2560);
    }

    #[test]
    fn test_config_with_custom_values() {
        let mut config = AppConfig::default();
        config.picker.start_dir = Some(PathBuf::from("/home/user/Pictures"));
        config.recognition.offline = true;
        config.recognition.max_image_dimension = 1024;

        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(parsed.picker.start_dir, Some(PathBuf::from("/home/user/Pictures")));
        assert!(parsed.recognition.offline);
        assert_eq!(parsed.recognition.max_image_dimension, 1024);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed: AppConfig = toml::from_str("[recognition]\noffline = true\n").unwrap();

        assert!(parsed.recognition.offline);
        assert_eq!(parsed.recognition.max_image_dimension, 2560);
        assert!(parsed.picker.remember_last_dir);
        assert!((parsed.window.width - 480.0).abs() < 0.01);
    }

    #[test]
    fn test_save_and_load_config() {
        let mut config = AppConfig::default();
        config.picker.show_hidden = true;

        let temp_file = NamedTempFile::new().unwrap();
        save_config(&config, temp_file.path()).unwrap();
        let loaded = load_config(temp_file.path()).unwrap();

        assert!(loaded.picker.show_hidden);
        assert_eq!(
            config.recognition.max_image_dimension,
            loaded.recognition.max_image_dimension
        );
    }

    #[test]
    fn test_save_config_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        save_config(&AppConfig::default(), &path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/path/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "this is not valid toml {{{{").unwrap();

        let result = load_config(temp_file.path());
        assert!(result.is_err());
    }
}
