use crate::domain::ViewerSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadSettingsError {
    #[error("failed to read settings: {0}")]
    Read(#[from] io::Error),

    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum SaveSettingsError {
    #[error("failed to encode settings: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to write settings: {0}")]
    Write(#[from] io::Error),
}

fn settings_path(state_dir: &Path) -> PathBuf {
    state_dir.join("settings.json")
}

pub fn load_settings(state_dir: &Path) -> Result<ViewerSettings, LoadSettingsError> {
    let path = settings_path(state_dir);
    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            return Ok(ViewerSettings::default());
        }
        Err(error) => return Err(error.into()),
    };

    let file: SettingsFile = serde_json::from_str(&raw)?;
    Ok(file.into_settings())
}

pub fn save_settings(state_dir: &Path, settings: &ViewerSettings) -> Result<(), SaveSettingsError> {
    fs::create_dir_all(state_dir)?;
    let path = settings_path(state_dir);
    let tmp = path.with_extension("json.tmp");
    let text = serde_json::to_string_pretty(&SettingsFile::from_settings(settings))?;
    fs::write(&tmp, text)?;
    fs::rename(tmp, path)?;
    Ok(())
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct SettingsFile {
    version: u32,
    library_size_gb: Option<f64>,
    /// Pre-rename key for the library capacity; read when `library_size_gb`
    /// is absent, never written back.
    #[serde(skip_serializing_if = "Option::is_none")]
    cache_size_gb: Option<f64>,
    auto_load_adjacent_archives: Option<bool>,
    max_history_items: Option<usize>,
    auto_load_from_clipboard: Option<bool>,
    upscale_small_images: Option<bool>,
}

impl SettingsFile {
    fn from_settings(settings: &ViewerSettings) -> Self {
        Self {
            version: 1,
            library_size_gb: Some(settings.library_size_gb),
            cache_size_gb: None,
            auto_load_adjacent_archives: Some(settings.auto_load_adjacent_archives),
            max_history_items: Some(settings.max_history_items),
            auto_load_from_clipboard: Some(settings.auto_load_from_clipboard),
            upscale_small_images: Some(settings.upscale_small_images),
        }
    }

    fn into_settings(self) -> ViewerSettings {
        let defaults = ViewerSettings::default();
        ViewerSettings {
            library_size_gb: self
                .library_size_gb
                .or(self.cache_size_gb)
                .unwrap_or(defaults.library_size_gb),
            auto_load_adjacent_archives: self
                .auto_load_adjacent_archives
                .unwrap_or(defaults.auto_load_adjacent_archives),
            max_history_items: self.max_history_items.unwrap_or(defaults.max_history_items),
            auto_load_from_clipboard: self
                .auto_load_from_clipboard
                .unwrap_or(defaults.auto_load_from_clipboard),
            upscale_small_images: self
                .upscale_small_images
                .unwrap_or(defaults.upscale_small_images),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempdir().expect("tempdir");
        let settings = load_settings(dir.path()).expect("load");
        assert_eq!(settings, ViewerSettings::default());
    }

    #[test]
    fn settings_round_trip() {
        let dir = tempdir().expect("tempdir");
        let settings = ViewerSettings {
            library_size_gb: 25.0,
            auto_load_adjacent_archives: false,
            max_history_items: 50,
            auto_load_from_clipboard: true,
            upscale_small_images: true,
        };

        save_settings(dir.path(), &settings).expect("save");
        let loaded = load_settings(dir.path()).expect("load");
        assert_eq!(loaded, settings);
    }

    #[test]
    fn legacy_cache_size_key_is_honored_when_new_key_is_absent() {
        let dir = tempdir().expect("tempdir");
        let raw = r#"{"version":1,"cache_size_gb":4.5,"library_size_gb":null,
            "auto_load_adjacent_archives":null,"max_history_items":null,
            "auto_load_from_clipboard":null,"upscale_small_images":null}"#;
        std::fs::write(dir.path().join("settings.json"), raw).expect("write");

        let settings = load_settings(dir.path()).expect("load");
        assert!((settings.library_size_gb - 4.5).abs() < f64::EPSILON);
    }

    #[test]
    fn new_key_wins_over_the_legacy_key() {
        let dir = tempdir().expect("tempdir");
        let raw = r#"{"version":1,"cache_size_gb":4.5,"library_size_gb":8.0,
            "auto_load_adjacent_archives":null,"max_history_items":null,
            "auto_load_from_clipboard":null,"upscale_small_images":null}"#;
        std::fs::write(dir.path().join("settings.json"), raw).expect("write");

        let settings = load_settings(dir.path()).expect("load");
        assert!((settings.library_size_gb - 8.0).abs() < f64::EPSILON);
    }
}
