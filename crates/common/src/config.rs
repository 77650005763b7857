//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{TrimcropError, TrimcropResult};

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Editing session defaults.
    #[serde(default)]
    pub editor: EditorDefaults,

    /// Conversion engine settings.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Defaults applied to every new editing session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorDefaults {
    /// Minimum trim range span in seconds.
    pub min_span_secs: f64,

    /// Crop rectangles thinner than this (percent of frame) revert to full frame.
    pub min_crop_percent: f64,

    /// Target output size in megabytes.
    pub default_target_size_mb: u32,

    /// Window used to collapse repeated automatic export triggers.
    pub auto_export_debounce_ms: u64,
}

/// Settings for the ffmpeg-backed conversion engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// ffmpeg executable name or path.
    pub ffmpeg_bin: String,

    /// ffprobe executable name or path.
    pub ffprobe_bin: String,

    /// Output directory override. When unset the user video directory is used.
    pub output_dir: Option<PathBuf>,

    /// Output width; height follows the aspect ratio.
    pub scale_width: u32,

    /// Frame size assumed for crop conversion when the source cannot be probed.
    pub reference_width: u32,
    pub reference_height: u32,

    /// Crops smaller than this many pixels on either side are skipped.
    pub min_crop_pixels: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trimcrop=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,
}

impl Default for EditorDefaults {
    fn default() -> Self {
        Self {
            min_span_secs: 0.5,
            min_crop_percent: 1.0,
            default_target_size_mb: 8,
            auto_export_debounce_ms: 300,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ffmpeg_bin: "ffmpeg".to_string(),
            ffprobe_bin: "ffprobe".to_string(),
            output_dir: None,
            scale_width: 1280,
            reference_width: 1280,
            reference_height: 720,
            min_crop_pixels: 16,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl EditorDefaults {
    /// Debounce window as a duration.
    pub fn auto_export_debounce(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.auto_export_debounce_ms)
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match Self::load_from(&config_path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!("Failed to load config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Load and validate config from an explicit path.
    pub fn load_from(path: &Path) -> TrimcropResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }

    /// Reject values the editor cannot honor.
    pub fn validate(&self) -> TrimcropResult<()> {
        let editor = &self.editor;
        if editor.default_target_size_mb == 0 {
            return Err(TrimcropError::config("default_target_size_mb must be > 0"));
        }
        if !(editor.min_span_secs > 0.0) {
            return Err(TrimcropError::config("min_span_secs must be > 0"));
        }
        if !(editor.min_crop_percent > 0.0 && editor.min_crop_percent < 100.0) {
            return Err(TrimcropError::config(
                "min_crop_percent must be within (0, 100)",
            ));
        }
        if self.engine.scale_width == 0 {
            return Err(TrimcropError::config("scale_width must be > 0"));
        }
        Ok(())
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("trimcrop").join("config.json")
}

/// The user's video directory, when one can be found.
pub fn default_video_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("XDG_VIDEOS_DIR") {
        return Some(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").ok()?;
    let videos = PathBuf::from(home).join("Videos");
    videos.is_dir().then_some(videos)
}
