//! Configuration loading and persistence.
//!
//! Settings live as JSON in the user's config directory (e.g.
//! `~/.config/cliplens/settings.json` on Linux); the OCR API key comes from
//! the environment (including `.env` files) so it never lands on disk.

use crate::error::{AppError, Result};
use directories::ProjectDirs;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

/// What the overlay shows for the current clipboard.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplayMode {
    /// No clipboard preview at all.
    Off,
    /// Full content: text verbatim, images downscaled.
    #[default]
    Content,
    /// Only the payload's type name ("Text", "Image", "Files").
    ContentType,
}

/// User-configurable settings persisted between sessions.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Virtual-key codes that must all be held for drag tracking to react.
    pub gate_keys: Vec<u32>,
    /// Overlay anchor offset from the cursor, in pixels.
    pub overlay_left: i32,
    pub overlay_top: i32,
    /// Anchor to the cursor rather than the screen origin.
    pub follow_mouse: bool,
    pub display_mode: DisplayMode,
    /// Opacity of the clipboard preview, 0..=1.
    pub clipboard_opacity: f32,
    /// Opacity of the in-progress drag rectangles, 0..=1.
    pub drag_area_opacity: f32,
    /// Weighted-luminance cutoff deciding white vs black preview text.
    pub font_color_threshold: i32,
    pub font_size: f32,
    pub overlay_fps: u32,
    /// Scale applied to clipboard images before they are painted.
    pub preview_scale: f32,
    /// OCR service endpoint receiving multipart image uploads.
    pub ocr_endpoint: String,
    /// Never persisted; loaded from `OCR_API_KEY`.
    #[serde(skip)]
    pub ocr_api_key: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            // Left Ctrl + Left Alt
            gate_keys: vec![0xA2, 0xA4],
            overlay_left: 16,
            overlay_top: 24,
            follow_mouse: true,
            display_mode: DisplayMode::default(),
            clipboard_opacity: 0.8,
            drag_area_opacity: 0.3,
            font_color_threshold: 1275,
            font_size: 14.0,
            overlay_fps: 60,
            preview_scale: 0.1,
            ocr_endpoint: "https://api.ocr.space/parse/image".to_string(),
            ocr_api_key: String::new(),
        }
    }
}

impl Config {
    /// Returns the path to the settings file, creating the config
    /// directory if it doesn't exist.
    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "cliplens").map(|dirs| {
            let config_dir = dirs.config_dir();
            if !config_dir.exists() {
                let _ = fs::create_dir_all(config_dir);
            }
            config_dir.join("settings.json")
        })
    }

    /// Loads settings from disk (falling back to defaults) and the OCR API
    /// key from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] when `OCR_API_KEY` is not set.
    pub fn load() -> Result<Self> {
        // Load .env file if it exists, ignore if it doesn't
        let _ = dotenv();

        let mut config = Self::config_path()
            .and_then(|path| fs::read_to_string(&path).ok())
            .and_then(|content| serde_json::from_str::<Self>(&content).ok())
            .unwrap_or_default();

        config.ocr_api_key = env::var("OCR_API_KEY").map_err(|_| {
            AppError::Config("OCR_API_KEY must be set in environment or .env file".to_string())
        })?;

        Ok(config)
    }

    /// Persists settings to disk. The API key is skipped by serde and
    /// stays in the environment.
    pub fn save(&self) -> Result<()> {
        if let Some(path) = Self::config_path() {
            let json = serde_json::to_string_pretty(self)?;
            fs::write(path, json)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_through_json() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back.gate_keys, config.gate_keys);
        assert_eq!(back.display_mode, DisplayMode::Content);
        assert_eq!(back.overlay_fps, config.overlay_fps);
    }

    #[test]
    fn partial_settings_fill_from_defaults() {
        let config: Config = serde_json::from_str(r#"{"overlay_fps": 30}"#).unwrap();
        assert_eq!(config.overlay_fps, 30);
        assert_eq!(config.preview_scale, Config::default().preview_scale);
    }
}
