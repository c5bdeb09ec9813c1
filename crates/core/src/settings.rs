//! User settings persistence.
//!
//! This module handles loading and saving user preferences:
//! the brush the session starts with and the default generation parameters.

use crate::brush::{clamp_diameter, BrushConfig, Polarity, DEFAULT_DIAMETER};
use crate::error::Result;
use crate::request::InpaintParams;
use directories::ProjectDirs;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Checkpoints offered for inpainting.
pub const AVAILABLE_MODELS: &[&str] = &[
    "SD1.5/realisticVisionV60B1_v51VAE.safetensors",
    "SD1.5/dreamshaper_8.safetensors",
    "SD1.5/DreamShaper.safetensors",
    "SD1.5/openjourney_V4.ckpt",
];

/// User-configurable settings persisted between sessions.
///
/// Settings are stored as JSON in the user's config directory
/// (e.g., `~/.config/inpaint-mask/settings.json` on Linux).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Brush diameter in pixels.
    #[serde(default = "default_diameter")]
    pub brush_diameter: f32,
    #[serde(default)]
    pub polarity: Polarity,
    #[serde(default)]
    pub params: InpaintParams,
}

fn default_diameter() -> f32 {
    DEFAULT_DIAMETER
}

impl Settings {
    /// Returns the path to the settings file.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "inpaint-mask").map(|dirs| {
            let config_dir = dirs.config_dir();
            if !config_dir.exists() {
                let _ = fs::create_dir_all(config_dir);
            }
            config_dir.join("settings.json")
        })
    }

    /// Loads settings from the user config directory, falling back to defaults.
    pub fn load(default_model: &str) -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path, default_model),
            None => Self::with_defaults(default_model),
        }
    }

    /// Loads settings from `path`; a missing or unreadable file yields defaults.
    pub fn load_from(path: &Path, default_model: &str) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(_) => return Self::with_defaults(default_model),
        };

        match serde_json::from_str::<Settings>(&content) {
            Ok(mut settings) => {
                settings.brush_diameter = clamp_diameter(settings.brush_diameter);
                settings
            }
            Err(e) => {
                warn!("Ignoring unreadable settings file {}: {}", path.display(), e);
                Self::with_defaults(default_model)
            }
        }
    }

    /// Creates default settings with the specified model.
    pub fn with_defaults(model: &str) -> Self {
        Self {
            brush_diameter: DEFAULT_DIAMETER,
            polarity: Polarity::Add,
            params: InpaintParams {
                ckpt_name: model.to_string(),
                ..InpaintParams::default()
            },
        }
    }

    /// Persists settings to the user config directory.
    ///
    /// # Errors
    /// Returns an error if serialization or file writing fails.
    pub fn save(&self) -> Result<()> {
        if let Some(path) = Self::config_path() {
            self.save_to(&path)?;
        }
        Ok(())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// The brush a new session should start with.
    pub fn brush(&self) -> BrushConfig {
        BrushConfig::with_diameter(self.brush_diameter, self.polarity)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::with_defaults(crate::config::DEFAULT_MODEL)
    }
}
