use crate::error::{AppError, Result};
use crate::geometry::ContainerSize;
use dotenvy::dotenv;
use std::env;

/// Checkpoint used when `INPAINT_MODEL` is not set.
pub const DEFAULT_MODEL: &str = "SD1.5/DreamShaper.safetensors";

#[derive(Clone, Debug)]
pub struct Config {
    pub model_name: String,
    pub container: ContainerSize,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load .env file if it exists, ignore if it doesn't
        let _ = dotenv();

        let model_name = env::var("INPAINT_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let width = read_dimension("INPAINT_CONTAINER_WIDTH", 800.0)?;
        let height = read_dimension("INPAINT_CONTAINER_HEIGHT", 500.0)?;

        Ok(Self {
            model_name,
            container: ContainerSize::new(width, height),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_name: DEFAULT_MODEL.to_string(),
            container: ContainerSize::new(800.0, 500.0),
        }
    }
}

fn read_dimension(key: &str, default: f32) -> Result<f32> {
    match env::var(key) {
        Ok(raw) => parse_dimension(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_dimension(key: &str, raw: &str) -> Result<f32> {
    let value: f32 = raw
        .trim()
        .parse()
        .map_err(|_| AppError::config(format!("{} must be a number, got '{}'", key, raw)))?;

    if !value.is_finite() || value < 0.0 {
        return Err(AppError::config(format!("{} must be a non-negative number", key)));
    }
    Ok(value)
}
