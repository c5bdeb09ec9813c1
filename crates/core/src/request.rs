//! Payload for the generative inpainting service.
//!
//! Only the body is built here; how it reaches the service is up to the caller.
//! Both the photo and the mask travel as Base64 PNG strings.

use crate::config::DEFAULT_MODEL;
use crate::error::{AppError, Result};
use crate::export::ExportedMask;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};
use std::io::Cursor;

/// Whether the service refines the mask edge before blending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FineEdge {
    #[default]
    Enable,
    Disable,
}

/// Generation settings sent alongside the prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InpaintParams {
    /// Model checkpoint, one of [`AVAILABLE_MODELS`](crate::settings::AVAILABLE_MODELS).
    pub ckpt_name: String,
    pub negative_prompt: String,
    pub fine_edge: FineEdge,
    /// Pixels the service grows the mask by before inpainting.
    pub grow_size: u32,
    pub edge_strength: f32,
    pub color_strength: f32,
    pub inpaint_strength: f32,
    /// `-1` lets the service pick a random seed.
    pub seed: i64,
    pub steps: u32,
    pub cfg: f32,
    pub sampler_name: String,
    pub scheduler: String,
}

impl Default for InpaintParams {
    fn default() -> Self {
        Self {
            ckpt_name: DEFAULT_MODEL.to_string(),
            negative_prompt: String::new(),
            fine_edge: FineEdge::Enable,
            grow_size: 15,
            edge_strength: 0.55,
            color_strength: 0.55,
            inpaint_strength: 1.0,
            seed: -1,
            steps: 20,
            cfg: 7.0,
            sampler_name: "euler_ancestral".to_string(),
            scheduler: "karras".to_string(),
        }
    }
}

impl InpaintParams {
    /// Checks the ranges the service accepts.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("edge_strength", self.edge_strength),
            ("color_strength", self.color_strength),
            ("inpaint_strength", self.inpaint_strength),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(AppError::parameter(format!(
                    "{} must be within 0..=1, got {}",
                    name, value
                )));
            }
        }
        if self.steps == 0 {
            return Err(AppError::parameter("steps must be at least 1"));
        }
        if !(self.cfg.is_finite() && self.cfg > 0.0) {
            return Err(AppError::parameter(format!("cfg must be positive, got {}", self.cfg)));
        }
        if self.ckpt_name.trim().is_empty() {
            return Err(AppError::parameter("ckpt_name must not be empty"));
        }
        Ok(())
    }
}

/// JSON body for one inpainting call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InpaintRequest {
    #[serde(rename = "x")]
    pub prompt: String,
    #[serde(flatten)]
    pub params: InpaintParams,
    /// Base64 PNG of the original photo.
    pub image: String,
    /// Base64 PNG of the exported mask.
    pub mask: String,
}

impl InpaintRequest {
    /// Assembles a request from an already exported mask.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::MissingPrompt`] for a blank prompt,
    /// [`AppError::InvalidParameter`] for out-of-range params and
    /// [`AppError::ImageProcessing`] if PNG encoding fails.
    pub fn new(
        prompt: &str,
        params: InpaintParams,
        original: &DynamicImage,
        mask: &ExportedMask,
    ) -> Result<Self> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(AppError::MissingPrompt);
        }
        params.validate()?;

        if mask.dimensions() != (original.width(), original.height()) {
            return Err(AppError::MaskSizeMismatch {
                mask: mask.dimensions(),
                image: (original.width(), original.height()),
            });
        }

        Ok(Self {
            prompt: prompt.to_string(),
            params,
            image: encode_to_base64_png(original)?,
            mask: mask.to_base64_png()?,
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Encodes an image to a Base64 PNG string.
pub fn encode_to_base64_png(image: &DynamicImage) -> Result<String> {
    let mut buffer: Vec<u8> = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(|e| AppError::image(format!("Failed to encode image: {}", e)))?;
    Ok(BASE64.encode(buffer))
}
