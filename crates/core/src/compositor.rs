//! Feedback view: the working base image with the selection drawn on top.

use crate::error::{AppError, Result};
use crate::layer::SelectionLayer;
use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbaImage};

pub struct DisplayCompositor;

impl DisplayCompositor {
    /// Scales the original photo down (or up) to the working canvas size.
    ///
    /// This is only for display, so it uses a smoothing filter; the mask path
    /// never goes through here.
    pub fn working_base(original: &DynamicImage, size: (u32, u32)) -> RgbaImage {
        original
            .resize_exact(size.0, size.1, FilterType::Triangle)
            .to_rgba8()
    }

    /// Draws `base`, then source-overs `layer` on top.
    ///
    /// The layer is only read.
    pub fn render(base: &RgbaImage, layer: &SelectionLayer) -> Result<RgbaImage> {
        if base.dimensions() != layer.dimensions() {
            return Err(AppError::DimensionMismatch {
                layer: layer.dimensions(),
                expected: base.dimensions(),
            });
        }

        let mut canvas = base.clone();
        imageops::overlay(&mut canvas, layer.as_image(), 0, 0);
        Ok(canvas)
    }
}
