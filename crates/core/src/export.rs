//! Mask export for the inpainting service.
//!
//! The working selection layer lives at canvas resolution; the inpainting
//! model needs a mask at the resolution of the original photo. Export runs
//! three fused per-pixel steps:
//!
//! 1. **Nearest-neighbour resampling** to the original size. No smoothing:
//!    interpolated edge alpha would move the boundary once thresholded.
//! 2. **Binarization** on alpha: painted iff `alpha > MASK_THRESHOLD`.
//! 3. **Inversion**: painted pixels become `0` (regenerate), everything else
//!    `255` (preserve).
//!
//! The result is written with `R = G = B = A`, so the mask reads the same
//! whether the consumer samples its alpha or its luminance, and is encoded as
//! PNG for transport.

use crate::error::{AppError, Result};
use crate::geometry::ScaleContext;
use crate::layer::SelectionLayer;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::{ImageFormat, Rgba, RgbaImage};
use log::info;
use std::io::Cursor;
use std::path::Path;

/// Alpha strictly above this value counts as selected.
pub const MASK_THRESHOLD: u8 = 128;
/// Exported value instructing the model to regenerate a pixel.
pub const REGENERATE: u8 = 0;
/// Exported value instructing the model to keep a pixel.
pub const PRESERVE: u8 = 255;

/// A binary, polarity-inverted mask at original image resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedMask {
    image: RgbaImage,
}

impl ExportedMask {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Mask value at `(x, y)`: [`REGENERATE`] or [`PRESERVE`].
    pub fn value_at(&self, x: u32, y: u32) -> Option<u8> {
        self.image.get_pixel_checked(x, y).map(|p| p.0[3])
    }

    /// Number of pixels the model is asked to regenerate.
    pub fn regenerate_count(&self) -> usize {
        self.image.pixels().filter(|p| p.0[3] == REGENERATE).count()
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Encodes the mask as a PNG file in memory.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer: Vec<u8> = Vec::new();
        self.image
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .map_err(|e| AppError::image(format!("Failed to encode mask: {}", e)))?;
        Ok(buffer)
    }

    /// Encodes the mask as a Base64 PNG string, ready for an API payload.
    pub fn to_base64_png(&self) -> Result<String> {
        Ok(BASE64.encode(self.to_png_bytes()?))
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_png_bytes()?)?;
        Ok(())
    }
}

/// Converts selection layers into exported masks.
pub struct MaskExporter;

impl MaskExporter {
    /// Exports `layer` at the original image size recorded in `context`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::DimensionMismatch`] when the layer was not painted
    /// on the working canvas `context` describes (e.g. a stale layer from
    /// before a resize). Mismatched buffers are never resampled.
    pub fn export_for(layer: &SelectionLayer, context: &ScaleContext) -> Result<ExportedMask> {
        if layer.dimensions() != context.working {
            return Err(AppError::DimensionMismatch {
                layer: layer.dimensions(),
                expected: context.working,
            });
        }
        Self::export(layer, context.original)
    }

    /// Resamples, binarizes and inverts `layer` into a mask of size `original`.
    ///
    /// An unpainted layer yields an all-[`PRESERVE`] mask; rejecting an empty
    /// selection is the caller's job.
    pub fn export(layer: &SelectionLayer, original: (u32, u32)) -> Result<ExportedMask> {
        let (src_w, src_h) = layer.dimensions();
        let (dst_w, dst_h) = original;
        if src_w == 0 || src_h == 0 || dst_w == 0 || dst_h == 0 {
            return Err(AppError::image(format!(
                "Cannot resample {}x{} selection to {}x{}",
                src_w, src_h, dst_w, dst_h
            )));
        }

        let columns = nearest_indices(src_w, dst_w);
        let rows = nearest_indices(src_h, dst_h);
        let source = layer.as_image();

        let image = RgbaImage::from_fn(dst_w, dst_h, |x, y| {
            let alpha = source.get_pixel(columns[x as usize], rows[y as usize])[3];
            let value = if alpha > MASK_THRESHOLD { REGENERATE } else { PRESERVE };
            Rgba([value, value, value, value])
        });

        let mask = ExportedMask { image };
        info!(
            "Exported {}x{} mask from {}x{} selection ({} pixels to regenerate)",
            dst_w,
            dst_h,
            src_w,
            src_h,
            mask.regenerate_count()
        );
        Ok(mask)
    }

    /// Runs [`export_for`](Self::export_for) on a blocking worker thread.
    ///
    /// `layer` is a snapshot: strokes painted while the export runs go to the
    /// store's own copy and never show up half-way in this mask.
    pub async fn export_async(
        layer: SelectionLayer,
        context: ScaleContext,
    ) -> Result<ExportedMask> {
        tokio::task::spawn_blocking(move || Self::export_for(&layer, &context))
            .await
            .map_err(|e| AppError::Export(e.to_string()))?
    }
}

/// Source index for each destination index under nearest-neighbour sampling.
///
/// Destination pixel `d` samples at its centre, `(d + 0.5) * src / dst`,
/// computed in integers so equal inputs always pick the same source pixel.
fn nearest_indices(src_len: u32, dst_len: u32) -> Vec<u32> {
    let (src, dst) = (src_len as u64, dst_len as u64);
    (0..dst)
        .map(|d| (((2 * d + 1) * src) / (2 * dst)).min(src - 1) as u32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brush::{stamp, BrushConfig, Polarity, Tint};
    use crate::geometry::Point;

    fn single_pixel_layer(size: u32, x: u32, y: u32) -> SelectionLayer {
        let white = Tint::new(255, 255, 255, 255).unwrap();
        let brush = BrushConfig::new(0.5, Polarity::Add).with_tint(white);
        let center = Point::new(x as f32 + 0.5, y as f32 + 0.5);
        stamp(SelectionLayer::new(size, size), center, &brush)
    }

    #[test]
    fn nearest_indices_scale_up_and_down() {
        assert_eq!(nearest_indices(2, 6), vec![0, 0, 0, 1, 1, 1]);
        assert_eq!(nearest_indices(6, 2), vec![1, 4]);
        assert_eq!(nearest_indices(3, 3), vec![0, 1, 2]);
    }

    #[test]
    fn single_pixel_upscales_to_a_block() {
        let layer = single_pixel_layer(100, 50, 50);
        assert_eq!(layer.painted_pixel_count(), 1);

        let mask = MaskExporter::export(&layer, (1000, 1000)).unwrap();
        assert_eq!(mask.dimensions(), (1000, 1000));
        assert_eq!(mask.regenerate_count(), 100);
        for (x, y, p) in mask.as_image().enumerate_pixels() {
            let inside = (500..510).contains(&x) && (500..510).contains(&y);
            let expected = if inside { REGENERATE } else { PRESERVE };
            assert_eq!(p.0, [expected; 4], "pixel ({x}, {y})");
        }
    }

    #[test]
    fn empty_layer_preserves_everything() {
        let mask = MaskExporter::export(&SelectionLayer::new(40, 30), (400, 300)).unwrap();
        assert_eq!(mask.regenerate_count(), 0);
        assert!(mask.as_image().pixels().all(|p| p.0 == [PRESERVE; 4]));
    }

    #[test]
    fn alpha_just_above_threshold_is_selected() {
        let at = BrushConfig::new(100.0, Polarity::Add).with_tint(Tint::new(0, 0, 0, 129).unwrap());
        let layer = stamp(SelectionLayer::new(4, 4), Point::new(2.0, 2.0), &at);
        let mask = MaskExporter::export(&layer, (4, 4)).unwrap();
        assert_eq!(mask.regenerate_count(), 16);
    }

    #[test]
    fn stale_layer_is_rejected() {
        let context = ScaleContext {
            working_scale: 0.5,
            working: (50, 40),
            original: (100, 80),
        };
        let err = MaskExporter::export_for(&SelectionLayer::new(60, 40), &context).unwrap_err();
        assert!(matches!(
            err,
            AppError::DimensionMismatch { layer: (60, 40), expected: (50, 40) }
        ));
    }

    #[test]
    fn png_payload_decodes_to_the_mask() {
        let mask = MaskExporter::export(&single_pixel_layer(8, 2, 3), (16, 16)).unwrap();
        let decoded = image::load_from_memory(&mask.to_png_bytes().unwrap()).unwrap().to_rgba8();
        assert_eq!(&decoded, mask.as_image());

        let b64 = mask.to_base64_png().unwrap();
        assert_eq!(BASE64.decode(b64).unwrap(), mask.to_png_bytes().unwrap());
    }

    #[tokio::test]
    async fn background_export_matches_foreground() {
        let layer = single_pixel_layer(20, 4, 4);
        let context = ScaleContext {
            working_scale: 0.5,
            working: (20, 20),
            original: (40, 40),
        };
        let foreground = MaskExporter::export_for(&layer, &context).unwrap();
        let background = MaskExporter::export_async(layer, context).await.unwrap();
        assert_eq!(foreground, background);
    }
}
