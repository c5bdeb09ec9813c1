//! The persistent selection raster and its single-writer store.
//!
//! A [`SelectionLayer`] is an RGBA buffer at working-canvas resolution whose
//! alpha channel is the only carrier of "selected" state. The pixel data sits
//! behind an [`Arc`]: cloning a layer is a cheap snapshot, and the rasterizer
//! goes through [`Arc::make_mut`], so a snapshot held by an in-flight export
//! is copied before it would be written to. Readers therefore only ever see a
//! complete layer version.

use image::RgbaImage;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct SelectionLayer {
    pixels: Arc<RgbaImage>,
}

impl Default for SelectionLayer {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

impl SelectionLayer {
    /// Creates a fully unselected (all-zero) layer.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: Arc::new(RgbaImage::new(width, height)),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Alpha at `(x, y)`, or `None` outside the layer.
    pub fn alpha_at(&self, x: u32, y: u32) -> Option<u8> {
        self.pixels.get_pixel_checked(x, y).map(|p| p.0[3])
    }

    /// Whether any pixel carries selection alpha.
    pub fn has_painted_pixels(&self) -> bool {
        self.pixels.pixels().any(|p| p.0[3] > 0)
    }

    pub fn painted_pixel_count(&self) -> usize {
        self.pixels.pixels().filter(|p| p.0[3] > 0).count()
    }

    /// Whether both layers still point at the same pixel buffer.
    pub fn shares_buffer_with(&self, other: &SelectionLayer) -> bool {
        Arc::ptr_eq(&self.pixels, &other.pixels)
    }

    /// Write access for the rasterizer; copies the buffer first if a snapshot shares it.
    pub(crate) fn pixels_mut(&mut self) -> &mut RgbaImage {
        Arc::make_mut(&mut self.pixels)
    }
}

/// Owns the authoritative selection layer.
///
/// Every mutation bumps [`version`](Self::version), so collaborators can tell
/// whether the layer changed since they last rendered or exported it.
#[derive(Debug, Default)]
pub struct SelectionLayerStore {
    current: SelectionLayer,
    version: u64,
}

impl SelectionLayerStore {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            current: SelectionLayer::new(width, height),
            version: 0,
        }
    }

    pub fn current(&self) -> &SelectionLayer {
        &self.current
    }

    /// A read-only copy of the current version, safe to hand to another thread.
    pub fn snapshot(&self) -> SelectionLayer {
        self.current.clone()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Publishes `layer` as the new authoritative version.
    pub fn replace(&mut self, layer: SelectionLayer) {
        self.current = layer;
        self.version += 1;
    }

    /// Resets to an all-zero layer of the given size.
    pub fn clear(&mut self, width: u32, height: u32) -> &SelectionLayer {
        self.replace(SelectionLayer::new(width, height));
        &self.current
    }

    /// Runs `edit` on the current layer by value and publishes its result.
    ///
    /// The layer is moved out rather than cloned so the rasterizer mutates the
    /// buffer in place unless a snapshot elsewhere still shares it.
    pub fn update(&mut self, edit: impl FnOnce(SelectionLayer) -> SelectionLayer) {
        let layer = std::mem::take(&mut self.current);
        self.replace(edit(layer));
    }
}
