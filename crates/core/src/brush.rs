//! Brush configuration and the circular stamp rasterizer.
//!
//! A stamp is a hard-edged filled disk: a pixel belongs to it when its centre
//! lies within `radius` of the stamp centre. Without anti-aliasing every
//! touched pixel ends at either the tint alpha or zero, so the exported mask
//! boundary follows the painted disk exactly.

use crate::error::{AppError, Result};
use crate::export::MASK_THRESHOLD;
use crate::geometry::Point;
use crate::layer::SelectionLayer;
use image::Rgba;
use serde::{Deserialize, Serialize};

/// Smallest brush diameter offered to the user.
pub const MIN_DIAMETER: f32 = 5.0;
/// Largest brush diameter offered to the user.
pub const MAX_DIAMETER: f32 = 100.0;
/// Brush diameter of a fresh session.
pub const DEFAULT_DIAMETER: f32 = 20.0;

/// Whether a stamp adds to or removes from the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    /// Source-over the tint onto the layer.
    #[default]
    Add,
    /// Destination-out: clear the disk to zero alpha.
    #[serde(alias = "erase")]
    Subtract,
}

/// Colour painted into the selection layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tint(Rgba<u8>);

impl Tint {
    /// Royal blue, translucent enough to see the photo through it.
    pub const DEFAULT: Tint = Tint(Rgba([65, 105, 225, 192]));

    /// Alpha must be above [`MASK_THRESHOLD`], otherwise painted pixels would
    /// binarize to "unselected".
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Result<Self> {
        if a <= MASK_THRESHOLD {
            return Err(AppError::InvalidTint(a));
        }
        Ok(Self(Rgba([r, g, b, a])))
    }

    pub fn rgba(&self) -> Rgba<u8> {
        self.0
    }

    pub fn alpha(&self) -> u8 {
        self.0[3]
    }
}

impl Default for Tint {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Brush state owned by the editor session; fixed for the duration of a stroke.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrushConfig {
    radius: f32,
    polarity: Polarity,
    tint: Tint,
}

impl BrushConfig {
    pub fn new(radius: f32, polarity: Polarity) -> Self {
        Self {
            radius,
            polarity,
            tint: Tint::DEFAULT,
        }
    }

    /// Builds a brush from a slider diameter, clamped to the offered range.
    pub fn with_diameter(diameter: f32, polarity: Polarity) -> Self {
        Self::new(clamp_diameter(diameter) / 2.0, polarity)
    }

    pub fn with_tint(mut self, tint: Tint) -> Self {
        self.tint = tint;
        self
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn diameter(&self) -> f32 {
        self.radius * 2.0
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    pub fn tint(&self) -> Tint {
        self.tint
    }

    pub fn set_diameter(&mut self, diameter: f32) {
        self.radius = clamp_diameter(diameter) / 2.0;
    }

    pub fn set_polarity(&mut self, polarity: Polarity) {
        self.polarity = polarity;
    }
}

impl Default for BrushConfig {
    fn default() -> Self {
        Self::with_diameter(DEFAULT_DIAMETER, Polarity::Add)
    }
}

/// Clamps a diameter into `MIN_DIAMETER..=MAX_DIAMETER`; NaN maps to the default.
pub fn clamp_diameter(diameter: f32) -> f32 {
    if diameter.is_nan() {
        return DEFAULT_DIAMETER;
    }
    diameter.clamp(MIN_DIAMETER, MAX_DIAMETER)
}

/// Renders one brush disk into `layer` and returns the new layer version.
///
/// The disk is clipped to the layer; centres and radii far outside it are
/// harmless. A non-positive or non-finite radius leaves the layer unchanged.
pub fn stamp(mut layer: SelectionLayer, center: Point, brush: &BrushConfig) -> SelectionLayer {
    let radius = brush.radius();
    if !(radius > 0.0 && radius.is_finite() && center.x.is_finite() && center.y.is_finite()) {
        return layer;
    }

    let (width, height) = layer.dimensions();
    if width == 0 || height == 0 {
        return layer;
    }

    // Pixel (x, y) has its centre at (x + 0.5, y + 0.5).
    let min_x = (center.x - radius - 0.5).floor().max(0.0);
    let min_y = (center.y - radius - 0.5).floor().max(0.0);
    let max_x = (center.x + radius - 0.5).ceil().min(width as f32 - 1.0);
    let max_y = (center.y + radius - 0.5).ceil().min(height as f32 - 1.0);
    if min_x > max_x || min_y > max_y {
        return layer;
    }

    let (min_x, max_x) = (min_x as u32, max_x as u32);
    let (min_y, max_y) = (min_y as u32, max_y as u32);
    let radius_sq = radius * radius;
    let tint = brush.tint().rgba();
    let pixels = layer.pixels_mut();

    for y in min_y..=max_y {
        let dy = y as f32 + 0.5 - center.y;
        for x in min_x..=max_x {
            let dx = x as f32 + 0.5 - center.x;
            if dx * dx + dy * dy > radius_sq {
                continue;
            }
            let pixel = pixels.get_pixel_mut(x, y);
            *pixel = match brush.polarity() {
                Polarity::Add => add_over(tint, *pixel),
                Polarity::Subtract => Rgba([0, 0, 0, 0]),
            };
        }
    }

    layer
}

/// Source-over of `src` onto `dst`, with the result alpha capped at the larger
/// of the two inputs so overlapping stamps saturate instead of accumulating.
fn add_over(src: Rgba<u8>, dst: Rgba<u8>) -> Rgba<u8> {
    let src_a = src[3] as f32 / 255.0;
    let dst_a = dst[3] as f32 / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);
    if out_a <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let channel = |i: usize| {
        let c = (src[i] as f32 * src_a + dst[i] as f32 * dst_a * (1.0 - src_a)) / out_a;
        c.round().clamp(0.0, 255.0) as u8
    };

    Rgba([channel(0), channel(1), channel(2), src[3].max(dst[3])])
}
