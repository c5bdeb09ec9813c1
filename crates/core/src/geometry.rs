//! Coordinate mapping between pointer, canvas and image space.
//!
//! Three spaces are involved when painting a selection:
//!
//! - **Client space**: pointer coordinates as reported by the surrounding UI.
//! - **Canvas space**: pixel coordinates inside the working canvas buffer.
//!   The layout keeps the canvas' displayed size equal to its buffer size, so
//!   client to canvas is a pure translation by the canvas origin.
//! - **Image space**: pixels of the original, full-resolution photo. The
//!   working canvas is the photo fitted into its container, so the two differ
//!   by the uniform fit scale.

use serde::{Deserialize, Serialize};

/// A point in client or canvas space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance(self, other: Point) -> f32 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Linear interpolation towards `other`; `t = 0` is `self`, `t = 1` is `other`.
    pub fn lerp(self, other: Point, t: f32) -> Point {
        Point::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }
}

impl From<[f32; 2]> for Point {
    fn from([x, y]: [f32; 2]) -> Self {
        Self::new(x, y)
    }
}

/// The canvas' bounding rectangle in client space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CanvasRect {
    pub left: f32,
    pub top: f32,
    #[serde(default)]
    pub width: f32,
    #[serde(default)]
    pub height: f32,
}

impl CanvasRect {
    pub const fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// A rect whose origin coincides with client space.
    pub fn at_origin(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }
}

/// Size of the layout box the working canvas is fitted into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContainerSize {
    pub width: f32,
    pub height: f32,
}

impl ContainerSize {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Whether the container can host a canvas at all.
    pub fn is_degenerate(&self) -> bool {
        let usable = |side: f32| side.is_finite() && side > 0.0;
        !(usable(self.width) && usable(self.height))
    }
}

/// Result of fitting an image into a container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitScale {
    /// Scaled width in canvas pixels (fractional).
    pub width: f32,
    /// Scaled height in canvas pixels (fractional).
    pub height: f32,
    /// `width / image_width`.
    pub scale: f32,
}

impl FitScale {
    /// Integer buffer size of the working canvas.
    ///
    /// Canvas buffers truncate fractional sizes; both sides are kept at least
    /// one pixel wide.
    pub fn buffer_size(&self) -> (u32, u32) {
        (
            (self.width.floor() as u32).max(1),
            (self.height.floor() as u32).max(1),
        )
    }
}

/// Translates a client-space pointer position into canvas buffer space.
pub fn to_canvas_space(client_x: f32, client_y: f32, canvas: &CanvasRect) -> Point {
    Point::new(client_x - canvas.left, client_y - canvas.top)
}

/// Fits an image into a container while preserving its aspect ratio.
///
/// Returns `None` when any dimension is zero or non-finite: the caller must
/// defer until layout has produced a real container.
pub fn compute_fit_scale(
    image_width: u32,
    image_height: u32,
    container: ContainerSize,
) -> Option<FitScale> {
    if image_width == 0 || image_height == 0 || container.is_degenerate() {
        return None;
    }

    let image_w = image_width as f32;
    let image_h = image_height as f32;
    let image_aspect = image_w / image_h;
    let container_aspect = container.width / container.height;

    let (width, height) = if image_aspect > container_aspect {
        // Width-bound
        (container.width, container.width * image_h / image_w)
    } else {
        // Height-bound
        (container.height * image_w / image_h, container.height)
    };

    Some(FitScale {
        width,
        height,
        scale: width / image_w,
    })
}

/// Relation between the working canvas and the original image.
///
/// Derived once per image load (or container resize) and read-only afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleContext {
    /// `working_width / original_width`.
    pub working_scale: f32,
    pub working: (u32, u32),
    pub original: (u32, u32),
}

impl ScaleContext {
    pub fn new(fit: FitScale, original: (u32, u32)) -> Self {
        Self {
            working_scale: fit.scale,
            working: fit.buffer_size(),
            original,
        }
    }
}
