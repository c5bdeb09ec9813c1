//! Stroke continuity and recorded stroke input.
//!
//! Pointer-move events arrive at whatever rate the host delivers them. A fast
//! drag can move tens of pixels between samples, which would leave gaps
//! between brush stamps. [`interpolate`] fills the segment between two samples
//! with stamps spaced no further apart than half the brush radius.

use crate::brush::{BrushConfig, Polarity};
use crate::error::Result;
use crate::geometry::{CanvasRect, Point};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Lower bound on stamp spacing so tiny brushes cannot explode the step count.
pub const MIN_SPACING: f32 = 0.25;

/// Distance between consecutive stamps for a brush of the given radius.
pub fn stamp_spacing(radius: f32) -> f32 {
    (radius / 2.0).max(MIN_SPACING)
}

/// Produces the points to stamp when the pointer moves from `last` to `current`.
///
/// When the move is shorter than the stamp spacing only `current` is returned.
/// Otherwise the segment is divided into `ceil(dist / spacing)` equal steps and
/// every step end is returned, `current` included and `last` excluded.
///
/// Only the part of the segment that can touch a `bounds`-sized layer is
/// subdivided: the segment is clipped to the layer grown by `radius` on every
/// side. Stamps outside that band would paint nothing, so a far-off sample
/// costs at most one stamp per spacing across the layer. When the segment
/// enters the band from outside, the entry point is stamped too; when it
/// misses the band entirely only `current` is returned.
pub fn interpolate(last: Point, current: Point, radius: f32, bounds: (u32, u32)) -> Vec<Point> {
    let spacing = f64::from(stamp_spacing(radius));
    let start = (f64::from(last.x), f64::from(last.y));
    let end = (f64::from(current.x), f64::from(current.y));
    let delta = (end.0 - start.0, end.1 - start.1);
    let dist = delta.0.hypot(delta.1);

    if !dist.is_finite() || dist <= spacing {
        return vec![current];
    }

    let reach = if radius.is_finite() { f64::from(radius.max(0.0)) } else { 0.0 };
    let min = (-reach, -reach);
    let max = (f64::from(bounds.0) + reach, f64::from(bounds.1) + reach);

    // Clip from both ends so each clipped endpoint is measured from the
    // sample nearest to it; a far-off sample would otherwise swamp it.
    let forward = clip_segment(start, delta, min, max);
    let backward = clip_segment(end, (-delta.0, -delta.1), min, max);
    let (Some((t0, t1)), Some((u0, u1))) = (forward, backward) else {
        return vec![current];
    };

    let along = |t: f64, u: f64| {
        if t <= 0.5 {
            (start.0 + delta.0 * t, start.1 + delta.1 * t)
        } else {
            (end.0 - delta.0 * u, end.1 - delta.1 * u)
        }
    };
    let entry = along(t0, u1);
    let exit = along(t1, u0);
    let enters = t0 > 0.0;
    let exits = u0 > 0.0;

    let span = (exit.0 - entry.0).hypot(exit.1 - entry.1);
    let steps = (span / spacing).ceil().max(1.0) as usize;
    let first = if enters { 0 } else { 1 };
    let mut points: Vec<Point> = (first..steps)
        .map(|i| {
            let t = i as f64 / steps as f64;
            Point::new(
                (entry.0 + (exit.0 - entry.0) * t) as f32,
                (entry.1 + (exit.1 - entry.1) * t) as f32,
            )
        })
        .collect();
    if exits {
        points.push(Point::new(exit.0 as f32, exit.1 as f32));
    }
    points.push(current);
    points
}

/// Liang-Barsky clip of `origin + t * delta, t in [0, 1]` against a rectangle.
///
/// Returns the parameter range that lies inside, or `None` if the segment
/// misses the rectangle.
fn clip_segment(
    origin: (f64, f64),
    delta: (f64, f64),
    min: (f64, f64),
    max: (f64, f64),
) -> Option<(f64, f64)> {
    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;
    let edges = [
        (-delta.0, origin.0 - min.0),
        (delta.0, max.0 - origin.0),
        (-delta.1, origin.1 - min.1),
        (delta.1, max.1 - origin.1),
    ];

    for (p, q) in edges {
        if p == 0.0 {
            // Parallel to this edge: either fully inside it or fully outside.
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }
    Some((t0, t1))
}

/// A stroke in progress.
///
/// The brush is captured when the stroke begins and stays fixed until it ends;
/// only the last pointer sample is remembered; the path itself is not retained.
#[derive(Debug, Clone, Copy)]
pub struct ActiveStroke {
    brush: BrushConfig,
    last: Point,
    bounds: (u32, u32),
}

impl ActiveStroke {
    /// Starts a stroke at `at` on a layer of size `bounds`.
    pub fn begin(brush: BrushConfig, at: Point, bounds: (u32, u32)) -> Self {
        Self {
            brush,
            last: at,
            bounds,
        }
    }

    pub fn brush(&self) -> &BrushConfig {
        &self.brush
    }

    /// Moves the stroke to `to`, returning the stamp centres to rasterize in order.
    pub fn advance(&mut self, to: Point) -> Vec<Point> {
        let points = interpolate(self.last, to, self.brush.radius(), self.bounds);
        self.last = to;
        points
    }
}

/// One recorded stroke in client coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedStroke {
    #[serde(default)]
    pub polarity: Polarity,
    /// Brush diameter in pixels, as shown on the brush-size slider.
    pub diameter: f32,
    pub points: Vec<Point>,
}

/// A sequence of strokes plus the canvas rect they were recorded against.
///
/// This is the JSON input format of the command-line front end.
///
/// ```json
/// {
///   "canvas": { "left": 0, "top": 0 },
///   "strokes": [
///     {
///       "polarity": "add",
///       "diameter": 20,
///       "points": [{ "x": 10, "y": 12 }, { "x": 80, "y": 40 }]
///     }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrokeScript {
    #[serde(default)]
    pub canvas: CanvasRect,
    pub strokes: Vec<RecordedStroke>,
}

impl StrokeScript {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}
