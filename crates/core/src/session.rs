//! Editor session: the engine as the surrounding UI drives it.
//!
//! The session owns the original photo, the working canvas layout, the brush
//! and the selection layer store. Pointer events flow through
//! [`to_canvas_space`], the stroke interpolator and the stamp rasterizer, one
//! stamp at a time; the compositor and the exporter only ever read the store.
//!
//! # Example
//!
//! ```ignore
//! use inpaint_mask_core::{EditorSession, geometry::{CanvasRect, ContainerSize}};
//!
//! let mut session = EditorSession::new(ContainerSize::new(800.0, 500.0), Default::default());
//! session.load_image(image::open("photo.jpg")?);
//!
//! let canvas = CanvasRect::at_origin(800.0, 450.0);
//! session.pointer_down(100.0, 120.0, &canvas);
//! session.pointer_move(180.0, 140.0, &canvas);
//! session.pointer_up();
//!
//! let mask = session.export_mask()?;
//! ```

use crate::brush::{stamp, BrushConfig, Polarity, Tint};
use crate::compositor::DisplayCompositor;
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::export::{ExportedMask, MaskExporter};
use crate::geometry::{
    compute_fit_scale, to_canvas_space, CanvasRect, ContainerSize, Point, ScaleContext,
};
use crate::layer::{SelectionLayer, SelectionLayerStore};
use crate::request::{InpaintParams, InpaintRequest};
use crate::settings::Settings;
use crate::stroke::{ActiveStroke, StrokeScript};
use image::{DynamicImage, RgbaImage};
use log::{debug, info, warn};

/// Working canvas derived from the current image and container.
struct Layout {
    context: ScaleContext,
    base: RgbaImage,
}

pub struct EditorSession {
    original: Option<DynamicImage>,
    container: ContainerSize,
    layout: Option<Layout>,
    store: SelectionLayerStore,
    brush: BrushConfig,
    stroke: Option<ActiveStroke>,
}

impl EditorSession {
    pub fn new(container: ContainerSize, brush: BrushConfig) -> Self {
        Self {
            original: None,
            container,
            layout: None,
            store: SelectionLayerStore::default(),
            brush,
            stroke: None,
        }
    }

    /// Creates a session from environment configuration and persisted settings.
    pub fn from_settings(config: &Config, settings: &Settings) -> Self {
        Self::new(config.container, settings.brush())
    }

    /// Replaces the photo being edited. The selection is always cleared.
    ///
    /// If the container has no usable size yet, the working canvas is not
    /// built until [`resize_container`](Self::resize_container) provides one.
    pub fn load_image(&mut self, image: DynamicImage) {
        info!("Loaded {}x{} image", image.width(), image.height());
        self.original = Some(image);
        self.relayout();
        self.clear_selection();
    }

    /// Applies a new container size.
    ///
    /// When the working canvas changes size the selection is cleared: a layer
    /// painted at the old size is never resampled onto the new one.
    pub fn resize_container(&mut self, container: ContainerSize) {
        self.container = container;
        let before = self.working_size();
        self.relayout();
        if self.working_size() != before {
            debug!("Working canvas changed from {:?} to {:?}", before, self.working_size());
            self.clear_selection();
        }
    }

    fn relayout(&mut self) {
        self.stroke = None;
        let Some(original) = &self.original else {
            self.layout = None;
            return;
        };

        let original_size = (original.width(), original.height());
        match compute_fit_scale(original_size.0, original_size.1, self.container) {
            Some(fit) => {
                let context = ScaleContext::new(fit, original_size);
                let base = DisplayCompositor::working_base(original, context.working);
                info!(
                    "Working canvas {}x{} (scale {:.4})",
                    context.working.0, context.working.1, context.working_scale
                );
                self.layout = Some(Layout { context, base });
            }
            None => {
                warn!(
                    "Deferring layout: container is {}x{}",
                    self.container.width, self.container.height
                );
                self.layout = None;
            }
        }
    }

    fn working_size(&self) -> Option<(u32, u32)> {
        self.layout.as_ref().map(|l| l.context.working)
    }

    pub fn original(&self) -> Option<&DynamicImage> {
        self.original.as_ref()
    }

    pub fn container(&self) -> ContainerSize {
        self.container
    }

    pub fn is_laid_out(&self) -> bool {
        self.layout.is_some()
    }

    pub fn scale_context(&self) -> Option<ScaleContext> {
        self.layout.as_ref().map(|l| l.context)
    }

    pub fn brush(&self) -> &BrushConfig {
        &self.brush
    }

    /// Changes the brush size; takes effect from the next stroke.
    pub fn set_brush_diameter(&mut self, diameter: f32) {
        self.brush.set_diameter(diameter);
    }

    /// Changes the brush polarity; takes effect from the next stroke.
    pub fn set_polarity(&mut self, polarity: Polarity) {
        self.brush.set_polarity(polarity);
    }

    pub fn set_tint(&mut self, tint: Tint) {
        self.brush = self.brush.with_tint(tint);
    }

    pub fn is_drawing(&self) -> bool {
        self.stroke.is_some()
    }

    /// Starts a stroke and stamps once at the pointer. Returns the stamp count.
    pub fn pointer_down(&mut self, client_x: f32, client_y: f32, canvas: &CanvasRect) -> usize {
        let Some(bounds) = self.working_size() else {
            debug!("Ignoring pointer down before layout");
            return 0;
        };

        let at = to_canvas_space(client_x, client_y, canvas);
        debug!("Stroke started at ({:.1}, {:.1}) with {:?}", at.x, at.y, self.brush);
        self.stroke = Some(ActiveStroke::begin(self.brush, at, bounds));
        self.stamp_at(at, self.brush);
        1
    }

    /// Continues the current stroke, stamping every interpolated point in order.
    pub fn pointer_move(&mut self, client_x: f32, client_y: f32, canvas: &CanvasRect) -> usize {
        let Some(mut stroke) = self.stroke.take() else {
            return 0;
        };

        let to = to_canvas_space(client_x, client_y, canvas);
        let points = stroke.advance(to);
        let brush = *stroke.brush();
        for &point in &points {
            self.stamp_at(point, brush);
        }
        self.stroke = Some(stroke);
        points.len()
    }

    pub fn pointer_up(&mut self) {
        if self.stroke.take().is_some() {
            debug!("Stroke finished (layer version {})", self.store.version());
        }
    }

    /// The pointer left the canvas; ends the stroke like a release.
    pub fn pointer_leave(&mut self) {
        self.pointer_up();
    }

    fn stamp_at(&mut self, center: Point, brush: BrushConfig) {
        self.store.update(|layer| stamp(layer, center, &brush));
    }

    /// Replays recorded strokes through the pointer lifecycle.
    ///
    /// Each stroke sets the brush diameter and polarity before it starts, the
    /// same way the user changes them between strokes. Returns the number of
    /// stamps rasterized.
    pub fn replay(&mut self, script: &StrokeScript) -> usize {
        let mut stamps = 0;
        for recorded in &script.strokes {
            let Some((first, rest)) = recorded.points.split_first() else {
                continue;
            };
            self.set_brush_diameter(recorded.diameter);
            self.set_polarity(recorded.polarity);

            stamps += self.pointer_down(first.x, first.y, &script.canvas);
            for point in rest {
                stamps += self.pointer_move(point.x, point.y, &script.canvas);
            }
            self.pointer_up();
        }
        info!("Replayed {} strokes ({} stamps)", script.strokes.len(), stamps);
        stamps
    }

    /// Resets the selection to all-zero at the current working size.
    pub fn clear_selection(&mut self) {
        let (width, height) = self.working_size().unwrap_or((0, 0));
        self.store.clear(width, height);
    }

    pub fn selection(&self) -> &SelectionLayer {
        self.store.current()
    }

    pub fn selection_version(&self) -> u64 {
        self.store.version()
    }

    pub fn has_selection(&self) -> bool {
        self.store.current().has_painted_pixels()
    }

    /// The visible canvas: working base image with the selection on top.
    pub fn render(&self) -> Result<RgbaImage> {
        let layout = self.require_layout()?;
        DisplayCompositor::render(&layout.base, self.store.current())
    }

    fn require_layout(&self) -> Result<&Layout> {
        if self.original.is_none() {
            return Err(AppError::NoImageLoaded);
        }
        self.layout.as_ref().ok_or(AppError::LayoutPending)
    }

    /// Snapshots the selection for export, checking the session preconditions.
    ///
    /// # Errors
    ///
    /// [`AppError::NoImageLoaded`], [`AppError::LayoutPending`] or
    /// [`AppError::EmptySelection`].
    pub fn begin_export(&self) -> Result<PendingExport> {
        let layout = self.require_layout()?;
        if !self.has_selection() {
            return Err(AppError::EmptySelection);
        }
        Ok(PendingExport {
            layer: self.store.snapshot(),
            context: layout.context,
        })
    }

    /// Exports the current selection on the calling thread.
    pub fn export_mask(&self) -> Result<ExportedMask> {
        self.begin_export()?.run_blocking()
    }

    /// Exports the current selection on a blocking worker.
    pub async fn export_mask_async(&self) -> Result<ExportedMask> {
        self.begin_export()?.run().await
    }

    /// Builds the inpainting payload for `prompt`.
    ///
    /// Checks run in the order a user would fix them: image, prompt, selection.
    pub fn build_request(&self, prompt: &str, params: InpaintParams) -> Result<InpaintRequest> {
        let original = self.original.as_ref().ok_or(AppError::NoImageLoaded)?;
        if prompt.trim().is_empty() {
            return Err(AppError::MissingPrompt);
        }
        let mask = self.export_mask()?;
        InpaintRequest::new(prompt, params, original, &mask)
    }
}

impl Default for EditorSession {
    fn default() -> Self {
        let config = Config::default();
        Self::new(config.container, BrushConfig::default())
    }
}

/// A selection snapshot waiting to be exported.
///
/// Holding one does not block the session: strokes painted afterwards go to a
/// fresh copy of the layer.
#[derive(Debug, Clone)]
pub struct PendingExport {
    layer: SelectionLayer,
    context: ScaleContext,
}

impl PendingExport {
    pub fn layer(&self) -> &SelectionLayer {
        &self.layer
    }

    pub fn run_blocking(self) -> Result<ExportedMask> {
        MaskExporter::export_for(&self.layer, &self.context)
    }

    pub async fn run(self) -> Result<ExportedMask> {
        MaskExporter::export_async(self.layer, self.context).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn photo(width: u32, height: u32) -> DynamicImage {
        let pixel = Rgba([200, 180, 160, 255]);
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, pixel))
    }

    fn session_with(width: u32, height: u32, container: ContainerSize) -> EditorSession {
        let mut session = EditorSession::new(container, BrushConfig::default());
        session.load_image(photo(width, height));
        session
    }

    #[test]
    fn load_builds_working_canvas() {
        let session = session_with(1600, 900, ContainerSize::new(800.0, 800.0));
        let context = session.scale_context().unwrap();
        assert_eq!(context.working, (800, 450));
        assert_eq!(context.original, (1600, 900));
        assert_eq!(context.working_scale, 0.5);
        assert_eq!(session.selection().dimensions(), (800, 450));
        assert!(!session.has_selection());
    }

    #[test]
    fn degenerate_container_defers_layout() {
        let mut session = session_with(100, 100, ContainerSize::new(400.0, 0.0));
        assert!(!session.is_laid_out());
        assert_eq!(session.pointer_down(10.0, 10.0, &CanvasRect::default()), 0);
        assert!(matches!(session.render(), Err(AppError::LayoutPending)));

        session.resize_container(ContainerSize::new(400.0, 300.0));
        assert_eq!(session.scale_context().unwrap().working, (300, 300));
    }

    #[test]
    fn stroke_paints_continuously() {
        let mut session = session_with(200, 100, ContainerSize::new(200.0, 100.0));
        let canvas = CanvasRect::new(50.0, 20.0, 200.0, 100.0);

        session.pointer_down(60.0, 70.0, &canvas);
        assert!(session.is_drawing());
        let stamps = session.pointer_move(160.0, 70.0, &canvas);
        session.pointer_up();
        assert_eq!(stamps, 20);
        assert!(!session.is_drawing());

        // Canvas-space y = 50; every x along the segment is covered.
        for x in 10..=110 {
            assert!(session.selection().alpha_at(x, 50).unwrap() > 128, "gap at x = {x}");
        }
        assert_eq!(session.selection().alpha_at(150, 50), Some(0));
    }

    #[test]
    fn far_off_samples_paint_up_to_the_layer_edge() {
        let mut session = session_with(100, 100, ContainerSize::new(100.0, 100.0));
        let script = StrokeScript::from_json(
            r#"{ "strokes": [{ "diameter": 10,
                 "points": [{ "x": 50, "y": 10 }, { "x": 3e38, "y": 10 }] }] }"#,
        )
        .unwrap();

        // Spacing 2.5 from x = 50 to the band edge at x = 105, plus the far sample.
        let stamps = session.replay(&script);
        assert!(stamps <= 25, "{stamps} stamps");
        for x in 50..100 {
            assert!(session.selection().alpha_at(x, 10).unwrap() > 128, "gap at x = {x}");
        }
        assert_eq!(session.selection().alpha_at(50, 30), Some(0));
    }

    #[test]
    fn brush_changes_wait_for_the_next_stroke() {
        let mut session = session_with(100, 100, ContainerSize::new(100.0, 100.0));
        let canvas = CanvasRect::at_origin(100.0, 100.0);

        session.pointer_down(50.0, 50.0, &canvas);
        session.set_polarity(Polarity::Subtract);
        session.pointer_move(52.0, 50.0, &canvas);
        session.pointer_up();
        assert!(session.has_selection());

        session.pointer_down(50.0, 50.0, &canvas);
        session.pointer_move(52.0, 50.0, &canvas);
        session.pointer_up();
        assert!(!session.has_selection());
    }

    #[test]
    fn moves_without_a_press_do_nothing() {
        let mut session = session_with(100, 100, ContainerSize::new(100.0, 100.0));
        let canvas = CanvasRect::at_origin(100.0, 100.0);
        assert_eq!(session.pointer_move(10.0, 10.0, &canvas), 0);

        session.pointer_down(10.0, 10.0, &canvas);
        session.pointer_leave();
        assert_eq!(session.pointer_move(90.0, 90.0, &canvas), 0);
        assert_eq!(session.selection().alpha_at(90, 90), Some(0));
    }

    #[test]
    fn export_requires_selection() {
        let session = session_with(100, 100, ContainerSize::new(100.0, 100.0));
        assert!(matches!(session.export_mask(), Err(AppError::EmptySelection)));

        let empty = EditorSession::default();
        assert!(matches!(empty.export_mask(), Err(AppError::NoImageLoaded)));
    }

    #[test]
    fn resize_clears_stale_selection() {
        let mut session = session_with(400, 200, ContainerSize::new(200.0, 200.0));
        let canvas = CanvasRect::at_origin(200.0, 100.0);
        session.pointer_down(20.0, 20.0, &canvas);
        session.pointer_up();
        assert!(session.has_selection());

        // Same working size: the selection survives.
        session.resize_container(ContainerSize::new(200.0, 150.0));
        assert!(session.has_selection());

        session.resize_container(ContainerSize::new(300.0, 300.0));
        assert_eq!(session.selection().dimensions(), (300, 150));
        assert!(!session.has_selection());
    }

    #[test]
    fn new_image_clears_selection() {
        let mut session = session_with(100, 100, ContainerSize::new(100.0, 100.0));
        session.pointer_down(50.0, 50.0, &CanvasRect::at_origin(100.0, 100.0));
        session.pointer_up();
        assert!(session.has_selection());

        session.load_image(photo(100, 100));
        assert!(!session.has_selection());
    }

    #[test]
    fn pending_export_is_isolated_from_new_strokes() {
        let mut session = session_with(100, 100, ContainerSize::new(100.0, 100.0));
        let canvas = CanvasRect::at_origin(100.0, 100.0);
        session.pointer_down(20.0, 20.0, &canvas);
        session.pointer_up();

        let pending = session.begin_export().unwrap();
        session.pointer_down(80.0, 80.0, &canvas);
        session.pointer_up();

        let mask = pending.run_blocking().unwrap();
        assert_eq!(mask.value_at(20, 20), Some(0));
        assert_eq!(mask.value_at(80, 80), Some(255));
        assert_eq!(session.export_mask().unwrap().value_at(80, 80), Some(0));
    }

    #[test]
    fn request_checks_prompt_before_selection() {
        let session = session_with(100, 100, ContainerSize::new(100.0, 100.0));
        let result = session.build_request("", InpaintParams::default());
        assert!(matches!(result, Err(AppError::MissingPrompt)));
        let result = session.build_request("a boat", InpaintParams::default());
        assert!(matches!(result, Err(AppError::EmptySelection)));
    }
}
