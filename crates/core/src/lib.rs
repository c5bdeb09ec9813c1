//! Inpaint-Mask Core Library
//!
//! This library provides the selection mask engine behind a generative
//! inpainting editor: the user paints a freehand selection over a photo, and
//! the engine turns it into a full-resolution mask for the inpainting model.
//!
//! # Overview
//!
//! The photo is shown on a working canvas fitted into its container. Brush
//! input is painted onto a selection layer at that working resolution, and
//! the layer is exported at the photo's original resolution. The library
//! handles:
//!
//! - **Coordinate Mapping**: pointer to canvas space and fit scaling via [`geometry`]
//! - **Stroke Continuity**: stamp interpolation between pointer samples via [`stroke`]
//! - **Rasterization**: additive and erasing brush stamps via [`brush`]
//! - **Selection Storage**: single-writer, snapshot-safe layers via [`layer`]
//! - **Feedback View**: photo plus selection overlay via [`compositor`]
//! - **Mask Export**: nearest-neighbour upscale, binarization and inversion via [`export`]
//! - **Request Payload**: the JSON body for the inpainting service via [`request`]
//!
//! # Quick Start
//!
//! The simplest way to use the library is through the [`EditorSession`] facade:
//!
//! ```ignore
//! use inpaint_mask_core::{Config, EditorSession, Settings};
//!
//! let config = Config::load()?;
//! let settings = Settings::load(&config.model_name);
//! let mut session = EditorSession::from_settings(&config, &settings);
//!
//! session.load_image(image::open("photo.jpg")?);
//! session.replay(&StrokeScript::from_path("strokes.json")?);
//!
//! let request = session.build_request("a red kite in the sky", settings.params)?;
//! ```
//!
//! # Module Structure
//!
//! - [`brush`]: Brush configuration and stamp rasterizer
//! - [`compositor`]: Display compositing
//! - [`config`]: Configuration loading
//! - [`error`]: Error types and result aliases
//! - [`export`]: Mask export and encoding
//! - [`geometry`]: Coordinate spaces and fit scaling
//! - [`layer`]: Selection layer and its store
//! - [`request`]: Inpainting request payload
//! - [`session`]: Editor session facade
//! - [`settings`]: Persisted user preferences
//! - [`stroke`]: Stroke interpolation and recorded strokes

pub mod brush;
pub mod compositor;
pub mod config;
pub mod error;
pub mod export;
pub mod geometry;
pub mod layer;
pub mod request;
pub mod session;
pub mod settings;
pub mod stroke;

// Re-export primary types for convenience
pub use brush::{BrushConfig, Polarity, Tint};
pub use config::Config;
pub use error::{AppError, Result};
pub use export::{ExportedMask, MaskExporter};
pub use layer::{SelectionLayer, SelectionLayerStore};
pub use request::{InpaintParams, InpaintRequest};
pub use session::{EditorSession, PendingExport};
pub use settings::{Settings, AVAILABLE_MODELS};
pub use stroke::StrokeScript;

/// Initializes the library by loading environment variables.
///
/// Call this once at application startup before using any other functions.
/// This loads `.env` files if present.
///
/// # Example
///
/// ```ignore
/// inpaint_mask_core::init();
/// let config = inpaint_mask_core::Config::load()?;
/// ```
pub fn init() {
    let _ = dotenvy::dotenv();
}

/// Decodes an image file from disk.
///
/// # Errors
///
/// Returns [`AppError::ImageProcessing`] if the file cannot be read or decoded.
pub fn open_image(path: impl AsRef<std::path::Path>) -> Result<image::DynamicImage> {
    let path = path.as_ref();
    image::open(path)
        .map_err(|e| AppError::image(format!("Failed to open {}: {}", path.display(), e)))
}
