//! Error types for the inpaint-mask-core library.
//!
//! This module provides granular error variants for the different failure
//! modes of the mask engine, enabling precise error handling and
//! user-friendly error messages at the collaborator boundary.

use thiserror::Error;

/// Errors that can occur within the inpaint-mask-core library.
///
/// Each variant represents a specific failure mode with contextual information
/// to help diagnose and handle errors appropriately.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors (unparseable values).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Image decoding or encoding failed.
    #[error("Image processing failed: {0}")]
    ImageProcessing(String),

    /// Export was requested while nothing is painted.
    #[error("Selection required: paint an area with the brush first")]
    EmptySelection,

    /// A request was built without a text prompt.
    #[error("Prompt required: describe what should be generated")]
    MissingPrompt,

    /// An operation needs a base image but none has been loaded.
    #[error("No image loaded")]
    NoImageLoaded,

    /// The container has no usable size yet, so the working canvas is undefined.
    #[error("Canvas layout pending: container has zero width or height")]
    LayoutPending,

    /// The selection layer does not match the working canvas it is exported against.
    #[error("Selection layer is {layer:?} but the working canvas is {expected:?}")]
    DimensionMismatch {
        layer: (u32, u32),
        expected: (u32, u32),
    },

    /// An exported mask and the photo it is sent with differ in size.
    #[error("Mask is {mask:?} but the original image is {image:?}")]
    MaskSizeMismatch {
        mask: (u32, u32),
        image: (u32, u32),
    },

    /// The selection tint is too transparent to survive binarization.
    #[error("Tint alpha {0} must be above the mask threshold")]
    InvalidTint(u8),

    /// A generation parameter is out of range.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The background export worker failed.
    #[error("Mask export failed: {0}")]
    Export(String),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an image processing error with the given message.
    pub fn image(msg: impl Into<String>) -> Self {
        Self::ImageProcessing(msg.into())
    }

    /// Creates a parameter validation error with the given message.
    pub fn parameter(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }
}

/// A convenient alias for Result with [`AppError`].
pub type Result<T> = std::result::Result<T, AppError>;
