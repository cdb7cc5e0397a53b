//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the full list of pixel operations the
//! composition pipeline is allowed to use: read metadata, decode, rotate,
//! two resize modes, extract, overlay, flatten, normalize, and encode. The
//! pipeline only decides *which* calls to make and with which geometry.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Tests use the recording `MockBackend` in this module.

use super::params::{Color, Fill, Quality, Rotation, Window};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode {path}: {message}")]
    Decode { path: String, message: String },
    #[error("Failed to encode {path}: {message}")]
    Encode { path: String, message: String },
    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),
    #[error("Window {window:?} does not fit a {width}x{height} raster")]
    InvalidWindow {
        window: Window,
        width: u32,
        height: u32,
    },
}

/// Dimensions and orientation of a source image, read without decoding pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageMeta {
    /// Stored pixel width.
    pub width: u32,
    /// Stored pixel height.
    pub height: u32,
    /// EXIF orientation turns the image by 90° or 270° when displayed.
    pub orientation_applies_rotation: bool,
}

impl ImageMeta {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            orientation_applies_rotation: false,
        }
    }

    /// Dimensions as displayed, after EXIF orientation.
    pub fn oriented_dimensions(&self) -> (u32, u32) {
        if self.orientation_applies_rotation {
            (self.height, self.width)
        } else {
            (self.width, self.height)
        }
    }
}

/// Trait for image processing backends.
///
/// Rasters are owned values threaded through the pipeline; each operation
/// consumes or borrows its input and returns a new raster.
pub trait ImageBackend: Sync {
    /// Decoded image held in memory.
    type Raster: Send + Sync;

    /// Read dimensions and orientation without a full decode.
    fn read_metadata(&self, path: &Path) -> Result<ImageMeta, BackendError>;

    /// Decode an image, applying its EXIF orientation.
    fn open(&self, path: &Path) -> Result<Self::Raster, BackendError>;

    /// Rotate clockwise.
    fn rotate(&self, raster: Self::Raster, rotation: Rotation)
    -> Result<Self::Raster, BackendError>;

    /// Resize preserving aspect ratio to fit inside `width × height`, centered,
    /// painting the rest of the canvas with `fill`.
    fn resize_letterbox(
        &self,
        raster: Self::Raster,
        width: u32,
        height: u32,
        fill: Fill,
    ) -> Result<Self::Raster, BackendError>;

    /// Resize to exactly `width × height`. Callers pass cover dimensions that
    /// preserve the source aspect ratio.
    fn resize_cover(
        &self,
        raster: Self::Raster,
        width: u32,
        height: u32,
    ) -> Result<Self::Raster, BackendError>;

    /// Copy out a rectangular window.
    fn extract(&self, raster: &Self::Raster, window: Window) -> Result<Self::Raster, BackendError>;

    /// Alpha-composite `top` over `base` at the origin.
    fn overlay(
        &self,
        base: Self::Raster,
        top: &Self::Raster,
    ) -> Result<Self::Raster, BackendError>;

    /// Composite onto an opaque `background` and drop the alpha channel.
    fn flatten(&self, raster: Self::Raster, background: Color)
    -> Result<Self::Raster, BackendError>;

    /// Stretch contrast to the full tonal range.
    fn normalize(&self, raster: Self::Raster) -> Result<Self::Raster, BackendError>;

    /// Encode to `path`, choosing the format from its extension.
    fn encode(
        &self,
        raster: &Self::Raster,
        path: &Path,
        quality: Quality,
    ) -> Result<(), BackendError>;
}
