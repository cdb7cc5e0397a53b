//! Image processing, pure Rust on top of the `image` crate.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `ImageDecoder::dimensions` + `orientation` |
//! | **Letterbox / cover resize** | Lanczos3 + `imageops::replace` |
//! | **Extract / overlay** | `crop_imm` + `imageops::overlay` |
//! | **Normalize** | luma histogram contrast stretch |
//! | **Encode** | JPEG / PNG / WebP / TIFF, picked by extension |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for fit geometry (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: [`compose`], the per-file pipeline combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend, ImageMeta};
pub use calculations::{
    FitError, FitPlan, MAX_DIMENSION, calculate_fill_dimensions, cap_dimensions, center_window,
    crop_window, fill_window, plan_fit,
};
pub use operations::{ComposeError, ComposeSettings, Composed, compose, plan_file};
pub use params::{Color, ColorError, Fill, Position, Quality, Rotation, Window};
pub use rust_backend::RustBackend;
