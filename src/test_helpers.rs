//! Shared test utilities for the ratiofit test suite.
//!
//! Synthetic image writers plus a helper that lays out a photo directory the
//! way a job's source directory looks.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = photo_dir(&[("a.jpg", 400, 300), ("b.png", 300, 400)]);
//! create_test_jpeg(&tmp.path().join("c.jpg"), 64, 48);
//! ```

use image::{DynamicImage, ImageEncoder, RgbImage, Rgba, RgbaImage};
use std::path::Path;
use tempfile::TempDir;

// =========================================================================
// Image writers
// =========================================================================

/// Write a gradient JPEG so decoders have real content to chew on.
pub fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let file = std::fs::File::create(path).unwrap();
    let writer = std::io::BufWriter::new(file);
    image::codecs::jpeg::JpegEncoder::new(writer)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

/// Write a gradient PNG with an opaque alpha channel.
pub fn create_test_png(path: &Path, width: u32, height: u32) {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, 64, 255])
    });
    img.save(path).unwrap();
}

/// In-memory raster of a single color.
pub fn solid_rgba(width: u32, height: u32, pixel: [u8; 4]) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba(pixel)))
}

// =========================================================================
// Fixture setup
// =========================================================================

/// Create a temp directory holding real images, one per `(name, w, h)`.
///
/// The writer is picked from the extension: `.png` gets a PNG, anything else
/// a JPEG.
pub fn photo_dir(images: &[(&str, u32, u32)]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    for &(name, width, height) in images {
        let path = tmp.path().join(name);
        if name.to_lowercase().ends_with(".png") {
            create_test_png(&path, width, height);
        } else {
            create_test_jpeg(&path, width, height);
        }
    }
    tmp
}

/// Create a temp directory of empty files, for tests driving a mock backend.
pub fn placeholder_dir(names: &[&str]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    for name in names {
        std::fs::write(tmp.path().join(name), b"").unwrap();
    }
    tmp
}
