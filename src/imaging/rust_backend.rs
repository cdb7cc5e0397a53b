//! Pure Rust image processing backend built on the `image` crate.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Metadata | `ImageDecoder::dimensions` + `ImageDecoder::orientation` (no pixel decode) |
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::ImageReader`, EXIF orientation applied |
//! | Rotate | `DynamicImage::rotate90/180/270` |
//! | Resize | `DynamicImage::resize` / `resize_exact` with `Lanczos3` |
//! | Letterbox canvas, extract | `RgbaImage::from_pixel`, `imageops::replace`, `crop_imm` |
//! | Overlay, flatten | `imageops::overlay` (alpha blending) |
//! | Normalize | 1st–99th percentile luminance stretch |
//! | Encode | JPEG (quality), PNG, TIFF, lossless WebP, chosen by extension |

use super::backend::{BackendError, ImageBackend, ImageMeta};
use super::params::{Color, Fill, Quality, Rotation, Window};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::tiff::TiffEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::{self, FilterType};
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageReader, Rgba, RgbaImage};
use std::path::Path;

/// Share of pixels clipped at each end of the tonal range by [`normalize`](ImageBackend::normalize).
const NORMALIZE_CLIP_PERCENT: u64 = 1;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_error(path: &Path, err: image::ImageError) -> BackendError {
    BackendError::Decode {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}

fn encode_error(path: &Path, err: image::ImageError) -> BackendError {
    BackendError::Encode {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}

fn orientation_swaps_axes(orientation: Orientation) -> bool {
    matches!(
        orientation,
        Orientation::Rotate90
            | Orientation::Rotate270
            | Orientation::Rotate90FlipH
            | Orientation::Rotate270FlipH
    )
}

/// Open a decoder for `path` with the format sniffed from its content.
fn open_decoder(path: &Path) -> Result<impl ImageDecoder, BackendError> {
    ImageReader::open(path)?
        .with_guessed_format()?
        .into_decoder()
        .map_err(|e| decode_error(path, e))
}

/// Save a DynamicImage to the given path, inferring format from extension.
fn save_image(img: &DynamicImage, path: &Path, quality: Quality) -> Result<(), BackendError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    if !matches!(ext.as_str(), "jpg" | "jpeg" | "png" | "tif" | "tiff" | "webp") {
        return Err(BackendError::UnsupportedFormat(ext));
    }

    let file = std::fs::File::create(path)?;
    let writer = std::io::BufWriter::new(file);

    let result = match ext.as_str() {
        "jpg" | "jpeg" => {
            // JPEG has no alpha channel
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            rgb.write_with_encoder(JpegEncoder::new_with_quality(writer, quality.value() as u8))
        }
        "png" => img.write_with_encoder(PngEncoder::new(writer)),
        "webp" => {
            let rgba = DynamicImage::ImageRgba8(img.to_rgba8());
            rgba.write_with_encoder(WebPEncoder::new_lossless(writer))
        }
        _ => img.write_with_encoder(TiffEncoder::new(writer)),
    };
    result.map_err(|e| encode_error(path, e))
}

/// Stretch luminance so the 1st percentile maps to black and the 99th to white.
///
/// Fully transparent pixels are padding, not photo, and are left out of the
/// histogram.
fn stretch_contrast(img: &DynamicImage) -> DynamicImage {
    let mut rgba = img.to_rgba8();

    let mut histogram = [0u64; 256];
    let mut counted = 0u64;
    for p in rgba.pixels().filter(|p| p[3] > 0) {
        histogram[luma(p) as usize] += 1;
        counted += 1;
    }
    if counted == 0 {
        return DynamicImage::ImageRgba8(rgba);
    }

    let clip = counted * NORMALIZE_CLIP_PERCENT / 100;
    let low = percentile_from_start(&histogram, clip);
    let high = 255 - percentile_from_start_rev(&histogram, clip);
    if high <= low {
        return DynamicImage::ImageRgba8(rgba);
    }

    let range = (high - low) as f32;
    for p in rgba.pixels_mut() {
        for c in 0..3 {
            let v = (p[c] as f32 - low as f32) * 255.0 / range;
            p[c] = v.round().clamp(0.0, 255.0) as u8;
        }
    }
    DynamicImage::ImageRgba8(rgba)
}

/// Rec. 601 luma of an RGBA pixel.
fn luma(p: &Rgba<u8>) -> u8 {
    ((p[0] as u32 * 299 + p[1] as u32 * 587 + p[2] as u32 * 114) / 1000) as u8
}

/// First bucket where the running count exceeds `clip`.
fn percentile_from_start(histogram: &[u64; 256], clip: u64) -> u8 {
    let mut seen = 0;
    for (value, count) in histogram.iter().enumerate() {
        seen += count;
        if seen > clip {
            return value as u8;
        }
    }
    255
}

/// Distance from 255 of the last bucket where the running count (from the top) exceeds `clip`.
fn percentile_from_start_rev(histogram: &[u64; 256], clip: u64) -> u8 {
    let mut seen = 0;
    for (distance, count) in histogram.iter().rev().enumerate() {
        seen += count;
        if seen > clip {
            return distance as u8;
        }
    }
    255
}

impl ImageBackend for RustBackend {
    type Raster = DynamicImage;

    fn read_metadata(&self, path: &Path) -> Result<ImageMeta, BackendError> {
        let mut decoder = open_decoder(path)?;
        let (width, height) = decoder.dimensions();
        let orientation = decoder
            .orientation()
            .unwrap_or(Orientation::NoTransforms);
        Ok(ImageMeta {
            width,
            height,
            orientation_applies_rotation: orientation_swaps_axes(orientation),
        })
    }

    fn open(&self, path: &Path) -> Result<DynamicImage, BackendError> {
        let mut decoder = open_decoder(path)?;
        let orientation = decoder
            .orientation()
            .unwrap_or(Orientation::NoTransforms);
        let mut img = DynamicImage::from_decoder(decoder).map_err(|e| decode_error(path, e))?;
        img.apply_orientation(orientation);
        Ok(img)
    }

    fn rotate(&self, raster: DynamicImage, rotation: Rotation) -> Result<DynamicImage, BackendError> {
        Ok(match rotation {
            Rotation::Deg0 => raster,
            Rotation::Deg90 => raster.rotate90(),
            Rotation::Deg180 => raster.rotate180(),
            Rotation::Deg270 => raster.rotate270(),
        })
    }

    fn resize_letterbox(
        &self,
        raster: DynamicImage,
        width: u32,
        height: u32,
        fill: Fill,
    ) -> Result<DynamicImage, BackendError> {
        let (src_w, src_h) = (raster.width(), raster.height());
        // Already fits edge-to-edge on one axis: no resampling needed
        let fitted = if src_w <= width && src_h <= height && (src_w == width || src_h == height) {
            raster
        } else {
            raster.resize(width, height, FilterType::Lanczos3)
        };

        let mut canvas = RgbaImage::from_pixel(width, height, Rgba(fill.to_rgba()));
        let x = (width.saturating_sub(fitted.width()) / 2) as i64;
        let y = (height.saturating_sub(fitted.height()) / 2) as i64;
        imageops::replace(&mut canvas, &fitted.to_rgba8(), x, y);
        Ok(DynamicImage::ImageRgba8(canvas))
    }

    fn resize_cover(
        &self,
        raster: DynamicImage,
        width: u32,
        height: u32,
    ) -> Result<DynamicImage, BackendError> {
        if raster.width() == width && raster.height() == height {
            return Ok(raster);
        }
        Ok(raster.resize_exact(width, height, FilterType::Lanczos3))
    }

    fn extract(&self, raster: &DynamicImage, window: Window) -> Result<DynamicImage, BackendError> {
        let (width, height) = (raster.width(), raster.height());
        let fits = window.left as u64 + window.width as u64 <= width as u64
            && window.top as u64 + window.height as u64 <= height as u64;
        if !fits || window.width == 0 || window.height == 0 {
            return Err(BackendError::InvalidWindow {
                window,
                width,
                height,
            });
        }
        Ok(raster.crop_imm(window.left, window.top, window.width, window.height))
    }

    fn overlay(&self, base: DynamicImage, top: &DynamicImage) -> Result<DynamicImage, BackendError> {
        let mut base = base.to_rgba8();
        imageops::overlay(&mut base, &top.to_rgba8(), 0, 0);
        Ok(DynamicImage::ImageRgba8(base))
    }

    fn flatten(&self, raster: DynamicImage, background: Color) -> Result<DynamicImage, BackendError> {
        let mut canvas = RgbaImage::from_pixel(
            raster.width(),
            raster.height(),
            Rgba(background.opaque().to_rgba()),
        );
        imageops::overlay(&mut canvas, &raster.to_rgba8(), 0, 0);
        Ok(DynamicImage::ImageRgb8(
            DynamicImage::ImageRgba8(canvas).to_rgb8(),
        ))
    }

    fn normalize(&self, raster: DynamicImage) -> Result<DynamicImage, BackendError> {
        Ok(stretch_contrast(&raster))
    }

    fn encode(
        &self,
        raster: &DynamicImage,
        path: &Path,
        quality: Quality,
    ) -> Result<(), BackendError> {
        save_image(raster, path, quality)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{create_test_jpeg, create_test_png, solid_rgba};

    #[test]
    fn read_metadata_synthetic_jpeg() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("test.jpg");
        create_test_jpeg(&path, 200, 150);

        let meta = RustBackend::new().read_metadata(&path).unwrap();
        assert_eq!((meta.width, meta.height), (200, 150));
        assert!(!meta.orientation_applies_rotation);
    }

    #[test]
    fn read_metadata_nonexistent_file_errors() {
        let result = RustBackend::new().read_metadata(Path::new("/nonexistent/image.jpg"));
        assert!(result.is_err());
    }

    #[test]
    fn read_metadata_garbage_file_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("fake.jpg");
        std::fs::write(&path, b"not an image").unwrap();
        assert!(RustBackend::new().read_metadata(&path).is_err());
    }

    #[test]
    fn open_decodes_png() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("test.png");
        create_test_png(&path, 64, 48);

        let img = RustBackend::new().open(&path).unwrap();
        assert_eq!((img.width(), img.height()), (64, 48));
    }

    #[test]
    fn rotate_270_swaps_dimensions() {
        let backend = RustBackend::new();
        let img = solid_rgba(30, 40, [1, 2, 3, 255]);
        let rotated = backend.rotate(img, Rotation::Deg270).unwrap();
        assert_eq!((rotated.width(), rotated.height()), (40, 30));
    }

    #[test]
    fn letterbox_pads_both_sides_with_fill() {
        let backend = RustBackend::new();
        let img = solid_rgba(100, 50, [0, 0, 0, 255]);
        let out = backend
            .resize_letterbox(img, 140, 50, Fill::Color(Color::WHITE))
            .unwrap()
            .to_rgba8();

        assert_eq!(out.dimensions(), (140, 50));
        assert_eq!(out.get_pixel(0, 25).0, [255, 255, 255, 255]);
        assert_eq!(out.get_pixel(139, 25).0, [255, 255, 255, 255]);
        assert_eq!(out.get_pixel(70, 25).0, [0, 0, 0, 255]);
        // padding is (140 - 100) / 2 = 20 per side
        assert_eq!(out.get_pixel(19, 25).0, [255, 255, 255, 255]);
        assert_eq!(out.get_pixel(20, 25).0, [0, 0, 0, 255]);
    }

    #[test]
    fn letterbox_transparent_fill_has_zero_alpha() {
        let backend = RustBackend::new();
        let img = solid_rgba(100, 50, [10, 20, 30, 255]);
        let out = backend
            .resize_letterbox(img, 100, 80, Fill::Transparent)
            .unwrap()
            .to_rgba8();
        assert_eq!(out.get_pixel(50, 0).0[3], 0);
        assert_eq!(out.get_pixel(50, 40).0, [10, 20, 30, 255]);
    }

    #[test]
    fn letterbox_scales_down_to_fit() {
        let backend = RustBackend::new();
        let img = solid_rgba(400, 200, [0, 0, 0, 255]);
        let out = backend
            .resize_letterbox(img, 100, 100, Fill::Color(Color::WHITE))
            .unwrap();
        assert_eq!((out.width(), out.height()), (100, 100));
    }

    #[test]
    fn cover_resizes_exactly() {
        let backend = RustBackend::new();
        let img = solid_rgba(400, 300, [0, 0, 0, 255]);
        let out = backend.resize_cover(img, 200, 150).unwrap();
        assert_eq!((out.width(), out.height()), (200, 150));
    }

    #[test]
    fn extract_within_bounds() {
        let backend = RustBackend::new();
        let img = solid_rgba(200, 100, [0, 0, 0, 255]);
        let window = Window {
            top: 0,
            left: 50,
            width: 150,
            height: 100,
        };
        let out = backend.extract(&img, window).unwrap();
        assert_eq!((out.width(), out.height()), (150, 100));
    }

    #[test]
    fn extract_out_of_bounds_errors() {
        let backend = RustBackend::new();
        let img = solid_rgba(200, 100, [0, 0, 0, 255]);
        let window = Window {
            top: 1,
            left: 0,
            width: 200,
            height: 100,
        };
        assert!(matches!(
            backend.extract(&img, window),
            Err(BackendError::InvalidWindow { .. })
        ));
    }

    #[test]
    fn overlay_keeps_base_where_top_is_transparent() {
        let backend = RustBackend::new();
        let base = solid_rgba(10, 10, [255, 0, 0, 255]);
        let mut top = RgbaImage::from_pixel(10, 10, Rgba([0, 0, 0, 0]));
        top.put_pixel(5, 5, Rgba([0, 0, 255, 255]));
        let out = backend
            .overlay(base, &DynamicImage::ImageRgba8(top))
            .unwrap()
            .to_rgba8();
        assert_eq!(out.get_pixel(0, 0).0, [255, 0, 0, 255]);
        assert_eq!(out.get_pixel(5, 5).0, [0, 0, 255, 255]);
    }

    #[test]
    fn flatten_replaces_transparency_with_background() {
        let backend = RustBackend::new();
        let img = solid_rgba(4, 4, [0, 0, 0, 0]);
        let out = backend.flatten(img, Color::rgb(1, 2, 3)).unwrap();
        assert!(matches!(out, DynamicImage::ImageRgb8(_)));
        assert_eq!(out.to_rgb8().get_pixel(2, 2).0, [1, 2, 3]);
    }

    #[test]
    fn normalize_stretches_low_contrast() {
        let backend = RustBackend::new();
        let mut img = RgbaImage::from_pixel(10, 10, Rgba([100, 100, 100, 255]));
        for x in 0..10 {
            img.put_pixel(x, 0, Rgba([150, 150, 150, 255]));
        }
        let out = backend
            .normalize(DynamicImage::ImageRgba8(img))
            .unwrap()
            .to_rgba8();
        assert_eq!(out.get_pixel(5, 5).0[0], 0);
        assert_eq!(out.get_pixel(5, 0).0[0], 255);
    }

    #[test]
    fn normalize_flat_image_is_unchanged() {
        let backend = RustBackend::new();
        let img = solid_rgba(8, 8, [90, 90, 90, 255]);
        let out = backend.normalize(img).unwrap().to_rgba8();
        assert_eq!(out.get_pixel(3, 3).0, [90, 90, 90, 255]);
    }

    #[test]
    fn encode_jpeg_and_png() {
        let tmp = tempfile::TempDir::new().unwrap();
        let backend = RustBackend::new();
        let img = solid_rgba(32, 16, [10, 200, 30, 255]);

        for name in ["out.jpg", "out.png", "out.tiff", "out.webp"] {
            let path = tmp.path().join(name);
            backend.encode(&img, &path, Quality::default()).unwrap();
            let meta = backend.read_metadata(&path).unwrap();
            assert_eq!((meta.width, meta.height), (32, 16), "{name}");
        }
    }

    #[test]
    fn encode_unsupported_format_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("out.gif");
        let result = RustBackend::new().encode(
            &solid_rgba(4, 4, [0, 0, 0, 255]),
            &path,
            Quality::default(),
        );
        assert!(matches!(result, Err(BackendError::UnsupportedFormat(ext)) if ext == "gif"));
        assert!(!path.exists());
    }
}
