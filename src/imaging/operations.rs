//! High-level image operations.
//!
//! [`compose`] turns one source photo into one print-ready output file. It
//! combines the pure geometry from [`calculations`](super::calculations) with
//! backend calls, always issued in the same order:
//!
//! ```text
//! read_metadata → plan_fit → cap_dimensions
//!   → [background cache: open + resize_letterbox]
//!   → open → [rotate 270°] → resize_letterbox | resize_cover
//!   → extract → [normalize]
//!   → [extract background window → overlay] → flatten → encode
//! ```

use super::backend::{BackendError, ImageBackend, ImageMeta};
use super::calculations::{
    FitError, FitPlan, MAX_DIMENSION, cap_dimensions, crop_window, fill_window, plan_fit,
};
use super::params::{Color, Fill, Position, Quality, Rotation, Window};
use crate::cache::BackgroundCache;
use crate::ratio::RatioSpec;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ComposeError {
    #[error("cannot read image {path}: {source}")]
    UnreadableImage {
        path: PathBuf,
        #[source]
        source: BackendError,
    },
    #[error("cannot fit {path}: {source}")]
    InvalidGeometry {
        path: PathBuf,
        #[source]
        source: FitError,
    },
    #[error("processing {path} failed: {source}")]
    ProcessingFailed {
        path: PathBuf,
        #[source]
        source: BackendError,
    },
    #[error("cannot write {path}: {source}")]
    EncodeFailed {
        path: PathBuf,
        #[source]
        source: BackendError,
    },
}

/// Per-job settings shared by every file of the job.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposeSettings {
    pub ratio: RatioSpec,
    pub position: Position,
    pub color: Color,
    pub background: Option<PathBuf>,
    pub fillup: bool,
    pub normalize: bool,
    pub quality: Quality,
}

impl Default for ComposeSettings {
    fn default() -> Self {
        Self {
            ratio: RatioSpec::default(),
            position: Position::default(),
            color: Color::default(),
            background: None,
            fillup: false,
            normalize: false,
            quality: Quality::default(),
        }
    }
}

impl ComposeSettings {
    /// Background to composite over, if any. Fillup mode never uses one.
    pub fn active_background(&self) -> Option<&Path> {
        if self.fillup {
            None
        } else {
            self.background.as_deref()
        }
    }
}

/// What [`compose`] produced for one file.
///
/// `window` is the extracted region and so the size of the output. In fillup
/// mode it can be smaller than the plan's crop when the cover was capped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Composed {
    pub source: PathBuf,
    pub output: PathBuf,
    pub plan: FitPlan,
    pub window: Window,
}

/// Read a photo's metadata and compute its capped fit plan.
pub fn plan_file(
    backend: &impl ImageBackend,
    source: &Path,
    ratio: RatioSpec,
) -> Result<(ImageMeta, FitPlan), ComposeError> {
    let meta = backend
        .read_metadata(source)
        .map_err(|e| ComposeError::UnreadableImage {
            path: source.to_path_buf(),
            source: e,
        })?;
    let plan = plan_fit(&meta, ratio).map_err(|e| ComposeError::InvalidGeometry {
        path: source.to_path_buf(),
        source: e,
    })?;
    Ok((meta, cap_dimensions(plan, MAX_DIMENSION)))
}

/// Fit one photo onto the job's ratio and write it to `output`.
///
/// The output directory must already exist.
pub fn compose<B: ImageBackend>(
    backend: &B,
    settings: &ComposeSettings,
    source: &Path,
    output: &Path,
    backgrounds: &BackgroundCache<B::Raster>,
) -> Result<Composed, ComposeError> {
    let processing = |e| ComposeError::ProcessingFailed {
        path: source.to_path_buf(),
        source: e,
    };

    let (meta, plan) = plan_file(backend, source, settings.ratio)?;
    log::debug!(
        "{}: crop {}x{} on canvas {}x{}{}",
        source.display(),
        plan.crop_width,
        plan.crop_height,
        plan.canvas_width,
        plan.canvas_height,
        if plan.landscape { "" } else { " (rotated)" }
    );

    let background = match settings.active_background() {
        Some(path) => Some(
            backgrounds
                .get_or_resize(
                    backend,
                    path,
                    settings.color,
                    plan.canvas_width,
                    plan.canvas_height,
                )
                .map_err(|e| ComposeError::UnreadableImage {
                    path: path.to_path_buf(),
                    source: e,
                })?,
        ),
        None => None,
    };

    let mut raster = backend
        .open(source)
        .map_err(|e| ComposeError::UnreadableImage {
            path: source.to_path_buf(),
            source: e,
        })?;
    if !plan.landscape {
        raster = backend.rotate(raster, Rotation::Deg270).map_err(processing)?;
    }

    let (staged, window) = if settings.fillup {
        let (w, h) = meta.oriented_dimensions();
        let working = if plan.landscape { (w, h) } else { (h, w) };
        let crop = (plan.crop_width, plan.crop_height);
        let ((fill_w, fill_h), window) = fill_window(working, crop, MAX_DIMENSION);
        let staged = backend
            .resize_cover(raster, fill_w, fill_h)
            .map_err(processing)?;
        (staged, window)
    } else {
        // Transparent padding lets the background show through
        let fill = match background {
            Some(_) => Fill::Transparent,
            None => Fill::Color(settings.color),
        };
        let staged = backend
            .resize_letterbox(raster, plan.canvas_width, plan.canvas_height, fill)
            .map_err(processing)?;
        (staged, crop_window(&plan, settings.position))
    };

    let mut fitted = backend.extract(&staged, window).map_err(processing)?;
    drop(staged);
    if settings.normalize {
        fitted = backend.normalize(fitted).map_err(processing)?;
    }

    if let Some(background) = background {
        let base = backend.extract(&background, window).map_err(processing)?;
        fitted = backend.overlay(base, &fitted).map_err(processing)?;
    }
    let flattened = backend.flatten(fitted, settings.color).map_err(processing)?;

    backend
        .encode(&flattened, output, settings.quality)
        .map_err(|e| ComposeError::EncodeFailed {
            path: output.to_path_buf(),
            source: e,
        })?;

    Ok(Composed {
        source: source.to_path_buf(),
        output: output.to_path_buf(),
        plan,
        window,
    })
}
