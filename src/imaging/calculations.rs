//! Pure calculation functions for fit geometry.
//!
//! All functions here are pure and testable without any I/O or images.
//!
//! ## The oversized canvas
//!
//! A letterbox resize always centers the photo, but prints want the photo
//! pushed to one edge. [`plan_fit`] sizes a canvas wider (or taller) than the
//! final crop window by exactly the padding amount, so the centered letterbox
//! leaves `crop - source` pixels of padding on *each* side. Extracting a
//! crop-sized window from offset 0 then captures all the left padding plus the
//! photo, from the far offset the photo plus all the right padding, and from
//! the middle half of each:
//!
//! ```text
//! canvas:  [ pad | photo | pad ]      canvas = 2*crop - source
//! right:   [ pad | photo ]            offset 0
//! left:          [ photo | pad ]      offset canvas - crop
//! ```

use super::backend::ImageMeta;
use super::params::{Position, Window};
use crate::ratio::RatioSpec;
use thiserror::Error;

/// Largest dimension the encoders reliably accept (WebP's hard limit).
pub const MAX_DIMENSION: u32 = 16383;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FitError {
    #[error("image has a zero dimension ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },
    #[error("fit for {width}x{height} at {ratio} overflows the pixel range")]
    TooLarge {
        width: u32,
        height: u32,
        ratio: RatioSpec,
    },
}

/// Crop window and staging canvas for one photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FitPlan {
    pub crop_width: u32,
    pub crop_height: u32,
    pub canvas_width: u32,
    pub canvas_height: u32,
    /// Size the photo takes on the canvas, in the landscape working frame.
    pub photo_width: u32,
    pub photo_height: u32,
    /// Whether the oriented source was landscape (or square).
    pub landscape: bool,
}

impl FitPlan {
    fn max_dimension(&self) -> u32 {
        self.crop_width
            .max(self.crop_height)
            .max(self.canvas_width)
            .max(self.canvas_height)
    }
}

/// Compute the crop window and oversized canvas for a photo at a target ratio.
///
/// Portrait sources are reasoned about as if already rotated to landscape; the
/// caller rotates the pixels by 270° before resizing.
///
/// # Examples
/// ```
/// # use ratiofit::imaging::{plan_fit, ImageMeta};
/// # use ratiofit::ratio::RatioSpec;
/// let meta = ImageMeta::new(1600, 1200);
/// let plan = plan_fit(&meta, RatioSpec { width: 3, height: 2 }).unwrap();
/// assert_eq!((plan.crop_width, plan.crop_height), (1800, 1200));
/// assert_eq!((plan.canvas_width, plan.canvas_height), (2000, 1200));
/// ```
pub fn plan_fit(meta: &ImageMeta, ratio: RatioSpec) -> Result<FitPlan, FitError> {
    let (w, h) = meta.oriented_dimensions();
    if w == 0 || h == 0 {
        return Err(FitError::EmptyImage {
            width: w,
            height: h,
        });
    }

    let landscape = w >= h;
    let (width, height) = if landscape {
        (w as u64, h as u64)
    } else {
        (h as u64, w as u64)
    };
    let (rw, rh) = (ratio.width as u64, ratio.height as u64);

    let (crop_width, crop_height, canvas_width, canvas_height) = if rw * height > rh * width {
        // Ratio is wider than the photo: pad horizontally
        let crop_h = height;
        let crop_w = crop_h * rw / rh;
        (crop_w, crop_h, 2 * crop_w - width, crop_h)
    } else {
        // Ratio is narrower (or equal): pad vertically
        let crop_w = width;
        let crop_h = crop_w * rh / rw;
        (crop_w, crop_h, crop_w, 2 * crop_h - height)
    };

    let to_u32 = |v: u64| {
        u32::try_from(v).map_err(|_| FitError::TooLarge {
            width: w,
            height: h,
            ratio,
        })
    };

    Ok(FitPlan {
        crop_width: to_u32(crop_width)?,
        crop_height: to_u32(crop_height)?,
        canvas_width: to_u32(canvas_width)?,
        canvas_height: to_u32(canvas_height)?,
        photo_width: to_u32(width)?,
        photo_height: to_u32(height)?,
        landscape,
    })
}

/// Scale every dimension of a plan down so none exceeds `cap`.
///
/// Plans already within the cap are returned unchanged. The unpadded axis is
/// scaled by truncation and the padded axis follows from it: the photo size
/// is rounded the way a letterbox resize rounds it, and the canvas is rebuilt
/// as `2 * crop - photo` so the padding still lands exactly on the window edge.
pub fn cap_dimensions(plan: FitPlan, cap: u32) -> FitPlan {
    let max = plan.max_dimension();
    if max <= cap {
        return plan;
    }

    let horizontal = plan.canvas_width > plan.crop_width;
    // Crop and photo agree on the unpadded axis
    let (fixed, crop, photo) = if horizontal {
        (plan.crop_height, plan.crop_width, plan.photo_width)
    } else {
        (plan.crop_width, plan.crop_height, plan.photo_height)
    };

    let scaled_fixed = (fixed as u64 * cap as u64 / max as u64).max(1);
    let scaled_crop = (crop as u64 * scaled_fixed / fixed as u64).max(1);
    let scaled_photo = ((photo as f64 * scaled_fixed as f64 / fixed as f64).round() as u64)
        .clamp(1, scaled_crop);
    let scaled_canvas = 2 * scaled_crop - scaled_photo;

    let (fixed, crop, photo, canvas) = (
        scaled_fixed as u32,
        scaled_crop as u32,
        scaled_photo as u32,
        scaled_canvas as u32,
    );
    if horizontal {
        FitPlan {
            crop_width: crop,
            crop_height: fixed,
            canvas_width: canvas,
            canvas_height: fixed,
            photo_width: photo,
            photo_height: fixed,
            landscape: plan.landscape,
        }
    } else {
        FitPlan {
            crop_width: fixed,
            crop_height: crop,
            canvas_width: fixed,
            canvas_height: canvas,
            photo_width: fixed,
            photo_height: photo,
            landscape: plan.landscape,
        }
    }
}

/// Select the crop window on the oversized canvas for an anchor position.
///
/// Only the padded axis has slack, so the offset on the other axis is always 0.
pub fn crop_window(plan: &FitPlan, position: Position) -> Window {
    let slack_y = plan.canvas_height - plan.crop_height;
    let slack_x = plan.canvas_width - plan.crop_width;

    let (top, left) = match position {
        Position::Right => (0, 0),
        Position::Left => (slack_y, slack_x),
        Position::Center => (slack_y.div_ceil(2), slack_x.div_ceil(2)),
    };

    Window {
        top,
        left,
        width: plan.crop_width,
        height: plan.crop_height,
    }
}

/// Calculate dimensions needed to fill a target area (resize before crop).
///
/// Returns dimensions that completely cover the target area while maintaining
/// the source aspect ratio. One dimension will match exactly, the other may exceed.
///
/// # Arguments
/// * `source` - Source image dimensions (width, height)
/// * `target` - Target area dimensions (width, height)
pub fn calculate_fill_dimensions(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;

    let src_aspect = src_w as f64 / src_h as f64;
    let tgt_aspect = tgt_w as f64 / tgt_h as f64;

    if src_aspect > tgt_aspect {
        // Source is wider: height will match, width will exceed
        let h = tgt_h;
        let w = ((h as f64 * src_aspect).round() as u32).max(tgt_w);
        (w, h)
    } else {
        // Source is taller: width will match, height will exceed
        let w = tgt_w;
        let h = ((w as f64 / src_aspect).round() as u32).max(tgt_h);
        (w, h)
    }
}

/// Center a `target`-sized window inside a `filled` raster (fillup mode).
pub fn center_window(filled: (u32, u32), target: (u32, u32)) -> Window {
    let (fill_w, fill_h) = filled;
    let (tgt_w, tgt_h) = target;
    Window {
        top: fill_h.saturating_sub(tgt_h) / 2,
        left: fill_w.saturating_sub(tgt_w) / 2,
        width: tgt_w,
        height: tgt_h,
    }
}

/// Cover size and centered window for fillup mode, both within `cap`.
///
/// When covering `crop` would need a side longer than `cap` (a panorama
/// against a squarer ratio), the crop is scaled down with the cover so the
/// resize stays bounded. The window keeps the crop's aspect.
pub fn fill_window(source: (u32, u32), crop: (u32, u32), cap: u32) -> ((u32, u32), Window) {
    let filled = calculate_fill_dimensions(source, crop);
    let longest = filled.0.max(filled.1);
    if longest <= cap {
        return (filled, center_window(filled, crop));
    }

    let scale = |v: u32| ((v as u64 * cap as u64) / longest as u64).max(1) as u32;
    let crop = (scale(crop.0), scale(crop.1));
    let (w, h) = calculate_fill_dimensions(source, crop);
    let filled = (w.min(cap), h.min(cap));
    (filled, center_window(filled, crop))
}
