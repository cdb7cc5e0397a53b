//! # ratiofit
//!
//! Prepares photographs for print by fitting each one onto a target aspect
//! ratio. The photo is padded out to the ratio (anchored left, center or
//! right) or, in fillup mode, cropped to fill it, and can be composited over a
//! background image instead of a flat color.
//!
//! # Architecture: Jobs, Batches, Files
//!
//! ```text
//! 1. Jobs      CLI + ratiofit.json  →  queue of JobOptions   (run in order)
//! 2. Batch     one job              →  (source, output) pairs (run in parallel)
//! 3. Compose   one pair             →  one encoded output file
//! ```
//!
//! The geometry of a fit is computed by pure functions before any pixel is
//! decoded, and every pixel operation goes through the [`imaging::ImageBackend`]
//! trait. Tests swap in a recording mock and assert the exact sequence of
//! backend calls without touching real images.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`ratio`] | `W:H` ratio parsing |
//! | [`imaging`] | Fit geometry, the backend trait, the `image` crate backend, and the per-file pipeline |
//! | [`cache`] | Job-scoped cache of resized background images |
//! | [`process`] | Batch driver: validation, source/output pairing, parallel processing |
//! | [`jobs`] | Sequential job runner |
//! | [`config`] | Job options, JSON job files, CLI/file merging, thread settings |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Padding With a Centered Primitive
//!
//! Anchored padding is built from a centered letterbox resize. The photo is
//! letterboxed onto a canvas that is oversized along the padded axis by
//! exactly the padding amount, so the centered photo touches one edge of a
//! crop-sized window at one end of the canvas and the other edge of a window
//! at the other end. Extracting the window at offset 0, at the far end, or
//! halfway gives right, left and center anchoring.
//!
//! ## Landscape Working Frame
//!
//! Portrait photos are rotated 270° before fitting, so the ratio always
//! reads as long edge to short edge and the output of a portrait photo is a
//! landscape print.
//!
//! ## Backgrounds
//!
//! With a background, the padding is transparent and the background (resized
//! once per canvas size and job) shows through. The same window is extracted
//! from the photo and the background, then the two are overlaid and flattened.

pub mod cache;
pub mod config;
pub mod imaging;
pub mod jobs;
pub mod output;
pub mod process;
pub mod ratio;

#[cfg(test)]
pub(crate) mod test_helpers;
