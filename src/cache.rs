//! Job-scoped cache of resized background images.
//!
//! When a job composites photos over a background image, every photo with the
//! same canvas size needs the same resized background. Resizing a large
//! background with Lanczos3 costs as much as processing the photo itself, so
//! the first file to need a given size computes it and every later file reuses
//! the result.
//!
//! # Design
//!
//! ## Cache keys
//!
//! A key is `(background path, fill color, canvas width, canvas height)`. The
//! color is part of the key because it paints the letterbox bars around a
//! background whose aspect ratio differs from the canvas.
//!
//! ## Lifetime
//!
//! One [`BackgroundCache`] is created per job by the batch driver and dropped
//! when the job ends. Nothing is persisted and there is no eviction: a job's
//! files produce only a handful of distinct canvas sizes.
//!
//! ## Concurrency
//!
//! Files are processed in parallel. Each key owns its own slot behind a
//! mutex, so two files racing for the same key produce exactly one resize
//! (the second waits for the first), while different keys resize in parallel.

use crate::imaging::{BackendError, Color, Fill, ImageBackend};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Identity of one resized background.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BackgroundKey {
    pub path: PathBuf,
    pub color: Color,
    pub width: u32,
    pub height: u32,
}

type Slot<R> = Arc<Mutex<Option<Arc<R>>>>;

/// Memoized background rasters for a single job.
pub struct BackgroundCache<R> {
    slots: Mutex<HashMap<BackgroundKey, Slot<R>>>,
    stats: Mutex<CacheStats>,
}

impl<R> Default for BackgroundCache<R> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            stats: Mutex::new(CacheStats::default()),
        }
    }
}

impl<R> BackgroundCache<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the background letterboxed to `width × height`, resizing it
    /// through `backend` only on the first request for this key.
    pub fn get_or_resize<B>(
        &self,
        backend: &B,
        path: &Path,
        color: Color,
        width: u32,
        height: u32,
    ) -> Result<Arc<R>, BackendError>
    where
        B: ImageBackend<Raster = R>,
    {
        let key = BackgroundKey {
            path: path.to_path_buf(),
            color,
            width,
            height,
        };
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.entry(key).or_default())
        };

        let mut entry = slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(raster) = entry.as_ref() {
            self.record(CacheStats::hit);
            log::debug!("background {} at {width}x{height}: cached", path.display());
            return Ok(Arc::clone(raster));
        }

        let background = backend.open(path)?;
        let resized = Arc::new(backend.resize_letterbox(
            background,
            width,
            height,
            Fill::Color(color),
        )?);
        *entry = Some(Arc::clone(&resized));
        self.record(CacheStats::miss);
        log::debug!("background {} at {width}x{height}: resized", path.display());
        Ok(resized)
    }

    /// Number of distinct backgrounds held.
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        *self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, update: fn(&mut CacheStats)) {
        update(&mut self.stats.lock().unwrap_or_else(PoisonError::into_inner));
    }
}

/// Summary of background cache use for one job.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub misses: u32,
}

impl CacheStats {
    pub fn hit(&mut self) {
        self.hits += 1;
    }

    pub fn miss(&mut self) {
        self.misses += 1;
    }

    pub fn total(&self) -> u32 {
        self.hits + self.misses
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.total() == 0 {
            write!(f, "no background")
        } else {
            write!(
                f,
                "{} resized, {} reused ({} total)",
                self.misses,
                self.hits,
                self.total()
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, MockRaster, RecordedOp};

    fn resize_count(backend: &MockBackend) -> usize {
        backend
            .get_operations()
            .iter()
            .filter(|op| matches!(op, RecordedOp::ResizeLetterbox { .. }))
            .count()
    }

    #[test]
    fn miss_then_hit_resizes_once() {
        let backend = MockBackend::with_images(&[("bg.png", 4000, 3000)]);
        let cache = BackgroundCache::new();

        let first = cache
            .get_or_resize(&backend, Path::new("bg.png"), Color::WHITE, 1800, 1200)
            .unwrap();
        let second = cache
            .get_or_resize(&backend, Path::new("bg.png"), Color::WHITE, 1800, 1200)
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(*first, MockRaster { width: 1800, height: 1200 });
        assert_eq!(resize_count(&backend), 1);
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 1 });
    }

    #[test]
    fn miss_issues_open_then_letterbox_with_color() {
        let backend = MockBackend::with_images(&[("bg.png", 400, 300)]);
        let cache = BackgroundCache::new();
        cache
            .get_or_resize(&backend, Path::new("bg.png"), Color::BLACK, 200, 100)
            .unwrap();

        assert_eq!(
            backend.get_operations(),
            vec![
                RecordedOp::Open("bg.png".into()),
                RecordedOp::ResizeLetterbox {
                    width: 200,
                    height: 100,
                    fill: Fill::Color(Color::BLACK),
                },
            ]
        );
    }

    #[test]
    fn different_dimensions_are_different_entries() {
        let backend = MockBackend::with_images(&[("bg.png", 400, 300)]);
        let cache = BackgroundCache::new();
        cache
            .get_or_resize(&backend, Path::new("bg.png"), Color::WHITE, 200, 100)
            .unwrap();
        cache
            .get_or_resize(&backend, Path::new("bg.png"), Color::WHITE, 100, 200)
            .unwrap();

        assert_eq!(cache.len(), 2);
        assert_eq!(resize_count(&backend), 2);
    }

    #[test]
    fn different_colors_are_different_entries() {
        let backend = MockBackend::with_images(&[("bg.png", 400, 300)]);
        let cache = BackgroundCache::new();
        cache
            .get_or_resize(&backend, Path::new("bg.png"), Color::WHITE, 200, 100)
            .unwrap();
        cache
            .get_or_resize(&backend, Path::new("bg.png"), Color::BLACK, 200, 100)
            .unwrap();
        assert_eq!(resize_count(&backend), 2);
    }

    #[test]
    fn failed_open_is_not_cached() {
        let backend = MockBackend::new();
        let cache: BackgroundCache<MockRaster> = BackgroundCache::new();
        assert!(
            cache
                .get_or_resize(&backend, Path::new("missing.png"), Color::WHITE, 10, 10)
                .is_err()
        );
        assert_eq!(cache.stats().total(), 0);
    }

    #[test]
    fn concurrent_requests_resize_once() {
        use rayon::prelude::*;

        let backend = MockBackend::with_images(&[("bg.png", 400, 300)]);
        let cache = BackgroundCache::new();
        (0..32).into_par_iter().for_each(|_| {
            cache
                .get_or_resize(&backend, Path::new("bg.png"), Color::WHITE, 300, 200)
                .unwrap();
        });

        assert_eq!(resize_count(&backend), 1);
        assert_eq!(cache.stats(), CacheStats { hits: 31, misses: 1 });
    }

    #[test]
    fn cache_stats_display() {
        assert_eq!(CacheStats::default().to_string(), "no background");
        let s = CacheStats { hits: 5, misses: 2 };
        assert_eq!(s.to_string(), "2 resized, 5 reused (7 total)");
    }
}
