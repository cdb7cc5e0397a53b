//! CLI output formatting.
//!
//! # Photo-First Display
//!
//! Every written photo is shown by its file name with the destination and the
//! final pixel size as context. Failures name the photo first and the reason
//! second, so a long run can be scanned for problems quickly.
//!
//! # Output Format
//!
//! ## Progress
//!
//! ```text
//! photos → prints (3 photos)
//!     a.jpg → prints/a.jpg (1800x1200)
//!     b.png → prints/b.png (1800x1200)
//!     c.jpg failed: cannot read image photos/c.jpg: ...
//! ```
//!
//! ## Summary
//!
//! ```text
//! Fitted 5 photos in 2 jobs
//! Backgrounds: 1 resized, 4 reused (5 total)
//! ```
//!
//! ## Errors (stderr)
//!
//! ```text
//! Error: job 1: 1 file(s) failed
//!     photos/c.jpg: cannot read image photos/c.jpg: ...
//! ```
//!
//! # Architecture
//!
//! Each display has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that does the writing. Format functions
//! are pure: no I/O, no side effects.

use crate::cache::CacheStats;
use crate::jobs::RunError;
use crate::process::{BatchEvent, BatchReport, JobError};
use std::path::Path;

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{count} {word}")
    } else {
        format!("{count} {word}s")
    }
}

// ============================================================================
// Progress
// ============================================================================

/// Format a single batch progress event as display lines.
pub fn format_batch_event(event: &BatchEvent) -> Vec<String> {
    match event {
        BatchEvent::Started {
            source,
            output,
            photos,
        } => vec![format!(
            "{} \u{2192} {} ({})",
            source.display(),
            output.display(),
            plural(*photos, "photo")
        )],
        BatchEvent::Written {
            source,
            output,
            width,
            height,
        } => vec![format!(
            "    {} \u{2192} {} ({}x{})",
            display_name(source),
            output.display(),
            width,
            height
        )],
        BatchEvent::Failed { source, reason } => {
            vec![format!("    {} failed: {}", display_name(source), reason)]
        }
    }
}

// ============================================================================
// Summary
// ============================================================================

/// Format the end-of-run summary across all jobs.
pub fn format_run_summary(reports: &[BatchReport]) -> Vec<String> {
    let photos: usize = reports.iter().map(|r| r.written.len()).sum();
    let mut lines = vec![format!(
        "Fitted {} in {}",
        plural(photos, "photo"),
        plural(reports.len(), "job")
    )];

    let cache = reports.iter().fold(CacheStats::default(), |acc, r| CacheStats {
        hits: acc.hits + r.cache.hits,
        misses: acc.misses + r.cache.misses,
    });
    if cache.total() > 0 {
        lines.push(format!("Backgrounds: {cache}"));
    }
    lines
}

pub fn print_run_summary(reports: &[BatchReport]) {
    for line in format_run_summary(reports) {
        println!("{}", line);
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Format a run failure, listing every failed photo of a `FilesFailed` job.
pub fn format_run_error(error: &RunError) -> Vec<String> {
    let mut lines = vec![format!("Error: {error}")];
    if let RunError::Job {
        source: JobError::FilesFailed(failures),
        ..
    } = error
    {
        for failure in failures {
            lines.push(format!(
                "    {}: {}",
                failure.source.display(),
                failure.error
            ));
        }
    }
    lines
}

pub fn print_run_error(error: &RunError) {
    for line in format_run_error(error) {
        eprintln!("{}", line);
    }
}
