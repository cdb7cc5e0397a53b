//! Batch driver: one job, many photos.
//!
//! Takes a job's [`JobOptions`], validates them, pairs every eligible source
//! photo with its destination, and runs the composition pipeline over the
//! pairs in parallel.
//!
//! ## Validation Order
//!
//! All checks are job-level and happen before any image is touched:
//!
//! ```text
//! MissingSourceOrOutput → InvalidRatio → InvalidOptions → BadSource → BadOutput → NoPhotosFound
//! ```
//!
//! ## Pairing
//!
//! ```text
//! source file  + existing output dir  →  output/<file name>
//! source file  + anything else        →  output verbatim
//! source dir   + existing output dir  →  output/<entry> for each eligible entry
//! ```
//!
//! Directory listing is non-recursive. Hidden entries (leading `.`) are
//! skipped; extensions match case-insensitively against the job's allow list.
//!
//! ## Parallel Processing
//!
//! Pairs are processed with [rayon](https://docs.rs/rayon) on the global pool.
//! A failing pair never stops its siblings: failures are collected and the
//! job fails with [`JobError::FilesFailed`] once every pair has run. Outputs
//! already written stay on disk.

use crate::cache::{BackgroundCache, CacheStats};
use crate::config::JobOptions;
use crate::imaging::{
    Color, ColorError, ComposeError, ComposeSettings, Composed, ImageBackend, Quality, compose,
};
use crate::ratio::{RatioError, parse_ratio};
use rayon::prelude::*;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use walkdir::WalkDir;

/// Why a single photo could not be produced.
#[derive(Error, Debug)]
pub enum FileError {
    #[error(transparent)]
    Compose(#[from] ComposeError),
    #[error("cannot create directory {path}: {source}")]
    DirectoryCreateFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A failed pair: the source photo and what went wrong.
#[derive(Debug)]
pub struct FileFailure {
    pub source: PathBuf,
    pub error: FileError,
}

#[derive(Error, Debug)]
pub enum JobError {
    #[error("a job needs both a source and an output")]
    MissingSourceOrOutput,
    #[error("invalid ratio: {0}")]
    InvalidRatio(#[from] RatioError),
    #[error("invalid options: {0}")]
    InvalidOptions(String),
    #[error("source not found or not readable: {0}")]
    BadSource(PathBuf),
    #[error("output must be an existing directory when the source is a directory: {0}")]
    BadOutput(PathBuf),
    #[error("no photos found in {0}")]
    NoPhotosFound(PathBuf),
    #[error("{} file(s) failed", .0.len())]
    FilesFailed(Vec<FileFailure>),
}

impl From<ColorError> for JobError {
    fn from(e: ColorError) -> Self {
        JobError::InvalidOptions(e.to_string())
    }
}

/// Progress reported while a batch runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchEvent {
    Started {
        source: PathBuf,
        output: PathBuf,
        photos: usize,
    },
    Written {
        source: PathBuf,
        output: PathBuf,
        width: u32,
        height: u32,
    },
    Failed {
        source: PathBuf,
        reason: String,
    },
}

/// Everything a finished batch produced.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub written: Vec<Composed>,
    pub failures: Vec<FileFailure>,
    pub cache: CacheStats,
}

impl BatchReport {
    /// `Ok(self)` when every pair succeeded, else `FilesFailed` with all causes.
    pub fn into_result(self) -> Result<BatchReport, JobError> {
        if self.failures.is_empty() {
            Ok(self)
        } else {
            Err(JobError::FilesFailed(self.failures))
        }
    }
}

/// A job whose options passed validation.
#[derive(Debug, Clone)]
pub struct ValidatedJob {
    pub source: PathBuf,
    pub output: PathBuf,
    pub extensions: Vec<String>,
    pub settings: ComposeSettings,
}

/// Check the options that do not need the filesystem and parse them.
pub fn validate_job(options: &JobOptions) -> Result<ValidatedJob, JobError> {
    let (Some(source), Some(output)) = (&options.source, &options.output) else {
        return Err(JobError::MissingSourceOrOutput);
    };
    let ratio = parse_ratio(&options.ratio)?;
    let color: Color = options.color.parse()?;
    if !(1..=100).contains(&options.quality) {
        return Err(JobError::InvalidOptions(format!(
            "quality must be between 1 and 100, got {}",
            options.quality
        )));
    }
    if let Some(background) = &options.background
        && !background.is_file()
    {
        return Err(JobError::InvalidOptions(format!(
            "background not found: {}",
            background.display()
        )));
    }

    Ok(ValidatedJob {
        source: source.clone(),
        output: output.clone(),
        extensions: options.extensions.clone(),
        settings: ComposeSettings {
            ratio,
            position: options.position,
            color,
            background: options.background.clone(),
            fillup: options.fillup,
            normalize: options.normalize,
            quality: Quality::new(options.quality),
        },
    })
}

fn has_allowed_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .is_some_and(|ext| extensions.iter().any(|allowed| *allowed == ext))
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

/// Pair each eligible source photo with its destination path.
pub fn collect_pairs(
    source: &Path,
    output: &Path,
    extensions: &[String],
) -> Result<Vec<(PathBuf, PathBuf)>, JobError> {
    let metadata = fs::metadata(source).map_err(|_| JobError::BadSource(source.to_path_buf()))?;

    if !metadata.is_dir() {
        if !has_allowed_extension(source, extensions) {
            return Err(JobError::NoPhotosFound(source.to_path_buf()));
        }
        let destination = match source.file_name() {
            Some(name) if output.is_dir() => output.join(name),
            _ => output.to_path_buf(),
        };
        return Ok(vec![(source.to_path_buf(), destination)]);
    }

    // Unlistable counts as inaccessible
    if let Err(e) = fs::read_dir(source) {
        log::debug!("cannot list {}: {e}", source.display());
        return Err(JobError::BadSource(source.to_path_buf()));
    }
    if !output.is_dir() {
        return Err(JobError::BadOutput(output.to_path_buf()));
    }

    let pairs: Vec<(PathBuf, PathBuf)> = WalkDir::new(source)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::warn!("skipping entry in {}: {e}", source.display());
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| !is_hidden(entry.file_name()))
        .filter(|entry| has_allowed_extension(entry.path(), extensions))
        .map(|entry| (entry.path().to_path_buf(), output.join(entry.file_name())))
        .collect();

    if pairs.is_empty() {
        return Err(JobError::NoPhotosFound(source.to_path_buf()));
    }
    Ok(pairs)
}

fn process_pair<B: ImageBackend>(
    backend: &B,
    settings: &ComposeSettings,
    source: &Path,
    output: &Path,
    backgrounds: &BackgroundCache<B::Raster>,
) -> Result<Composed, FileError> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| FileError::DirectoryCreateFailed {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    Ok(compose(backend, settings, source, output, backgrounds)?)
}

/// Run the pipeline over every pair in parallel, collecting results in pair order.
///
/// One background cache is shared by all pairs and dropped with the batch.
pub fn process_pairs<B: ImageBackend>(
    backend: &B,
    settings: &ComposeSettings,
    pairs: &[(PathBuf, PathBuf)],
    events: Option<Sender<BatchEvent>>,
) -> BatchReport {
    let backgrounds = BackgroundCache::new();

    let results: Vec<Result<Composed, FileFailure>> = pairs
        .par_iter()
        .map_with(events, |events, (source, output)| {
            let result = process_pair(backend, settings, source, output, &backgrounds);
            let event = match &result {
                Ok(composed) => {
                    log::debug!("{} → {}", source.display(), output.display());
                    BatchEvent::Written {
                        source: source.clone(),
                        output: output.clone(),
                        width: composed.window.width,
                        height: composed.window.height,
                    }
                }
                Err(e) => {
                    log::debug!("{} failed: {e}", source.display());
                    BatchEvent::Failed {
                        source: source.clone(),
                        reason: e.to_string(),
                    }
                }
            };
            if let Some(tx) = events {
                tx.send(event).ok();
            }
            result.map_err(|error| FileFailure {
                source: source.clone(),
                error,
            })
        })
        .collect();

    let mut report = BatchReport {
        cache: backgrounds.stats(),
        ..BatchReport::default()
    };
    for result in results {
        match result {
            Ok(composed) => report.written.push(composed),
            Err(failure) => report.failures.push(failure),
        }
    }
    report
}

/// Run one job end to end: validate, pair, process.
pub fn run_batch<B: ImageBackend>(
    backend: &B,
    options: &JobOptions,
    events: Option<Sender<BatchEvent>>,
) -> Result<BatchReport, JobError> {
    let job = validate_job(options)?;
    let pairs = collect_pairs(&job.source, &job.output, &job.extensions)?;
    log::debug!(
        "{} photo(s) from {} at {} ({})",
        pairs.len(),
        job.source.display(),
        job.settings.ratio,
        if job.settings.fillup {
            "fillup".to_string()
        } else {
            job.settings.position.to_string()
        }
    );

    if let Some(tx) = &events {
        tx.send(BatchEvent::Started {
            source: job.source.clone(),
            output: job.output.clone(),
            photos: pairs.len(),
        })
        .ok();
    }

    process_pairs(backend, &job.settings, &pairs, events).into_result()
}
