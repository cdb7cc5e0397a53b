//! Job configuration module.
//!
//! A run is a queue of jobs. Each job's options start from the values given
//! on the command line (the *base*) and are overlaid by one job description
//! read from a JSON config file.
//!
//! ## Config File Location
//!
//! `--config <path>` names the file explicitly; otherwise `ratiofit.json` in
//! the current directory is used when present. A file that is missing,
//! unreadable or not valid JSON means "no configuration": the run falls back
//! to the base job alone.
//!
//! ## Configuration Options
//!
//! ```json
//! {
//!   "source": "photos/",       // file or directory (required)
//!   "output": "prints/",       // file or directory (required)
//!   "ratio": "3:2",            // target width:height
//!   "position": "right",       // left | center | right
//!   "color": "white",          // CSS color name or hex
//!   "background": "paper.jpg", // optional background image
//!   "fillup": false,           // crop-to-fill instead of padding
//!   "normalize": false,        // stretch contrast
//!   "extensions": ["png", "jpg", "jpeg", "tiff"],
//!   "quality": 100             // lossy encoder quality, 1-100
//! }
//! ```
//!
//! The file holds either one object (one job) or an array of objects (a job
//! queue). `ext` is accepted as an alias of `extensions`, which may also be a
//! comma-joined string.
//!
//! ## Partial Configuration
//!
//! Descriptions are sparse. The merge is shallow: a key present in the
//! description replaces the base value wholesale, including lists.
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::Position;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "ratiofit.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid job options: {0}")]
    InvalidOptions(#[from] serde_json::Error),
}

/// Options of a single job, as merged from CLI and config file.
///
/// `ratio` and `color` stay strings here; they are parsed when the job runs
/// so that their errors surface in job validation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JobOptions {
    pub source: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub ratio: String,
    pub position: Position,
    pub color: String,
    pub background: Option<PathBuf>,
    pub fillup: bool,
    pub normalize: bool,
    #[serde(alias = "ext", deserialize_with = "deserialize_extensions")]
    pub extensions: Vec<String>,
    pub quality: u32,
}

impl Default for JobOptions {
    fn default() -> Self {
        Self {
            source: None,
            output: None,
            ratio: "3:2".to_string(),
            position: Position::Right,
            color: "white".to_string(),
            background: None,
            fillup: false,
            normalize: false,
            extensions: default_extensions(),
            quality: 100,
        }
    }
}

pub fn default_extensions() -> Vec<String> {
    ["png", "jpg", "jpeg", "tiff"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn deserialize_extensions<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
    };
    Ok(normalize_extensions(&raw))
}

/// Lower-case, strip leading dots, split comma-joined entries, drop blanks
/// and duplicates. Order of first appearance is kept.
pub fn normalize_extensions<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for entry in raw {
        for part in entry.as_ref().split(',') {
            let ext = part.trim().trim_start_matches('.').to_lowercase();
            if !ext.is_empty() && !out.contains(&ext) {
                out.push(ext);
            }
        }
    }
    out
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default)]
pub struct ProcessingConfig {
    /// Maximum number of parallel image processing workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Job descriptions: loading and merging
// =============================================================================

/// Read the job descriptions from `explicit` or from [`DEFAULT_CONFIG_FILE`].
///
/// Returns an empty list when the file does not exist, cannot be read, is not
/// valid JSON, or holds something other than an object or an array.
pub fn load_job_descriptions(explicit: Option<&Path>) -> Vec<Value> {
    let path = explicit.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            if explicit.is_some() {
                log::warn!("config {} not found, using command line only", path.display());
            } else {
                log::debug!("no {} in working directory", DEFAULT_CONFIG_FILE);
            }
            return Vec::new();
        }
        Err(e) => {
            log::warn!("ignoring unreadable config {}: {e}", path.display());
            return Vec::new();
        }
    };

    let value: Value = match serde_json::from_str(&content) {
        Ok(value) => value,
        Err(e) => {
            log::warn!("ignoring malformed config {}: {e}", path.display());
            return Vec::new();
        }
    };

    let descriptions = match value {
        Value::Object(_) => vec![value],
        Value::Array(items) => items,
        _ => {
            log::warn!(
                "ignoring config {}: expected an object or an array",
                path.display()
            );
            Vec::new()
        }
    };
    log::debug!(
        "loaded {} job description(s) from {}",
        descriptions.len(),
        path.display()
    );
    descriptions
}

/// Shallow merge: every key of `overlay` replaces the same key of `base`.
///
/// Non-object overlays leave `base` untouched.
pub fn merge_json(mut base: Map<String, Value>, overlay: Value) -> Map<String, Value> {
    if let Value::Object(overlay) = overlay {
        for (key, value) in overlay {
            base.insert(key, value);
        }
    }
    base
}

/// Resolve one job: merge `description` over `base` and deserialize.
pub fn resolve_job(base: &JobOptions, mut description: Value) -> Result<JobOptions, ConfigError> {
    let base = match serde_json::to_value(base)? {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    // The base always serializes `extensions`; fold the alias onto it so the
    // merged object never carries both.
    if let Value::Object(map) = &mut description
        && !map.contains_key("extensions")
        && let Some(ext) = map.remove("ext")
    {
        map.insert("extensions".to_string(), ext);
    }
    let merged = merge_json(base, description);
    Ok(serde_json::from_value(Value::Object(merged))?)
}

/// Resolve the job queue. Without descriptions the queue is just `base`.
///
/// Each entry is resolved independently so one bad description does not
/// prevent the jobs before it from running.
pub fn resolve_jobs(
    base: &JobOptions,
    descriptions: Vec<Value>,
) -> Vec<Result<JobOptions, ConfigError>> {
    if descriptions.is_empty() {
        return vec![Ok(base.clone())];
    }
    descriptions
        .into_iter()
        .map(|description| resolve_job(base, description))
        .collect()
}
