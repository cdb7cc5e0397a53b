//! Job runner: executes a queue of jobs strictly in order.
//!
//! Each job is a full batch (see [`process::run_batch`]). The first job that
//! fails aborts the queue; later jobs never start. Outputs of jobs that
//! already finished are kept.

use crate::config::{ConfigError, JobOptions};
use crate::imaging::ImageBackend;
use crate::process::{self, BatchEvent, BatchReport, JobError};
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunError {
    #[error("job {}: {source}", .index + 1)]
    Job {
        /// Zero-based position in the queue.
        index: usize,
        #[source]
        source: JobError,
    },
}

/// Run resolved jobs one after another.
///
/// A description that failed to resolve counts as that job failing with
/// `InvalidOptions` at its position in the queue.
pub fn run_jobs<B: ImageBackend>(
    backend: &B,
    jobs: Vec<Result<JobOptions, ConfigError>>,
    events: Option<Sender<BatchEvent>>,
) -> Result<Vec<BatchReport>, RunError> {
    let total = jobs.len();
    let mut reports = Vec::with_capacity(total);

    for (index, job) in jobs.into_iter().enumerate() {
        let options = job.map_err(|e| RunError::Job {
            index,
            source: JobError::InvalidOptions(e.to_string()),
        })?;
        log::debug!("job {}/{total}: {options:?}", index + 1);

        let report = process::run_batch(backend, &options, events.clone())
            .map_err(|source| RunError::Job { index, source })?;
        log::debug!(
            "job {}/{total}: {} written, backgrounds {}",
            index + 1,
            report.written.len(),
            report.cache
        );
        reports.push(report);
    }

    Ok(reports)
}
