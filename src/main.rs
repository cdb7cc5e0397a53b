use clap::Parser;
use ratiofit::config::{self, JobOptions, ProcessingConfig};
use ratiofit::imaging::{Position, RustBackend};
use ratiofit::jobs::{self, RunError};
use ratiofit::output;
use ratiofit::process::BatchReport;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::mpsc;

#[derive(Parser)]
#[command(name = "ratiofit")]
#[command(about = "Fit photographs onto a target aspect ratio for print")]
#[command(long_about = "\
Fit photographs onto a target aspect ratio for print

Each photo is padded out to the ratio (or, with --fillup, cropped to it) and
written to the output. Portrait photos are turned to landscape first, so the
ratio always describes the long edge against the short edge.

  ratiofit photos/ prints/ --ratio 3:2 --position left
  ratiofit scan.tif print.jpg --background paper.jpg --normalize

Jobs can also come from a JSON file (--config, or ratiofit.json in the
current directory): an object is one job, an array is a queue run in order.
Keys match the long flags; values in the file override the command line.")]
#[command(version)]
struct Cli {
    /// Source photo or directory of photos
    source: Option<PathBuf>,

    /// Output file, or directory for the fitted photos
    output: Option<PathBuf>,

    /// Where the photo sits along the padded edge
    #[arg(short, long, value_enum, default_value_t = Position::Right)]
    position: Position,

    /// Crop to fill the ratio instead of padding
    #[arg(short, long)]
    fillup: bool,

    /// Padding and flatten color (CSS name or hex)
    #[arg(short, long, default_value = "white")]
    color: String,

    /// Target ratio as WIDTH:HEIGHT
    #[arg(short, long, default_value = "3:2")]
    ratio: String,

    /// Extensions to process, repeatable or comma-joined [default: png,jpg,jpeg,tiff]
    #[arg(short, long, value_delimiter = ',')]
    ext: Vec<String>,

    /// Stretch contrast to the full tonal range
    #[arg(short, long)]
    normalize: bool,

    /// Background image shown through the padding
    #[arg(short, long)]
    background: Option<PathBuf>,

    /// Quality for lossy encoders (1-100)
    #[arg(short, long, default_value_t = 100)]
    quality: u32,

    /// JSON job config [default: ./ratiofit.json when present]
    #[arg(long)]
    config: Option<PathBuf>,

    /// Maximum parallel workers (defaults to CPU cores)
    #[arg(long)]
    max_processes: Option<usize>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Job options given on the command line; the base every job starts from.
    fn base_options(&self) -> JobOptions {
        let extensions = if self.ext.is_empty() {
            config::default_extensions()
        } else {
            config::normalize_extensions(&self.ext)
        };
        JobOptions {
            source: self.source.clone(),
            output: self.output.clone(),
            ratio: self.ratio.clone(),
            position: self.position,
            color: self.color.clone(),
            background: self.background.clone(),
            fillup: self.fillup,
            normalize: self.normalize,
            extensions,
            quality: self.quality,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    init_thread_pool(&ProcessingConfig {
        max_processes: cli.max_processes,
    });

    match run(&cli) {
        Ok(reports) => {
            output::print_run_summary(&reports);
            ExitCode::SUCCESS
        }
        Err(e) => {
            output::print_run_error(&e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<Vec<BatchReport>, RunError> {
    let base = cli.base_options();
    let descriptions = config::load_job_descriptions(cli.config.as_deref());
    let queue = config::resolve_jobs(&base, descriptions);
    log::debug!("{} job(s) queued", queue.len());

    let (tx, rx) = mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            for line in output::format_batch_event(&event) {
                println!("{}", line);
            }
        }
    });
    let result = jobs::run_jobs(&RustBackend::new(), queue, Some(tx));
    if printer.join().is_err() {
        log::warn!("progress printer panicked");
    }
    result
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_millis()
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; user can constrain down, not up.
fn init_thread_pool(processing: &ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
