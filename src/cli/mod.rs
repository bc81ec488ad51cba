//! # CLI Module
//!
//! Command-line interface for the card ingest tool.
//!
//! ## Usage
//! ```bash
//! # List the dates present on a card
//! card-ingest dates /Volumes/EOS_DIGITAL
//!
//! # Copy one day's shoot, RAW and JPG in separate folders
//! card-ingest copy /Volumes/EOS_DIGITAL --activity wedding --date 20240101 --separate-raw-jpg
//!
//! # JSON output
//! card-ingest copy /Volumes/EOS_DIGITAL --activity hike --output json
//! ```

use card_ingest::core::ingest::{CollisionPolicy, CopyEngine, CopyReport, CopyRequest, MismatchPolicy};
use card_ingest::error::{RequestError, Result};
use card_ingest::events::{Event, EventChannel};
use card_ingest::logging::{self, DEFAULT_RETENTION_DAYS};
use card_ingest::scan_dates;
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::thread;

/// Card Ingest - Copy, verify and organize photos and videos from memory cards
#[derive(Parser, Debug)]
#[command(name = "card-ingest")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Also write logs to this directory, one file per start day
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the dates present on a card, newest first
    Dates {
        /// Card or folder to scan
        source: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },

    /// Copy media into dated activity folders
    Copy(CopyArgs),
}

#[derive(clap::Args, Debug)]
struct CopyArgs {
    /// Card or folder to copy from
    #[arg(required_unless_present = "request")]
    source: Option<PathBuf>,

    /// Activity label used in folder names (e.g. "wedding")
    #[arg(short, long, required_unless_present = "request")]
    activity: Option<String>,

    /// Base folder for images (defaults to your Pictures folder)
    #[arg(long)]
    images: Option<PathBuf>,

    /// Base folder for videos (defaults to your Videos folder)
    #[arg(long)]
    videos: Option<PathBuf>,

    /// Only copy files from this date (YYYYMMDD); repeatable
    #[arg(short, long = "date")]
    dates: Vec<String>,

    /// Put RAW and JPG files in RAW/ and JPG/ subfolders
    #[arg(long)]
    separate_raw_jpg: bool,

    /// Skip images
    #[arg(long)]
    no_images: bool,

    /// Skip videos
    #[arg(long)]
    no_videos: bool,

    /// What to do when a different file already has the same name
    #[arg(long, value_enum)]
    on_collision: Option<Collision>,

    /// What to do with a copy that fails verification
    #[arg(long, value_enum)]
    on_mismatch: Option<Mismatch>,

    /// Number of files copied concurrently
    #[arg(short, long, default_value = "1")]
    workers: usize,

    /// Load the request from a JSON file; other flags override it
    #[arg(long)]
    request: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "pretty")]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Collision {
    /// Replace the existing file (default)
    Overwrite,
    /// Copy to name_1.ext, name_2.ext, ...
    Rename,
    /// Leave the existing file and report a failure
    KeepExisting,
}

impl From<Collision> for CollisionPolicy {
    fn from(collision: Collision) -> Self {
        match collision {
            Collision::Overwrite => CollisionPolicy::Overwrite,
            Collision::Rename => CollisionPolicy::Rename,
            Collision::KeepExisting => CollisionPolicy::KeepExisting,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mismatch {
    /// Leave the bad copy in place (default)
    Keep,
    /// Delete the bad copy
    Remove,
}

impl From<Mismatch> for MismatchPolicy {
    fn from(mismatch: Mismatch) -> Self {
        match mismatch {
            Mismatch::Keep => MismatchPolicy::Keep,
            Mismatch::Remove => MismatchPolicy::Remove,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
}

/// Run the CLI
pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.log_dir.as_deref());

    match cli.command {
        Commands::Dates { source, output } => run_dates(&source, output),
        Commands::Copy(args) => run_copy(args),
    }
}

fn init_logging(log_dir: Option<&Path>) {
    match log_dir {
        Some(dir) => match logging::init_with_log_dir(dir) {
            Ok(path) => {
                logging::prune_old_logs(dir, DEFAULT_RETENTION_DAYS);
                tracing::info!(log_file = %path.display(), "Logging to file");
            }
            Err(e) => eprintln!("Failed to set up log file in {}: {}", dir.display(), e),
        },
        None => card_ingest::init_tracing(),
    }
}

fn run_dates(source: &Path, output: OutputFormat) -> Result<ExitCode> {
    let dates = scan_dates(source)?;

    match output {
        OutputFormat::Json => println!("{}", to_json(&dates)?),
        OutputFormat::Pretty => {
            let term = Term::stdout();
            if dates.is_empty() {
                term.write_line(&format!("{} No media found", style("!").yellow().bold()))
                    .ok();
            }
            for date in &dates {
                let pretty = NaiveDate::parse_from_str(date, "%Y%m%d")
                    .map(|d| d.format("%A %-d %B %Y").to_string())
                    .unwrap_or_default();
                term.write_line(&format!("  {}  {}", style(date).cyan(), style(pretty).dim()))
                    .ok();
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn build_request(args: &CopyArgs) -> Result<CopyRequest> {
    let mut request = match &args.request {
        Some(path) => CopyRequest::from_json(&fs::read_to_string(path)?)?,
        None => CopyRequest::new(
            args.source.clone().unwrap_or_default(),
            args.activity.clone().unwrap_or_default(),
        ),
    };

    if let Some(source) = &args.source {
        request.source_dir = source.clone();
    }
    if let Some(activity) = &args.activity {
        request.activity_label = activity.clone();
    }
    if let Some(images) = &args.images {
        request.image_target_dir = images.clone();
    }
    if let Some(videos) = &args.videos {
        request.video_target_dir = videos.clone();
    }
    if !args.dates.is_empty() {
        request = request.with_dates(args.dates.iter().cloned());
    }
    if args.separate_raw_jpg {
        request.separate_raw_jpg = true;
    }
    if args.no_images {
        request.copy_images = false;
    }
    if args.no_videos {
        request.copy_videos = false;
    }
    if let Some(collision) = args.on_collision {
        request.collision_policy = collision.into();
    }
    if let Some(mismatch) = args.on_mismatch {
        request.mismatch_policy = mismatch.into();
    }

    if !request.copy_images && !request.copy_videos {
        return Err(RequestError::NothingSelected.into());
    }
    request.validate()?;
    Ok(request)
}

fn run_copy(args: CopyArgs) -> Result<ExitCode> {
    let request = build_request(&args)?;
    let term = Term::stderr();
    let pretty = matches!(args.output, OutputFormat::Pretty);

    if pretty {
        term.write_line(&format!(
            "{} {}",
            style("Card Ingest").bold().cyan(),
            style(format!("v{}", env!("CARGO_PKG_VERSION"))).dim()
        ))
        .ok();
        term.write_line(&format!(
            "  {} → {}, {}",
            style(request.source_dir.display()).bold(),
            request.image_target_dir.display(),
            request.video_target_dir.display()
        ))
        .ok();
        term.write_line("").ok();
    }

    let engine = CopyEngine::builder().workers(args.workers).build();
    let (sender, receiver) = EventChannel::new();

    let progress = if pretty {
        let pb = ProgressBar::new(100);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos:>3}% {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓░"),
        );
        Some(pb)
    } else {
        None
    };

    let progress_clone = progress.clone();
    let event_thread = thread::spawn(move || {
        for event in receiver.iter() {
            if let Event::Progress(p) = event {
                if let Some(ref pb) = progress_clone {
                    pb.set_position(p.percentage as u64);
                    pb.set_message(p.message.clone());
                    if let Some(error) = &p.error {
                        if p.current_file.is_some() {
                            pb.println(format!("  {} {}", style("✗").red(), error));
                        }
                    }
                }
            }
        }
        if let Some(pb) = progress_clone {
            pb.finish_and_clear();
        }
    });

    let report = engine.run_with_reporter(&request, &sender);

    // Drop sender to signal event thread to finish
    drop(sender);
    event_thread.join().ok();

    match args.output {
        OutputFormat::Pretty => print_pretty_report(&term, &report),
        OutputFormat::Json => println!("{}", to_json(&report)?),
    }

    Ok(if report.success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value).map_err(RequestError::from)?)
}

fn print_pretty_report(term: &Term, report: &CopyReport) {
    let marker = if report.success() {
        style("✓").green().bold()
    } else {
        style("✗").red().bold()
    };
    term.write_line(&format!("{} {}", marker, report.message)).ok();
    term.write_line("").ok();

    term.write_line(&format!(
        "  {} copied, {} skipped, {} failed of {} in {:.1}s",
        style(report.copied).cyan(),
        style(report.skipped).dim(),
        style(report.failures.len()).red(),
        report.total_files,
        report.duration_ms as f64 / 1000.0
    ))
    .ok();
    if report.folders_created > 0 {
        term.write_line(&format!(
            "  {} folders created",
            style(report.folders_created).dim()
        ))
        .ok();
    }

    if let Some(error) = &report.fatal_error {
        term.write_line(&format!("  {} {}", style("Error:").red().bold(), error))
            .ok();
    }

    if !report.failures.is_empty() {
        term.write_line("").ok();
        term.write_line(&format!("{}", style("Failed files:").bold().underlined()))
            .ok();
        for failure in &report.failures {
            term.write_line(&format!(
                "  {} {}\n      {}",
                style("○").red(),
                failure.path.display(),
                style(&failure.reason).dim()
            ))
            .ok();
        }
    }

    if !report.scan_errors.is_empty() {
        term.write_line("").ok();
        term.write_line(&format!(
            "  {} {} folders on the card could not be read",
            style("!").yellow(),
            report.scan_errors.len()
        ))
        .ok();
    }

    if !report.success() && report.fatal_error.is_none() && !report.cancelled {
        term.write_line("").ok();
        term.write_line(&format!(
            "{}",
            style("Run the same command again to retry; copied files are skipped.").dim()
        ))
        .ok();
    }
}
