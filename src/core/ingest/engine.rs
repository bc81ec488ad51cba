//! Copy engine execution.

use super::planner::{plan, PlannedCopy, WorkingSet};
use super::transfer::{FileCopier, StdCopier, Transfer, Transferred};
use super::types::{CopyOutcome, CopyReport, CopyRequest, FailedFile, FileOutcome};
use crate::core::destination::DestinationResolver;
use crate::core::hasher::{ContentHasher, Sha256Hasher};
use crate::core::scanner::{MediaScanner, ScanConfig};
use crate::error::CopyError;
use crate::events::{NullReporter, ProgressEvent, ProgressReporter};
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Cooperative cancellation flag, checked between files
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; files already in flight still finish
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Builder for [`CopyEngine`]
pub struct CopyEngineBuilder {
    hasher: Option<Box<dyn ContentHasher>>,
    copier: Option<Box<dyn FileCopier>>,
    workers: usize,
    scan_config: ScanConfig,
    cancellation: Option<CancellationToken>,
}

impl CopyEngineBuilder {
    pub fn new() -> Self {
        Self {
            hasher: None,
            copier: None,
            workers: 1,
            scan_config: ScanConfig::default(),
            cancellation: None,
        }
    }

    /// Set the content hasher (defaults to SHA-256)
    pub fn hasher(mut self, hasher: Box<dyn ContentHasher>) -> Self {
        self.hasher = Some(hasher);
        self
    }

    /// Set the file copier (defaults to [`StdCopier`])
    pub fn copier(mut self, copier: Box<dyn FileCopier>) -> Self {
        self.copier = Some(copier);
        self
    }

    /// Number of files copied concurrently (minimum 1)
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Set scanner configuration
    pub fn scan_config(mut self, config: ScanConfig) -> Self {
        self.scan_config = config;
        self
    }

    /// Share a cancellation token with the caller
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn build(self) -> CopyEngine {
        CopyEngine {
            hasher: self.hasher.unwrap_or_else(|| Box::new(Sha256Hasher)),
            copier: self.copier.unwrap_or_else(|| Box::new(StdCopier)),
            workers: self.workers,
            scan_config: self.scan_config,
            cancellation: self.cancellation.unwrap_or_default(),
        }
    }
}

impl Default for CopyEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs copy requests: scan, plan, copy with verification, report
pub struct CopyEngine {
    hasher: Box<dyn ContentHasher>,
    copier: Box<dyn FileCopier>,
    workers: usize,
    scan_config: ScanConfig,
    cancellation: CancellationToken,
}

impl Default for CopyEngine {
    fn default() -> Self {
        CopyEngineBuilder::new().build()
    }
}

impl CopyEngine {
    pub fn builder() -> CopyEngineBuilder {
        CopyEngineBuilder::new()
    }

    /// Token that cancels runs of this engine
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Run without progress reporting
    pub fn run(&self, request: &CopyRequest) -> CopyReport {
        self.run_with_reporter(request, &NullReporter)
    }

    /// Scan `request.source_dir` and copy the selected media.
    ///
    /// Never panics on user data and never returns early with an error:
    /// per-file problems land in [`CopyReport::failures`], run-level ones in
    /// [`CopyReport::fatal_error`]. Either way the reporter sees a final event.
    pub fn run_with_reporter(
        &self,
        request: &CopyRequest,
        reporter: &dyn ProgressReporter,
    ) -> CopyReport {
        let start = Instant::now();
        let run_id = Uuid::new_v4();

        info!(
            %run_id,
            source = %request.source_dir.display(),
            activity = %request.activity_label,
            dates = ?request.selected_dates,
            "Starting copy"
        );

        if let Err(e) = request.validate() {
            return fatal(run_id, e.to_string(), reporter, start);
        }

        let mut walk = match MediaScanner::new(self.scan_config.clone()).scan(&request.source_dir) {
            Ok(walk) => walk,
            Err(e) => return fatal(run_id, e.to_string(), reporter, start),
        };
        let working = plan(request, walk.by_ref());
        let scan_errors = walk.into_errors().iter().map(ToString::to_string).collect();

        let mut report = self.execute(run_id, request, working, reporter, start);
        report.scan_errors = scan_errors;
        report
    }

    /// Copy an explicit list of files instead of scanning the source.
    ///
    /// Files still go through classification, category and date gating.
    pub fn run_files(
        &self,
        request: &CopyRequest,
        files: Vec<PathBuf>,
        reporter: &dyn ProgressReporter,
    ) -> CopyReport {
        let start = Instant::now();
        let run_id = Uuid::new_v4();

        if let Err(e) = request.validate() {
            return fatal(run_id, e.to_string(), reporter, start);
        }

        let working = plan(request, files);
        self.execute(run_id, request, working, reporter, start)
    }

    fn execute(
        &self,
        run_id: Uuid,
        request: &CopyRequest,
        working: WorkingSet,
        reporter: &dyn ProgressReporter,
        start: Instant,
    ) -> CopyReport {
        let total = working.len();
        let mut report = CopyReport::empty(run_id);
        report.total_files = total;

        if working.is_empty() {
            report.message = if request.selected_dates.is_all() {
                "No media files found to copy.".to_string()
            } else {
                "No media files found for the selected dates.".to_string()
            };
            info!(%run_id, "{}", report.message);
            reporter.report(ProgressEvent {
                percentage: 100,
                message: report.message.clone(),
                current_file: None,
                error: None,
                total_files: 0,
                processed_files: 0,
            });
            report.duration_ms = start.elapsed().as_millis() as u64;
            return report;
        }

        info!(%run_id, total, workers = self.workers, "Copying files");
        reporter.report(ProgressEvent {
            percentage: 0,
            message: format!("Preparing to copy {} files...", total),
            current_file: None,
            error: None,
            total_files: total,
            processed_files: 0,
        });

        let run = RunContext {
            request,
            transfer: Transfer {
                hasher: &*self.hasher,
                copier: &*self.copier,
                collision: request.collision_policy,
                mismatch: request.mismatch_policy,
            },
            resolver: DestinationResolver::new(),
            progress: Mutex::new(RunProgress {
                total,
                ..Default::default()
            }),
            reporter,
            cancellation: &self.cancellation,
        };

        let outcomes = if self.workers > 1 {
            run.parallel(&working.files, self.workers)
        } else {
            run.sequential(&working.files)
        };

        let mut cancelled = false;
        for outcome in outcomes {
            let Some(outcome) = outcome else {
                cancelled = true;
                continue;
            };
            match &outcome.outcome {
                CopyOutcome::Copied => report.copied += 1,
                CopyOutcome::Skipped => report.skipped += 1,
                CopyOutcome::Failed { reason } => report.failures.push(FailedFile {
                    path: outcome.source.clone(),
                    reason: reason.clone(),
                }),
            }
            report.outcomes.push(outcome);
        }
        report.folders_created = run.resolver.folders_created();

        let processed = report.processed();
        if cancelled {
            report.cancelled = true;
            report.message = format!(
                "Copy cancelled after {} of {} files.",
                report.outcomes.len(),
                total
            );
            warn!(%run_id, processed, failed = report.failures.len(), total, "Copy cancelled");
            reporter.report(ProgressEvent {
                percentage: ProgressEvent::percentage_of(processed, total),
                message: report.message.clone(),
                current_file: None,
                error: Some("Copy was cancelled".to_string()),
                total_files: total,
                processed_files: processed,
            });
        } else {
            report.message = final_message(&report);
            info!(
                %run_id,
                copied = report.copied,
                skipped = report.skipped,
                failed = report.failures.len(),
                folders_created = report.folders_created,
                "{}",
                report.message
            );
            reporter.report(ProgressEvent {
                percentage: 100,
                message: report.message.clone(),
                current_file: None,
                error: (!report.failures.is_empty())
                    .then(|| format!("{} files failed to copy", report.failures.len())),
                total_files: total,
                processed_files: processed,
            });
        }

        report.duration_ms = start.elapsed().as_millis() as u64;
        report
    }
}

/// Running counts behind the per-file events. Only copied and skipped
/// files move the percentage.
#[derive(Default)]
struct RunProgress {
    total: usize,
    copied: usize,
    skipped: usize,
    failed: usize,
}

impl RunProgress {
    fn processed(&self) -> usize {
        self.copied + self.skipped
    }
}

/// Shared state of one run, borrowed by every worker
struct RunContext<'a> {
    request: &'a CopyRequest,
    transfer: Transfer<'a>,
    resolver: DestinationResolver,
    progress: Mutex<RunProgress>,
    reporter: &'a dyn ProgressReporter,
    cancellation: &'a CancellationToken,
}

impl RunContext<'_> {
    /// One file at a time, in working-set order. `None` marks files not
    /// reached before cancellation.
    fn sequential(&self, files: &[PlannedCopy]) -> Vec<Option<FileOutcome>> {
        let mut outcomes = Vec::with_capacity(files.len());
        for planned in files {
            if self.cancellation.is_cancelled() {
                outcomes.push(None);
                continue;
            }
            outcomes.push(Some(self.process(planned)));
        }
        outcomes
    }

    /// Files sharing a destination folder go to the same worker, in order,
    /// so two sources never race for one destination name.
    fn parallel(&self, files: &[PlannedCopy], workers: usize) -> Vec<Option<FileOutcome>> {
        let pool = match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
            Ok(pool) => pool,
            Err(e) => {
                warn!(error = %e, "Failed to start worker pool, copying sequentially");
                return self.sequential(files);
            }
        };

        let mut buckets: Vec<Vec<usize>> = Vec::new();
        let mut by_dir: HashMap<&Path, usize> = HashMap::new();
        for (index, planned) in files.iter().enumerate() {
            let bucket = *by_dir.entry(planned.target_dir.as_path()).or_insert_with(|| {
                buckets.push(Vec::new());
                buckets.len() - 1
            });
            buckets[bucket].push(index);
        }

        let finished: Vec<(usize, FileOutcome)> = pool.install(|| {
            buckets
                .par_iter()
                .flat_map_iter(|bucket| {
                    bucket
                        .iter()
                        .map_while(|&index| {
                            if self.cancellation.is_cancelled() {
                                None
                            } else {
                                Some((index, self.process(&files[index])))
                            }
                        })
                        .collect::<Vec<_>>()
                })
                .collect()
        });

        let mut outcomes: Vec<Option<FileOutcome>> = vec![None; files.len()];
        for (index, outcome) in finished {
            outcomes[index] = Some(outcome);
        }
        outcomes
    }

    fn process(&self, planned: &PlannedCopy) -> FileOutcome {
        let source = &planned.file.path;
        let (destination, result) = match self.ensure_target(planned) {
            Ok(dir) => self.transfer.run(source, &dir),
            Err(e) => (planned.target_dir.join(planned.file.file_name()), Err(e)),
        };

        let outcome = match result {
            Ok(Transferred::Copied) => CopyOutcome::Copied,
            Ok(Transferred::Skipped) => CopyOutcome::Skipped,
            Err(e) => {
                error!(source = %source.display(), error = %e, "Failed to copy file");
                CopyOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };

        let outcome = FileOutcome {
            source: source.clone(),
            destination: Some(destination),
            outcome,
        };
        self.record(&outcome, planned.file.file_name());
        outcome
    }

    fn ensure_target(&self, planned: &PlannedCopy) -> Result<PathBuf, CopyError> {
        let date_dir = self.resolver.resolve_and_ensure(
            &planned.base_dir,
            &planned.file.date_key(),
            &self.request.activity_label,
        )?;
        self.resolver.ensure_category_dir(
            &date_dir,
            planned.file.category,
            self.request.separate_raw_jpg,
        )
    }

    /// Count the file and emit its event while holding the lock, so
    /// events arrive in the order they were counted.
    fn record(&self, outcome: &FileOutcome, file_name: &str) {
        let mut progress = self.progress.lock().unwrap_or_else(|e| e.into_inner());

        let (message, error) = match &outcome.outcome {
            CopyOutcome::Copied => {
                progress.copied += 1;
                (format!("Copying: {}", file_name), None)
            }
            CopyOutcome::Skipped => {
                progress.skipped += 1;
                (format!("Skipped (already exists): {}", file_name), None)
            }
            CopyOutcome::Failed { reason } => {
                progress.failed += 1;
                (format!("Failed: {}", file_name), Some(reason.clone()))
            }
        };
        debug!(
            copied = progress.copied,
            skipped = progress.skipped,
            failed = progress.failed,
            total = progress.total,
            "Recorded file outcome"
        );

        self.reporter.report(ProgressEvent {
            percentage: ProgressEvent::percentage_of(progress.processed(), progress.total),
            message,
            current_file: Some(outcome.source.clone()),
            error,
            total_files: progress.total,
            processed_files: progress.processed(),
        });
    }
}

fn final_message(report: &CopyReport) -> String {
    let mut message = if report.failures.is_empty() {
        format!("All {} files copied successfully!", report.copied)
    } else {
        format!(
            "Copy finished, but {} of {} files failed.",
            report.failures.len(),
            report.total_files
        )
    };
    if report.skipped > 0 {
        message.push_str(&format!(" Skipped {} files already at the destination.", report.skipped));
    }
    message
}

/// Abort before any file was processed
fn fatal(
    run_id: Uuid,
    message: String,
    reporter: &dyn ProgressReporter,
    start: Instant,
) -> CopyReport {
    error!(%run_id, error = %message, "Copy aborted");
    reporter.report(ProgressEvent {
        percentage: 0,
        message: format!("Fatal error during copy: {}", message),
        current_file: None,
        error: Some(message.clone()),
        total_files: 0,
        processed_files: 0,
    });

    let mut report = CopyReport::empty(run_id);
    report.message = format!("Copy aborted: {}", message);
    report.fatal_error = Some(message);
    report.duration_ms = start.elapsed().as_millis() as u64;
    report
}
