//! Sequential runner
//!
//! Runs selected activities in order and writes every outcome to
//! `{data_directory}/outcome.json`. A run ends early on:
//! - the first `Error` outcome
//! - a stop request, honoured between activities
//!
//! When any selected activity talks to the New system, its build is checked
//! first so a bad URL or token surfaces before a Legacy job starts.

use crate::activity::{SharedActivity, StateBoard};
use crate::catalog::Catalog;
use crate::client::{AppVersion, NewSystemApi};
use crate::error::{HarnessError, HarnessResult};
use crate::outcome::{Outcome, Status};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// File written into the data directory after every run
pub const OUTCOME_FILE: &str = "outcome.json";

/// Everything one run produced
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Outcomes of the activities that ran, in run order
    pub outcomes: Vec<Outcome>,
    /// Selected but never started, after a failure or a stop request
    pub skipped: Vec<String>,
    /// Whether the run ended on a stop request
    pub stopped: bool,
    /// New-system build checked before the first activity
    pub new_system: Option<AppVersion>,
    /// Wall time of the whole run
    pub elapsed: Duration,
}

impl RunReport {
    /// Whether every outcome is `Ok` or `NoOperation` and nothing was skipped
    #[must_use]
    pub fn passed(&self) -> bool {
        self.skipped.is_empty() && self.outcomes.iter().all(|o| o.status.is_acceptable())
    }

    /// Worst status across the run, `NoOperation` when nothing ran
    #[must_use]
    pub fn worst(&self) -> Status {
        self.outcomes
            .iter()
            .fold(Status::NoOperation, |acc, o| acc.worst(o.status))
    }

    /// Summary table plus the verdict
    #[must_use]
    pub fn generate_text(&self) -> String {
        let mut report = String::from("=== YE-Match Run ===\n\n");
        if let Some(version) = &self.new_system {
            let _ = writeln!(report, "New system: {version}\n");
        }
        for outcome in &self.outcomes {
            let _ = writeln!(
                report,
                "{:<12} {} {}",
                outcome.status.to_string(),
                outcome.elapsed_text(),
                outcome.activity_name
            );
        }
        for name in &self.skipped {
            let _ = writeln!(report, "{:<12} --:-- {name}", "Skipped");
        }
        if self.stopped {
            let _ = writeln!(report, "\nStopped on request");
        }
        let _ = writeln!(report, "\nCompleted in {}", hms(self.elapsed));
        let _ = writeln!(report, "=== Result: {} ===", if self.passed() { "PASS" } else { "FAIL" });
        report
    }
}

/// `Xh Ym Zs`
fn hms(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// Asks a running [`Runner`] to stop before its next activity
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    /// Request a stop; the activity in flight still finishes
    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether a stop has been requested
    #[must_use]
    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Runs activities one after another
pub struct Runner {
    data_directory: PathBuf,
    board: StateBoard,
    new_system: Option<Arc<dyn NewSystemApi>>,
    stop: StopHandle,
}

impl Runner {
    /// Runner writing into `data_directory`
    #[must_use]
    pub fn new(data_directory: impl Into<PathBuf>) -> Self {
        Self {
            data_directory: data_directory.into(),
            board: StateBoard::new(),
            new_system: None,
            stop: StopHandle::default(),
        }
    }

    /// Check this New system's build before runs that call it
    #[inline]
    #[must_use]
    pub fn with_new_system(mut self, api: Arc<dyn NewSystemApi>) -> Self {
        self.new_system = Some(api);
        self
    }

    /// Handle that stops this runner between activities
    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Turn the first Ctrl-C into a stop request
    ///
    /// Abort the returned task once the run is over.
    #[must_use]
    pub fn stop_on_ctrl_c(&self) -> JoinHandle<()> {
        let stop = self.stop_handle();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    warn!("stop requested, finishing the current activity");
                    stop.request();
                }
                Err(e) => warn!(error = %e, "cannot listen for ctrl-c"),
            }
        })
    }

    /// Live state of the activities this runner has touched
    #[must_use]
    pub fn board(&self) -> &StateBoard {
        &self.board
    }

    /// Where the last run's outcomes are written
    #[must_use]
    pub fn outcome_path(&self) -> PathBuf {
        self.data_directory.join(OUTCOME_FILE)
    }

    /// Resolve `names` against the catalog, keeping their order
    ///
    /// # Errors
    /// [`HarnessError::UnknownActivity`] for the first name not in the catalog.
    pub fn specify<S: AsRef<str>>(catalog: &Catalog, names: &[S]) -> HarnessResult<Vec<SharedActivity>> {
        names
            .iter()
            .map(|n| {
                catalog
                    .get(n.as_ref())
                    .ok_or_else(|| HarnessError::unknown_activity(n.as_ref()))
            })
            .collect()
    }

    /// Run `activities` in order
    ///
    /// # Errors
    /// When the New-system build check fails, or when the data directory or
    /// `outcome.json` cannot be written. Activity failures are reported in
    /// the returned [`RunReport`].
    pub async fn run(&self, activities: &[SharedActivity]) -> HarnessResult<RunReport> {
        tokio::fs::create_dir_all(&self.data_directory).await?;
        info!(count = activities.len(), "running activities");
        let new_system = self.check_new_system(activities).await?;

        let started = Instant::now();
        let mut outcomes = Vec::with_capacity(activities.len());
        let mut stopped = false;
        let mut next = 0;

        while let Some(activity) = activities.get(next) {
            if self.stop.is_requested() {
                warn!(remaining = activities.len() - next, "stopping on request");
                stopped = true;
                break;
            }
            next += 1;

            let name = activity.name();
            self.board.start(name);
            let outcome = activity.execute().await;
            self.board.complete(name, outcome.status);
            announce(&outcome);

            let failed = outcome.status == Status::Error;
            outcomes.push(outcome);
            if failed {
                warn!(activity = name, "stopping after error");
                break;
            }
        }

        let report = RunReport {
            outcomes,
            skipped: activities[next..].iter().map(|a| a.name().to_string()).collect(),
            stopped,
            new_system,
            elapsed: started.elapsed(),
        };
        write_outcomes(&self.outcome_path(), &report.outcomes).await?;
        info!(
            passed = report.passed(),
            outcome_file = %self.outcome_path().display(),
            "Completed in {}",
            hms(report.elapsed)
        );
        Ok(report)
    }

    async fn check_new_system(&self, activities: &[SharedActivity]) -> HarnessResult<Option<AppVersion>> {
        if !activities.iter().any(|a| a.uses_new_system()) {
            return Ok(None);
        }
        let Some(api) = &self.new_system else {
            warn!("no New-system client, build check skipped");
            return Ok(None);
        };
        let version = api.app_version().await?;
        info!(
            build = %version.build_number,
            git_hash = %version.short_git_hash,
            "Connected to New system {version}"
        );
        Ok(Some(version))
    }
}

fn announce(outcome: &Outcome) {
    info!(
        activity = %outcome.activity_name,
        status = %outcome.status,
        elapsed = %outcome.elapsed_text(),
        message = %outcome.message,
        "activity finished"
    );
    match outcome.status {
        Status::Ok | Status::NoOperation => {
            let command = if outcome.activity_name.starts_with('R') && !outcome.command.is_empty() {
                format!(" ({})", outcome.command)
            } else {
                String::new()
            };
            info!("✓ {} {}{command}", outcome.elapsed_text(), outcome.activity_name);
        }
        Status::ToBeDone | Status::Error => error!("{}", failure_block(outcome)),
    }
}

/// Detailed console block for a failed or unfinished activity
#[must_use]
pub fn failure_block(outcome: &Outcome) -> String {
    let mut block = String::new();
    let _ = writeln!(block, "------------------- ERROR in {} -------------------", outcome.activity_name);
    let _ = writeln!(block, "Status: {}", outcome.status);
    let _ = writeln!(block, "Duration: {}", outcome.elapsed_text());
    if !outcome.command.is_empty() {
        let _ = writeln!(block, "Command: {}", outcome.command);
    }
    let _ = writeln!(block, "Message: {}", outcome.message);
    if !outcome.stdout.is_empty() {
        let _ = writeln!(block, "Output:\n{}", outcome.stdout);
    }
    if !outcome.stderr.is_empty() {
        let _ = writeln!(block, "Error Output:\n{}", outcome.stderr);
    }
    block
}

async fn write_outcomes(path: &Path, outcomes: &[Outcome]) -> HarnessResult<()> {
    let json = serde_json::to_string_pretty(outcomes)?;
    tokio::fs::write(path, json).await?;
    Ok(())
}
