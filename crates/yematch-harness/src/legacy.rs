//! Legacy-side activities
//!
//! A Legacy activity runs one job script through the connector. On success
//! it looks for the `LogFile:` marker in the job's output, downloads the
//! reports that run produced into the data directory and, when an extractor
//! knows the report, parses it so a malformed report fails the step there and
//! then instead of at the parity check.

use crate::activity::{parse_step_identifier, Activity};
use crate::outcome::{Outcome, Status};
use crate::steps::ReportArtifact;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};
use yematch_connector::{ConnectorError, Download, RemoteTransport};
use yematch_reports::ExtractorRegistry;

static LOG_MARKER: Lazy<Result<Regex, regex::Error>> = Lazy::new(|| Regex::new(r"LogFile:\s*(\S+)_(\S+)\.log"));

/// Run id from a job's `LogFile: NAME_ID.log` marker
#[must_use]
pub fn log_file_id(stdout: &str) -> Option<String> {
    let marker = LOG_MARKER.as_ref().ok()?;
    marker.captures(stdout).map(|c| c[2].to_string())
}

/// One Legacy job
pub struct LegacyActivity {
    name: String,
    step_name: String,
    job: String,
    args: String,
    reports: Vec<ReportArtifact>,
    transport: Arc<dyn RemoteTransport>,
    extractors: Arc<ExtractorRegistry>,
    data_directory: PathBuf,
    report_dir: String,
}

impl LegacyActivity {
    /// Create an activity running `job`; a `!` prefix disables it
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        step_name: impl Into<String>,
        job: impl Into<String>,
        transport: Arc<dyn RemoteTransport>,
    ) -> Self {
        Self {
            name: name.into(),
            step_name: step_name.into(),
            job: job.into(),
            args: String::new(),
            reports: Vec::new(),
            transport,
            extractors: Arc::new(ExtractorRegistry::new()),
            data_directory: PathBuf::from("."),
            report_dir: String::new(),
        }
    }

    /// Set the argument string
    #[inline]
    #[must_use]
    pub fn with_args(mut self, args: impl Into<String>) -> Self {
        self.args = args.into();
        self
    }

    /// Reports to fetch after a successful run
    #[inline]
    #[must_use]
    pub fn with_reports(mut self, reports: &[ReportArtifact]) -> Self {
        self.reports = reports.to_vec();
        self
    }

    /// Extractors used to check fetched reports
    #[inline]
    #[must_use]
    pub fn with_extractors(mut self, extractors: Arc<ExtractorRegistry>) -> Self {
        self.extractors = extractors;
        self
    }

    /// Local destination and remote report directory
    #[inline]
    #[must_use]
    pub fn with_output(mut self, data_directory: impl Into<PathBuf>, report_dir: impl Into<String>) -> Self {
        self.data_directory = data_directory.into();
        self.report_dir = report_dir.into();
        self
    }

    /// Job script, `!` prefix included
    #[must_use]
    pub fn job(&self) -> &str {
        &self.job
    }

    /// Argument string after `{year}` substitution
    #[must_use]
    pub fn args(&self) -> &str {
        &self.args
    }

    async fn collect_reports(&self, stdout: &str, notes: &mut Vec<String>) -> Result<Status, ConnectorError> {
        let Some(log_id) = log_file_id(stdout) else {
            warn!(activity = %self.name, "LogFile marker not found in job output");
            notes.push("LogFile marker not found in job output; reports not fetched".to_string());
            return Ok(Status::Ok);
        };

        let mut status = Status::Ok;
        for artifact in &self.reports {
            let remote = artifact.remote_path(&self.report_dir, &log_id);
            let local = self.data_directory.join(artifact.local_name(&self.name));
            match self.transport.download_file(&remote, &local).await? {
                Download::Missing { note } => {
                    warn!(activity = %self.name, report = artifact.report_id, %note, "report not produced");
                    notes.push(format!("{}: not produced ({note})", artifact.report_id));
                }
                Download::Fetched(bytes) => match self.check_report(artifact.report_id, &local).await {
                    Ok(line) => notes.push(line.unwrap_or_else(|| format!("{}: {bytes} bytes", artifact.report_id))),
                    Err(message) => {
                        error!(activity = %self.name, report = artifact.report_id, %message, "report rejected");
                        status = Status::Error;
                        notes.push(message);
                    }
                },
            }
        }
        Ok(status)
    }

    async fn check_report(&self, report_id: &str, local: &Path) -> Result<Option<String>, String> {
        let Some(extractor) = self.extractors.get(report_id) else {
            return Ok(None);
        };
        let text = tokio::fs::read_to_string(local)
            .await
            .map_err(|e| format!("{report_id}: cannot read {}: {e}", local.display()))?;
        let summary = extractor.check(&text).map_err(|e| e.to_string())?;
        Ok(Some(format!("{}: {} records", summary.report, summary.records)))
    }
}

#[async_trait::async_trait]
impl Activity for LegacyActivity {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self) -> Outcome {
        let (enabled, script) = parse_step_identifier(&self.job);
        let command = format!("{script} {}", self.args).trim_end().to_string();
        if !enabled {
            return Outcome::no_operation(&self.name, &self.step_name).with_command(command);
        }

        info!(activity = %self.name, %command, "running legacy job");
        let started = Instant::now();
        let result = match self.transport.run_command(script, &self.args).await {
            Ok(result) => result,
            Err(e) => {
                error!(activity = %self.name, error = %e, "legacy job could not be run");
                return Outcome::error(&self.name, &self.step_name, e.to_string())
                    .with_command(command)
                    .with_duration(started.elapsed());
            }
        };

        if !result.success() {
            return Outcome::error(
                &self.name,
                &self.step_name,
                format!("{script} exited with status {}", result.exit_status),
            )
            .with_command(command)
            .with_streams(result.stdout, result.stderr)
            .with_duration(started.elapsed());
        }

        let mut notes = Vec::new();
        let status = if self.reports.is_empty() {
            Status::Ok
        } else {
            match self.collect_reports(&result.stdout, &mut notes).await {
                Ok(status) => status,
                Err(e) => {
                    notes.push(e.to_string());
                    Status::Error
                }
            }
        };

        Outcome::new(&self.name, &self.step_name, status)
            .with_command(command)
            .with_message(notes.join("\n"))
            .with_streams(result.stdout, result.stderr)
            .with_duration(started.elapsed())
    }
}
