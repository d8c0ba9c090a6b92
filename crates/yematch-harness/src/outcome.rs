//! Activity outcomes
//!
//! An [`Outcome`] is built once by the activity that produced it. Parallel
//! pairs fold their two outcomes together with [`Outcome::merge`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Final status of one activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    /// Completed and, for asserts, clean
    Ok,
    /// Failed; the runner stops here
    Error,
    /// Step has nothing to do on this side
    NoOperation,
    /// Step still needs a manual or unfinished implementation
    ToBeDone,
}

impl Status {
    const fn severity(self) -> u8 {
        match self {
            Self::NoOperation => 0,
            Self::Ok => 1,
            Self::ToBeDone => 2,
            Self::Error => 3,
        }
    }

    /// The worse of two statuses
    #[inline]
    #[must_use]
    pub const fn worst(self, other: Self) -> Self {
        if other.severity() > self.severity() {
            other
        } else {
            self
        }
    }

    /// Whether a run containing this status may still exit 0
    #[inline]
    #[must_use]
    pub const fn is_acceptable(self) -> bool {
        matches!(self, Self::Ok | Self::NoOperation)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Ok => "Ok",
            Self::Error => "Error",
            Self::NoOperation => "NoOperation",
            Self::ToBeDone => "ToBeDone",
        };
        f.write_str(s)
    }
}

/// Result of running one activity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    /// Catalog name, e.g. `R17`
    pub activity_name: String,
    /// Human step name, e.g. `ProfitShareReportEditRun`
    pub step_name: String,
    /// What was invoked: a job with arguments, an endpoint, a local program
    pub command: String,
    /// Verdict of the run
    pub status: Status,
    /// Summary lines such as record counts or a parity report
    pub message: String,
    /// Wall time, absent for outcomes that did no work
    pub duration: Option<Duration>,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

impl Outcome {
    /// Create an outcome with empty texts
    #[must_use]
    pub fn new(activity_name: impl Into<String>, step_name: impl Into<String>, status: Status) -> Self {
        Self {
            activity_name: activity_name.into(),
            step_name: step_name.into(),
            command: String::new(),
            status,
            message: String::new(),
            duration: None,
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    /// Successful outcome carrying `message`
    #[must_use]
    pub fn ok(activity_name: impl Into<String>, step_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(activity_name, step_name, Status::Ok).with_message(message)
    }

    /// Failed outcome carrying `message`
    #[must_use]
    pub fn error(activity_name: impl Into<String>, step_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(activity_name, step_name, Status::Error).with_message(message)
    }

    /// Nothing to do for this step on this side
    #[must_use]
    pub fn no_operation(activity_name: impl Into<String>, step_name: impl Into<String>) -> Self {
        Self::new(activity_name, step_name, Status::NoOperation)
    }

    /// Step not implemented yet on this side
    #[must_use]
    pub fn to_be_done(activity_name: impl Into<String>, step_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(activity_name, step_name, Status::ToBeDone).with_message(message)
    }

    /// Record what was invoked
    #[inline]
    #[must_use]
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    /// Replace the message
    #[inline]
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Record the wall time
    #[inline]
    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Attach captured output
    #[inline]
    #[must_use]
    pub fn with_streams(mut self, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        self.stdout = stdout.into();
        self.stderr = stderr.into();
        self
    }

    /// Fold the New side's outcome into this Legacy outcome
    ///
    /// The status is the worse of the two. Texts are kept from both sides,
    /// tagged `[legacy]` and `[new]`; the longer duration wins since both
    /// sides ran concurrently.
    #[must_use]
    pub fn merge(self, new: Outcome) -> Outcome {
        Outcome {
            activity_name: self.activity_name,
            step_name: self.step_name,
            command: tagged(&self.command, &new.command),
            status: self.status.worst(new.status),
            message: tagged(&self.message, &new.message),
            duration: match (self.duration, new.duration) {
                (Some(a), Some(b)) => Some(a.max(b)),
                (a, b) => a.or(b),
            },
            stdout: tagged(&self.stdout, &new.stdout),
            stderr: tagged(&self.stderr, &new.stderr),
        }
    }

    /// `mm:ss` for the console, `--:--` when unknown
    #[must_use]
    pub fn elapsed_text(&self) -> String {
        match self.duration {
            Some(d) => {
                let secs = d.as_secs();
                format!("{:02}:{:02}", secs / 60, secs % 60)
            }
            None => "--:--".to_string(),
        }
    }
}

fn tagged(legacy: &str, new: &str) -> String {
    let legacy = legacy.trim_end();
    let new = new.trim_end();
    match (legacy.is_empty(), new.is_empty()) {
        (true, true) => String::new(),
        (false, true) => format!("[legacy] {legacy}"),
        (true, false) => format!("[new] {new}"),
        (false, false) => format!("[legacy] {legacy}\n[new] {new}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn severity_orders_error_above_pending_above_ok() {
        assert_eq!(Status::Ok.worst(Status::Error), Status::Error);
        assert_eq!(Status::ToBeDone.worst(Status::Ok), Status::ToBeDone);
        assert_eq!(Status::Error.worst(Status::ToBeDone), Status::Error);
        assert_eq!(Status::NoOperation.worst(Status::Ok), Status::Ok);
        assert_eq!(Status::NoOperation.worst(Status::NoOperation), Status::NoOperation);
    }

    #[test]
    fn only_ok_and_no_operation_are_acceptable() {
        assert!(Status::Ok.is_acceptable());
        assert!(Status::NoOperation.is_acceptable());
        assert!(!Status::ToBeDone.is_acceptable());
        assert!(!Status::Error.is_acceptable());
    }

    #[test]
    fn merge_keeps_both_texts_and_worst_status() {
        let legacy = Outcome::ok("R03", "ProfTermination", "downloaded QPAY066")
            .with_command("PROF-TERM YEAR=2024")
            .with_duration(Duration::from_secs(90));
        let new = Outcome::error("S03", "ProfTermination", "HTTP 500").with_duration(Duration::from_secs(4));

        let merged = legacy.merge(new);
        assert_eq!(merged.status, Status::Error);
        assert_eq!(merged.message, "[legacy] downloaded QPAY066\n[new] HTTP 500");
        assert_eq!(merged.command, "[legacy] PROF-TERM YEAR=2024");
        assert_eq!(merged.duration, Some(Duration::from_secs(90)));
        assert_eq!(merged.elapsed_text(), "01:30");
    }

    #[test]
    fn outcome_serializes_status_by_name() {
        let json = serde_json::to_value(Outcome::to_be_done("S07", "ReadyScreen00809", "manual")).unwrap();
        assert_eq!(json["status"], "ToBeDone");
        assert_eq!(json["duration"], serde_json::Value::Null);
    }
}
