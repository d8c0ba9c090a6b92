//! Arrange activities: local programs run before or between steps, such as
//! the database import CLI

use crate::activity::Activity;
use crate::config::ArrangeCommand;
use crate::outcome::Outcome;
use std::path::PathBuf;
use std::time::Instant;
use tokio::process::Command;
use tracing::{error, info};

/// Runs one local program to completion
#[derive(Debug, Clone)]
pub struct CommandActivity {
    name: String,
    program: String,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
}

impl CommandActivity {
    /// Run `program` under catalog name `name`
    #[must_use]
    pub fn new(name: impl Into<String>, program: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
        }
    }

    /// Set the arguments
    #[inline]
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Run from `dir`
    #[inline]
    #[must_use]
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Build from an `[[arrange]]` entry
    #[must_use]
    pub fn from_config(command: &ArrangeCommand) -> Self {
        let activity = Self::new(&command.name, &command.program).with_args(command.args.iter().cloned());
        match &command.working_dir {
            Some(dir) => activity.with_working_dir(dir),
            None => activity,
        }
    }

    fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[async_trait::async_trait]
impl Activity for CommandActivity {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self) -> Outcome {
        let line = self.command_line();
        info!(activity = %self.name, command = %line, "running local command");

        let mut command = Command::new(&self.program);
        command.args(&self.args).kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        let started = Instant::now();
        let output = match command.output().await {
            Ok(output) => output,
            Err(e) => {
                error!(activity = %self.name, error = %e, "cannot start local command");
                return Outcome::error(&self.name, &self.name, format!("cannot start {}: {e}", self.program))
                    .with_command(line)
                    .with_duration(started.elapsed());
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        let outcome = if output.status.success() {
            Outcome::ok(&self.name, &self.name, "")
        } else {
            let code = output
                .status
                .code()
                .map_or_else(|| "a signal".to_string(), |c| format!("status {c}"));
            Outcome::error(&self.name, &self.name, format!("{} exited with {code}", self.program))
        };
        outcome
            .with_command(line)
            .with_streams(stdout, stderr)
            .with_duration(started.elapsed())
    }
}
