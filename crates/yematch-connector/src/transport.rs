//! The seam between activities and the remote host

use crate::error::ConnectorResult;
use serde::Serialize;
use std::path::Path;

/// Completed remote command
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct RunResult {
    /// Remote exit status; `-1` when the process was killed by a signal
    pub exit_status: i32,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

impl RunResult {
    /// Exit status zero
    #[inline]
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_status == 0
    }
}

/// Result of fetching one remote file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Download {
    /// File copied; size in bytes
    Fetched(u64),
    /// Remote file does not exist
    Missing {
        /// What the transfer client said
        note: String,
    },
}

impl Download {
    /// File was copied
    #[inline]
    #[must_use]
    pub fn is_fetched(&self) -> bool {
        matches!(self, Self::Fetched(_))
    }
}

/// Remote command execution and file retrieval
///
/// Implemented by [`crate::SshConnector`] and by test fakes.
#[async_trait::async_trait]
pub trait RemoteTransport: Send + Sync {
    /// Run `script` with `args` appended verbatim
    ///
    /// # Errors
    /// Only when the session itself fails; a non-zero exit is a normal result.
    async fn run_command(&self, script: &str, args: &str) -> ConnectorResult<RunResult>;

    /// Copy `remote` to `local`
    ///
    /// # Errors
    /// Transport failures other than a missing remote file.
    async fn download_file(&self, remote: &str, local: &Path) -> ConnectorResult<Download>;

    /// Release the session; later calls reconnect
    async fn close(&self) {}
}
