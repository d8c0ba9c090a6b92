//! Connector errors
//!
//! Only transport-level failures are errors. A remote job that exits non-zero
//! is a normal [`crate::RunResult`], and a missing remote file is a
//! [`crate::Download::Missing`] note.

use std::path::PathBuf;
use std::time::Duration;

/// Remote transport failures
#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    /// Local client binary could not be started
    #[error("failed to start {program}: {source}")]
    Spawn {
        /// Binary that failed to start
        program: &'static str,
        /// Underlying spawn failure
        #[source]
        source: std::io::Error,
    },

    /// Master connection did not come up within the connect timeout
    #[error("connecting to {host} timed out after {}s", timeout.as_secs())]
    ConnectTimeout {
        /// Configured host
        host: String,
        /// Timeout that elapsed
        timeout: Duration,
    },

    /// Master connection was refused or authentication failed
    #[error("cannot open session to {host}: {message}")]
    Connect {
        /// Configured host
        host: String,
        /// Client diagnostic
        message: String,
    },

    /// Session dropped while a command was running
    #[error("session to {host} lost: {message}")]
    SessionLost {
        /// Configured host
        host: String,
        /// Client diagnostic
        message: String,
    },

    /// File transfer failed for a reason other than a missing file
    #[error("transfer of {remote} to {} failed: {message}", local.display())]
    Transfer {
        /// Path on the Legacy host
        remote: String,
        /// Intended local destination
        local: PathBuf,
        /// Copy client diagnostic
        message: String,
    },

    /// Local filesystem failure
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Unusable remote configuration
    #[error("invalid remote configuration: {0}")]
    InvalidConfig(String),
}

impl ConnectorError {
    /// Create spawn error
    pub fn spawn(program: &'static str, source: std::io::Error) -> Self {
        Self::Spawn { program, source }
    }

    /// Create connect error
    pub fn connect(host: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connect {
            host: host.into(),
            message: message.into(),
        }
    }

    /// Create session-lost error
    pub fn session_lost(host: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SessionLost {
            host: host.into(),
            message: message.into(),
        }
    }

    /// Create transfer error
    pub fn transfer(remote: impl Into<String>, local: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Transfer {
            remote: remote.into(),
            local: local.into(),
            message: message.into(),
        }
    }
}

/// Result alias for connector operations
pub type ConnectorResult<T> = Result<T, ConnectorError>;
