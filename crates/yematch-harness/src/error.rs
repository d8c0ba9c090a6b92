//! Harness error types
//!
//! Activities report failures through their [`Outcome`](crate::Outcome);
//! these errors cover what happens around them: loading configuration,
//! building the catalog, resolving names and writing results.

use crate::catalog::CatalogError;
use crate::client::ClientError;
use crate::config::ConfigError;
use yematch_connector::ConnectorError;
use yematch_reports::ReportError;

/// Top-level harness error
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// Configuration could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Step tables do not line up
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Legacy transport failure
    #[error(transparent)]
    Connector(#[from] ConnectorError),

    /// New-system call failed
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Report could not be parsed or compared
    #[error(transparent)]
    Report(#[from] ReportError),

    /// Requested name is not in the catalog
    #[error("activity '{0}' not found")]
    UnknownActivity(String),

    /// Logging could not be initialised
    #[error("logging: {0}")]
    Logging(String),

    /// Local filesystem failure
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Outcomes could not be serialized
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl HarnessError {
    /// Create unknown activity error
    pub fn unknown_activity(name: impl Into<String>) -> Self {
        Self::UnknownActivity(name.into())
    }
}

/// Result alias for harness operations
pub type HarnessResult<T> = Result<T, HarnessError>;
