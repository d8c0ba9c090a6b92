//! Remote job connector for the legacy host
//!
//! Provides:
//! - [`RemoteTransport`]: run a job script, download a report file
//! - [`SshConnector`]: the OpenSSH implementation, one multiplexed session per host
//! - [`RemoteConfig`] and the versioned [`PathMap`] exported to every job
//!
//! A non-zero exit is data, not an error; only transport failures are
//! [`ConnectorError`]s.

pub mod config;
pub mod error;
pub mod ssh;
pub mod transport;

pub use config::{PathMap, RemoteConfig, PATH_MAP_VERSION_KEY};
pub use error::{ConnectorError, ConnectorResult};
pub use ssh::{shell_quote, SshConnector};
pub use transport::{Download, RemoteTransport, RunResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
