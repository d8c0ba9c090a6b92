//! Tracing subscriber setup for the binary

use crate::config::LoggingConfig;
use crate::error::{HarnessError, HarnessResult};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber: `RUST_LOG` filter (default `info`),
/// JSON or human output per `config`
///
/// # Errors
/// When a global subscriber is already installed.
pub fn init(config: LoggingConfig) -> HarnessResult<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    let installed = if config.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
    installed.map_err(|e| HarnessError::Logging(e.to_string()))
}
