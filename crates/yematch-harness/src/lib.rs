//! YE-Match harness
//!
//! Drives the year-end sequence on the Legacy and New systems side by side:
//! 1. **Catalog**: the step table becomes `R..`, `S..` and `P..` activities
//!    plus arrange commands and parity asserts
//! 2. **Run**: selected activities execute in order until the first error
//!    or a stop request
//! 3. **Record**: every outcome lands in `outcome.json`
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use yematch_harness::prelude::*;
//!
//! let config = HarnessConfig::load(Path::new("yematch.toml"))?;
//! let context = CatalogContext::new(config, transport, api, extractors);
//! let catalog = Catalog::build(&context)?;
//!
//! let runner = Runner::new(&context.config.data_directory);
//! let report = runner.run(&catalog.parallel()).await?;
//! println!("{}", report.generate_text());
//! ```

pub mod activity;
pub mod catalog;
pub mod client;
pub mod command;
pub mod config;
pub mod error;
pub mod legacy;
pub mod logging;
pub mod new_system;
pub mod outcome;
pub mod parallel;
pub mod parity;
pub mod runner;
pub mod steps;

pub use activity::{Activity, ActivityState, SharedActivity, StateBoard};
pub use catalog::{Catalog, CatalogContext, CatalogError};
pub use client::{AppVersion, ClientError, NewSystemApi, NewSystemClient};
pub use config::{ConfigError, HarnessConfig};
pub use error::{HarnessError, HarnessResult};
pub use outcome::{Outcome, Status};
pub use runner::{RunReport, Runner, StopHandle};

/// Harness version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports for driving a run
pub mod prelude {
    pub use crate::activity::{Activity, SharedActivity};
    pub use crate::catalog::{Catalog, CatalogContext};
    pub use crate::config::HarnessConfig;
    pub use crate::error::{HarnessError, HarnessResult};
    pub use crate::outcome::{Outcome, Status};
    pub use crate::runner::{RunReport, Runner};
}
