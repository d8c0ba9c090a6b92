//! Harness configuration
//!
//! Loaded from a TOML file, then patched from `YEMATCH_`-prefixed environment
//! variables, then validated. Every section has defaults, so a file only needs
//! the values that differ.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use yematch_connector::{ConnectorError, RemoteConfig};

/// Path-map key naming the Legacy report directory
pub const REPORT_DIR_KEY: &str = "REPORT_DIR";

/// Overrides the Legacy host
pub const ENV_REMOTE_HOST: &str = "YEMATCH_REMOTE_HOST";
/// Overrides the New-system bearer token
pub const ENV_NEW_SYSTEM_TOKEN: &str = "YEMATCH_NEW_SYSTEM_TOKEN";

/// Configuration failures
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("cannot read {path}: {source}")]
    Read {
        /// Configuration file
        path: PathBuf,
        /// Read failure
        #[source]
        source: std::io::Error,
    },

    /// File is not valid TOML for [`HarnessConfig`]
    #[error("cannot parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Values parse but cannot be used
    #[error("invalid configuration: {0}")]
    Invalid(String),

    /// Remote section failed its own checks
    #[error("invalid remote configuration: {0}")]
    Remote(#[from] ConnectorError),
}

impl ConfigError {
    fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }
}

/// Result alias for configuration
pub type ConfigResult<T> = Result<T, ConfigError>;

/// New-system HTTP endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewSystemConfig {
    /// Base URL, e.g. `http://localhost:7141/`
    pub base_url: String,
    /// Bearer token forwarded on every request
    pub token: Option<String>,
    /// Per-request timeout
    pub timeout_secs: u64,
}

impl Default for NewSystemConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:7141/".to_string(),
            token: None,
            timeout_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Emit JSON lines instead of human-readable text
    pub json: bool,
}

/// A local program run as an arrange activity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrangeCommand {
    /// Catalog name
    pub name: String,
    /// Executable, resolved on `PATH`
    pub program: String,
    /// Arguments passed as given
    #[serde(default)]
    pub args: Vec<String>,
    /// Directory to run in, the current one when absent
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
}

/// Per-step replacement for the Legacy job or its arguments
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StepOverride {
    /// Job script; prefix with `!` to disable the step
    pub legacy_job: Option<String>,
    /// Argument string; `{year}` is replaced by the profit year
    pub legacy_args: Option<String>,
}

/// Adjustment inputs sent with the profit-share update and edit calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProfitShareParams {
    /// Company contribution as a percent of wages
    pub contribution_percent: Decimal,
    /// Forfeitures redistributed, percent
    pub incoming_forfeit_percent: Decimal,
    /// Earnings credited, percent
    pub earnings_percent: Decimal,
    /// Secondary earnings credited, percent
    pub secondary_earnings_percent: Decimal,
    /// Per-employee contribution cap in dollars
    pub max_allowed_contributions: i64,
}

impl Default for ProfitShareParams {
    /// Reference values from the 2022 year-end run
    fn default() -> Self {
        Self {
            contribution_percent: Decimal::new(15, 0),
            incoming_forfeit_percent: Decimal::new(876_678, 6),
            earnings_percent: Decimal::new(9_280_136, 6),
            secondary_earnings_percent: Decimal::ZERO,
            max_allowed_contributions: 57_000,
        }
    }
}

/// Complete harness configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Where downloaded reports and `outcome.json` go
    pub data_directory: PathBuf,
    /// Year being closed
    pub profit_year: i32,
    /// Legacy host session
    pub remote: RemoteConfig,
    /// New-system endpoint and token
    pub new_system: NewSystemConfig,
    /// Subscriber settings
    pub logging: LoggingConfig,
    /// Local programs exposed as catalog activities
    pub arrange: Vec<ArrangeCommand>,
    /// Keyed by step id, e.g. `"17"`
    pub steps: BTreeMap<String, StepOverride>,
    /// Adjustment inputs for the profit-share calls
    pub profit_share: ProfitShareParams,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            data_directory: std::env::temp_dir().join("yematch"),
            profit_year: 2024,
            remote: RemoteConfig::default(),
            new_system: NewSystemConfig::default(),
            logging: LoggingConfig::default(),
            arrange: Vec::new(),
            steps: BTreeMap::new(),
            profit_share: ProfitShareParams::default(),
        }
    }
}

impl HarnessConfig {
    /// Read, patch from the process environment, validate
    ///
    /// # Errors
    /// Unreadable file, malformed TOML or a failed [`HarnessConfig::validate`].
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&text)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse without environment overrides or validation
    ///
    /// # Errors
    /// Malformed TOML.
    pub fn from_toml(text: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Apply `YEMATCH_` overrides looked up through `lookup`
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup(ENV_REMOTE_HOST).filter(|h| !h.is_empty()) {
            self.remote.host = host;
        }
        if let Some(token) = lookup(ENV_NEW_SYSTEM_TOKEN).filter(|t| !t.is_empty()) {
            self.new_system.token = Some(token);
        }
    }

    /// Check everything that would otherwise fail halfway through a run
    ///
    /// # Errors
    /// [`ConfigError`] naming the first offending value.
    pub fn validate(&self) -> ConfigResult<()> {
        self.remote.validate()?;
        if !self.remote.path_map.paths.contains_key(REPORT_DIR_KEY) {
            return Err(ConfigError::invalid(format!(
                "remote.path_map.paths.{REPORT_DIR_KEY} is required"
            )));
        }
        reqwest::Url::parse(&self.new_system.base_url)
            .map_err(|e| ConfigError::invalid(format!("new_system.base_url '{}': {e}", self.new_system.base_url)))?;
        if self.new_system.timeout_secs == 0 {
            return Err(ConfigError::invalid("new_system.timeout_secs must be non-zero"));
        }
        if !(2000..=2100).contains(&self.profit_year) {
            return Err(ConfigError::invalid(format!("profit_year {} is out of range", self.profit_year)));
        }

        let mut names = HashSet::new();
        for command in &self.arrange {
            if command.name.is_empty() || command.program.is_empty() {
                return Err(ConfigError::invalid("arrange entries need a name and a program"));
            }
            if !names.insert(command.name.as_str()) {
                return Err(ConfigError::invalid(format!("arrange '{}' is declared twice", command.name)));
            }
        }
        for id in self.steps.keys() {
            if crate::steps::find(id).is_none() {
                return Err(ConfigError::invalid(format!("steps.{id} is not a year-end step")));
            }
        }
        Ok(())
    }

    /// Legacy report directory from the path map
    #[must_use]
    pub fn report_dir(&self) -> &str {
        self.remote
            .path_map
            .paths
            .get(REPORT_DIR_KEY)
            .map_or("", String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"
data_directory = "/tmp/yematch"
profit_year = 2024

[remote]
host = "legacy-host"
user = "ops"
sandbox_dir = "/home/ops/yematch-sandbox"
script_dir = "/prod/jobs"

[remote.path_map]
version = 3
[remote.path_map.paths]
REPORT_DIR = "/data/reports/test"

[new_system]
base_url = "http://localhost:7141/"
timeout_secs = 60

[logging]
json = true

[steps."17"]
legacy_job = "!PROF-SHARE"

[[arrange]]
name = "ImportReadyDbToSmartDb"
program = "dotnet"
args = ["run", "import-from-ready"]
"#;

    #[test]
    fn sample_parses_and_validates() {
        let config = HarnessConfig::from_toml(SAMPLE).unwrap();
        config.validate().unwrap();
        assert_eq!(config.remote.host, "legacy-host");
        assert_eq!(config.remote.connect_timeout_secs, 15);
        assert_eq!(config.report_dir(), "/data/reports/test");
        assert_eq!(config.new_system.timeout_secs, 60);
        assert!(config.logging.json);
        assert_eq!(config.arrange[0].args, vec!["run", "import-from-ready"]);
        assert_eq!(config.steps["17"].legacy_job.as_deref(), Some("!PROF-SHARE"));
        assert_eq!(config.profit_share.max_allowed_contributions, 57_000);
        assert_eq!(config.profit_share.earnings_percent.to_string(), "9.280136");
    }

    #[test]
    fn environment_overrides_host_and_token() {
        let mut config = HarnessConfig::from_toml(SAMPLE).unwrap();
        config.apply_env(|key| match key {
            ENV_REMOTE_HOST => Some("other-host".to_string()),
            ENV_NEW_SYSTEM_TOKEN => Some("secret".to_string()),
            _ => None,
        });
        assert_eq!(config.remote.host, "other-host");
        assert_eq!(config.new_system.token.as_deref(), Some("secret"));
    }

    #[test]
    fn validation_rejects_bad_values() {
        let base = HarnessConfig::from_toml(SAMPLE).unwrap();

        let mut bad = base.clone();
        bad.new_system.base_url = "not a url".to_string();
        assert!(matches!(bad.validate(), Err(ConfigError::Invalid(_))));

        let mut bad = base.clone();
        bad.new_system.timeout_secs = 0;
        assert!(bad.validate().is_err());

        let mut bad = base.clone();
        bad.remote.host.clear();
        assert!(matches!(bad.validate(), Err(ConfigError::Remote(_))));

        let mut bad = base.clone();
        bad.remote.path_map.paths.clear();
        assert!(bad.validate().is_err());

        let mut bad = base.clone();
        bad.arrange.push(bad.arrange[0].clone());
        assert!(bad.validate().is_err());

        let mut bad = base;
        bad.steps.insert("99".to_string(), StepOverride::default());
        assert!(bad.validate().is_err());
    }

    #[test]
    fn load_reports_missing_file() {
        let err = HarnessConfig::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
