//! Remote host configuration and the versioned path mapping

use crate::error::{ConnectorError, ConnectorResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Environment parameter carrying [`PathMap::version`]
pub const PATH_MAP_VERSION_KEY: &str = "YEMATCH_PATHMAP_VERSION";

/// Logical name to environment path, exported to every remote job
///
/// The legacy jobs read their input and output locations from these
/// parameters instead of having them rewritten in the job file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PathMap {
    /// Bumped whenever the mapping's meaning changes
    pub version: u32,
    /// `KEY` to path
    pub paths: BTreeMap<String, String>,
}

impl PathMap {
    /// Create an empty mapping at `version`
    #[inline]
    #[must_use]
    pub fn new(version: u32) -> Self {
        Self {
            version,
            paths: BTreeMap::new(),
        }
    }

    /// Add one mapping
    #[inline]
    #[must_use]
    pub fn with_path(mut self, key: impl Into<String>, path: impl Into<String>) -> Self {
        self.paths.insert(key.into(), path.into());
        self
    }

    /// `KEY=value` pairs in export order, version first
    #[must_use]
    pub fn env_params(&self) -> Vec<(String, String)> {
        std::iter::once((PATH_MAP_VERSION_KEY.to_string(), self.version.to_string()))
            .chain(self.paths.iter().map(|(k, v)| (k.clone(), v.clone())))
            .collect()
    }

    /// Keys must be usable as shell variable names
    ///
    /// # Errors
    /// [`ConnectorError::InvalidConfig`] naming the offending key.
    pub fn validate(&self) -> ConnectorResult<()> {
        for key in self.paths.keys() {
            let mut chars = key.chars();
            let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
            if !valid {
                return Err(ConnectorError::InvalidConfig(format!("path map key '{key}' is not a valid variable name")));
            }
            if key == PATH_MAP_VERSION_KEY {
                return Err(ConnectorError::InvalidConfig(format!("path map key '{key}' is reserved")));
            }
        }
        Ok(())
    }
}

/// Where and how to reach the legacy host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Host name or address
    pub host: String,
    /// Login user; the ssh client default when absent
    pub user: Option<String>,
    /// SSH port; the ssh client default when absent
    pub port: Option<u16>,
    /// Bound on establishing the master connection
    pub connect_timeout_secs: u64,
    /// Local directory holding the control socket
    pub control_dir: PathBuf,
    /// Remote directory production scripts are copied into before running
    pub sandbox_dir: Option<String>,
    /// Remote directory holding the production scripts
    pub script_dir: String,
    /// Exported path parameters
    pub path_map: PathMap,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            user: None,
            port: None,
            connect_timeout_secs: 15,
            control_dir: std::env::temp_dir(),
            sandbox_dir: None,
            script_dir: String::new(),
            path_map: PathMap::default(),
        }
    }
}

impl RemoteConfig {
    /// Create config for `host` with defaults elsewhere
    #[inline]
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    /// `user@host`, or just `host`
    #[must_use]
    pub fn destination(&self) -> String {
        match &self.user {
            Some(user) => format!("{user}@{}", self.host),
            None => self.host.clone(),
        }
    }

    /// Connect timeout as a duration
    #[inline]
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Reject configurations no session could be opened with
    ///
    /// # Errors
    /// [`ConnectorError::InvalidConfig`] describing the first problem.
    pub fn validate(&self) -> ConnectorResult<()> {
        if self.host.trim().is_empty() {
            return Err(ConnectorError::InvalidConfig("remote host is empty".into()));
        }
        if self.connect_timeout_secs == 0 {
            return Err(ConnectorError::InvalidConfig("connect timeout must be non-zero".into()));
        }
        if self.sandbox_dir.as_deref().is_some_and(|d| d.trim_end_matches('/').is_empty()) {
            return Err(ConnectorError::InvalidConfig("sandbox directory cannot be the remote root".into()));
        }
        self.path_map.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn version_is_exported_first() {
        let map = PathMap::new(3)
            .with_path("REPORT_DIR", "/data/reports/test")
            .with_path("EXTRACT_DIR", "/data/extract/test");
        let params = map.env_params();
        assert_eq!(params[0], (PATH_MAP_VERSION_KEY.to_string(), "3".to_string()));
        assert_eq!(params[1].0, "EXTRACT_DIR");
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn bad_keys_are_rejected() {
        assert!(PathMap::new(1).with_path("1BAD", "/x").validate().is_err());
        assert!(PathMap::new(1).with_path("HAS-DASH", "/x").validate().is_err());
        assert!(PathMap::new(1).with_path(PATH_MAP_VERSION_KEY, "/x").validate().is_err());
        assert!(PathMap::new(1).with_path("_OK_1", "/x").validate().is_ok());
    }

    #[test]
    fn config_validation() {
        assert!(RemoteConfig::default().validate().is_err());
        assert!(RemoteConfig::new("legacy").validate().is_ok());

        let mut zero = RemoteConfig::new("legacy");
        zero.connect_timeout_secs = 0;
        assert!(zero.validate().is_err());

        let mut root = RemoteConfig::new("legacy");
        root.sandbox_dir = Some("/".into());
        assert!(root.validate().is_err());
    }

    #[test]
    fn destination_includes_user() {
        let mut config = RemoteConfig::new("legacy");
        assert_eq!(config.destination(), "legacy");
        config.user = Some("ops".into());
        assert_eq!(config.destination(), "ops@legacy");
    }

    #[test]
    fn deserializes_from_toml() {
        let config: RemoteConfig = toml::from_str(
            r#"
            host = "legacy-host"
            user = "ops"
            sandbox_dir = "/home/ops/sandbox"
            script_dir = "/prod/jobs"

            [path_map]
            version = 3
            [path_map.paths]
            REPORT_DIR = "/data/reports/test"
            "#,
        )
        .unwrap();
        assert_eq!(config.connect_timeout_secs, 15);
        assert_eq!(config.path_map.version, 3);
        assert_eq!(config.path_map.paths["REPORT_DIR"], "/data/reports/test");
    }
}
