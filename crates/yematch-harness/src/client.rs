//! New-system HTTP client
//!
//! [`NewSystemApi`] is the seam the New and parity activities talk through;
//! [`NewSystemClient`] implements it over reqwest with a bearer token.

use crate::config::NewSystemConfig;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument};

/// Maximum page size; year-end reports are always fetched whole
pub const TAKE_ALL: &str = "2147483647";

/// Build information endpoint, also a cheap authentication check
pub const APP_VERSION_PATH: &str = "api/common/app-version-info";

/// Build the New system reports about itself
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppVersion {
    /// CI build number
    #[serde(default)]
    pub build_number: String,
    /// Abbreviated commit of the deployed build
    #[serde(default)]
    pub short_git_hash: String,
}

impl fmt::Display for AppVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "build {} git-hash {}", self.build_number, self.short_git_hash)
    }
}

/// Failures talking to the New system
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Base URL or a joined endpoint is not a valid URL
    #[error("invalid base url '{url}': {message}")]
    InvalidBaseUrl {
        /// Offending URL text
        url: String,
        /// Parser diagnostic
        message: String,
    },

    /// Token cannot be sent as a header value
    #[error("invalid bearer token")]
    InvalidToken,

    /// reqwest refused the client settings
    #[error("cannot build http client: {0}")]
    Build(#[source] reqwest::Error),

    /// Connection, timeout or body read failure
    #[error("request to {url} failed: {source}")]
    Request {
        /// Requested URL
        url: String,
        /// Transport failure
        #[source]
        source: reqwest::Error,
    },

    /// Non-success HTTP status
    #[error("{url} answered {status}: {body}")]
    Status {
        /// Requested URL
        url: String,
        /// HTTP status code
        status: u16,
        /// Response body, kept for the outcome message
        body: String,
    },

    /// Response body is not the expected JSON
    #[error("{url} returned malformed JSON: {source}")]
    Decode {
        /// Requested URL
        url: String,
        /// Decoder failure
        #[source]
        source: serde_json::Error,
    },
}

/// Result alias for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Calls the New-system activities make
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait NewSystemApi: Send + Sync {
    /// GET `path` with query parameters, decoding the JSON response
    async fn get_json(&self, path: &str, query: Vec<(String, String)>) -> ClientResult<Value>;

    /// POST a JSON body to `path`; an empty response body is `Null`
    async fn post_json(&self, path: &str, body: Value) -> ClientResult<Value>;

    /// Raw response text for the parity activities
    async fn get_text(&self, path: &str, query: Vec<(String, String)>) -> ClientResult<String>;

    /// Build number and commit of the deployed New system
    async fn app_version(&self) -> ClientResult<AppVersion>;
}

/// reqwest implementation of [`NewSystemApi`]
#[derive(Debug, Clone)]
pub struct NewSystemClient {
    http: reqwest::Client,
    base_url: reqwest::Url,
}

impl NewSystemClient {
    /// Build a client for `config`
    ///
    /// # Errors
    /// Unparseable base URL, a token that cannot be a header value, or a
    /// client build failure.
    pub fn new(config: &NewSystemConfig) -> ClientResult<Self> {
        let mut base = config.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = reqwest::Url::parse(&base).map_err(|e| ClientError::InvalidBaseUrl {
            url: config.base_url.clone(),
            message: e.to_string(),
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = &config.token {
            let mut value =
                HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| ClientError::InvalidToken)?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(ClientError::Build)?;
        Ok(Self { http, base_url })
    }

    /// Base URL with a trailing slash
    #[must_use]
    pub fn base_url(&self) -> &reqwest::Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> ClientResult<reqwest::Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ClientError::InvalidBaseUrl {
                url: format!("{}{path}", self.base_url),
                message: e.to_string(),
            })
    }

    async fn send(&self, request: reqwest::RequestBuilder, url: &reqwest::Url) -> ClientResult<String> {
        let response = request.send().await.map_err(|source| ClientError::Request {
            url: url.to_string(),
            source,
        })?;
        let status = response.status();
        let body = response.text().await.map_err(|source| ClientError::Request {
            url: url.to_string(),
            source,
        })?;
        debug!(%url, status = status.as_u16(), bytes = body.len(), "new system responded");
        if !status.is_success() {
            return Err(ClientError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

fn decode(url: &reqwest::Url, body: &str) -> ClientResult<Value> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(body).map_err(|source| ClientError::Decode {
        url: url.to_string(),
        source,
    })
}

#[async_trait::async_trait]
impl NewSystemApi for NewSystemClient {
    #[instrument(skip(self, query), fields(base = %self.base_url))]
    async fn get_json(&self, path: &str, query: Vec<(String, String)>) -> ClientResult<Value> {
        let body = self.get_text(path, query).await?;
        decode(&self.url(path)?, &body)
    }

    #[instrument(skip(self, body), fields(base = %self.base_url))]
    async fn post_json(&self, path: &str, body: Value) -> ClientResult<Value> {
        let url = self.url(path)?;
        let text = self.send(self.http.post(url.clone()).json(&body), &url).await?;
        decode(&url, &text)
    }

    #[instrument(skip(self, query), fields(base = %self.base_url))]
    async fn get_text(&self, path: &str, query: Vec<(String, String)>) -> ClientResult<String> {
        let url = self.url(path)?;
        self.send(self.http.get(url.clone()).query(&query), &url).await
    }

    #[instrument(skip(self), fields(base = %self.base_url))]
    async fn app_version(&self) -> ClientResult<AppVersion> {
        let url = self.url(APP_VERSION_PATH)?;
        let body = self.send(self.http.get(url.clone()), &url).await?;
        serde_json::from_str(&body).map_err(|source| ClientError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

/// Number of records in a New-system response
#[must_use]
pub fn record_count(value: Value) -> usize {
    yematch_reports::find_records(value)
        .and_then(|v| v.as_array().map(Vec::len))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn counts_records_in_every_envelope() {
        assert_eq!(record_count(json!([1, 2, 3])), 3);
        assert_eq!(record_count(json!({"response": {"results": [1, 2]}})), 2);
        assert_eq!(record_count(json!({"results": []})), 0);
        assert_eq!(record_count(json!({"message": "ok"})), 0);
    }

    #[test]
    fn app_version_reads_camel_case_and_tolerates_gaps() {
        let version: AppVersion = serde_json::from_value(json!({"buildNumber": "1482", "shortGitHash": "9f3c2ab"})).unwrap();
        assert_eq!(version.to_string(), "build 1482 git-hash 9f3c2ab");

        let partial: AppVersion = serde_json::from_value(json!({"buildNumber": "1482"})).unwrap();
        assert_eq!(partial.short_git_hash, "");
    }

    #[test]
    fn base_url_gains_a_trailing_slash() {
        let config = NewSystemConfig {
            base_url: "http://localhost:7141/app".to_string(),
            token: Some("t".to_string()),
            timeout_secs: 5,
        };
        let client = NewSystemClient::new(&config).unwrap();
        assert_eq!(client.url("api/yearend/final").unwrap().as_str(), "http://localhost:7141/app/api/yearend/final");
        assert_eq!(client.url("/api/x").unwrap().as_str(), "http://localhost:7141/app/api/x");
    }

    #[test]
    fn rejects_bad_base_url_and_token() {
        let mut config = NewSystemConfig::default();
        config.base_url = "::".to_string();
        assert!(matches!(NewSystemClient::new(&config), Err(ClientError::InvalidBaseUrl { .. })));

        let mut config = NewSystemConfig::default();
        config.token = Some("line\nbreak".to_string());
        assert!(matches!(NewSystemClient::new(&config), Err(ClientError::InvalidToken)));
    }
}
