//! Remote fetch collaborator for runtime CSS.
//!
//! The optimizer performs at most two requests per document: the runtime
//! version lookup and the stylesheet download. Both go through
//! [`RemoteGetRequest`] so callers can run offline or inject canned
//! responses.

use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::embed::cdn::{CdnVars, METADATA_URL, RUNTIME_CSS_URL};

/// Client timeout for every request.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Prefix of the canary (experimental) runtime channel.
const CANARY_PREFIX: &str = "00";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network access is disabled")]
    Offline,

    #[error("invalid url `{0}`")]
    InvalidUrl(String, #[source] url::ParseError),

    #[error("request to `{url}` failed: {reason}")]
    Request { url: String, reason: String },

    #[error("`{url}` responded with status {status}")]
    Status { url: String, status: u16 },

    #[error("invalid runtime metadata: {0}")]
    InvalidMetadata(#[from] serde_json::Error),
}

/// Capability to GET a text resource.
pub trait RemoteGetRequest: Send + Sync {
    fn get(&self, url: &str) -> Result<String, FetchError>;
}

// ============================================================================
// Implementations
// ============================================================================

/// Blocking HTTP client.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("amp-optimizer/", env!("CARGO_PKG_VERSION")))
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|err| FetchError::Request {
                url: String::new(),
                reason: err.to_string(),
            })?;
        Ok(Self { client })
    }
}

impl RemoteGetRequest for HttpFetcher {
    fn get(&self, url: &str) -> Result<String, FetchError> {
        let parsed = Url::parse(url).map_err(|err| FetchError::InvalidUrl(url.to_string(), err))?;
        let request_failed = |err: reqwest::Error| FetchError::Request {
            url: url.to_string(),
            reason: err.to_string(),
        };

        crate::debug!("fetch"; "GET {}", url);
        let response = self.client.get(parsed).send().map_err(request_failed)?;
        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }
        response.text().map_err(request_failed)
    }
}

/// Fetcher for runs without network access. Every request fails, which makes
/// the runtime CSS fall back to the bundled copy.
pub struct OfflineFetcher;

impl RemoteGetRequest for OfflineFetcher {
    fn get(&self, _url: &str) -> Result<String, FetchError> {
        Err(FetchError::Offline)
    }
}

// ============================================================================
// Runtime lookups
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RuntimeMetadata {
    amp_runtime_version: String,
    #[serde(default)]
    diversions: Vec<String>,
}

/// Current runtime version. With `canary`, the first canary diversion is
/// preferred over the production version.
pub fn runtime_version(
    fetcher: &dyn RemoteGetRequest,
    host: &str,
    canary: bool,
) -> Result<String, FetchError> {
    let url = METADATA_URL.render(&CdnVars {
        host: host.to_string(),
        version: String::new(),
    });
    let metadata: RuntimeMetadata = serde_json::from_str(&fetcher.get(&url)?)?;
    let canary_version = canary
        .then(|| {
            metadata
                .diversions
                .iter()
                .find(|version| version.starts_with(CANARY_PREFIX))
        })
        .flatten();
    Ok(canary_version
        .cloned()
        .unwrap_or(metadata.amp_runtime_version))
}

/// Runtime stylesheet of `version`.
pub fn runtime_css(
    fetcher: &dyn RemoteGetRequest,
    host: &str,
    version: &str,
) -> Result<String, FetchError> {
    let url = RUNTIME_CSS_URL.render(&CdnVars {
        host: host.to_string(),
        version: version.to_string(),
    });
    fetcher.get(&url)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rustc_hash::FxHashMap;
    use std::sync::Mutex;

    /// Canned responses keyed by URL; unknown URLs fail. Requested URLs are
    /// recorded in order.
    #[derive(Default)]
    pub struct StubFetcher {
        responses: FxHashMap<String, String>,
        pub requests: Mutex<Vec<String>>,
    }

    impl StubFetcher {
        pub fn with(mut self, url: &str, body: &str) -> Self {
            self.responses.insert(url.to_string(), body.to_string());
            self
        }

        pub fn requested(&self) -> Vec<String> {
            self.requests.lock().map(|r| r.clone()).unwrap_or_default()
        }
    }

    impl RemoteGetRequest for StubFetcher {
        fn get(&self, url: &str) -> Result<String, FetchError> {
            if let Ok(mut requests) = self.requests.lock() {
                requests.push(url.to_string());
            }
            self.responses
                .get(url)
                .cloned()
                .ok_or_else(|| FetchError::Status {
                    url: url.to_string(),
                    status: 404,
                })
        }
    }

    const HOST: &str = "https://cdn.test";
    const METADATA: &str =
        r#"{"ampRuntimeVersion":"012345","diversions":["023456","001111","031111"]}"#;

    #[test]
    fn test_runtime_version() {
        let fetcher = StubFetcher::default().with("https://cdn.test/rtv/metadata", METADATA);
        assert_eq!(runtime_version(&fetcher, HOST, false).unwrap(), "012345");
        assert_eq!(runtime_version(&fetcher, HOST, true).unwrap(), "001111");
    }

    #[test]
    fn test_canary_without_diversion_uses_production() {
        let fetcher = StubFetcher::default()
            .with("https://cdn.test/rtv/metadata", r#"{"ampRuntimeVersion":"012345"}"#);
        assert_eq!(runtime_version(&fetcher, HOST, true).unwrap(), "012345");
    }

    #[test]
    fn test_invalid_metadata() {
        let fetcher = StubFetcher::default().with("https://cdn.test/rtv/metadata", "<html>");
        assert!(matches!(
            runtime_version(&fetcher, HOST, false),
            Err(FetchError::InvalidMetadata(_))
        ));
    }

    #[test]
    fn test_runtime_css() {
        let fetcher =
            StubFetcher::default().with("https://cdn.test/rtv/012345/v0.css", "html{x:y}");
        assert_eq!(runtime_css(&fetcher, HOST, "012345").unwrap(), "html{x:y}");
        assert!(runtime_css(&fetcher, HOST, "099999").is_err());
        assert_eq!(fetcher.requested().len(), 2);
    }

    #[test]
    fn test_offline() {
        assert!(matches!(OfflineFetcher.get(HOST), Err(FetchError::Offline)));
    }
}
