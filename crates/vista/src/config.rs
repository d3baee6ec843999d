use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use url::Url;

use crate::VistaError;

/// Environment variable holding the API base URL.
pub const API_BASE_URL_ENV: &str = "VISTA_API_BASE_URL";

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";

const DEFAULT_USER_AGENT: &str = concat!("vista/", env!("CARGO_PKG_VERSION"));

/// Configurable options for the backend and store clients
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL every API path is resolved against
    pub api_base_url: String,

    /// Overall timeout for a single HTTP request
    pub timeout: Duration,

    /// Connection timeout (time to establish initial connection)
    pub connect_timeout: Duration,

    /// Upper bound for the stream start request. The backend blocks until the
    /// transcoder has produced its first segments, so this is longer than `timeout`.
    pub start_timeout: Duration,

    /// Upper bound for the "metadata loaded" / "manifest parsed" signal after attaching
    pub attach_timeout: Duration,

    /// Settle period for the source URL input
    pub debounce_delay: Duration,

    /// User agent string
    pub user_agent: String,

    /// Custom HTTP headers for requests
    pub headers: HeaderMap,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_owned(),
            timeout: Duration::from_secs(15),
            connect_timeout: Duration::from_secs(5),
            start_timeout: Duration::from_secs(45),
            attach_timeout: Duration::from_secs(20),
            debounce_delay: Duration::from_millis(500),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            headers: ClientConfig::get_default_headers(),
        }
    }
}

impl ClientConfig {
    pub fn builder() -> crate::builder::ClientConfigBuilder {
        crate::builder::ClientConfigBuilder::new()
    }

    /// Default configuration with the base URL taken from `VISTA_API_BASE_URL` when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(base) = std::env::var(API_BASE_URL_ENV) {
            let base = base.trim();
            if !base.is_empty() {
                config.api_base_url = base.to_owned();
            }
        }
        config
    }

    /// Resolves `path` (e.g. `stream/start`) against the base URL.
    ///
    /// The base is treated as a directory, so `http://host/api` and
    /// `http://host/api/` both resolve `overlays` to `http://host/api/overlays`.
    pub fn endpoint(&self, path: &str) -> Result<Url, VistaError> {
        let mut base = self.api_base_url.trim().to_owned();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base = Url::parse(&base)?;
        Ok(base.join(path.trim_start_matches('/'))?)
    }

    /// Like [`endpoint`](Self::endpoint) with `id` appended as a single
    /// percent-encoded path segment.
    pub fn endpoint_with_id(&self, path: &str, id: &str) -> Result<Url, VistaError> {
        let mut url = self.endpoint(path)?;
        if url.cannot_be_a_base() {
            return Err(VistaError::UrlError(format!("{url} cannot be a base")));
        }
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(id);
        }
        Ok(url)
    }

    pub fn get_default_headers() -> HeaderMap {
        let mut default_headers = HeaderMap::new();

        default_headers.insert(
            reqwest::header::ACCEPT,
            HeaderValue::from_static("application/json"),
        );

        default_headers.insert(
            reqwest::header::CONNECTION,
            HeaderValue::from_static("keep-alive"),
        );
        default_headers
    }
}
