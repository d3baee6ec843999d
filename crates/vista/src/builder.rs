//! # Builder for ClientConfig
//!
//! Fluent construction of [`ClientConfig`] instances.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use vista_engine::ClientConfig;
//!
//! let config = ClientConfig::builder()
//!     .with_api_base_url("http://media.local:5000/api")
//!     .with_start_timeout(Duration::from_secs(60))
//!     .with_header("X-Client", "kiosk-3")
//!     .build();
//!
//! assert_eq!(config.api_base_url, "http://media.local:5000/api");
//! ```

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};

use crate::ClientConfig;

/// Builder for creating ClientConfig instances with a fluent API
#[derive(Debug, Clone)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
        }
    }

    /// Start from the environment-derived configuration
    pub fn from_env() -> Self {
        Self {
            config: ClientConfig::from_env(),
        }
    }

    /// Set the API base URL
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_base_url = url.into();
        self
    }

    /// Set the overall timeout for a single HTTP request
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the connection timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set the upper bound for the stream start request
    pub fn with_start_timeout(mut self, timeout: Duration) -> Self {
        self.config.start_timeout = timeout;
        self
    }

    /// Set the upper bound for the playback readiness signal
    pub fn with_attach_timeout(mut self, timeout: Duration) -> Self {
        self.config.attach_timeout = timeout;
        self
    }

    /// Set the settle period of the source URL debouncer
    pub fn with_debounce_delay(mut self, delay: Duration) -> Self {
        self.config.debounce_delay = delay;
        self
    }

    /// Set the user agent string
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Add a custom HTTP header; invalid names or values are ignored
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        if let (Ok(name), Ok(value)) = (
            name.as_ref().parse::<reqwest::header::HeaderName>(),
            HeaderValue::from_str(value.as_ref()),
        ) {
            self.config.headers.insert(name, value);
        }
        self
    }

    /// Set all HTTP headers, replacing any existing headers
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.config.headers = headers;
        self
    }

    /// Build the ClientConfig instance
    pub fn build(self) -> ClientConfig {
        self.config
    }
}

impl Default for ClientConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
