use reqwest::{Client, Response};
use serde::Deserialize;
use tracing::debug;

use crate::{ClientConfig, VistaError};

/// Create a reqwest Client with the provided configuration
pub fn create_client(config: &ClientConfig) -> Result<Client, VistaError> {
    let mut client_builder = Client::builder()
        .pool_max_idle_per_host(2)
        .user_agent(&config.user_agent)
        .default_headers(config.headers.clone());

    if !config.timeout.is_zero() {
        client_builder = client_builder.timeout(config.timeout);
    }

    if !config.connect_timeout.is_zero() {
        client_builder = client_builder.connect_timeout(config.connect_timeout);
    }

    debug!(base_url = %config.api_base_url, "Creating API client");
    client_builder.build().map_err(VistaError::from)
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Turns a non-2xx response into [`VistaError::StatusCode`], keeping the
/// server's `{"error": ...}` message when it sent one.
pub(crate) async fn ensure_success(response: Response) -> Result<Response, VistaError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.error.or(b.message))
        .unwrap_or_else(|| body.trim().to_string());

    Err(VistaError::StatusCode { status, message })
}
