// Transcoding backend client: starts and stops RTSP → HLS sessions.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::client::ensure_success;
use crate::{ClientConfig, VistaError, create_client};

/// Session handle returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamSession {
    /// Identifies the backend-side transcoding process.
    #[serde(rename = "streamId")]
    pub session_id: String,
    /// Adaptive-streaming manifest for this session.
    #[serde(rename = "hlsUrl")]
    pub manifest_url: String,
}

#[derive(Debug, Serialize)]
struct StartRequest<'a> {
    #[serde(rename = "rtspUrl")]
    rtsp_url: &'a str,
}

#[async_trait]
pub trait StreamBackend: Send + Sync {
    /// Begins transcoding `source_url` and returns the playable session.
    async fn start(&self, source_url: &str) -> Result<StreamSession, VistaError>;

    /// Notifies the backend that the session is no longer watched.
    async fn stop(&self, session_id: &str) -> Result<(), VistaError>;
}

pub struct HttpStreamBackend {
    http_client: Client,
    config: Arc<ClientConfig>,
}

impl HttpStreamBackend {
    pub fn new(config: Arc<ClientConfig>) -> Result<Self, VistaError> {
        let http_client = create_client(&config)?;
        Ok(Self::with_client(http_client, config))
    }

    pub fn with_client(http_client: Client, config: Arc<ClientConfig>) -> Self {
        Self {
            http_client,
            config,
        }
    }
}

#[async_trait]
impl StreamBackend for HttpStreamBackend {
    async fn start(&self, source_url: &str) -> Result<StreamSession, VistaError> {
        let url = self.config.endpoint("stream/start")?;
        debug!(%url, source = %source_url, "Requesting stream start");

        // The backend answers only once the first segments exist, so the
        // per-request client timeout is replaced by the start timeout.
        let response = self
            .http_client
            .post(url)
            .json(&StartRequest {
                rtsp_url: source_url,
            })
            .timeout(self.config.start_timeout)
            .send()
            .await?;
        let session: StreamSession = ensure_success(response).await?.json().await?;

        if session.session_id.is_empty() || session.manifest_url.is_empty() {
            return Err(VistaError::InvalidInput(
                "backend returned an empty stream id or manifest URL".into(),
            ));
        }

        info!(
            session_id = %session.session_id,
            manifest_url = %session.manifest_url,
            "Stream started"
        );
        Ok(session)
    }

    async fn stop(&self, session_id: &str) -> Result<(), VistaError> {
        let url = self.config.endpoint_with_id("stream/stop", session_id)?;
        debug!(%url, "Requesting stream stop");
        let response = self.http_client.post(url).send().await?;
        ensure_success(response).await?;
        Ok(())
    }
}
