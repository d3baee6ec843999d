// Overlay store client: CRUD over the remote overlay collection.

use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use tracing::debug;

use crate::client::ensure_success;
use crate::overlay::{Overlay, OverlayDraft};
use crate::{ClientConfig, VistaError, create_client};

#[async_trait]
pub trait OverlayStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Overlay>, VistaError>;
    async fn create(&self, draft: &OverlayDraft) -> Result<Overlay, VistaError>;
    async fn update(&self, id: &str, draft: &OverlayDraft) -> Result<Overlay, VistaError>;
    async fn delete(&self, id: &str) -> Result<(), VistaError>;
}

pub struct HttpOverlayStore {
    http_client: Client,
    config: Arc<ClientConfig>,
}

impl HttpOverlayStore {
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
impl OverlayStore for HttpOverlayStore {
    async fn list(&self) -> Result<Vec<Overlay>, VistaError> {
        let url = self.config.endpoint("overlays")?;
        let response = self.http_client.get(url).send().await?;
        let overlays: Vec<Overlay> = ensure_success(response).await?.json().await?;
        debug!(count = overlays.len(), "Fetched overlays");
        Ok(overlays)
    }

    async fn create(&self, draft: &OverlayDraft) -> Result<Overlay, VistaError> {
        let url = self.config.endpoint("overlays")?;
        let response = self.http_client.post(url).json(draft).send().await?;
        let created: Overlay = ensure_success(response).await?.json().await?;
        debug!(id = ?created.id, name = %created.name, "Created overlay");
        Ok(created)
    }

    async fn update(&self, id: &str, draft: &OverlayDraft) -> Result<Overlay, VistaError> {
        let url = self.config.endpoint_with_id("overlays", id)?;
        let response = self.http_client.put(url).json(draft).send().await?;
        let updated: Overlay = ensure_success(response).await?.json().await?;
        debug!(%id, "Updated overlay");
        Ok(updated)
    }

    async fn delete(&self, id: &str) -> Result<(), VistaError> {
        let url = self.config.endpoint_with_id("overlays", id)?;
        let response = self.http_client.delete(url).send().await?;
        ensure_success(response).await?;
        debug!(%id, "Deleted overlay");
        Ok(())
    }
}
