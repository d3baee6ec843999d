// Headless video surface: "plays" HLS by polling the playlist until the transcoder publishes it.

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::{Client, StatusCode};
use tracing::{debug, info};
use vista_engine::session::HLS_MIME_TYPE;
use vista_engine::{PlayOptions, PlaybackError, SurfaceSize, VideoSurface};

const PLAYLIST_TAG: &str = "#EXTM3U";

pub struct HeadlessSurface {
    client: Client,
    size: SurfaceSize,
    poll_interval: Duration,
    source: Mutex<Option<String>>,
}

impl HeadlessSurface {
    pub fn new(client: Client, size: SurfaceSize) -> Self {
        Self {
            client,
            size,
            poll_interval: Duration::from_secs(1),
            source: Mutex::new(None),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// `Ok(true)` once the playlist is published, `Ok(false)` while it is still pending.
    async fn check_playlist(&self, url: &str) -> Result<bool, PlaybackError> {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) if e.is_connect() || e.is_timeout() => {
                debug!(url, error = %e, "Playlist not reachable yet");
                return Ok(false);
            }
            Err(e) => return Err(PlaybackError::Decoder(e.to_string())),
        };

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => {
                let body = response
                    .text()
                    .await
                    .map_err(|e| PlaybackError::Decoder(e.to_string()))?;
                if body.trim_start().starts_with(PLAYLIST_TAG) {
                    Ok(true)
                } else {
                    Err(PlaybackError::Decoder(format!(
                        "{url} is not an HLS playlist"
                    )))
                }
            }
            status => Err(PlaybackError::Decoder(format!(
                "playlist request failed with {status}"
            ))),
        }
    }
}

#[async_trait]
impl VideoSurface for HeadlessSurface {
    fn can_play_type(&self, mime_type: &str) -> bool {
        mime_type == HLS_MIME_TYPE
    }

    fn set_source(&self, source: Option<&str>) {
        debug!(source = ?source, "Surface source changed");
        *self.source.lock() = source.map(str::to_string);
    }

    fn dimensions(&self) -> SurfaceSize {
        self.size
    }

    async fn metadata_loaded(&self) -> Result<(), PlaybackError> {
        loop {
            let Some(url) = self.source.lock().clone() else {
                return Err(PlaybackError::Cancelled);
            };
            if self.check_playlist(&url).await? {
                return Ok(());
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn play(&self, options: PlayOptions) -> Result<(), PlaybackError> {
        let source = self.source.lock().clone();
        info!(source = ?source, muted = options.muted, "Stream is playing");
        Ok(())
    }
}
