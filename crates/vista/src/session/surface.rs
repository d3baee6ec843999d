//! Collaborator interfaces for the host's video surface and the software
//! HLS demuxer.
//!
//! The surface is owned by the host and shared with the controller, which is
//! the only party allowed to change its source or bind a demuxer to it.

use std::sync::Arc;

use async_trait::async_trait;

use crate::overlay::SurfaceSize;

/// MIME type a native decoder must declare to play the manifest directly.
pub const HLS_MIME_TYPE: &str = "application/vnd.apple.mpegurl";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlaybackError {
    #[error("autoplay rejected: {0}")]
    AutoplayRejected(String),
    #[error("decoder error: {0}")]
    Decoder(String),
    #[error("no playback path available for {0}")]
    Unsupported(String),
    #[error("timed out waiting for {0}")]
    Timeout(&'static str),
    #[error("attach cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlayOptions {
    pub muted: bool,
    pub inline: bool,
}

impl PlayOptions {
    /// Muted inline playback, which autoplay policies allow without a user gesture.
    pub const AUTOPLAY: Self = Self {
        muted: true,
        inline: true,
    };
}

#[async_trait]
pub trait VideoSurface: Send + Sync {
    /// Whether the native decoder can play `mime_type` by itself.
    fn can_play_type(&self, mime_type: &str) -> bool;

    /// Sets or clears (`None`) the source URL of the native decoder.
    fn set_source(&self, source: Option<&str>);

    fn dimensions(&self) -> SurfaceSize;

    /// Resolves once metadata of the current source is loaded, immediately if
    /// it already is. Fails on a decoder error.
    async fn metadata_loaded(&self) -> Result<(), PlaybackError>;

    /// Requests playback. Autoplay refusal is reported as
    /// [`PlaybackError::AutoplayRejected`].
    async fn play(&self, options: PlayOptions) -> Result<(), PlaybackError>;
}

/// A software demuxer instance bound to one surface.
#[async_trait]
pub trait Demuxer: Send + Sync {
    fn load_source(&self, manifest_url: &str);

    /// Resolves once the manifest is parsed, immediately if it already is.
    /// Fails on a fatal demuxer error.
    async fn manifest_parsed(&self) -> Result<(), PlaybackError>;

    /// Unbinds from the surface and releases network and decoder resources.
    fn destroy(&self);
}

pub trait DemuxerFactory: Send + Sync {
    /// Whether the platform can run the software demuxer at all.
    fn is_supported(&self) -> bool;

    /// Creates a demuxer attached to `surface`.
    fn create(&self, surface: Arc<dyn VideoSurface>) -> Result<Box<dyn Demuxer>, PlaybackError>;
}
