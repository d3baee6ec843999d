// Playback engine attach/detach protocol.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::surface::{
    Demuxer, DemuxerFactory, HLS_MIME_TYPE, PlayOptions, PlaybackError, VideoSurface,
};

enum AttachMode {
    /// The surface decodes the manifest itself.
    Native,
    Demuxer(Box<dyn Demuxer>),
}

/// A manifest bound to a surface.
///
/// Detaching is idempotent and happens on drop at the latest, so the decoder
/// is released on every exit path.
pub struct PlaybackAttachment {
    surface: Arc<dyn VideoSurface>,
    manifest_url: String,
    mode: Option<AttachMode>,
}

impl PlaybackAttachment {
    pub fn manifest_url(&self) -> &str {
        &self.manifest_url
    }

    pub fn is_attached(&self) -> bool {
        self.mode.is_some()
    }

    pub fn uses_demuxer(&self) -> bool {
        matches!(self.mode, Some(AttachMode::Demuxer(_)))
    }

    /// Destroys the demuxer if one was created, otherwise clears the surface source.
    pub fn detach(&mut self) {
        match self.mode.take() {
            Some(AttachMode::Demuxer(demuxer)) => {
                demuxer.destroy();
                debug!(manifest_url = %self.manifest_url, "Demuxer destroyed");
            }
            Some(AttachMode::Native) => {
                self.surface.set_source(None);
                debug!(manifest_url = %self.manifest_url, "Surface source cleared");
            }
            None => {}
        }
    }

    async fn ready(&self) -> Result<(), PlaybackError> {
        match &self.mode {
            Some(AttachMode::Native) => self.surface.metadata_loaded().await,
            Some(AttachMode::Demuxer(demuxer)) => demuxer.manifest_parsed().await,
            None => Err(PlaybackError::Cancelled),
        }
    }

    fn signal_name(&self) -> &'static str {
        match self.mode {
            Some(AttachMode::Demuxer(_)) => "manifest parsed",
            _ => "metadata loaded",
        }
    }
}

impl Drop for PlaybackAttachment {
    fn drop(&mut self) {
        self.detach();
    }
}

impl std::fmt::Debug for PlaybackAttachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackAttachment")
            .field("manifest_url", &self.manifest_url)
            .field("attached", &self.is_attached())
            .field("demuxer", &self.uses_demuxer())
            .finish()
    }
}

/// Chooses between native playback and the software demuxer and drives the
/// attach protocol up to the first play request.
#[derive(Clone)]
pub struct PlaybackEngine {
    demuxers: Option<Arc<dyn DemuxerFactory>>,
    attach_timeout: Duration,
}

impl PlaybackEngine {
    pub fn new(attach_timeout: Duration) -> Self {
        Self {
            demuxers: None,
            attach_timeout,
        }
    }

    pub fn with_demuxers(mut self, demuxers: Arc<dyn DemuxerFactory>) -> Self {
        self.demuxers = Some(demuxers);
        self
    }

    /// Binds `manifest_url` to `surface`, waits for the readiness signal, then
    /// requests muted inline playback.
    ///
    /// A rejected autoplay leaves the stream loaded but paused and is not an
    /// error. Any failure before that releases the attachment.
    pub async fn attach(
        &self,
        surface: Arc<dyn VideoSurface>,
        manifest_url: &str,
        cancel: &CancellationToken,
    ) -> Result<PlaybackAttachment, PlaybackError> {
        let mode = if surface.can_play_type(HLS_MIME_TYPE) {
            surface.set_source(Some(manifest_url));
            AttachMode::Native
        } else {
            match self.demuxers.as_ref().filter(|d| d.is_supported()) {
                Some(factory) => {
                    let demuxer = factory.create(Arc::clone(&surface))?;
                    demuxer.load_source(manifest_url);
                    AttachMode::Demuxer(demuxer)
                }
                None => return Err(PlaybackError::Unsupported(manifest_url.to_string())),
            }
        };

        let attachment = PlaybackAttachment {
            surface,
            manifest_url: manifest_url.to_string(),
            mode: Some(mode),
        };
        debug!(
            manifest_url,
            demuxer = attachment.uses_demuxer(),
            "Attached manifest, waiting for {}",
            attachment.signal_name()
        );

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PlaybackError::Cancelled),
            res = tokio::time::timeout(self.attach_timeout, attachment.ready()) => {
                res.map_err(|_| PlaybackError::Timeout(attachment.signal_name()))??
            }
        }

        match attachment.surface.play(PlayOptions::AUTOPLAY).await {
            Ok(()) => info!(manifest_url, "Playback started"),
            Err(PlaybackError::AutoplayRejected(reason)) => {
                warn!(manifest_url, %reason, "Autoplay blocked, stream stays paused");
            }
            Err(e) => warn!(manifest_url, error = %e, "Play request failed, stream stays paused"),
        }

        Ok(attachment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::testing::{FakeDemuxers, FakeSurface, SurfaceEvent};

    const MANIFEST: &str = "http://h/s1.m3u8";

    #[tokio::test]
    async fn test_native_attach_plays_muted_inline() {
        let surface = FakeSurface::native();
        let engine = PlaybackEngine::new(Duration::from_secs(5));

        let attachment = engine
            .attach(surface.clone(), MANIFEST, &CancellationToken::new())
            .await
            .unwrap();

        assert!(attachment.is_attached());
        assert!(!attachment.uses_demuxer());
        assert_eq!(surface.source().as_deref(), Some(MANIFEST));
        assert_eq!(
            surface.events(),
            vec![
                SurfaceEvent::Source(Some(MANIFEST.into())),
                SurfaceEvent::Play(PlayOptions {
                    muted: true,
                    inline: true
                }),
            ]
        );
    }

    #[tokio::test]
    async fn test_native_preferred_over_demuxer() {
        let surface = FakeSurface::native();
        let demuxers = FakeDemuxers::supported();
        let engine = PlaybackEngine::new(Duration::from_secs(5)).with_demuxers(demuxers.clone());

        let attachment = engine
            .attach(surface, MANIFEST, &CancellationToken::new())
            .await
            .unwrap();
        assert!(!attachment.uses_demuxer());
        assert_eq!(demuxers.live(), 0);
    }

    #[tokio::test]
    async fn test_demuxer_attach_and_detach() {
        let surface = FakeSurface::without_native();
        let demuxers = FakeDemuxers::supported();
        let engine = PlaybackEngine::new(Duration::from_secs(5)).with_demuxers(demuxers.clone());

        let mut attachment = engine
            .attach(surface.clone(), MANIFEST, &CancellationToken::new())
            .await
            .unwrap();

        assert!(attachment.uses_demuxer());
        assert_eq!(demuxers.live(), 1);
        assert_eq!(*demuxers.loaded.lock(), vec![MANIFEST.to_string()]);
        assert_eq!(surface.source(), None);

        attachment.detach();
        attachment.detach();
        assert_eq!(demuxers.live(), 0);
        assert!(!attachment.is_attached());
        drop(attachment);
        assert_eq!(demuxers.live(), 0);
    }

    #[tokio::test]
    async fn test_detach_is_idempotent_and_runs_on_drop() {
        let surface = FakeSurface::native();
        let engine = PlaybackEngine::new(Duration::from_secs(5));

        let mut attachment = engine
            .attach(surface.clone(), MANIFEST, &CancellationToken::new())
            .await
            .unwrap();
        attachment.detach();
        attachment.detach();
        drop(attachment);

        let clears = surface
            .events()
            .into_iter()
            .filter(|e| *e == SurfaceEvent::Source(None))
            .count();
        assert_eq!(clears, 1);

        let attachment = engine
            .attach(surface.clone(), MANIFEST, &CancellationToken::new())
            .await
            .unwrap();
        drop(attachment);
        assert_eq!(surface.source(), None);
    }

    #[tokio::test]
    async fn test_no_playback_path() {
        let surface = FakeSurface::without_native();
        let engine = PlaybackEngine::new(Duration::from_secs(5));
        let err = engine
            .attach(surface.clone(), MANIFEST, &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err, PlaybackError::Unsupported(MANIFEST.into()));
        assert!(surface.events().is_empty());
    }

    #[tokio::test]
    async fn test_autoplay_rejection_is_not_fatal() {
        let surface = FakeSurface::native();
        surface.set_play_result(Err(PlaybackError::AutoplayRejected(
            "NotAllowedError".into(),
        )));
        let engine = PlaybackEngine::new(Duration::from_secs(5));

        let attachment = engine
            .attach(surface.clone(), MANIFEST, &CancellationToken::new())
            .await
            .unwrap();
        assert!(attachment.is_attached());
        assert_eq!(surface.source().as_deref(), Some(MANIFEST));
    }

    #[tokio::test]
    async fn test_decoder_error_releases_surface() {
        let surface = FakeSurface::native();
        surface.set_metadata(Some(Err(PlaybackError::Decoder("bad codec".into()))));
        let engine = PlaybackEngine::new(Duration::from_secs(5));

        let err = engine
            .attach(surface.clone(), MANIFEST, &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err, PlaybackError::Decoder("bad codec".into()));
        assert_eq!(surface.source(), None);
        assert!(!surface.events().iter().any(|e| matches!(e, SurfaceEvent::Play(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_readiness_timeout_releases_demuxer() {
        let surface = FakeSurface::without_native();
        let demuxers = FakeDemuxers::supported();
        *demuxers.parse_result.lock() = None;
        let engine = PlaybackEngine::new(Duration::from_secs(3)).with_demuxers(demuxers.clone());

        let err = engine
            .attach(surface, MANIFEST, &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err, PlaybackError::Timeout("manifest parsed"));
        assert_eq!(demuxers.live(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_attach_releases_surface() {
        let surface = FakeSurface::native();
        surface.set_metadata(None);
        let engine = PlaybackEngine::new(Duration::from_secs(5));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = engine
            .attach(surface.clone(), MANIFEST, &cancel)
            .await
            .unwrap_err();
        assert_eq!(err, PlaybackError::Cancelled);
        assert_eq!(surface.source(), None);
    }
}
