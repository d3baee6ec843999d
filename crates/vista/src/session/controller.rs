//! Stream session controller.
//!
//! Owns the lifecycle of a single live playback session: requesting a
//! manifest from the transcoding backend, attaching it to the host's video
//! surface and tearing everything down again. At most one session is live per
//! controller; `start` always completes the teardown of the previous session
//! before the new start request is issued.
//!
//! Lifecycle operations are serialized by an async lock. `stop`, `shutdown`
//! and a superseding `start` first cancel whatever operation is in flight, so
//! a start that is still waiting on the backend gives up instead of attaching
//! a stale session.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::playback::{PlaybackAttachment, PlaybackEngine};
use super::state::SessionState;
use super::surface::{DemuxerFactory, PlaybackError, VideoSurface};
use crate::api::{StreamBackend, StreamSession};
use crate::overlay::{Composite, Overlay, OverlayCompositor};
use crate::report::{Notice, Reporter, TracingReporter};
use crate::{ClientConfig, VistaError};

struct Inner {
    state: SessionState,
    session: Option<StreamSession>,
    attachment: Option<PlaybackAttachment>,
    /// Cancels the lifecycle operation currently in flight.
    cancel: CancellationToken,
    /// Bumped by every lifecycle request. A start that finds it moved while
    /// queued on the lifecycle lock has been superseded.
    generation: u64,
}

pub struct StreamSessionController {
    backend: Arc<dyn StreamBackend>,
    surface: Arc<dyn VideoSurface>,
    engine: PlaybackEngine,
    reporter: Arc<dyn Reporter>,
    start_timeout: Duration,
    inner: Mutex<Inner>,
    lifecycle: AsyncMutex<()>,
    state_tx: watch::Sender<SessionState>,
}

impl StreamSessionController {
    pub fn new(
        backend: Arc<dyn StreamBackend>,
        surface: Arc<dyn VideoSurface>,
        config: &ClientConfig,
    ) -> Self {
        let (state_tx, _) = watch::channel(SessionState::Idle);
        Self {
            backend,
            surface,
            engine: PlaybackEngine::new(config.attach_timeout),
            reporter: Arc::new(TracingReporter),
            start_timeout: config.start_timeout,
            inner: Mutex::new(Inner {
                state: SessionState::Idle,
                session: None,
                attachment: None,
                cancel: CancellationToken::new(),
                generation: 0,
            }),
            lifecycle: AsyncMutex::new(()),
            state_tx,
        }
    }

    /// Software demuxer used when the surface cannot play HLS natively.
    pub fn with_demuxers(mut self, demuxers: Arc<dyn DemuxerFactory>) -> Self {
        self.engine = self.engine.clone().with_demuxers(demuxers);
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn state(&self) -> SessionState {
        self.inner.lock().state
    }

    pub fn session(&self) -> Option<StreamSession> {
        self.inner.lock().session.clone()
    }

    /// Receiver observing every state transition.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    /// Overlay layers for the current surface. Empty unless a session is playing.
    pub fn composite(&self, overlays: &[Overlay]) -> Composite {
        let surface = self.surface.dimensions();
        if self.state() != SessionState::Playing {
            return Composite {
                surface,
                layers: Vec::new(),
            };
        }
        OverlayCompositor::compose(overlays, surface)
    }

    /// Starts a session for `source_url`, replacing any live one.
    ///
    /// Failures are reported to the user once and leave the controller `Idle`.
    pub async fn start(&self, source_url: &str) -> Result<StreamSession, VistaError> {
        let source_url = source_url.trim();
        if source_url.is_empty() {
            return Err(VistaError::InvalidInput(
                "stream source URL must not be empty".into(),
            ));
        }

        let generation = self.cancel_in_flight();
        let _guard = self.lifecycle.lock().await;

        self.teardown_locked().await;

        let cancel = {
            let mut inner = self.inner.lock();
            if inner.generation != generation {
                debug!(source = %source_url, "Stream start superseded while queued");
                return Err(VistaError::Cancelled);
            }
            inner.cancel = CancellationToken::new();
            self.transition(&mut inner, SessionState::Starting);
            inner.cancel.clone()
        };
        info!(source = %source_url, "Starting stream session");

        match self.establish(source_url, &cancel).await {
            Ok((session, attachment)) => {
                let mut inner = self.inner.lock();
                if cancel.is_cancelled() {
                    drop(attachment);
                    self.transition(&mut inner, SessionState::Idle);
                    drop(inner);
                    self.release_in_background(session);
                    return Err(VistaError::Cancelled);
                }
                inner.session = Some(session.clone());
                inner.attachment = Some(attachment);
                self.transition(&mut inner, SessionState::Playing);
                Ok(session)
            }
            Err(VistaError::Cancelled) => {
                debug!(source = %source_url, "Stream start cancelled");
                self.transition_to(SessionState::Idle);
                Err(VistaError::Cancelled)
            }
            Err(e) => {
                error!(source = %source_url, error = %e, "Error starting stream");
                self.transition_to(SessionState::Idle);
                self.reporter
                    .notify(Notice::error(format!("Failed to start stream: {e}")));
                Err(e)
            }
        }
    }

    /// Stops the live session, if any. Returns whether there was one.
    ///
    /// The backend is notified on a best-effort basis; local resources are
    /// released whatever it answers.
    pub async fn stop(&self) -> bool {
        self.cancel_in_flight();
        let _guard = self.lifecycle.lock().await;
        self.teardown_locked().await
    }

    /// Releases everything before the host goes away, including a start that
    /// is still in flight.
    pub async fn shutdown(&self) {
        debug!(state = %self.state(), "Shutting down stream session controller");
        self.stop().await;
    }

    /// Cancels the running operation and invalidates every queued start.
    /// Returns the new generation.
    fn cancel_in_flight(&self) -> u64 {
        let mut inner = self.inner.lock();
        inner.cancel.cancel();
        inner.generation += 1;
        inner.generation
    }

    async fn establish(
        &self,
        source_url: &str,
        cancel: &CancellationToken,
    ) -> Result<(StreamSession, PlaybackAttachment), VistaError> {
        // Runs as its own task so a response arriving after cancellation can
        // still be observed and its backend session stopped.
        let backend = Arc::clone(&self.backend);
        let source = source_url.to_owned();
        let mut request: JoinHandle<Result<StreamSession, VistaError>> =
            tokio::spawn(async move { backend.start(&source).await });

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            res = tokio::time::timeout(self.start_timeout, &mut request) => Some(res),
        };
        let session = match outcome {
            None => {
                self.discard_late_start(request);
                return Err(VistaError::Cancelled);
            }
            Some(Err(_elapsed)) => {
                self.discard_late_start(request);
                return Err(VistaError::Timeout(format!(
                    "stream start did not complete within {}s",
                    self.start_timeout.as_secs()
                )));
            }
            Some(Ok(joined)) => joined
                .map_err(|e| VistaError::Internal(format!("stream start task failed: {e}")))??,
        };

        match self
            .engine
            .attach(Arc::clone(&self.surface), &session.manifest_url, cancel)
            .await
        {
            Ok(attachment) => Ok((session, attachment)),
            Err(e) => {
                // Without a surface the backend session is useless.
                self.notify_backend_stop(&session.session_id).await;
                Err(match e {
                    PlaybackError::Cancelled => VistaError::Cancelled,
                    other => VistaError::Playback(other),
                })
            }
        }
    }

    /// Detaches and clears the session. Caller holds the lifecycle lock.
    async fn teardown_locked(&self) -> bool {
        let (session, attachment) = {
            let mut inner = self.inner.lock();
            if inner.session.is_none() && inner.attachment.is_none() {
                self.transition(&mut inner, SessionState::Idle);
                return false;
            }
            self.transition(&mut inner, SessionState::Stopping);
            (inner.session.take(), inner.attachment.take())
        };

        // Local release first, it must not wait on the backend.
        if let Some(mut attachment) = attachment {
            attachment.detach();
        }
        if let Some(session) = &session {
            info!(session_id = %session.session_id, "Stopping stream session");
            self.notify_backend_stop(&session.session_id).await;
        }

        self.transition_to(SessionState::Idle);
        true
    }

    async fn notify_backend_stop(&self, session_id: &str) {
        match self.backend.stop(session_id).await {
            Ok(()) => debug!(session_id, "Backend confirmed stream stop"),
            Err(e) => warn!(session_id, error = %e, "Could not confirm stream stop on server"),
        }
    }

    fn discard_late_start(&self, request: JoinHandle<Result<StreamSession, VistaError>>) {
        let backend = Arc::clone(&self.backend);
        tokio::spawn(async move {
            if let Ok(Ok(session)) = request.await {
                info!(
                    session_id = %session.session_id,
                    "Discarding stream start that completed after teardown"
                );
                if let Err(e) = backend.stop(&session.session_id).await {
                    warn!(session_id = %session.session_id, error = %e, "Could not stop discarded stream");
                }
            }
        });
    }

    fn release_in_background(&self, session: StreamSession) {
        let backend = Arc::clone(&self.backend);
        tokio::spawn(async move {
            if let Err(e) = backend.stop(&session.session_id).await {
                warn!(session_id = %session.session_id, error = %e, "Could not confirm stream stop on server");
            }
        });
    }

    fn transition(&self, inner: &mut Inner, state: SessionState) {
        if inner.state != state {
            debug!(from = %inner.state, to = %state, "Session state transition");
            inner.state = state;
            self.state_tx.send_replace(state);
        }
    }

    fn transition_to(&self, state: SessionState) {
        let mut inner = self.inner.lock();
        self.transition(&mut inner, state);
    }
}

impl Drop for StreamSessionController {
    fn drop(&mut self) {
        let inner = self.inner.get_mut();
        inner.cancel.cancel();
        if let Some(mut attachment) = inner.attachment.take() {
            attachment.detach();
        }
        if let Some(session) = inner.session.take() {
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    let backend = Arc::clone(&self.backend);
                    handle.spawn(async move {
                        if let Err(e) = backend.stop(&session.session_id).await {
                            warn!(session_id = %session.session_id, error = %e, "Could not confirm stream stop on server");
                        }
                    });
                }
                Err(_) => warn!(
                    session_id = %session.session_id,
                    "No async runtime left, backend not notified of stream stop"
                ),
            }
        }
    }
}
