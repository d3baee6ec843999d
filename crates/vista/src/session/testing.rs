// In-memory collaborators for session tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::StatusCode;

use super::surface::{Demuxer, DemuxerFactory, PlayOptions, PlaybackError, VideoSurface};
use crate::api::{StreamBackend, StreamSession};
use crate::overlay::SurfaceSize;
use crate::report::{Notice, Reporter};
use crate::VistaError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    Source(Option<String>),
    Play(PlayOptions),
}

pub struct FakeSurface {
    native: bool,
    metadata: Mutex<Option<Result<(), PlaybackError>>>,
    play_result: Mutex<Result<(), PlaybackError>>,
    source: Mutex<Option<String>>,
    events: Mutex<Vec<SurfaceEvent>>,
}

impl FakeSurface {
    pub fn native() -> Arc<Self> {
        Arc::new(Self::with_native(true))
    }

    pub fn without_native() -> Arc<Self> {
        Arc::new(Self::with_native(false))
    }

    fn with_native(native: bool) -> Self {
        Self {
            native,
            metadata: Mutex::new(Some(Ok(()))),
            play_result: Mutex::new(Ok(())),
            source: Mutex::new(None),
            events: Mutex::new(Vec::new()),
        }
    }

    /// `None` keeps `metadata_loaded` pending forever.
    pub fn set_metadata(&self, result: Option<Result<(), PlaybackError>>) {
        *self.metadata.lock() = result;
    }

    pub fn set_play_result(&self, result: Result<(), PlaybackError>) {
        *self.play_result.lock() = result;
    }

    pub fn source(&self) -> Option<String> {
        self.source.lock().clone()
    }

    pub fn events(&self) -> Vec<SurfaceEvent> {
        self.events.lock().clone()
    }
}

#[async_trait]
impl VideoSurface for FakeSurface {
    fn can_play_type(&self, mime_type: &str) -> bool {
        self.native && mime_type == super::HLS_MIME_TYPE
    }

    fn set_source(&self, source: Option<&str>) {
        let mut current = self.source.lock();
        if let Some(new) = source {
            assert!(
                current.is_none(),
                "attached {new} while {current:?} is still attached"
            );
        }
        *current = source.map(str::to_string);
        self.events
            .lock()
            .push(SurfaceEvent::Source(source.map(str::to_string)));
    }

    fn dimensions(&self) -> SurfaceSize {
        SurfaceSize::new(1280, 720)
    }

    async fn metadata_loaded(&self) -> Result<(), PlaybackError> {
        let result = self.metadata.lock().clone();
        match result {
            Some(result) => result,
            None => std::future::pending().await,
        }
    }

    async fn play(&self, options: PlayOptions) -> Result<(), PlaybackError> {
        self.events.lock().push(SurfaceEvent::Play(options));
        self.play_result.lock().clone()
    }
}

#[derive(Default)]
pub struct FakeDemuxers {
    pub supported: bool,
    pub live: Arc<AtomicUsize>,
    pub created: AtomicUsize,
    pub loaded: Arc<Mutex<Vec<String>>>,
    pub parse_result: Mutex<Option<Result<(), PlaybackError>>>,
}

impl FakeDemuxers {
    pub fn supported() -> Arc<Self> {
        Arc::new(Self {
            supported: true,
            parse_result: Mutex::new(Some(Ok(()))),
            ..Default::default()
        })
    }

    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

impl DemuxerFactory for FakeDemuxers {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn create(&self, _surface: Arc<dyn VideoSurface>) -> Result<Box<dyn Demuxer>, PlaybackError> {
        assert_eq!(self.live(), 0, "a second demuxer was bound to the surface");
        self.live.fetch_add(1, Ordering::SeqCst);
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeDemuxer {
            live: Arc::clone(&self.live),
            loaded: Arc::clone(&self.loaded),
            parse_result: self.parse_result.lock().clone(),
            destroyed: Mutex::new(false),
        }))
    }
}

struct FakeDemuxer {
    live: Arc<AtomicUsize>,
    loaded: Arc<Mutex<Vec<String>>>,
    parse_result: Option<Result<(), PlaybackError>>,
    destroyed: Mutex<bool>,
}

#[async_trait]
impl Demuxer for FakeDemuxer {
    fn load_source(&self, manifest_url: &str) {
        self.loaded.lock().push(manifest_url.to_string());
    }

    async fn manifest_parsed(&self) -> Result<(), PlaybackError> {
        match self.parse_result.clone() {
            Some(result) => result,
            None => std::future::pending().await,
        }
    }

    fn destroy(&self) {
        let mut destroyed = self.destroyed.lock();
        assert!(!*destroyed, "demuxer destroyed twice");
        *destroyed = true;
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Scripted transcoding backend recording every call as `start:<url>` / `stop:<id>`.
#[derive(Default)]
pub struct FakeBackend {
    calls: Mutex<Vec<String>>,
    counter: AtomicUsize,
    pub fail_start: Mutex<bool>,
    pub fail_stop: Mutex<bool>,
    pub start_delay: Mutex<Option<Duration>>,
    pub stop_delay: Mutex<Option<Duration>>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl StreamBackend for FakeBackend {
    async fn start(&self, source_url: &str) -> Result<StreamSession, VistaError> {
        self.calls.lock().push(format!("start:{source_url}"));
        let delay = *self.start_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if *self.fail_start.lock() {
            return Err(VistaError::StatusCode {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "ffmpeg failed".into(),
            });
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(StreamSession {
            session_id: format!("s{n}"),
            manifest_url: format!("http://h/s{n}.m3u8"),
        })
    }

    async fn stop(&self, session_id: &str) -> Result<(), VistaError> {
        self.calls.lock().push(format!("stop:{session_id}"));
        let delay = *self.stop_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if *self.fail_stop.lock() {
            return Err(VistaError::StatusCode {
                status: StatusCode::NOT_FOUND,
                message: "Stream not found".into(),
            });
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingReporter {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingReporter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().clone()
    }
}

impl Reporter for RecordingReporter {
    fn notify(&self, notice: Notice) {
        self.notices.lock().push(notice);
    }
}
