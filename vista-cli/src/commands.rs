use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, error, info, warn};
use vista_engine::{
    ClientConfig, Debouncer, HttpOverlayStore, HttpStreamBackend, Overlay, OverlayCompositor,
    OverlayForm, OverlayManager, OverlayStore, StreamSession, StreamSessionController,
    SurfaceSize, TracingReporter, VistaError, create_client,
};

use crate::cli::{OverlayAction, OverlayFields, SurfaceArgs};
use crate::error::AppError;
use crate::surface::HeadlessSurface;

impl From<SurfaceArgs> for SurfaceSize {
    fn from(args: SurfaceArgs) -> Self {
        SurfaceSize::new(args.width, args.height)
    }
}

pub struct CommandExecutor {
    config: Arc<ClientConfig>,
    http_client: reqwest::Client,
}

impl CommandExecutor {
    pub fn new(config: ClientConfig) -> Result<Self, AppError> {
        let http_client = create_client(&config)?;
        Ok(Self {
            config: Arc::new(config),
            http_client,
        })
    }

    fn overlay_store(&self) -> Arc<dyn OverlayStore> {
        Arc::new(HttpOverlayStore::with_client(
            self.http_client.clone(),
            Arc::clone(&self.config),
        ))
    }

    fn controller(&self, surface: SurfaceArgs) -> Arc<StreamSessionController> {
        let backend = Arc::new(HttpStreamBackend::with_client(
            self.http_client.clone(),
            Arc::clone(&self.config),
        ));
        let surface = Arc::new(HeadlessSurface::new(
            self.http_client.clone(),
            surface.into(),
        ));
        Arc::new(StreamSessionController::new(backend, surface, &self.config))
    }

    /// Overlays for compositing. A failing store yields no overlays.
    async fn load_overlays(&self) -> Vec<Overlay> {
        match self.overlay_store().list().await {
            Ok(overlays) => overlays,
            Err(e) => {
                warn!(error = %e, "Could not load overlays, rendering without them");
                Vec::new()
            }
        }
    }

    /// Starts one stream and keeps it alive until Ctrl-C.
    pub async fn stream(&self, source_url: String, surface: SurfaceArgs) -> Result<(), AppError> {
        let controller = self.controller(surface);
        let mut start = spawn_start(&controller, source_url);

        let started = tokio::select! {
            res = &mut start => Some(res),
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(joined) = started else {
            info!("Interrupted, cancelling stream start");
            controller.shutdown().await;
            let _ = start.await;
            return Ok(());
        };
        let session = joined.map_err(|e| AppError::Initialization(e.to_string()))??;

        print_session(&session);
        let overlays = self.load_overlays().await;
        let composite = controller.composite(&overlays);
        println!("{}", serde_json::to_string_pretty(&composite)?);

        info!("Press Ctrl-C to stop the stream");
        tokio::signal::ctrl_c().await?;
        controller.shutdown().await;
        Ok(())
    }

    /// Restarts the stream for every settled line read from stdin.
    pub async fn watch(&self, debounce: Duration, surface: SurfaceArgs) -> Result<(), AppError> {
        let controller = self.controller(surface);
        let (debouncer, mut settled) = Debouncer::new(debounce);
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdin_open = true;
        let mut current: Option<StartTask> = None;
        let mut failure = None;

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        info!("Reading stream source URLs from stdin, Ctrl-C to quit");
        loop {
            let event = tokio::select! {
                biased;
                _ = &mut ctrl_c => WatchEvent::Interrupted,
                line = lines.next_line(), if stdin_open => WatchEvent::from_input(line),
                Some(source_url) = settled.recv() => WatchEvent::Settled(source_url),
                Some(joined) = wait_start(&mut current) => WatchEvent::Started(joined),
            };

            match event {
                WatchEvent::Interrupted => break,
                WatchEvent::InputFailed(e) => {
                    error!(error = %e, "Could not read from stdin");
                    failure = Some(AppError::Io(e));
                    break;
                }
                WatchEvent::Line(Some(line)) => {
                    debouncer.push(line.trim().to_string());
                }
                WatchEvent::Line(None) => {
                    debug!("stdin closed");
                    stdin_open = false;
                }
                WatchEvent::Settled(source_url) if source_url.is_empty() => {
                    if controller.stop().await {
                        info!("Source cleared, stream stopped");
                    }
                }
                WatchEvent::Settled(source_url) => {
                    // The controller cancels the previous start itself.
                    current = Some(spawn_start(&controller, source_url));
                }
                WatchEvent::Started(joined) => {
                    current = None;
                    match joined {
                        Ok(Ok(session)) => print_session(&session),
                        Ok(Err(e)) => debug!(error = %e, "Stream start did not complete"),
                        Err(e) => warn!(error = %e, "Stream start task failed"),
                    }
                }
            }
        }

        drop(debouncer);
        controller.shutdown().await;
        if let Some(task) = current {
            let _ = task.await;
        }
        failure.map_or(Ok(()), Err)
    }

    pub async fn overlays(&self, action: OverlayAction) -> Result<(), AppError> {
        let mut manager = OverlayManager::new(self.overlay_store(), Arc::new(TracingReporter));

        match action {
            OverlayAction::List => {
                manager.refresh().await?;
                println!("{}", serde_json::to_string_pretty(manager.overlays())?);
            }
            OverlayAction::Create { fields } => {
                let form = fields.apply(OverlayForm::default());
                let overlay = manager.save(&form).await?;
                println!("{}", serde_json::to_string_pretty(&overlay)?);
            }
            OverlayAction::Update { id, fields } => {
                manager.refresh().await?;
                let form = manager
                    .select(&id)
                    .ok_or_else(|| AppError::InvalidInput(format!("No overlay with id {id}")))?;
                let overlay = manager.save(&fields.apply(form)).await?;
                println!("{}", serde_json::to_string_pretty(&overlay)?);
            }
            OverlayAction::Delete { id } => {
                manager.refresh().await?;
                if manager.select(&id).is_none() {
                    return Err(AppError::InvalidInput(format!("No overlay with id {id}")));
                }
                manager.delete_selected().await?;
            }
        }
        Ok(())
    }

    pub async fn compose(&self, surface: SurfaceArgs) -> Result<(), AppError> {
        let overlays = self.overlay_store().list().await?;
        let composite = OverlayCompositor::compose(&overlays, surface.into());
        println!("{}", serde_json::to_string_pretty(&composite)?);
        Ok(())
    }
}

impl OverlayFields {
    /// Overwrites the form fields given on the command line.
    fn apply(self, mut form: OverlayForm) -> OverlayForm {
        let number = |v: i64| v.to_string();
        if let Some(name) = self.name {
            form.name = name;
        }
        if let Some(kind) = self.kind {
            form.kind = kind;
        }
        if let Some(content) = self.content {
            form.content = content;
        }
        if let Some(color) = self.color {
            form.color = color;
        }
        if let Some(x) = self.x {
            form.x = number(x);
        }
        if let Some(y) = self.y {
            form.y = number(y);
        }
        if let Some(width) = self.width {
            form.width = number(width);
        }
        if let Some(height) = self.height {
            form.height = number(height);
        }
        form
    }
}

type StartTask = JoinHandle<Result<StreamSession, VistaError>>;

enum WatchEvent {
    Interrupted,
    InputFailed(std::io::Error),
    Line(Option<String>),
    Settled(String),
    Started(Result<Result<StreamSession, VistaError>, JoinError>),
}

impl WatchEvent {
    /// A read error ends the loop through the regular teardown path.
    fn from_input(line: std::io::Result<Option<String>>) -> Self {
        match line {
            Ok(line) => WatchEvent::Line(line),
            Err(e) => WatchEvent::InputFailed(e),
        }
    }
}

fn spawn_start(controller: &Arc<StreamSessionController>, source_url: String) -> StartTask {
    let controller = Arc::clone(controller);
    tokio::spawn(async move { controller.start(&source_url).await })
}

async fn wait_start(
    task: &mut Option<StartTask>,
) -> Option<Result<Result<StreamSession, VistaError>, JoinError>> {
    match task {
        Some(handle) => Some(handle.await),
        None => std::future::pending().await,
    }
}

fn print_session(session: &StreamSession) {
    println!("Session: {}", session.session_id);
    println!("Manifest: {}", session.manifest_url);
}
