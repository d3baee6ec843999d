//! # Vista
//!
//! A library for controlling live RTSP-to-HLS stream sessions and compositing
//! user-defined overlays on top of the resulting playback surface.
//!
//! ## Features
//!
//! - Stream session lifecycle with a single live session per controller
//! - Native HLS playback with a software demuxer fallback
//! - Overlay CRUD against a REST store
//! - Pure overlay compositing into positioned layers
//! - Input debouncing for source URL entry

pub mod api;
pub mod builder;
pub mod client;
pub mod config;
pub mod debounce;
pub mod error;
pub mod overlay;
pub mod report;
pub mod session;

pub use builder::ClientConfigBuilder;
pub use client::create_client;
pub use config::ClientConfig;
pub use debounce::Debouncer;
pub use error::VistaError;

// Re-export the backend clients
pub use api::{HttpOverlayStore, HttpStreamBackend, OverlayStore, StreamBackend, StreamSession};

// Re-export overlay types
pub use overlay::{
    Composite, Overlay, OverlayCompositor, OverlayDraft, OverlayForm, OverlayKind, OverlayManager,
    SurfaceSize,
};

pub use report::{ChannelReporter, Notice, NoticeLevel, Reporter, TracingReporter};

// Re-export session types
pub use session::{
    Demuxer, DemuxerFactory, PlayOptions, PlaybackAttachment, PlaybackEngine, PlaybackError,
    SessionState, StreamSessionController, VideoSurface,
};
