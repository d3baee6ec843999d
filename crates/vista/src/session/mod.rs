// Stream session lifecycle: controller, playback attach protocol and the host-side collaborators.

pub mod controller;
pub mod playback;
pub mod state;
pub mod surface;

#[cfg(test)]
pub(crate) mod testing;

pub use controller::StreamSessionController;
pub use playback::{PlaybackAttachment, PlaybackEngine};
pub use state::SessionState;
pub use surface::{
    Demuxer, DemuxerFactory, HLS_MIME_TYPE, PlayOptions, PlaybackError, VideoSurface,
};
