// HTTP clients for the external collaborators: the transcoding backend and the overlay store.

pub mod overlays;
pub mod stream;

pub use overlays::{HttpOverlayStore, OverlayStore};
pub use stream::{HttpStreamBackend, StreamBackend, StreamSession};
