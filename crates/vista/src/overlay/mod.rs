pub mod compositor;
pub mod manager;
pub mod model;

pub use compositor::{
    Composite, ImageSource, Layer, LayerContent, LayerRect, OverlayCompositor, SurfaceSize,
};
pub use manager::OverlayManager;
pub use model::{Overlay, OverlayDraft, OverlayForm, OverlayKind, Position, Size};
