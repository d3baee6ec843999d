//! Overlay compositor: turns overlay definitions into absolutely positioned
//! layers above the video surface.
//!
//! Composition is a pure function of the overlay list and the surface size.
//! Paint order is list order, so later overlays render above earlier ones.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use url::Url;

use super::model::{Overlay, OverlayKind};

/// Inline-data scheme marker.
pub const DATA_URI_PREFIX: &str = "data:";

const PNG_DATA_URI_PREFIX: &str = "data:image/png;base64,";

pub const DEFAULT_TEXT_COLOR: &str = "white";

pub const TEXT_FONT_SIZE_PX: u32 = 16;

/// Pixel dimensions of the video surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// A resolved, renderable image source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "src", rename_all = "snake_case")]
pub enum ImageSource {
    /// HTTP(S) URL, used unchanged.
    Remote(String),
    /// `data:` URI, either given as such or synthesized from a bare base64 payload.
    Inline(String),
}

impl ImageSource {
    pub fn as_str(&self) -> &str {
        match self {
            ImageSource::Remote(src) | ImageSource::Inline(src) => src,
        }
    }

    /// Resolves logo content by precedence: HTTP(S) URL, then `data:` URI,
    /// then bare base64 PNG payload.
    pub fn resolve(content: &str) -> Self {
        let content = content.trim();
        if has_prefix_ignore_case(content, "http://") || has_prefix_ignore_case(content, "https://")
        {
            ImageSource::Remote(content.to_string())
        } else if has_prefix_ignore_case(content, DATA_URI_PREFIX) {
            ImageSource::Inline(content.to_string())
        } else {
            ImageSource::Inline(format!("{PNG_DATA_URI_PREFIX}{content}"))
        }
    }

    /// Whether the source can plausibly be loaded. A remote URL must parse;
    /// a base64 inline payload must decode.
    pub fn is_loadable(&self) -> bool {
        match self {
            ImageSource::Remote(src) => Url::parse(src).is_ok_and(|u| u.host().is_some()),
            ImageSource::Inline(src) => {
                let Some((header, payload)) = src.split_once(',') else {
                    return false;
                };
                if payload.is_empty() {
                    return false;
                }
                if header.to_ascii_lowercase().ends_with(";base64") {
                    STANDARD.decode(payload.trim()).is_ok()
                } else {
                    true
                }
            }
        }
    }
}

fn has_prefix_ignore_case(s: &str, prefix: &str) -> bool {
    s.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// Layer box relative to the surface's top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LayerRect {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayerContent {
    Image {
        source: ImageSource,
        alt: String,
    },
    /// Centered, bold, single-line label.
    Text {
        text: String,
        color: String,
        font_size_px: u32,
        bold: bool,
    },
}

/// One positioned element of the composite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Layer {
    /// Overlay id, or `#<index>` for overlays without one.
    pub key: String,
    pub rect: LayerRect,
    pub content: LayerContent,
    /// Layers never intercept pointer or input events.
    pub interactive: bool,
    pub visible: bool,
}

/// The ordered layer stack for one surface.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Composite {
    pub surface: SurfaceSize,
    pub layers: Vec<Layer>,
}

impl Composite {
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Visible layers in paint order.
    pub fn visible_layers(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter().filter(|l| l.visible)
    }

    /// Hides the layer whose image failed to load at render time.
    /// Returns `false` when no layer has that key.
    pub fn degrade(&mut self, key: &str) -> bool {
        match self.layers.iter_mut().find(|l| l.key == key) {
            Some(layer) => {
                layer.visible = false;
                true
            }
            None => false,
        }
    }
}

pub struct OverlayCompositor;

impl OverlayCompositor {
    pub fn compose(overlays: &[Overlay], surface: SurfaceSize) -> Composite {
        let layers = overlays
            .iter()
            .enumerate()
            .map(|(index, overlay)| Self::layer(index, overlay))
            .collect();
        Composite { surface, layers }
    }

    fn layer(index: usize, overlay: &Overlay) -> Layer {
        let position = overlay.position.unwrap_or_default();
        let size = overlay.size.unwrap_or_default();
        let key = overlay
            .id
            .clone()
            .unwrap_or_else(|| format!("#{index}"));

        let left = pixels(position.x);
        let top = pixels(position.y);

        match overlay.kind {
            OverlayKind::Logo => {
                let source = ImageSource::resolve(&overlay.content);
                let visible = !overlay.content.trim().is_empty() && source.is_loadable();
                Layer {
                    key,
                    rect: LayerRect {
                        left,
                        top,
                        width: pixels(size.width),
                        height: pixels(size.height),
                    },
                    content: LayerContent::Image {
                        source,
                        alt: overlay.name.clone(),
                    },
                    interactive: false,
                    visible,
                }
            }
            OverlayKind::Text => {
                let color = overlay
                    .color
                    .as_deref()
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .unwrap_or(DEFAULT_TEXT_COLOR)
                    .to_string();
                Layer {
                    key,
                    // Text sizes itself to its content.
                    rect: LayerRect {
                        left,
                        top,
                        width: 0,
                        height: 0,
                    },
                    content: LayerContent::Text {
                        text: overlay.content.clone(),
                        color,
                        font_size_px: TEXT_FONT_SIZE_PX,
                        bold: true,
                    },
                    interactive: false,
                    visible: true,
                }
            }
        }
    }
}

fn pixels(value: Option<i64>) -> u32 {
    value.unwrap_or(0).clamp(0, i64::from(u32::MAX)) as u32
}
