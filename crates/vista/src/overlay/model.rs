use serde::{Deserialize, Serialize};

use crate::VistaError;

/// Overlay variant tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum OverlayKind {
    #[default]
    Text,
    Logo,
}

impl std::fmt::Display for OverlayKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverlayKind::Text => f.write_str("text"),
            OverlayKind::Logo => f.write_str("logo"),
        }
    }
}

/// Pixel offset from the top-left of the video surface.
///
/// Fields are optional because overlays may be rendered from unvalidated
/// form state; missing values count as `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<i64>,
}

impl Position {
    pub fn new(x: i64, y: i64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Size {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<i64>,
}

impl Size {
    pub fn new(width: i64, height: i64) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
        }
    }
}

/// An overlay record as held by the store.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Overlay {
    /// Store-assigned identifier, `None` for overlays not yet persisted.
    #[serde(rename = "_id", alias = "id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: OverlayKind,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
}

impl Overlay {
    /// The request body used to update this overlay.
    pub fn to_draft(&self) -> OverlayDraft {
        OverlayDraft {
            name: self.name.clone(),
            kind: self.kind,
            content: self.content.clone(),
            color: match self.kind {
                OverlayKind::Text => self.color.clone(),
                OverlayKind::Logo => None,
            },
            position: self.position.unwrap_or_default(),
            size: self.size.unwrap_or_default(),
        }
    }
}

/// An overlay without its identifier: the body of create and update requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayDraft {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: OverlayKind,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub position: Position,
    pub size: Size,
}

impl OverlayDraft {
    /// Checks the fields a store accepts: non-empty name and content,
    /// non-negative coordinates.
    pub fn validate(&self) -> Result<(), VistaError> {
        if self.name.trim().is_empty() {
            return Err(VistaError::InvalidInput("overlay name is required".into()));
        }
        if self.content.trim().is_empty() {
            return Err(VistaError::InvalidInput(
                "overlay content is required".into(),
            ));
        }
        let fields = [
            ("x", self.position.x),
            ("y", self.position.y),
            ("width", self.size.width),
            ("height", self.size.height),
        ];
        for (field, value) in fields {
            if let Some(v) = value
                && v < 0
            {
                return Err(VistaError::InvalidInput(format!(
                    "{field} must not be negative, got {v}"
                )));
            }
        }
        Ok(())
    }
}

/// Raw, string-typed form fields as typed by the user.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OverlayForm {
    pub name: String,
    pub content: String,
    pub kind: OverlayKind,
    pub color: String,
    pub x: String,
    pub y: String,
    pub width: String,
    pub height: String,
}

impl OverlayForm {
    /// Form pre-filled from an existing overlay, used when one is selected for editing.
    pub fn from_overlay(overlay: &Overlay) -> Self {
        let position = overlay.position.unwrap_or_default();
        let size = overlay.size.unwrap_or_default();
        let field = |v: Option<i64>| v.map(|v| v.to_string()).unwrap_or_default();
        Self {
            name: overlay.name.clone(),
            content: overlay.content.clone(),
            kind: overlay.kind,
            color: overlay.color.clone().unwrap_or_default(),
            x: field(position.x),
            y: field(position.y),
            width: field(size.width),
            height: field(size.height),
        }
    }

    /// Parses the fields into a validated draft. Blank numeric fields stay absent.
    pub fn to_draft(&self) -> Result<OverlayDraft, VistaError> {
        let color = match self.kind {
            OverlayKind::Text if !self.color.trim().is_empty() => {
                Some(self.color.trim().to_string())
            }
            _ => None,
        };
        let draft = OverlayDraft {
            name: self.name.trim().to_string(),
            kind: self.kind,
            content: self.content.trim().to_string(),
            color,
            position: Position {
                x: parse_field("x", &self.x)?,
                y: parse_field("y", &self.y)?,
            },
            size: Size {
                width: parse_field("width", &self.width)?,
                height: parse_field("height", &self.height)?,
            },
        };
        draft.validate()?;
        Ok(draft)
    }
}

fn parse_field(field: &str, raw: &str) -> Result<Option<i64>, VistaError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<i64>()
        .map(Some)
        .map_err(|_| VistaError::InvalidInput(format!("{field} must be an integer, got {raw:?}")))
}
