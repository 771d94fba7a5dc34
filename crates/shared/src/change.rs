use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{ElementId, SlideId};

/// One user edit, prior to compilation into provider operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeRecord {
    Text {
        element_id: ElementId,
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        style: Option<StyleChange>,
    },
    Image {
        element_id: ElementId,
        image_url: String,
    },
    /// `slide_id: None` applies the colour to every slide.
    Background {
        slide_id: Option<SlideId>,
        color_hex: String,
    },
    PlaceholderFill {
        find: String,
        replace: String,
        match_case: bool,
    },
}

impl ChangeRecord {
    pub fn text(element_id: impl Into<ElementId>, text: impl Into<String>) -> Self {
        ChangeRecord::Text {
            element_id: element_id.into(),
            text: text.into(),
            style: None,
        }
    }

    pub fn image(element_id: impl Into<ElementId>, image_url: impl Into<String>) -> Self {
        ChangeRecord::Image {
            element_id: element_id.into(),
            image_url: image_url.into(),
        }
    }

    pub fn background(slide_id: Option<SlideId>, color_hex: impl Into<String>) -> Self {
        ChangeRecord::Background {
            slide_id,
            color_hex: color_hex.into(),
        }
    }

    /// True when compiling this record needs the full slide list.
    pub fn targets_all_slides(&self) -> bool {
        matches!(self, ChangeRecord::Background { slide_id: None, .. })
    }
}

/// Requested text styling. Unset fields fall back to the compiler defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleChange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub underline: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<Alignment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Alignment {
    Start,
    Center,
    End,
    Justified,
}

impl Alignment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Alignment::Start => "start",
            Alignment::Center => "center",
            Alignment::End => "end",
            Alignment::Justified => "justified",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown alignment {0:?}")]
pub struct UnknownAlignment(pub String);

impl FromStr for Alignment {
    type Err = UnknownAlignment;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "start" | "left" => Ok(Alignment::Start),
            "center" | "centre" => Ok(Alignment::Center),
            "end" | "right" => Ok(Alignment::End),
            "justified" | "justify" => Ok(Alignment::Justified),
            _ => Err(UnknownAlignment(s.to_string())),
        }
    }
}
