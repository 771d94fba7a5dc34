use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

id_newtype!(PresentationId);
id_newtype!(SlideId);
id_newtype!(ElementId);
id_newtype!(FileId);
id_newtype!(SessionId);

/// Normalized colour as the provider transmits it: each channel in `[0, 1]`.
///
/// The provider omits channels that are zero, hence the per-field defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RgbColor {
    #[serde(default)]
    pub red: f64,
    #[serde(default)]
    pub green: f64,
    #[serde(default)]
    pub blue: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorParseError {
    #[error("color must be a #RRGGBB hex string, got {0:?}")]
    Malformed(String),
}

impl RgbColor {
    pub const WHITE: RgbColor = RgbColor {
        red: 1.0,
        green: 1.0,
        blue: 1.0,
    };

    /// Parses `#RRGGBB` (the leading `#` is optional) into normalized channels.
    pub fn from_hex(hex: &str) -> Result<Self, ColorParseError> {
        let trimmed = hex.trim();
        let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ColorParseError::Malformed(hex.to_string()));
        }
        let value = u32::from_str_radix(digits, 16)
            .map_err(|_| ColorParseError::Malformed(hex.to_string()))?;
        Ok(Self::from_components(
            ((value >> 16) & 0xff) as u8,
            ((value >> 8) & 0xff) as u8,
            (value & 0xff) as u8,
        ))
    }

    pub fn from_components(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: f64::from(red) / 255.0,
            green: f64::from(green) / 255.0,
            blue: f64::from(blue) / 255.0,
        }
    }

    pub fn components(&self) -> (u8, u8, u8) {
        (
            channel_to_byte(self.red),
            channel_to_byte(self.green),
            channel_to_byte(self.blue),
        )
    }

    pub fn to_hex(&self) -> String {
        let (r, g, b) = self.components();
        format!("#{r:02x}{g:02x}{b:02x}")
    }
}

impl Default for RgbColor {
    fn default() -> Self {
        Self::WHITE
    }
}

fn channel_to_byte(channel: f64) -> u8 {
    (channel.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Editable projection of a provider presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub slides: Vec<Slide>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slide {
    pub slide_id: SlideId,
    pub background_color: RgbColor,
    pub elements: Vec<Element>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Element {
    Text {
        id: ElementId,
        text: String,
        #[serde(
            rename = "textColor",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        text_color: Option<RgbColor>,
    },
    Image {
        id: ElementId,
        image: String,
    },
}

impl Element {
    pub fn id(&self) -> &ElementId {
        match self {
            Element::Text { id, .. } | Element::Image { id, .. } => id,
        }
    }
}

impl Document {
    pub fn slide_ids(&self) -> Vec<SlideId> {
        self.slides.iter().map(|slide| slide.slide_id.clone()).collect()
    }
}

/// OAuth token bundle held for a session. Opaque to everything but the
/// provider client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBundle {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl TokenBundle {
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            token_type: Some("Bearer".to_string()),
            scope: None,
            expires_at: None,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
