use serde::{Deserialize, Serialize};
use shared::{change::Alignment, domain::RgbColor};

pub const BACKGROUND_FILL_FIELDS: &str = "pageBackgroundFill.solidFill.color";
pub const TEXT_STYLE_FIELDS: &str = "fontSize,bold,italic,underline";
pub const PARAGRAPH_ALIGNMENT_FIELDS: &str = "alignment";

/// One primitive of a provider batch update. Serializes to the provider's
/// externally tagged shape, e.g. `{"deleteText": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Request {
    DeleteText(DeleteTextRequest),
    InsertText(InsertTextRequest),
    ReplaceAllText(ReplaceAllTextRequest),
    UpdateTextStyle(UpdateTextStyleRequest),
    UpdateParagraphStyle(UpdateParagraphStyleRequest),
    UpdatePageProperties(UpdatePagePropertiesRequest),
    ReplaceImage(ReplaceImageRequest),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RangeType {
    All,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRange {
    #[serde(rename = "type")]
    pub kind: RangeType,
}

impl TextRange {
    pub const ALL: TextRange = TextRange {
        kind: RangeType::All,
    };
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteTextRequest {
    pub object_id: String,
    pub text_range: TextRange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertTextRequest {
    pub object_id: String,
    pub text: String,
    pub insertion_index: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubstringMatchCriteria {
    pub text: String,
    pub match_case: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceAllTextRequest {
    pub contains_text: SubstringMatchCriteria,
    pub replace_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    pub magnitude: f64,
    pub unit: String,
}

impl Dimension {
    pub fn points(magnitude: f64) -> Self {
        Self {
            magnitude,
            unit: "PT".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyleUpdate {
    pub font_size: Dimension,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTextStyleRequest {
    pub object_id: String,
    pub text_range: TextRange,
    pub style: TextStyleUpdate,
    pub fields: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParagraphStyleUpdate {
    pub alignment: Alignment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateParagraphStyleRequest {
    pub object_id: String,
    pub text_range: TextRange,
    pub style: ParagraphStyleUpdate,
    pub fields: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorValue {
    pub rgb_color: RgbColor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolidFillUpdate {
    pub color: ColorValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundFillUpdate {
    pub solid_fill: SolidFillUpdate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagePropertiesUpdate {
    pub page_background_fill: BackgroundFillUpdate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePagePropertiesRequest {
    pub object_id: String,
    pub page_properties: PagePropertiesUpdate,
    pub fields: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImageReplaceMethod {
    CenterInside,
    CenterCrop,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceImageRequest {
    pub image_object_id: String,
    pub url: String,
    pub image_replace_method: ImageReplaceMethod,
}

impl Request {
    pub fn delete_all_text(object_id: impl Into<String>) -> Self {
        Request::DeleteText(DeleteTextRequest {
            object_id: object_id.into(),
            text_range: TextRange::ALL,
        })
    }

    pub fn insert_text(object_id: impl Into<String>, text: impl Into<String>) -> Self {
        Request::InsertText(InsertTextRequest {
            object_id: object_id.into(),
            text: text.into(),
            insertion_index: 0,
        })
    }

    pub fn replace_all_text(
        find: impl Into<String>,
        replace: impl Into<String>,
        match_case: bool,
    ) -> Self {
        Request::ReplaceAllText(ReplaceAllTextRequest {
            contains_text: SubstringMatchCriteria {
                text: find.into(),
                match_case,
            },
            replace_text: replace.into(),
        })
    }

    pub fn update_text_style(object_id: impl Into<String>, style: TextStyleUpdate) -> Self {
        Request::UpdateTextStyle(UpdateTextStyleRequest {
            object_id: object_id.into(),
            text_range: TextRange::ALL,
            style,
            fields: TEXT_STYLE_FIELDS.to_string(),
        })
    }

    pub fn update_alignment(object_id: impl Into<String>, alignment: Alignment) -> Self {
        Request::UpdateParagraphStyle(UpdateParagraphStyleRequest {
            object_id: object_id.into(),
            text_range: TextRange::ALL,
            style: ParagraphStyleUpdate { alignment },
            fields: PARAGRAPH_ALIGNMENT_FIELDS.to_string(),
        })
    }

    /// Background fill update masked to the solid fill colour only.
    pub fn update_background(object_id: impl Into<String>, rgb_color: RgbColor) -> Self {
        Request::UpdatePageProperties(UpdatePagePropertiesRequest {
            object_id: object_id.into(),
            page_properties: PagePropertiesUpdate {
                page_background_fill: BackgroundFillUpdate {
                    solid_fill: SolidFillUpdate {
                        color: ColorValue { rgb_color },
                    },
                },
            },
            fields: BACKGROUND_FILL_FIELDS.to_string(),
        })
    }

    pub fn replace_image(image_object_id: impl Into<String>, url: impl Into<String>) -> Self {
        Request::ReplaceImage(ReplaceImageRequest {
            image_object_id: image_object_id.into(),
            url: url.into(),
            image_replace_method: ImageReplaceMethod::CenterInside,
        })
    }

    /// Object the primitive targets, when it targets a single one.
    pub fn object_id(&self) -> Option<&str> {
        match self {
            Request::DeleteText(r) => Some(&r.object_id),
            Request::InsertText(r) => Some(&r.object_id),
            Request::ReplaceAllText(_) => None,
            Request::UpdateTextStyle(r) => Some(&r.object_id),
            Request::UpdateParagraphStyle(r) => Some(&r.object_id),
            Request::UpdatePageProperties(r) => Some(&r.object_id),
            Request::ReplaceImage(r) => Some(&r.image_object_id),
        }
    }
}

#[cfg(test)]
#[path = "tests/requests_tests.rs"]
mod tests;
