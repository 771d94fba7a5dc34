use serde::{Deserialize, Serialize};

use crate::{
    change::{Alignment, ChangeRecord, StyleChange},
    domain::{ElementId, FileId, PresentationId, SlideId},
    error::ApiError,
};

pub const PRESENTATION_MIME_TYPE: &str = "application/vnd.google-apps.presentation";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresentationQuery {
    #[serde(default)]
    pub presentation_id: Option<String>,
}

/// Body of `POST /update`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateRequest {
    #[serde(default)]
    pub updates: Vec<TextUpdate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ImageUpdate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replacements: Vec<Replacement>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextUpdate {
    #[serde(default)]
    pub object_id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_bold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_italic: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_underline: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageUpdate {
    #[serde(default)]
    pub object_id: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Replacement {
    #[serde(default)]
    pub find: Option<String>,
    #[serde(default)]
    pub replace: Option<String>,
    #[serde(default)]
    pub match_case: bool,
}

impl TextUpdate {
    pub fn plain(object_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            object_id: Some(object_id.into()),
            text: Some(text.into()),
            ..Self::default()
        }
    }

    fn has_style(&self) -> bool {
        self.font_size.is_some()
            || self.is_bold.is_some()
            || self.is_italic.is_some()
            || self.is_underline.is_some()
            || self.alignment.is_some()
    }

    pub fn into_change(self) -> Result<ChangeRecord, ApiError> {
        let style = if self.has_style() {
            let alignment = self
                .alignment
                .as_deref()
                .map(str::parse::<Alignment>)
                .transpose()
                .map_err(|e| ApiError::validation(e.to_string()))?;
            Some(StyleChange {
                font_size: self.font_size,
                bold: self.is_bold.unwrap_or(false),
                italic: self.is_italic.unwrap_or(false),
                underline: self.is_underline.unwrap_or(false),
                alignment,
            })
        } else {
            None
        };
        let element_id = non_empty(self.object_id)
            .ok_or_else(|| ApiError::validation("Missing objectId in update"))?;
        let text = self
            .text
            .ok_or_else(|| ApiError::validation("Missing text in update"))?;
        Ok(ChangeRecord::Text {
            element_id: ElementId(element_id),
            text,
            style,
        })
    }
}

impl ImageUpdate {
    pub fn into_change(self) -> Result<ChangeRecord, ApiError> {
        let element_id = non_empty(self.object_id)
            .ok_or_else(|| ApiError::validation("Missing objectId in image update"))?;
        let image_url = non_empty(self.image_url)
            .ok_or_else(|| ApiError::validation("Missing imageUrl in image update"))?;
        Ok(ChangeRecord::image(element_id, image_url))
    }
}

impl Replacement {
    pub fn into_change(self) -> Result<ChangeRecord, ApiError> {
        let find = non_empty(self.find)
            .ok_or_else(|| ApiError::validation("Missing find in replacement"))?;
        Ok(ChangeRecord::PlaceholderFill {
            find,
            replace: self.replace.unwrap_or_default(),
            match_case: self.match_case,
        })
    }
}

impl UpdateRequest {
    /// Builds the wire body for a set of change records. Background records
    /// travel through their own endpoint and are skipped.
    pub fn from_changes(changes: impl IntoIterator<Item = ChangeRecord>) -> Self {
        let mut request = Self::default();
        for change in changes {
            match change {
                ChangeRecord::Text {
                    element_id,
                    text,
                    style,
                } => {
                    let mut update = TextUpdate::plain(element_id.0, text);
                    if let Some(style) = style {
                        update.font_size = style.font_size;
                        update.is_bold = Some(style.bold);
                        update.is_italic = Some(style.italic);
                        update.is_underline = Some(style.underline);
                        update.alignment = style.alignment.map(|a| a.as_str().to_string());
                    }
                    request.updates.push(update);
                }
                ChangeRecord::Image {
                    element_id,
                    image_url,
                } => request.images.push(ImageUpdate {
                    object_id: Some(element_id.0),
                    image_url: Some(image_url),
                }),
                ChangeRecord::PlaceholderFill {
                    find,
                    replace,
                    match_case,
                } => request.replacements.push(Replacement {
                    find: Some(find),
                    replace: Some(replace),
                    match_case,
                }),
                ChangeRecord::Background { .. } => {}
            }
        }
        request
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.images.is_empty() && self.replacements.is_empty()
    }

    /// Validates every entry and flattens the body into change records,
    /// text first, then images, then placeholder fills.
    pub fn into_changes(self) -> Result<Vec<ChangeRecord>, ApiError> {
        let mut changes =
            Vec::with_capacity(self.updates.len() + self.images.len() + self.replacements.len());
        for update in self.updates {
            changes.push(update.into_change()?);
        }
        for image in self.images {
            changes.push(image.into_change()?);
        }
        for replacement in self.replacements {
            changes.push(replacement.into_change()?);
        }
        Ok(changes)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateResponse {
    pub success: bool,
}

/// Body of `POST /api/update-slide-background`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slide_id: Option<SlideId>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub presentation_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackgroundResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadImageResponse {
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSummary {
    pub id: FileId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_link: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplatesResponse {
    pub templates: Vec<FileSummary>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePresentationRequest {
    #[serde(default)]
    pub template_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePresentationResponse {
    pub new_presentation_id: PresentationId,
    pub redirect_url: String,
}

pub fn editor_url(presentation_id: &PresentationId) -> String {
    format!("/editor.html?presentationId={presentation_id}")
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
