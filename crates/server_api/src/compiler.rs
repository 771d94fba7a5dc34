use provider::requests::{Dimension, Request, TextStyleUpdate};
use shared::{
    change::{Alignment, ChangeRecord, StyleChange},
    domain::{RgbColor, SlideId},
    error::ApiError,
};

pub const DEFAULT_FONT_SIZE_PT: f64 = 16.0;
pub const DEFAULT_ALIGNMENT: Alignment = Alignment::Center;

/// Fallbacks applied to style changes that leave a field unset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompileOptions {
    pub default_font_size_pt: f64,
    pub default_alignment: Alignment,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            default_font_size_pt: DEFAULT_FONT_SIZE_PT,
            default_alignment: DEFAULT_ALIGNMENT,
        }
    }
}

/// Lowers change records into provider operations, preserving record order.
///
/// `all_slides` is the fan-out target of a background change without a
/// slide id; it may be empty when no such change is present.
pub fn compile(
    changes: &[ChangeRecord],
    options: &CompileOptions,
    all_slides: &[SlideId],
) -> Result<Vec<Request>, ApiError> {
    let mut requests = Vec::with_capacity(changes.len() * 2);
    for change in changes {
        match change {
            ChangeRecord::Text {
                element_id,
                text,
                style,
            } => {
                requests.push(Request::delete_all_text(element_id.as_str()));
                requests.push(Request::insert_text(element_id.as_str(), text.as_str()));
                // Blank text leaves no range worth styling.
                if let Some(style) = style.as_ref().filter(|_| !text.trim().is_empty()) {
                    push_style(&mut requests, element_id.as_str(), style, options);
                }
            }
            ChangeRecord::Image {
                element_id,
                image_url,
            } => requests.push(Request::replace_image(element_id.as_str(), image_url.as_str())),
            ChangeRecord::Background {
                slide_id,
                color_hex,
            } => {
                let color = RgbColor::from_hex(color_hex)
                    .map_err(|e| ApiError::validation(e.to_string()))?;
                match slide_id {
                    Some(slide_id) => {
                        requests.push(Request::update_background(slide_id.as_str(), color))
                    }
                    None => requests.extend(
                        all_slides
                            .iter()
                            .map(|slide_id| Request::update_background(slide_id.as_str(), color)),
                    ),
                }
            }
            ChangeRecord::PlaceholderFill {
                find,
                replace,
                match_case,
            } => requests.push(Request::replace_all_text(
                find.as_str(),
                replace.as_str(),
                *match_case,
            )),
        }
    }
    Ok(requests)
}

fn push_style(
    requests: &mut Vec<Request>,
    object_id: &str,
    style: &StyleChange,
    options: &CompileOptions,
) {
    requests.push(Request::update_text_style(
        object_id,
        TextStyleUpdate {
            font_size: Dimension::points(style.font_size.unwrap_or(options.default_font_size_pt)),
            bold: style.bold,
            italic: style.italic,
            underline: style.underline,
        },
    ));
    requests.push(Request::update_alignment(
        object_id,
        style.alignment.unwrap_or(options.default_alignment),
    ));
}

#[cfg(test)]
#[path = "tests/compiler_tests.rs"]
mod tests;
