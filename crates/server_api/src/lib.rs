use std::sync::Arc;

use chrono::Utc;
use provider::{public_image_url, FileUpload, ProviderError, SlidesProvider};
use shared::{
    change::ChangeRecord,
    domain::{Document, FileId, PresentationId, RgbColor, SlideId, TokenBundle},
    error::{ApiError, ErrorCode},
    protocol::{
        editor_url, BackgroundRequest, BackgroundResponse, CreatePresentationRequest,
        CreatePresentationResponse, FileSummary, UpdateRequest, UpdateResponse,
        UploadImageResponse, PRESENTATION_MIME_TYPE,
    },
};
use tracing::{info, warn};

mod compiler;
mod projector;

pub use compiler::{compile, CompileOptions, DEFAULT_ALIGNMENT, DEFAULT_FONT_SIZE_PT};
pub use projector::project;

/// Drive folders the endpoints read from and write into.
#[derive(Debug, Clone, Default)]
pub struct Folders {
    pub templates: String,
    pub presentations: String,
    pub uploads: Option<String>,
}

#[derive(Clone)]
pub struct ApiContext {
    pub provider: Arc<dyn SlidesProvider>,
    pub folders: Folders,
    pub compile: CompileOptions,
}

/// An image received from the browser, ready to be pushed to storage.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

pub fn require_presentation_id(value: Option<String>) -> Result<PresentationId, ApiError> {
    value
        .filter(|id| !id.trim().is_empty())
        .map(PresentationId)
        .ok_or_else(|| ApiError::validation("Missing presentationId"))
}

pub async fn fetch_projected_document(
    ctx: &ApiContext,
    tokens: &TokenBundle,
    presentation_id: &PresentationId,
) -> Result<Document, ApiError> {
    let presentation = ctx
        .provider
        .fetch_presentation(tokens, presentation_id)
        .await
        .map_err(upstream)?;
    Ok(project(&presentation))
}

pub async fn apply_updates(
    ctx: &ApiContext,
    tokens: &TokenBundle,
    presentation_id: &PresentationId,
    request: UpdateRequest,
) -> Result<UpdateResponse, ApiError> {
    if request.is_empty() {
        return Err(ApiError::validation("Missing updates"));
    }
    let changes = request.into_changes()?;
    submit_changes(ctx, tokens, presentation_id, &changes).await?;
    Ok(UpdateResponse { success: true })
}

/// Validates a background request into its target and change record.
pub fn background_change(
    request: BackgroundRequest,
) -> Result<(PresentationId, ChangeRecord), ApiError> {
    let (Some(color), Some(presentation_id)) = (
        request.color.filter(|c| !c.trim().is_empty()),
        request.presentation_id.filter(|p| !p.trim().is_empty()),
    ) else {
        return Err(ApiError::validation("Missing color or presentationId"));
    };
    parse_color(&color)?;
    let slide_id = request.slide_id.filter(|s| !s.as_str().is_empty());
    Ok((
        PresentationId(presentation_id),
        ChangeRecord::background(slide_id, color),
    ))
}

pub async fn update_background(
    ctx: &ApiContext,
    tokens: &TokenBundle,
    presentation_id: &PresentationId,
    change: ChangeRecord,
) -> Result<BackgroundResponse, ApiError> {
    let updated = submit_changes(ctx, tokens, presentation_id, std::slice::from_ref(&change)).await?;
    Ok(BackgroundResponse {
        success: true,
        message: format!("Background updated for {updated} slide(s)."),
    })
}

pub async fn list_templates(
    ctx: &ApiContext,
    tokens: &TokenBundle,
) -> Result<Vec<FileSummary>, ApiError> {
    let templates = ctx
        .provider
        .list_files(tokens, &ctx.folders.templates, PRESENTATION_MIME_TYPE)
        .await
        .map_err(upstream)?;
    if templates.is_empty() {
        return Err(ApiError::new(ErrorCode::NotFound, "No templates found"));
    }
    Ok(templates)
}

pub async fn create_presentation(
    ctx: &ApiContext,
    tokens: &TokenBundle,
    request: CreatePresentationRequest,
) -> Result<CreatePresentationResponse, ApiError> {
    let template_id = request
        .template_id
        .filter(|id| !id.trim().is_empty())
        .map(FileId)
        .ok_or_else(|| ApiError::validation("Missing templateId"))?;
    let name = format!("Pre_{}", Utc::now().timestamp_millis());

    let copied = ctx
        .provider
        .copy_file(tokens, &template_id, &ctx.folders.presentations, &name)
        .await
        .map_err(upstream)?;
    info!(%template_id, new_presentation_id = %copied, %name, "presentation created from template");

    let new_presentation_id = PresentationId(copied.0);
    Ok(CreatePresentationResponse {
        redirect_url: editor_url(&new_presentation_id),
        new_presentation_id,
    })
}

pub async fn upload_image(
    ctx: &ApiContext,
    tokens: &TokenBundle,
    image: ImageUpload,
) -> Result<UploadImageResponse, ApiError> {
    if image.bytes.is_empty() {
        return Err(ApiError::validation("No image uploaded"));
    }
    let upload = FileUpload {
        name: image.file_name,
        mime_type: image
            .content_type
            .unwrap_or_else(|| "application/octet-stream".to_string()),
        folder_id: ctx.folders.uploads.clone(),
        bytes: image.bytes,
    };
    let file_id = ctx
        .provider
        .upload_file(tokens, upload)
        .await
        .map_err(upstream)?;
    ctx.provider
        .set_public_readable(tokens, &file_id)
        .await
        .map_err(upstream)?;
    Ok(UploadImageResponse {
        image_url: public_image_url(&file_id),
    })
}

/// Compiles `changes` and submits them as one batch. Returns the number of
/// operations sent.
async fn submit_changes(
    ctx: &ApiContext,
    tokens: &TokenBundle,
    presentation_id: &PresentationId,
    changes: &[ChangeRecord],
) -> Result<usize, ApiError> {
    // Reject bad colours before any provider round trip.
    for change in changes {
        if let ChangeRecord::Background { color_hex, .. } = change {
            parse_color(color_hex)?;
        }
    }

    let all_slides: Vec<SlideId> = if changes.iter().any(ChangeRecord::targets_all_slides) {
        fetch_projected_document(ctx, tokens, presentation_id)
            .await?
            .slide_ids()
    } else {
        Vec::new()
    };

    let requests = compile(changes, &ctx.compile, &all_slides)?;
    if requests.is_empty() {
        return Ok(0);
    }
    ctx.provider
        .batch_update(tokens, presentation_id, &requests)
        .await
        .map_err(upstream)?;
    info!(
        %presentation_id,
        changes = changes.len(),
        operations = requests.len(),
        "batch update submitted"
    );
    Ok(requests.len())
}

fn parse_color(color_hex: &str) -> Result<RgbColor, ApiError> {
    RgbColor::from_hex(color_hex).map_err(|e| ApiError::validation(e.to_string()))
}

/// Maps a provider failure onto the edge error. A rejected credential is
/// surfaced as a re-authentication signal.
pub fn upstream(err: ProviderError) -> ApiError {
    match err {
        ProviderError::NotFound(message) => ApiError::new(ErrorCode::NotFound, message),
        ProviderError::Unauthorized(_) => ApiError::login_required(),
        other => {
            warn!(status = ?other.status(), error = %other, "provider call failed");
            ApiError::new(ErrorCode::Upstream, other.to_string())
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
