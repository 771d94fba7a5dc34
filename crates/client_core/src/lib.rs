use anyhow::{Context, Result};
use reqwest::{
    header::COOKIE,
    multipart::{Form, Part},
    Client, RequestBuilder, Response, StatusCode,
};
use serde::de::DeserializeOwned;
use shared::{
    domain::{Document, FileId, PresentationId, SlideId},
    error::{ApiError, ApiException, ErrorCode},
    protocol::{
        BackgroundRequest, BackgroundResponse, CreatePresentationRequest,
        CreatePresentationResponse, FileSummary, TemplatesResponse, UpdateRequest,
        UpdateResponse, UploadImageResponse,
    },
};
use tracing::{info, warn};

pub mod collector;

pub use collector::{collect, RenderedNode, RenderedSlide, RenderedSurface};

pub const SESSION_COOKIE: &str = "deck_session";

#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// The surface had nothing to submit; no request was made.
    NothingToSave,
    /// The batch landed and the document was re-fetched from the server.
    Saved { document: Document },
}

/// HTTP client for the editor endpoints, acting on behalf of one session.
pub struct EditorClient {
    http: Client,
    server_url: String,
    session_id: Option<String>,
}

impl EditorClient {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            server_url: server_url.into().trim_end_matches('/').to_string(),
            session_id: None,
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub async fn load_document(&self, presentation_id: &PresentationId) -> Result<Document> {
        let response = self
            .authorized(self.http.get(self.url("/slides")))
            .query(&[("presentationId", presentation_id.as_str())])
            .send()
            .await
            .context("failed to reach editor server")?;
        read_json(response).await
    }

    /// Submits every collected change as one update, then reloads the
    /// document. On failure the surface is left as it was.
    pub async fn save(
        &self,
        presentation_id: &PresentationId,
        surface: &RenderedSurface,
    ) -> Result<SaveOutcome> {
        let mut changes = collect(surface);
        changes.extend(surface.image_changes().iter().cloned());
        if changes.is_empty() {
            warn!(%presentation_id, "no changes detected; nothing to save");
            return Ok(SaveOutcome::NothingToSave);
        }

        let change_count = changes.len();
        let response = self
            .authorized(self.http.post(self.url("/update")))
            .query(&[("presentationId", presentation_id.as_str())])
            .json(&UpdateRequest::from_changes(changes))
            .send()
            .await
            .context("failed to reach editor server")?;
        let _: UpdateResponse = read_json(response).await?;
        info!(%presentation_id, changes = change_count, "changes saved");

        let document = self.load_document(presentation_id).await?;
        Ok(SaveOutcome::Saved { document })
    }

    /// Uploads an image and returns the public URL it can be embedded from.
    pub async fn upload_image(
        &self,
        file_name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String> {
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime_type)
            .with_context(|| format!("invalid mime type {mime_type:?}"))?;
        let response = self
            .authorized(self.http.post(self.url("/upload-image")))
            .multipart(Form::new().part("image", part))
            .send()
            .await
            .context("failed to reach editor server")?;
        let body: UploadImageResponse = read_json(response).await?;
        Ok(body.image_url)
    }

    pub async fn update_background(
        &self,
        presentation_id: &PresentationId,
        slide_id: Option<SlideId>,
        color_hex: &str,
    ) -> Result<BackgroundResponse> {
        let response = self
            .authorized(self.http.post(self.url("/api/update-slide-background")))
            .json(&BackgroundRequest {
                slide_id,
                color: Some(color_hex.to_string()),
                presentation_id: Some(presentation_id.to_string()),
            })
            .send()
            .await
            .context("failed to reach editor server")?;
        read_json(response).await
    }

    pub async fn list_templates(&self) -> Result<Vec<FileSummary>> {
        let response = self
            .authorized(self.http.get(self.url("/templates")))
            .send()
            .await
            .context("failed to reach editor server")?;
        let body: TemplatesResponse = read_json(response).await?;
        Ok(body.templates)
    }

    pub async fn create_presentation(
        &self,
        template_id: &FileId,
    ) -> Result<CreatePresentationResponse> {
        let response = self
            .authorized(self.http.post(self.url("/create-presentation")))
            .json(&CreatePresentationRequest {
                template_id: Some(template_id.to_string()),
            })
            .send()
            .await
            .context("failed to reach editor server")?;
        read_json(response).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.server_url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.session_id {
            Some(session_id) => request.header(COOKIE, format!("{SESSION_COOKIE}={session_id}")),
            None => request,
        }
    }
}

/// Decodes a success body, or turns an `{"error": ..}` reply into an
/// [`ApiException`] carrying the server's message.
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return response
            .json()
            .await
            .context("invalid response body from editor server");
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiError>(&body)
        .map(|e| e.message)
        .unwrap_or_else(|_| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });
    Err(ApiException::new(error_code(status), message).into())
}

fn error_code(status: StatusCode) -> ErrorCode {
    match status {
        StatusCode::BAD_REQUEST | StatusCode::PAYLOAD_TOO_LARGE => ErrorCode::Validation,
        StatusCode::UNAUTHORIZED => ErrorCode::Unauthorized,
        StatusCode::NOT_FOUND => ErrorCode::NotFound,
        _ => ErrorCode::Upstream,
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
