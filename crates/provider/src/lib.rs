use async_trait::async_trait;
use shared::{
    domain::{FileId, PresentationId, TokenBundle},
    protocol::FileSummary,
};
use thiserror::Error;

mod google;
mod oauth;
pub mod raw;
pub mod requests;

pub use google::{GoogleEndpoints, GoogleProvider};
pub use oauth::{OAuthClient, OAuthConfig, DEFAULT_SCOPES, GOOGLE_AUTH_URL, GOOGLE_TOKEN_URL};

use raw::{BatchUpdateResponse, Presentation};
use requests::Request;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    InvalidOperation(String),
    #[error("{message}")]
    Upstream { status: u16, message: String },
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ProviderError {
    /// Classifies a failed provider response by status code.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            400 => ProviderError::InvalidOperation(message),
            401 => ProviderError::Unauthorized(message),
            404 => ProviderError::NotFound(message),
            _ => ProviderError::Upstream { status, message },
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ProviderError::NotFound(_) => Some(404),
            ProviderError::Unauthorized(_) => Some(401),
            ProviderError::InvalidOperation(_) => Some(400),
            ProviderError::Upstream { status, .. } => Some(*status),
            ProviderError::Transport(err) => err.status().map(|s| s.as_u16()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FileUpload {
    pub name: String,
    pub mime_type: String,
    pub folder_id: Option<String>,
    pub bytes: Vec<u8>,
}

/// Authenticated capabilities of the presentation/storage service.
///
/// No implementation retries: a failed call returns the provider's error.
#[async_trait]
pub trait SlidesProvider: Send + Sync {
    async fn fetch_presentation(
        &self,
        tokens: &TokenBundle,
        presentation_id: &PresentationId,
    ) -> Result<Presentation, ProviderError>;

    /// Applies `requests` atomically: all of them land or none do.
    async fn batch_update(
        &self,
        tokens: &TokenBundle,
        presentation_id: &PresentationId,
        requests: &[Request],
    ) -> Result<BatchUpdateResponse, ProviderError>;

    async fn list_files(
        &self,
        tokens: &TokenBundle,
        folder_id: &str,
        mime_type: &str,
    ) -> Result<Vec<FileSummary>, ProviderError>;

    async fn copy_file(
        &self,
        tokens: &TokenBundle,
        source_id: &FileId,
        dest_folder_id: &str,
        new_name: &str,
    ) -> Result<FileId, ProviderError>;

    async fn upload_file(
        &self,
        tokens: &TokenBundle,
        upload: FileUpload,
    ) -> Result<FileId, ProviderError>;

    async fn set_public_readable(
        &self,
        tokens: &TokenBundle,
        file_id: &FileId,
    ) -> Result<(), ProviderError>;
}

/// OAuth authorization-code flow against the provider.
#[async_trait]
pub trait Authenticator: Send + Sync {
    fn authorize_url(&self, state: &str) -> Result<String, ProviderError>;

    async fn exchange_code(&self, code: &str) -> Result<TokenBundle, ProviderError>;
}

/// Link under which a publicly readable Drive file can be embedded.
pub fn public_image_url(file_id: &FileId) -> String {
    format!("https://drive.google.com/uc?id={file_id}")
}

/// Extracts the human-readable message from a provider error body.
///
/// Handles both the API shape `{"error": {"message": ..}}` and the OAuth
/// shape `{"error": "..", "error_description": ..}`.
pub(crate) fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let error = value.get("error")?;
    if let Some(message) = error.get("message").and_then(|m| m.as_str()) {
        return Some(message.to_string());
    }
    let code = error.as_str()?;
    match value.get("error_description").and_then(|d| d.as_str()) {
        Some(description) => Some(format!("{code}: {description}")),
        None => Some(code.to_string()),
    }
}

pub(crate) async fn check(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body).unwrap_or_else(|| {
        if body.trim().is_empty() {
            status
                .canonical_reason()
                .unwrap_or("provider request failed")
                .to_string()
        } else {
            body
        }
    });
    tracing::warn!(status = status.as_u16(), %message, "provider request failed");
    Err(ProviderError::from_status(status.as_u16(), message))
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
