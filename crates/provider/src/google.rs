use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client};
use serde::{Deserialize, Serialize};
use shared::{
    domain::{FileId, PresentationId, TokenBundle},
    protocol::FileSummary,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    check,
    raw::{BatchUpdateResponse, Presentation},
    requests::Request,
    FileUpload, ProviderError, SlidesProvider,
};

pub const SLIDES_API_BASE: &str = "https://slides.googleapis.com/v1";
pub const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";
pub const DRIVE_UPLOAD_BASE: &str = "https://www.googleapis.com/upload/drive/v3";

const TEMPLATE_LIST_FIELDS: &str = "files(id, name, thumbnailLink)";

#[derive(Debug, Clone)]
pub struct GoogleEndpoints {
    pub slides_base: String,
    pub drive_base: String,
    pub upload_base: String,
}

impl Default for GoogleEndpoints {
    fn default() -> Self {
        Self {
            slides_base: SLIDES_API_BASE.into(),
            drive_base: DRIVE_API_BASE.into(),
            upload_base: DRIVE_UPLOAD_BASE.into(),
        }
    }
}

impl GoogleEndpoints {
    /// All three APIs rooted under one host, laid out like the real paths.
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            slides_base: format!("{base}/v1"),
            drive_base: format!("{base}/drive/v3"),
            upload_base: format!("{base}/upload/drive/v3"),
        }
    }
}

/// Google Slides + Drive over REST.
#[derive(Clone)]
pub struct GoogleProvider {
    http: Client,
    endpoints: GoogleEndpoints,
}

#[derive(Serialize)]
struct BatchUpdateBody<'a> {
    requests: &'a [Request],
}

#[derive(Serialize)]
struct CopyFileBody<'a> {
    name: &'a str,
    parents: [&'a str; 1],
}

#[derive(Serialize)]
struct UploadMetadata<'a> {
    name: &'a str,
    #[serde(rename = "mimeType")]
    mime_type: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    parents: Vec<&'a str>,
}

#[derive(Serialize)]
struct PermissionBody {
    role: &'static str,
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<FileSummary>,
}

#[derive(Deserialize)]
struct CreatedFile {
    id: FileId,
}

impl GoogleProvider {
    pub fn new(endpoints: GoogleEndpoints) -> Self {
        Self::with_client(Client::new(), endpoints)
    }

    pub fn with_client(http: Client, endpoints: GoogleEndpoints) -> Self {
        Self { http, endpoints }
    }
}

#[async_trait]
impl SlidesProvider for GoogleProvider {
    async fn fetch_presentation(
        &self,
        tokens: &TokenBundle,
        presentation_id: &PresentationId,
    ) -> Result<Presentation, ProviderError> {
        let response = self
            .http
            .get(format!(
                "{}/presentations/{presentation_id}",
                self.endpoints.slides_base
            ))
            .bearer_auth(&tokens.access_token)
            .send()
            .await?;
        let presentation: Presentation = check(response).await?.json().await?;
        debug!(
            %presentation_id,
            slides = presentation.slides.len(),
            "provider: fetched presentation"
        );
        Ok(presentation)
    }

    async fn batch_update(
        &self,
        tokens: &TokenBundle,
        presentation_id: &PresentationId,
        requests: &[Request],
    ) -> Result<BatchUpdateResponse, ProviderError> {
        debug!(
            %presentation_id,
            targets = ?requests.iter().filter_map(Request::object_id).collect::<Vec<_>>(),
            "provider: submitting batch update"
        );
        let response = self
            .http
            .post(format!(
                "{}/presentations/{presentation_id}:batchUpdate",
                self.endpoints.slides_base
            ))
            .bearer_auth(&tokens.access_token)
            .json(&BatchUpdateBody { requests })
            .send()
            .await?;
        let reply: BatchUpdateResponse = check(response).await?.json().await?;
        info!(
            %presentation_id,
            operations = requests.len(),
            "provider: batch update applied"
        );
        Ok(reply)
    }

    async fn list_files(
        &self,
        tokens: &TokenBundle,
        folder_id: &str,
        mime_type: &str,
    ) -> Result<Vec<FileSummary>, ProviderError> {
        let query = format!(
            "'{}' in parents and mimeType='{}' and trashed=false",
            escape_query_literal(folder_id),
            escape_query_literal(mime_type)
        );
        let response = self
            .http
            .get(format!("{}/files", self.endpoints.drive_base))
            .bearer_auth(&tokens.access_token)
            .query(&[("q", query.as_str()), ("fields", TEMPLATE_LIST_FIELDS)])
            .send()
            .await?;
        let listing: FileList = check(response).await?.json().await?;
        Ok(listing.files)
    }

    async fn copy_file(
        &self,
        tokens: &TokenBundle,
        source_id: &FileId,
        dest_folder_id: &str,
        new_name: &str,
    ) -> Result<FileId, ProviderError> {
        let response = self
            .http
            .post(format!(
                "{}/files/{source_id}/copy",
                self.endpoints.drive_base
            ))
            .bearer_auth(&tokens.access_token)
            .query(&[("fields", "id")])
            .json(&CopyFileBody {
                name: new_name,
                parents: [dest_folder_id],
            })
            .send()
            .await?;
        let created: CreatedFile = check(response).await?.json().await?;
        info!(%source_id, new_file_id = %created.id, "provider: file copied");
        Ok(created.id)
    }

    async fn upload_file(
        &self,
        tokens: &TokenBundle,
        upload: FileUpload,
    ) -> Result<FileId, ProviderError> {
        let metadata = UploadMetadata {
            name: &upload.name,
            mime_type: &upload.mime_type,
            parents: upload.folder_id.as_deref().into_iter().collect(),
        };
        let boundary = format!("upload-{}", Uuid::new_v4().simple());
        let body = multipart_related_body(&boundary, &metadata, &upload.mime_type, &upload.bytes);

        let response = self
            .http
            .post(format!("{}/files", self.endpoints.upload_base))
            .bearer_auth(&tokens.access_token)
            .query(&[("uploadType", "multipart"), ("fields", "id")])
            .header(
                CONTENT_TYPE,
                format!("multipart/related; boundary={boundary}"),
            )
            .body(body)
            .send()
            .await?;
        let created: CreatedFile = check(response).await?.json().await?;
        info!(
            file_id = %created.id,
            size_bytes = upload.bytes.len(),
            "provider: file uploaded"
        );
        Ok(created.id)
    }

    async fn set_public_readable(
        &self,
        tokens: &TokenBundle,
        file_id: &FileId,
    ) -> Result<(), ProviderError> {
        let response = self
            .http
            .post(format!(
                "{}/files/{file_id}/permissions",
                self.endpoints.drive_base
            ))
            .bearer_auth(&tokens.access_token)
            .json(&PermissionBody {
                role: "reader",
                kind: "anyone",
            })
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }
}

fn escape_query_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

fn multipart_related_body(
    boundary: &str,
    metadata: &UploadMetadata<'_>,
    mime_type: &str,
    bytes: &[u8],
) -> Vec<u8> {
    // Serializing a struct of string slices cannot fail.
    let metadata_json = serde_json::to_string(metadata).unwrap_or_else(|_| "{}".to_string());
    let mut body = Vec::with_capacity(bytes.len() + metadata_json.len() + 256);
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata_json}\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("--{boundary}\r\nContent-Type: {mime_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

#[cfg(test)]
#[path = "tests/google_tests.rs"]
mod tests;
