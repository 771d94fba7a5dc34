use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::JsonRejection,
        DefaultBodyLimit, Multipart, Query, State,
    },
    http::{header, HeaderMap, StatusCode},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Duration;
use provider::{Authenticator, GoogleEndpoints, GoogleProvider, OAuthClient, OAuthConfig};
use serde::Deserialize;
use server_api::{
    apply_updates, background_change, create_presentation, fetch_projected_document,
    list_templates, require_presentation_id, update_background, upload_image, upstream,
    ApiContext, CompileOptions, Folders, ImageUpload,
};
use shared::{
    domain::Document,
    error::{ApiError, ErrorCode},
    protocol::{
        BackgroundRequest, BackgroundResponse, CreatePresentationRequest,
        CreatePresentationResponse, PresentationQuery, TemplatesResponse, UpdateRequest,
        UpdateResponse, UploadImageResponse,
    },
};
use storage::CredentialStore;
use tower_http::{limit::RequestBodyLimitLayer, services::ServeDir};
use tracing::{error, info, warn};
use uuid::Uuid;

mod config;
mod session;

use config::{load_settings, prepare_database_url};
use session::{
    clear_cookie, cookie_value, require_tokens, session_id, set_cookie, OAUTH_STATE_COOKIE,
    OAUTH_STATE_TTL_SECONDS, SESSION_COOKIE,
};

#[derive(Clone)]
struct AppState {
    api: ApiContext,
    sessions: CredentialStore,
    auth: Arc<dyn Authenticator>,
    session_ttl: Duration,
    secure_cookies: bool,
    public_dir: PathBuf,
    max_upload_bytes: usize,
}

#[derive(Debug, Deserialize)]
struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

type HttpError = (StatusCode, Json<ApiError>);

const IMAGE_FIELD: &str = "image";
const MAX_FILENAME_BYTES: usize = 180;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = load_settings();
    if settings.client_id.is_empty() {
        warn!("CLIENT_ID is not set; sign-in will be rejected by the provider");
    }
    let session_ttl = settings.session_ttl()?;
    let secure_cookies = settings.secure_cookies();
    let database_url = prepare_database_url(&settings.database_url)?;
    let sessions = CredentialStore::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;

    let api = ApiContext {
        provider: Arc::new(GoogleProvider::new(GoogleEndpoints::default())),
        folders: Folders {
            templates: settings.templates_folder_id,
            presentations: settings.presentations_folder_id,
            uploads: settings.uploads_folder_id,
        },
        compile: CompileOptions {
            default_font_size_pt: settings.default_font_size_pt,
            default_alignment: settings.default_alignment,
        },
    };
    let auth = OAuthClient::new(OAuthConfig::google(
        settings.client_id,
        settings.client_secret,
        settings.redirect_uri,
    ));

    let state = AppState {
        api,
        sessions,
        auth: Arc::new(auth),
        session_ttl,
        secure_cookies,
        public_dir: settings.public_dir,
        max_upload_bytes: settings.max_upload_bytes,
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    let public = ServeDir::new(&state.public_dir).append_index_html_on_directories(true);
    let max_upload_bytes = state.max_upload_bytes;
    Router::new()
        .route("/healthz", get(healthz))
        .route("/auth", get(auth_start))
        .route("/auth/callback", get(auth_callback))
        .route("/logout", post(logout))
        .route("/slides", get(http_get_slides))
        .route("/update", post(http_update))
        .route("/api/update-slide-background", post(http_update_background))
        .route("/upload-image", post(http_upload_image))
        .route("/templates", get(http_list_templates))
        .route("/create-presentation", post(http_create_presentation))
        .fallback_service(public)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload_bytes))
        .with_state(state)
}

fn reject(err: ApiError) -> HttpError {
    let status = match err.code {
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Upstream | ErrorCode::Internal => {
            warn!(code = ?err.code, message = %err.message, "request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(err))
}

fn internal(err: anyhow::Error) -> HttpError {
    reject(ApiError::new(ErrorCode::Internal, err.to_string()))
}

fn bad_body(rejection: JsonRejection) -> HttpError {
    reject(ApiError::validation(rejection.body_text()))
}

fn bad_multipart(err: MultipartError) -> HttpError {
    (err.status(), Json(ApiError::validation(err.body_text())))
}

async fn healthz(State(state): State<Arc<AppState>>) -> Result<&'static str, HttpError> {
    state.sessions.health_check().await.map_err(internal)?;
    Ok("ok")
}

async fn auth_start(State(state): State<Arc<AppState>>) -> Result<Response, HttpError> {
    let csrf_state = Uuid::new_v4().simple().to_string();
    let url = state
        .auth
        .authorize_url(&csrf_state)
        .map_err(|e| reject(upstream(e)))?;
    Ok((
        AppendHeaders([(
            header::SET_COOKIE,
            set_cookie(
                OAUTH_STATE_COOKIE,
                &csrf_state,
                OAUTH_STATE_TTL_SECONDS,
                state.secure_cookies,
            ),
        )]),
        Redirect::to(&url),
    )
        .into_response())
}

async fn auth_callback(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(q): Query<CallbackQuery>,
) -> Result<Response, HttpError> {
    if let Some(denied) = q.error {
        return Err(reject(ApiError::validation(format!(
            "Authorization failed: {denied}"
        ))));
    }
    let expected = cookie_value(&headers, OAUTH_STATE_COOKIE);
    if expected.is_none() || expected != q.state {
        warn!("oauth callback state mismatch");
        return Err(reject(ApiError::validation("Invalid OAuth state")));
    }
    let code = q
        .code
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| reject(ApiError::validation("Missing authorization code")))?;

    let tokens = state.auth.exchange_code(&code).await.map_err(|e| {
        error!(error = %e, "authorization code exchange failed");
        reject(ApiError::new(ErrorCode::Upstream, e.to_string()))
    })?;
    let session_id = state
        .sessions
        .create_session(&tokens, state.session_ttl)
        .await
        .map_err(internal)?;
    info!(%session_id, "session started");

    Ok((
        AppendHeaders([
            (
                header::SET_COOKIE,
                set_cookie(
                    SESSION_COOKIE,
                    session_id.as_str(),
                    state.session_ttl.num_seconds(),
                    state.secure_cookies,
                ),
            ),
            (header::SET_COOKIE, clear_cookie(OAUTH_STATE_COOKIE, state.secure_cookies)),
        ]),
        Redirect::to("/templates.html"),
    )
        .into_response())
}

async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, HttpError> {
    if let Some(session_id) = session_id(&headers) {
        let removed = state.sessions.clear(&session_id).await.map_err(internal)?;
        info!(%session_id, removed, "session cleared");
    }
    Ok((
        StatusCode::NO_CONTENT,
        AppendHeaders([(header::SET_COOKIE, clear_cookie(SESSION_COOKIE, state.secure_cookies))]),
    ))
}

async fn http_get_slides(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(q): Query<PresentationQuery>,
) -> Result<Json<Document>, HttpError> {
    let presentation_id = require_presentation_id(q.presentation_id).map_err(reject)?;
    let tokens = require_tokens(&state.sessions, &headers)
        .await
        .map_err(reject)?;
    let document = fetch_projected_document(&state.api, &tokens, &presentation_id)
        .await
        .map_err(reject)?;
    Ok(Json(document))
}

async fn http_update(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(q): Query<PresentationQuery>,
    body: Result<Json<UpdateRequest>, JsonRejection>,
) -> Result<Json<UpdateResponse>, HttpError> {
    let tokens = require_tokens(&state.sessions, &headers)
        .await
        .map_err(reject)?;
    let presentation_id = require_presentation_id(q.presentation_id).map_err(reject)?;
    let Json(request) = body.map_err(bad_body)?;
    let response = apply_updates(&state.api, &tokens, &presentation_id, request)
        .await
        .map_err(reject)?;
    Ok(Json(response))
}

async fn http_update_background(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<BackgroundRequest>, JsonRejection>,
) -> Result<Json<BackgroundResponse>, HttpError> {
    let Json(request) = body.map_err(bad_body)?;
    let (presentation_id, change) = background_change(request).map_err(reject)?;
    let tokens = require_tokens(&state.sessions, &headers)
        .await
        .map_err(reject)?;
    let response = update_background(&state.api, &tokens, &presentation_id, change)
        .await
        .map_err(reject)?;
    Ok(Json(response))
}

async fn http_upload_image(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadImageResponse>, HttpError> {
    let tokens = require_tokens(&state.sessions, &headers)
        .await
        .map_err(reject)?;
    let mut multipart =
        multipart.map_err(|e| reject(ApiError::validation(e.body_text())))?;

    let mut image = None;
    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let file_name = sanitize_file_name(field.file_name());
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(bad_multipart)?;
        image = Some(ImageUpload {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
        break;
    }
    let image = image.ok_or_else(|| reject(ApiError::validation("No image uploaded")))?;
    if image.bytes.len() > state.max_upload_bytes {
        return Err((
            StatusCode::PAYLOAD_TOO_LARGE,
            Json(ApiError::validation(format!(
                "image exceeds {} bytes",
                state.max_upload_bytes
            ))),
        ));
    }

    let response = upload_image(&state.api, &tokens, image)
        .await
        .map_err(reject)?;
    Ok(Json(response))
}

async fn http_list_templates(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<TemplatesResponse>, HttpError> {
    let tokens = require_tokens(&state.sessions, &headers)
        .await
        .map_err(reject)?;
    let templates = list_templates(&state.api, &tokens)
        .await
        .map_err(reject)?;
    Ok(Json(TemplatesResponse { templates }))
}

async fn http_create_presentation(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<CreatePresentationRequest>, JsonRejection>,
) -> Result<Json<CreatePresentationResponse>, HttpError> {
    let tokens = require_tokens(&state.sessions, &headers)
        .await
        .map_err(reject)?;
    let Json(request) = body.map_err(bad_body)?;
    let response = create_presentation(&state.api, &tokens, request)
        .await
        .map_err(reject)?;
    Ok(Json(response))
}

/// Final path component of a client-supplied file name, capped in length.
fn sanitize_file_name(raw: Option<&str>) -> String {
    let name = raw
        .and_then(|raw| raw.rsplit(['/', '\\']).next())
        .map(str::trim)
        .unwrap_or_default();
    if name.is_empty() {
        return IMAGE_FIELD.to_string();
    }
    let mut end = name.len().min(MAX_FILENAME_BYTES);
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    name[..end].to_string()
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
