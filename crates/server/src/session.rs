use axum::http::{header, HeaderMap};
use chrono::Utc;
use shared::{
    domain::{SessionId, TokenBundle},
    error::{ApiError, ErrorCode},
};
use storage::CredentialStore;
use tracing::{info, warn};

pub const SESSION_COOKIE: &str = "deck_session";
pub const OAUTH_STATE_COOKIE: &str = "deck_oauth_state";
pub const OAUTH_STATE_TTL_SECONDS: i64 = 600;

/// Value of cookie `name` across every `Cookie` header of the request.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn set_cookie(name: &str, value: &str, max_age_seconds: i64, secure: bool) -> String {
    let mut cookie =
        format!("{name}={value}; HttpOnly; Path=/; SameSite=Lax; Max-Age={max_age_seconds}");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn clear_cookie(name: &str, secure: bool) -> String {
    set_cookie(name, "", 0, secure)
}

pub fn session_id(headers: &HeaderMap) -> Option<SessionId> {
    cookie_value(headers, SESSION_COOKIE).map(SessionId)
}

/// Resolves the caller's token bundle, failing fast with "Login Required".
///
/// A bundle whose access token has expired counts as absent and its
/// session is dropped.
pub async fn require_tokens(
    store: &CredentialStore,
    headers: &HeaderMap,
) -> Result<TokenBundle, ApiError> {
    let session_id = session_id(headers).ok_or_else(ApiError::login_required)?;
    let session = store
        .get(&session_id)
        .await
        .map_err(|e| ApiError::new(ErrorCode::Internal, e.to_string()))?
        .ok_or_else(ApiError::login_required)?;

    if session.tokens.is_expired_at(Utc::now()) {
        info!(%session_id, "access token expired; clearing session");
        if let Err(error) = store.clear(&session_id).await {
            warn!(%session_id, %error, "failed to clear expired session");
        }
        return Err(ApiError::login_required());
    }
    Ok(session.tokens)
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
