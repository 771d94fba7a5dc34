use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use chrono::Duration;
use server_api::{DEFAULT_ALIGNMENT, DEFAULT_FONT_SIZE_PT};
use shared::change::Alignment;
use tracing::warn;

#[derive(Debug)]
pub struct Settings {
    pub server_bind: String,
    pub database_url: String,
    pub public_dir: PathBuf,
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub templates_folder_id: String,
    pub presentations_folder_id: String,
    pub uploads_folder_id: Option<String>,
    pub session_ttl_seconds: i64,
    pub max_upload_bytes: usize,
    pub default_font_size_pt: f64,
    pub default_alignment: Alignment,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:3000".into(),
            database_url: "sqlite://./data/sessions.db".into(),
            public_dir: PathBuf::from("public"),
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: "http://localhost:3000/auth/callback".into(),
            templates_folder_id: String::new(),
            presentations_folder_id: String::new(),
            uploads_folder_id: None,
            session_ttl_seconds: 7 * 24 * 3600,
            max_upload_bytes: 10 * 1024 * 1024,
            default_font_size_pt: DEFAULT_FONT_SIZE_PT,
            default_alignment: DEFAULT_ALIGNMENT,
        }
    }
}

impl Settings {
    /// Session lifetime, rejecting values that do not fit a positive duration.
    pub fn session_ttl(&self) -> anyhow::Result<Duration> {
        Duration::try_seconds(self.session_ttl_seconds)
            .filter(|ttl| *ttl > Duration::zero())
            .with_context(|| {
                format!(
                    "session_ttl_seconds must be a positive number of seconds, got {}",
                    self.session_ttl_seconds
                )
            })
    }

    /// Cookies carry `Secure` whenever the app is reached over https.
    pub fn secure_cookies(&self) -> bool {
        self.redirect_uri
            .trim()
            .to_ascii_lowercase()
            .starts_with("https://")
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("server.toml") {
        match toml::from_str::<HashMap<String, String>>(&raw) {
            Ok(file_cfg) => apply_overrides(&mut settings, |key| file_cfg.get(key).cloned()),
            Err(error) => warn!(%error, "ignoring malformed server.toml"),
        }
    }

    apply_overrides(&mut settings, |key| std::env::var(env_key(key)).ok());
    apply_overrides(&mut settings, |key| {
        std::env::var(format!("APP__{}", key.to_ascii_uppercase())).ok()
    });

    settings
}

/// Plain environment names, as the deployment `.env` files spell them.
fn env_key(key: &str) -> String {
    match key {
        "bind_addr" => "SERVER_BIND".to_string(),
        "uploads_folder_id" => "DRIVE_FOLDER_ID".to_string(),
        other => other.to_ascii_uppercase(),
    }
}

/// Overlays every recognised key that `lookup` yields onto `settings`.
/// Unparseable numbers keep the previous value.
fn apply_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("bind_addr") {
        settings.server_bind = v;
    }
    if let Some(v) = lookup("database_url") {
        settings.database_url = v;
    }
    if let Some(v) = lookup("public_dir") {
        settings.public_dir = PathBuf::from(v);
    }
    if let Some(v) = lookup("client_id") {
        settings.client_id = v;
    }
    if let Some(v) = lookup("client_secret") {
        settings.client_secret = v;
    }
    if let Some(v) = lookup("redirect_uri") {
        settings.redirect_uri = v;
    }
    if let Some(v) = lookup("templates_folder_id") {
        settings.templates_folder_id = v;
    }
    if let Some(v) = lookup("presentations_folder_id") {
        settings.presentations_folder_id = v;
    }
    if let Some(v) = lookup("uploads_folder_id") {
        settings.uploads_folder_id = Some(v).filter(|id| !id.trim().is_empty());
    }
    if let Some(v) = lookup("session_ttl_seconds") {
        if let Ok(parsed) = v.parse::<i64>() {
            settings.session_ttl_seconds = parsed;
        }
    }
    if let Some(v) = lookup("max_upload_bytes") {
        if let Ok(parsed) = v.parse::<usize>() {
            settings.max_upload_bytes = parsed;
        }
    }
    if let Some(v) = lookup("default_font_size") {
        if let Ok(parsed) = v.parse::<f64>() {
            settings.default_font_size_pt = parsed;
        }
    }
    if let Some(v) = lookup("default_alignment") {
        match v.parse::<Alignment>() {
            Ok(parsed) => settings.default_alignment = parsed,
            Err(error) => warn!(%error, "ignoring default_alignment override"),
        }
    }
}

pub fn prepare_database_url(raw_database_url: &str) -> anyhow::Result<String> {
    let database_url = normalize_database_url(raw_database_url);
    ensure_parent_dir_exists(&database_url)?;
    Ok(database_url)
}

fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        let path = path.replace('\\', "/");
        return format!("sqlite://{path}");
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

fn ensure_parent_dir_exists(database_url: &str) -> anyhow::Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
