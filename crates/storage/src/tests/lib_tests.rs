use super::*;

async fn memory_store() -> CredentialStore {
    CredentialStore::new("sqlite::memory:").await.expect("db")
}

fn sample_tokens() -> TokenBundle {
    TokenBundle {
        access_token: "ya29.access".into(),
        refresh_token: Some("1//refresh".into()),
        token_type: Some("Bearer".into()),
        scope: Some("https://www.googleapis.com/auth/presentations".into()),
        expires_at: None,
    }
}

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    let store = memory_store().await;
    store.health_check().await.expect("health check");
}

#[tokio::test]
async fn created_session_reads_back_its_tokens() {
    let store = memory_store().await;
    let session_id = store
        .create_session(&sample_tokens(), Duration::hours(1))
        .await
        .expect("create");

    let session = store.get(&session_id).await.expect("get").expect("session");
    assert_eq!(session.session_id, session_id);
    assert_eq!(session.tokens, sample_tokens());
    assert!(session.expires_at > session.created_at);
}

#[tokio::test]
async fn session_ids_are_unique() {
    let store = memory_store().await;
    let a = store
        .create_session(&sample_tokens(), Duration::hours(1))
        .await
        .expect("a");
    let b = store
        .create_session(&sample_tokens(), Duration::hours(1))
        .await
        .expect("b");
    assert_ne!(a, b);
}

#[tokio::test]
async fn set_replaces_existing_tokens() {
    let store = memory_store().await;
    let session_id = SessionId::from("fixed-session");
    store
        .set(&session_id, &sample_tokens(), Utc::now() + Duration::hours(1))
        .await
        .expect("set");

    let rotated = TokenBundle::bearer("ya29.rotated");
    store
        .set(&session_id, &rotated, Utc::now() + Duration::hours(1))
        .await
        .expect("set again");

    let session = store.get(&session_id).await.expect("get").expect("session");
    assert_eq!(session.tokens.access_token, "ya29.rotated");
}

#[tokio::test]
async fn expired_session_reads_as_absent() {
    let store = memory_store().await;
    let session_id = store
        .create_session(&sample_tokens(), Duration::minutes(5))
        .await
        .expect("create");

    let later = Utc::now() + Duration::minutes(10);
    assert!(store
        .get_at(&session_id, later)
        .await
        .expect("get")
        .is_none());
    assert!(store.get(&session_id).await.expect("get").is_some());
}

#[tokio::test]
async fn clear_removes_session() {
    let store = memory_store().await;
    let session_id = store
        .create_session(&sample_tokens(), Duration::hours(1))
        .await
        .expect("create");

    assert!(store.clear(&session_id).await.expect("clear"));
    assert!(!store.clear(&session_id).await.expect("clear twice"));
    assert!(store.get(&session_id).await.expect("get").is_none());
}

#[tokio::test]
async fn purge_expired_only_removes_stale_rows() {
    let store = memory_store().await;
    let short = store
        .create_session(&sample_tokens(), Duration::minutes(1))
        .await
        .expect("short");
    let long = store
        .create_session(&sample_tokens(), Duration::days(1))
        .await
        .expect("long");

    let removed = store
        .purge_expired(Utc::now() + Duration::hours(1))
        .await
        .expect("purge");
    assert_eq!(removed, 1);
    assert!(store.get(&short).await.expect("get").is_none());
    assert!(store.get(&long).await.expect("get").is_some());
}

#[tokio::test]
async fn unknown_session_is_absent() {
    let store = memory_store().await;
    assert!(store
        .get(&SessionId::from("missing"))
        .await
        .expect("get")
        .is_none());
}

#[tokio::test]
async fn creates_database_file_when_missing() {
    let suffix = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let temp_root = std::env::temp_dir().join(format!("slide_editor_storage_test_{suffix}"));
    let db_path = temp_root.join("nested").join("sessions.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let store = CredentialStore::new(&database_url).await.expect("db");
    drop(store);

    assert!(
        db_path.exists(),
        "database file should exist: {}",
        db_path.display()
    );

    std::fs::remove_dir_all(temp_root).expect("cleanup");
}
