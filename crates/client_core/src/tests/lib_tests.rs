use super::*;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Multipart, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use shared::{
    domain::{Element, RgbColor, Slide},
    protocol::PresentationQuery,
};
use tokio::net::TcpListener;

#[derive(Debug, Clone)]
struct Seen {
    path: &'static str,
    presentation_id: Option<String>,
    body: Value,
}

#[derive(Clone, Default)]
struct MockState {
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl MockState {
    fn record(&self, path: &'static str, presentation_id: Option<String>, body: Value) {
        self.seen.lock().expect("seen").push(Seen {
            path,
            presentation_id,
            body,
        });
    }

    fn seen(&self) -> Vec<Seen> {
        self.seen.lock().expect("seen").clone()
    }
}

type Reply = Result<Json<Value>, (StatusCode, Json<Value>)>;

fn authorized(headers: &HeaderMap) -> Result<(), (StatusCode, Json<Value>)> {
    let has_session = headers
        .get("cookie")
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.contains("deck_session=sess-1"));
    if has_session {
        Ok(())
    } else {
        Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Login Required" })),
        ))
    }
}

fn sample_document() -> Document {
    Document {
        slides: vec![Slide {
            slide_id: "s1".into(),
            background_color: RgbColor::WHITE,
            elements: vec![
                Element::Text {
                    id: "t1".into(),
                    text: "Hello\n".into(),
                    text_color: None,
                },
                Element::Image {
                    id: "i1".into(),
                    image: "https://content/i1".into(),
                },
            ],
        }],
    }
}

async fn slides(
    State(state): State<MockState>,
    headers: HeaderMap,
    Query(query): Query<PresentationQuery>,
) -> Reply {
    authorized(&headers)?;
    state.record("/slides", query.presentation_id.clone(), Value::Null);
    if query.presentation_id.as_deref() == Some("missing") {
        return Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Requested entity was not found." })),
        ));
    }
    Ok(Json(json!(sample_document())))
}

async fn update(
    State(state): State<MockState>,
    headers: HeaderMap,
    Query(query): Query<PresentationQuery>,
    Json(body): Json<Value>,
) -> Reply {
    authorized(&headers)?;
    state.record("/update", query.presentation_id, body);
    Ok(Json(json!({ "success": true })))
}

async fn upload(
    State(state): State<MockState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Reply {
    authorized(&headers)?;
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() != Some("image") {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(|_| {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "bad upload" })),
            )
        })?;
        state.record(
            "/upload-image",
            None,
            json!({ "fileName": file_name, "contentType": content_type, "len": bytes.len() }),
        );
        return Ok(Json(json!({ "imageUrl": "https://drive/uc?id=up1" })));
    }
    Err((
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "No image uploaded" })),
    ))
}

async fn background(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    authorized(&headers)?;
    state.record("/api/update-slide-background", None, body);
    Ok(Json(
        json!({ "success": true, "message": "Background updated for 3 slide(s)." }),
    ))
}

async fn templates(State(state): State<MockState>, headers: HeaderMap) -> Reply {
    authorized(&headers)?;
    state.record("/templates", None, Value::Null);
    Ok(Json(json!({
        "templates": [{ "id": "tpl1", "name": "Pitch", "thumbnailLink": "https://thumb/1" }]
    })))
}

async fn create(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    authorized(&headers)?;
    state.record("/create-presentation", None, body);
    Ok(Json(json!({
        "newPresentationId": "copy1",
        "redirectUrl": "/editor.html?presentationId=copy1"
    })))
}

async fn spawn_editor_server() -> anyhow::Result<(String, MockState)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = MockState::default();
    let app = Router::new()
        .route("/slides", get(slides))
        .route("/update", post(update))
        .route("/upload-image", post(upload))
        .route("/api/update-slide-background", post(background))
        .route("/templates", get(templates))
        .route("/create-presentation", post(create))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}/"), state))
}

fn api_exception(error: anyhow::Error) -> ApiException {
    error
        .downcast::<ApiException>()
        .expect("error should carry an ApiException")
}

#[tokio::test]
async fn load_document_sends_session_cookie() {
    let (url, state) = spawn_editor_server().await.expect("spawn server");
    let client = EditorClient::new(url).with_session("sess-1");

    let document = client
        .load_document(&"deck1".into())
        .await
        .expect("load document");

    assert_eq!(document, sample_document());
    let seen = state.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].presentation_id.as_deref(), Some("deck1"));
}

#[tokio::test]
async fn save_without_editable_content_makes_no_request() {
    let (url, state) = spawn_editor_server().await.expect("spawn server");
    let client = EditorClient::new(url).with_session("sess-1");
    let surface = RenderedSurface::render(&Document {
        slides: vec![Slide {
            slide_id: "s1".into(),
            background_color: RgbColor::WHITE,
            elements: vec![Element::Text {
                id: "blank".into(),
                text: "   ".into(),
                text_color: None,
            }],
        }],
    });

    let outcome = client
        .save(&"deck1".into(), &surface)
        .await
        .expect("save");

    assert_eq!(outcome, SaveOutcome::NothingToSave);
    assert!(state.seen().is_empty());
}

#[tokio::test]
async fn save_posts_collected_changes_then_reloads() {
    let (url, state) = spawn_editor_server().await.expect("spawn server");
    let client = EditorClient::new(url).with_session("sess-1");
    let mut surface = RenderedSurface::render(&sample_document());
    assert!(surface.set_text(&"t1".into(), " Hello world "));
    assert!(surface.substitute_image(&"i1".into(), "https://drive/uc?id=up1"));

    let outcome = client
        .save(&"deck1".into(), &surface)
        .await
        .expect("save");

    assert_eq!(
        outcome,
        SaveOutcome::Saved {
            document: sample_document()
        }
    );
    let seen = state.seen();
    assert_eq!(
        seen.iter().map(|s| s.path).collect::<Vec<_>>(),
        vec!["/update", "/slides"]
    );
    assert_eq!(seen[0].presentation_id.as_deref(), Some("deck1"));
    assert_eq!(
        seen[0].body,
        json!({
            "updates": [{ "objectId": "t1", "text": "Hello world" }],
            "images": [{ "objectId": "i1", "imageUrl": "https://drive/uc?id=up1" }]
        })
    );
}

#[tokio::test]
async fn missing_session_surfaces_login_required() {
    let (url, state) = spawn_editor_server().await.expect("spawn server");
    let client = EditorClient::new(url);

    let error = client
        .save(&"deck1".into(), &RenderedSurface::render(&sample_document()))
        .await
        .expect_err("save without session should fail");

    let error = api_exception(error);
    assert_eq!(error.code, ErrorCode::Unauthorized);
    assert_eq!(error.message, "Login Required");
    assert!(state.seen().is_empty());
}

#[tokio::test]
async fn not_found_keeps_server_message() {
    let (url, _state) = spawn_editor_server().await.expect("spawn server");
    let client = EditorClient::new(url).with_session("sess-1");

    let error = client
        .load_document(&"missing".into())
        .await
        .expect_err("missing deck");

    let error = api_exception(error);
    assert_eq!(error.code, ErrorCode::NotFound);
    assert_eq!(error.message, "Requested entity was not found.");
}

#[tokio::test]
async fn upload_image_sends_image_field() {
    let (url, state) = spawn_editor_server().await.expect("spawn server");
    let client = EditorClient::new(url).with_session("sess-1");

    let image_url = client
        .upload_image("photo.png", "image/png", vec![1, 2, 3, 4])
        .await
        .expect("upload");

    assert_eq!(image_url, "https://drive/uc?id=up1");
    assert_eq!(
        state.seen()[0].body,
        json!({ "fileName": "photo.png", "contentType": "image/png", "len": 4 })
    );
}

#[tokio::test]
async fn background_request_targets_whole_deck_when_no_slide_given() {
    let (url, state) = spawn_editor_server().await.expect("spawn server");
    let client = EditorClient::new(url).with_session("sess-1");

    let response = client
        .update_background(&"deck1".into(), None, "#ff0000")
        .await
        .expect("background");

    assert!(response.success);
    assert_eq!(response.message, "Background updated for 3 slide(s).");
    assert_eq!(
        state.seen()[0].body,
        json!({ "color": "#ff0000", "presentationId": "deck1" })
    );
}

#[tokio::test]
async fn templates_and_create_round_trip_through_server() {
    let (url, state) = spawn_editor_server().await.expect("spawn server");
    let client = EditorClient::new(url).with_session("sess-1");

    let templates = client.list_templates().await.expect("templates");
    assert_eq!(templates.len(), 1);
    assert_eq!(templates[0].id, FileId::from("tpl1"));
    assert_eq!(templates[0].thumbnail_link.as_deref(), Some("https://thumb/1"));

    let created = client
        .create_presentation(&templates[0].id)
        .await
        .expect("create");
    assert_eq!(created.new_presentation_id, PresentationId::from("copy1"));
    assert_eq!(created.redirect_url, "/editor.html?presentationId=copy1");
    assert_eq!(state.seen()[1].body, json!({ "templateId": "tpl1" }));
}

#[test]
fn status_codes_map_to_error_codes() {
    assert_eq!(error_code(StatusCode::BAD_REQUEST), ErrorCode::Validation);
    assert_eq!(error_code(StatusCode::PAYLOAD_TOO_LARGE), ErrorCode::Validation);
    assert_eq!(error_code(StatusCode::UNAUTHORIZED), ErrorCode::Unauthorized);
    assert_eq!(error_code(StatusCode::NOT_FOUND), ErrorCode::NotFound);
    assert_eq!(
        error_code(StatusCode::INTERNAL_SERVER_ERROR),
        ErrorCode::Upstream
    );
}
