//! Surface API driven through the router without sockets.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::{Method, Request, StatusCode, header};
use feedback_core::{
    CapturedImage, ClipboardCapture, FeedbackRequest, IngestError, SessionHandle,
};
use feedback_web::router;
use image::{ImageFormat, RgbaImage};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tower::ServiceExt;

const LIMIT: usize = 1024 * 1024;

fn png(width: u32, height: u32) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    RgbaImage::new(width, height)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

fn empty_clipboard() -> Arc<dyn ClipboardCapture> {
    Arc::new(|| -> Result<Option<CapturedImage>, IngestError> { Ok(None) })
}

fn setup(summary: &str, clipboard: Arc<dyn ClipboardCapture>, limit: usize) -> (SessionHandle, Router) {
    let session = SessionHandle::new(FeedbackRequest::new(summary, Duration::from_secs(30)));
    let app = router(session.clone(), clipboard, limit);
    (session, app)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Bytes) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body)
}

async fn send_json(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = match body {
        Some(body) => Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };
    let (status, bytes) = send(app, request).await;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn upload(app: &Router, name: &str, bytes: Vec<u8>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri(format!("/api/images?name={name}"))
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .body(Body::from(bytes))
        .unwrap();
    let (status, bytes) = send(app, request).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn page_shows_escaped_summary() {
    let (_session, app) = setup("Implemented <b>X</b>", empty_clipboard(), LIMIT);

    let (status, body) = send(
        &app,
        Request::builder().uri("/").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let html = String::from_utf8(body.to_vec()).unwrap();
    assert!(html.contains("Implemented &lt;b&gt;X&lt;/b&gt;"));
}

#[tokio::test]
async fn session_view_describes_request() {
    let (session, app) = setup("Implemented feature X", empty_clipboard(), LIMIT);

    let (status, view) = send_json(&app, Method::GET, "/api/session", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["id"], json!(session.id().to_string()));
    assert_eq!(view["mode"], "feedback");
    assert_eq!(view["work_summary"], "Implemented feature X");
    assert_eq!(view["timeout_secs"], 30);
    assert_eq!(view["open"], true);
    assert_eq!(view["images"], json!([]));
}

#[tokio::test]
async fn upload_then_fetch_and_remove() {
    let (session, app) = setup("", empty_clipboard(), LIMIT);
    let bytes = png(4, 2);

    let (status, image) = upload(&app, "shot.png", bytes.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(image["index"], 0);
    assert_eq!(image["source"], "file:shot.png");
    assert_eq!(image["format"], "PNG");
    assert_eq!(image["mime_type"], "image/png");
    assert_eq!(image["width"], 4);
    assert_eq!(image["height"], 2);

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/api/images/0").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    let served = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(served.to_vec(), bytes);

    let (status, remaining) = send_json(&app, Method::DELETE, "/api/images/0", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(remaining, json!([]));
    assert!(session.pipeline().is_empty());
}

#[tokio::test]
async fn undecodable_upload_is_rejected() {
    let (session, app) = setup("", empty_clipboard(), LIMIT);

    let (status, body) = upload(&app, "notes.txt", b"plain text".to_vec()).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "decode_error");
    assert!(
        body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("file:notes.txt")
    );
    assert!(session.pipeline().is_empty());
    assert!(session.is_open());
}

#[tokio::test]
async fn oversized_upload_is_refused() {
    let (session, app) = setup("", empty_clipboard(), 16);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/images?name=big.png")
        .body(Body::from(png(8, 8)))
        .unwrap();
    let (status, _) = send(&app, request).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(session.pipeline().is_empty());
}

#[tokio::test]
async fn missing_index_is_not_found() {
    let (_session, app) = setup("", empty_clipboard(), LIMIT);

    let (status, body) = send_json(&app, Method::GET, "/api/images/3", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "index_out_of_range");

    let (status, _) = send_json(&app, Method::DELETE, "/api/images/3", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn clipboard_capture() {
    let (_session, app) = setup("", empty_clipboard(), LIMIT);
    let (status, body) = send_json(&app, Method::POST, "/api/images/clipboard", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "clipboard_empty");

    let pixels: Arc<dyn ClipboardCapture> =
        Arc::new(|| -> Result<Option<CapturedImage>, IngestError> {
            Ok(Some(CapturedImage::Rgba {
                width: 2,
                height: 1,
                pixels: vec![255, 0, 0, 255, 0, 255, 0, 255],
            }))
        });
    let (session, app) = setup("", pixels, LIMIT);
    let (status, body) = send_json(&app, Method::POST, "/api/images/clipboard", None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["source"], "clipboard");
    assert_eq!(body["format"], "PNG");
    assert_eq!(session.pipeline().len(), 1);
}

#[tokio::test]
async fn unavailable_clipboard_is_service_unavailable() {
    let broken: Arc<dyn ClipboardCapture> =
        Arc::new(|| -> Result<Option<CapturedImage>, IngestError> {
            Err(IngestError::ClipboardUnavailable("no display".to_string()))
        });
    let (_session, app) = setup("", broken, LIMIT);

    let (status, body) = send_json(&app, Method::POST, "/api/images/clipboard", None).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "clipboard_unavailable");
}

#[tokio::test]
async fn add_paths_reports_each_file() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("good.png");
    let bad = dir.path().join("bad.txt");
    std::fs::write(&good, png(1, 1)).unwrap();
    std::fs::write(&bad, "nope").unwrap();
    let missing = dir.path().join("missing.png");

    let (session, app) = setup("", empty_clipboard(), LIMIT);
    let (status, report) = send_json(
        &app,
        Method::POST,
        "/api/images/paths",
        Some(json!({ "paths": [good, bad, missing] })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["added"], 1);
    assert_eq!(report["errors"][0]["code"], "decode_error");
    assert_eq!(report["errors"][1]["code"], "read_error");
    assert_eq!(report["images"][0]["source"], "file:good.png");
    assert_eq!(session.pipeline().len(), 1);
}

#[tokio::test]
async fn clear_removes_everything() {
    let (session, app) = setup("", empty_clipboard(), LIMIT);
    upload(&app, "a.png", png(1, 1)).await;
    upload(&app, "b.png", png(1, 1)).await;

    let (status, remaining) = send_json(&app, Method::DELETE, "/api/images", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(remaining, json!([]));
    assert!(session.pipeline().is_empty());
}

#[tokio::test]
async fn empty_submit_keeps_session_open() {
    let (session, app) = setup("", empty_clipboard(), LIMIT);

    let (status, body) =
        send_json(&app, Method::POST, "/api/submit", Some(json!({ "text": "  " }))).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "validation_empty");
    assert!(session.is_open());
}

#[tokio::test]
async fn pick_image_submit_needs_exactly_one_image() {
    let session = SessionHandle::new(FeedbackRequest::pick_image(Duration::from_secs(30)));
    let app = router(session.clone(), empty_clipboard(), LIMIT);

    let (status, body) =
        send_json(&app, Method::POST, "/api/submit", Some(json!({ "text": "just text" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "image_count");
    assert!(session.is_open());

    upload(&app, "a.png", png(1, 1)).await;
    upload(&app, "b.png", png(2, 2)).await;
    let (status, body) =
        send_json(&app, Method::POST, "/api/submit", Some(json!({ "text": "" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["message"], "Select exactly one image (2 attached)");
    assert!(session.is_open());

    let (status, _) = send_json(&app, Method::DELETE, "/api/images/0", None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) =
        send_json(&app, Method::POST, "/api/submit", Some(json!({ "text": "" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "submitted");
    assert!(!session.is_open());
}

#[tokio::test]
async fn submit_closes_session() {
    let (session, app) = setup("", empty_clipboard(), LIMIT);

    let (status, body) =
        send_json(&app, Method::POST, "/api/submit", Some(json!({ "text": "Looks good" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "submitted");
    assert!(!session.is_open());

    let (status, body) = upload(&app, "late.png", png(1, 1)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "session_closed");

    let (status, _) =
        send_json(&app, Method::POST, "/api/submit", Some(json!({ "text": "again" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, view) = send_json(&app, Method::GET, "/api/session", None).await;
    assert_eq!(view["open"], false);
}

#[tokio::test]
async fn cancel_only_once() {
    let (session, app) = setup("", empty_clipboard(), LIMIT);

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/cancel",
        Some(json!({ "reason": "wrong branch" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "cancelled");
    assert!(!session.is_open());

    let (status, _) = send_json(&app, Method::POST, "/api/cancel", Some(json!({}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
}
