//! Request handlers for the surface API.

use std::path::PathBuf;
use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use feedback_core::{
    ClipboardCapture, ImageAttachment, ImagePipeline, ImageSource, IngestError, SessionHandle,
    SessionMode, format_name,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::{ApiResult, ErrorDetail, SurfaceApiError};
use crate::page::render_page;

/// Shared state of the surface router.
#[derive(Clone)]
pub(crate) struct SurfaceState {
    pub session: SessionHandle,
    pub clipboard: Arc<dyn ClipboardCapture>,
}

/// One attachment as shown to the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageView {
    pub index: usize,
    pub source: String,
    pub format: String,
    pub mime_type: String,
    pub width: u32,
    pub height: u32,
    pub size: usize,
}

impl ImageView {
    fn new(index: usize, attachment: &ImageAttachment) -> Self {
        Self {
            index,
            source: attachment.source().to_string(),
            format: format_name(attachment.format()).to_string(),
            mime_type: attachment.mime_type().to_string(),
            width: attachment.width(),
            height: attachment.height(),
            size: attachment.size(),
        }
    }
}

fn image_views(pipeline: &ImagePipeline) -> Vec<ImageView> {
    pipeline
        .iter()
        .enumerate()
        .map(|(index, attachment)| ImageView::new(index, attachment))
        .collect()
}

/// The session as shown to the page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionView {
    pub id: Uuid,
    pub mode: SessionMode,
    pub work_summary: String,
    pub timeout_secs: u64,
    pub open: bool,
    pub images: Vec<ImageView>,
}

/// Result of a multi-file add.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReportView {
    pub added: usize,
    pub errors: Vec<ErrorDetail>,
    pub images: Vec<ImageView>,
}

fn ensure_open(session: &SessionHandle) -> ApiResult<()> {
    if session.is_open() {
        Ok(())
    } else {
        Err(SurfaceApiError::Closed)
    }
}

pub(crate) async fn index(State(state): State<SurfaceState>) -> Html<String> {
    Html(render_page(state.session.id(), state.session.request()))
}

pub(crate) async fn get_session(State(state): State<SurfaceState>) -> Json<SessionView> {
    let session = &state.session;
    let request = session.request();
    Json(SessionView {
        id: session.id(),
        mode: request.mode,
        work_summary: request.work_summary.clone(),
        timeout_secs: request.timeout.as_secs(),
        open: session.is_open(),
        images: image_views(&session.pipeline()),
    })
}

#[derive(Debug, Deserialize)]
pub(crate) struct UploadQuery {
    name: Option<String>,
}

pub(crate) async fn upload_image(
    State(state): State<SurfaceState>,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<ImageView>)> {
    ensure_open(&state.session)?;
    let name = query
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "upload".to_string());

    let mut pipeline = state.session.pipeline();
    let index = pipeline.len();
    let attachment = pipeline.add_from_bytes(body.to_vec(), ImageSource::File(name))?;
    Ok((StatusCode::CREATED, Json(ImageView::new(index, attachment))))
}

#[derive(Debug, Deserialize)]
pub(crate) struct PathsRequest {
    paths: Vec<PathBuf>,
}

pub(crate) async fn add_paths(
    State(state): State<SurfaceState>,
    Json(request): Json<PathsRequest>,
) -> ApiResult<Json<IngestReportView>> {
    ensure_open(&state.session)?;
    let paths = request.paths;
    let selector = move || -> Vec<PathBuf> { paths.clone() };

    let mut pipeline = state.session.pipeline();
    let report = pipeline.add_selected(&selector);
    Ok(Json(IngestReportView {
        added: report.added,
        errors: report.errors.iter().map(ErrorDetail::from_ingest).collect(),
        images: image_views(&pipeline),
    }))
}

pub(crate) async fn capture_clipboard(
    State(state): State<SurfaceState>,
) -> ApiResult<(StatusCode, Json<ImageView>)> {
    ensure_open(&state.session)?;
    let session = state.session.clone();
    let clipboard = Arc::clone(&state.clipboard);

    // Clipboard access can block on the display server.
    let view = tokio::task::spawn_blocking(move || -> ApiResult<ImageView> {
        let mut pipeline = session.pipeline();
        let index = pipeline.len();
        let attachment = pipeline.add_from_capture(clipboard.as_ref())?;
        Ok(ImageView::new(index, attachment))
    })
    .await
    .map_err(|e| SurfaceApiError::Internal(format!("clipboard task failed: {e}")))??;

    Ok((StatusCode::CREATED, Json(view)))
}

pub(crate) async fn get_image(
    State(state): State<SurfaceState>,
    Path(index): Path<usize>,
) -> ApiResult<Response> {
    let pipeline = state.session.pipeline();
    let attachment = pipeline.get(index).ok_or(IngestError::IndexOutOfRange {
        index,
        len: pipeline.len(),
    })?;
    Ok((
        [(header::CONTENT_TYPE, attachment.mime_type())],
        attachment.bytes().to_vec(),
    )
        .into_response())
}

pub(crate) async fn remove_image(
    State(state): State<SurfaceState>,
    Path(index): Path<usize>,
) -> ApiResult<Json<Vec<ImageView>>> {
    ensure_open(&state.session)?;
    let mut pipeline = state.session.pipeline();
    pipeline.remove_at(index)?;
    Ok(Json(image_views(&pipeline)))
}

pub(crate) async fn clear_images(
    State(state): State<SurfaceState>,
) -> ApiResult<Json<Vec<ImageView>>> {
    ensure_open(&state.session)?;
    let mut pipeline = state.session.pipeline();
    pipeline.clear();
    Ok(Json(image_views(&pipeline)))
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitRequest {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct StatusResponse {
    status: &'static str,
}

pub(crate) async fn submit(
    State(state): State<SurfaceState>,
    Json(request): Json<SubmitRequest>,
) -> ApiResult<Json<StatusResponse>> {
    state.session.submit(&request.text)?;
    Ok(Json(StatusResponse {
        status: "submitted",
    }))
}

#[derive(Debug, Deserialize)]
pub(crate) struct CancelRequest {
    #[serde(default)]
    reason: Option<String>,
}

pub(crate) async fn cancel(
    State(state): State<SurfaceState>,
    Json(request): Json<CancelRequest>,
) -> ApiResult<Json<StatusResponse>> {
    let reason = request
        .reason
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty());
    if !state.session.cancel(reason) {
        return Err(SurfaceApiError::Closed);
    }
    info!(session_id = %state.session.id(), "Cancelled from the feedback page");
    Ok(Json(StatusResponse {
        status: "cancelled",
    }))
}
