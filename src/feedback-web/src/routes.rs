//! Router for one session's surface.

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use feedback_core::{ClipboardCapture, SessionHandle};
use tower_http::trace::TraceLayer;

use crate::handlers::{self, SurfaceState};

/// Build the router serving `session`.
///
/// Request bodies larger than `max_upload_bytes` are answered with 413.
pub fn router(
    session: SessionHandle,
    clipboard: Arc<dyn ClipboardCapture>,
    max_upload_bytes: usize,
) -> Router {
    let state = SurfaceState { session, clipboard };

    Router::new()
        .route("/", get(handlers::index))
        .route("/api/session", get(handlers::get_session))
        // Images
        .route(
            "/api/images",
            post(handlers::upload_image).delete(handlers::clear_images),
        )
        .route("/api/images/paths", post(handlers::add_paths))
        .route("/api/images/clipboard", post(handlers::capture_clipboard))
        .route(
            "/api/images/{index}",
            get(handlers::get_image).delete(handlers::remove_image),
        )
        // Terminal actions
        .route("/api/submit", post(handlers::submit))
        .route("/api/cancel", post(handlers::cancel))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
