//! Feedback collection sessions.
//!
//! A [`SessionController`] hands a [`FeedbackRequest`] to an
//! [`InteractionSurface`] and blocks until the human submits, cancels, or
//! the request's timeout elapses. The surface and the blocked caller meet in
//! a single-slot [`Bridge`]; images flow through an [`ImagePipeline`] that
//! only ever holds decodable images.
//!
//! # Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use feedback_core::{FeedbackRequest, ScriptStep, ScriptedSurface, SessionController};
//!
//! let surface = ScriptedSurface::new(vec![ScriptStep::Submit("Looks good".into())]);
//! let controller = SessionController::new(Arc::new(surface));
//! let result = controller
//!     .run(FeedbackRequest::new("Implemented feature X", Duration::from_secs(30)))
//!     .unwrap();
//! assert_eq!(result.text.as_deref(), Some("Looks good"));
//! ```

mod assembler;
mod bridge;
mod config;
mod error;
mod images;
mod model;
mod scripted;
mod session;
mod surface;

pub use assembler::{assemble, check_submission};
pub use bridge::{Bridge, WaitOutcome};
pub use config::{
    APP_DIR_NAME, BIND_ENV_VAR, DEFAULT_TIMEOUT_SECS, FeedbackConfig, LoggingConfig,
    OPEN_BROWSER_ENV_VAR, SurfaceConfig, TIMEOUT_ENV_VAR,
};
pub use error::{
    ConfigError, ImageInfoError, IngestError, SessionError, SubmitError, ValidationEmpty,
};
pub use images::{
    CapturedImage, ClipboardCapture, FileSelector, ImageInfo, ImagePipeline, IngestReport,
    SystemClipboard, describe_image,
};
pub use model::{
    FeedbackRequest, FeedbackResult, ImageAttachment, ImageSource, Outcome, SessionMode,
    SessionState, format_name,
};
pub use scripted::{ScriptStep, ScriptedSurface};
pub use session::SessionController;
pub use surface::{InteractionSurface, SessionHandle, SurfaceGuard, spawn_surface_thread};
