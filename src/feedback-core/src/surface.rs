//! Contract between the session controller and a human-facing surface.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use parking_lot::{Mutex, MutexGuard};
use tracing::{error, info};
use uuid::Uuid;

use crate::assembler::assemble;
use crate::bridge::{Bridge, WaitOutcome};
use crate::error::{SessionError, SubmitError};
use crate::images::ImagePipeline;
use crate::model::{FeedbackRequest, FeedbackResult, SessionMode};

/// Something that presents a session to a human.
///
/// `start` must return without waiting for the human. The surface then ends
/// the session by calling exactly one of [`SessionHandle::submit`],
/// [`SessionHandle::cancel`] or [`SessionHandle::fail`].
pub trait InteractionSurface: Send + Sync {
    /// Present `session`. Dropping the returned guard tears the surface down.
    fn start(&self, session: SessionHandle) -> Result<SurfaceGuard, SessionError>;
}

/// Tears a surface down when dropped.
#[must_use = "dropping the guard tears the surface down immediately"]
pub struct SurfaceGuard {
    teardown: Option<Box<dyn FnOnce() + Send>>,
}

impl SurfaceGuard {
    pub fn new(teardown: impl FnOnce() + Send + 'static) -> Self {
        Self {
            teardown: Some(Box::new(teardown)),
        }
    }

    /// A guard with nothing to tear down.
    pub fn noop() -> Self {
        Self { teardown: None }
    }
}

impl Drop for SurfaceGuard {
    fn drop(&mut self) {
        if let Some(teardown) = self.teardown.take() {
            teardown();
        }
    }
}

/// Terminal value written by the surface.
#[derive(Debug)]
pub(crate) enum Resolution {
    Submitted(FeedbackResult),
    Cancelled(Option<String>),
    Failed(String),
}

struct SessionShared {
    id: Uuid,
    request: FeedbackRequest,
    pipeline: Mutex<ImagePipeline>,
    bridge: Bridge<Resolution>,
}

/// Surface-side view of one session. Cheap to clone.
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<SessionShared>,
}

impl SessionHandle {
    /// Create a handle for `request`. [`SessionController::run`] does this
    /// for every session; surfaces only need it in their own tests.
    ///
    /// [`SessionController::run`]: crate::SessionController::run
    pub fn new(request: FeedbackRequest) -> Self {
        Self {
            inner: Arc::new(SessionShared {
                id: Uuid::new_v4(),
                request,
                pipeline: Mutex::new(ImagePipeline::new()),
                bridge: Bridge::new(),
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn request(&self) -> &FeedbackRequest {
        &self.inner.request
    }

    /// Locked access to the session's images.
    pub fn pipeline(&self) -> MutexGuard<'_, ImagePipeline> {
        self.inner.pipeline.lock()
    }

    /// Whether the session still accepts a terminal action.
    pub fn is_open(&self) -> bool {
        self.inner.bridge.is_open()
    }

    /// Submit `text` with the current images.
    ///
    /// An empty submission, or an image-picking submission without exactly
    /// one image, is rejected without closing the session.
    pub fn submit(&self, text: &str) -> Result<(), SubmitError> {
        if !self.is_open() {
            return Err(SubmitError::Closed);
        }
        let images = self.pipeline().snapshot();
        if self.request().mode == SessionMode::PickImage && images.len() != 1 {
            return Err(SubmitError::ImageCount(images.len()));
        }
        let result = assemble(text, images)?;
        let image_count = result.images.len();
        let has_text = result.text.is_some();

        if !self.inner.bridge.resolve(Resolution::Submitted(result)) {
            return Err(SubmitError::Closed);
        }
        info!(session_id = %self.id(), has_text, image_count, "Feedback submitted");
        Ok(())
    }

    /// Cancel the session. Returns `false` if it was already closed.
    pub fn cancel(&self, reason: Option<String>) -> bool {
        let accepted = self
            .inner
            .bridge
            .resolve(Resolution::Cancelled(reason.clone()));
        if accepted {
            info!(
                session_id = %self.id(),
                reason = reason.as_deref().unwrap_or(""),
                "Feedback cancelled"
            );
        }
        accepted
    }

    /// Report a surface-side fault. Returns `false` if the session was already closed.
    pub fn fail(&self, message: impl Into<String>) -> bool {
        let message = message.into();
        let accepted = self
            .inner
            .bridge
            .resolve(Resolution::Failed(message.clone()));
        if accepted {
            error!(session_id = %self.id(), error = %message, "Interaction surface failed");
        }
        accepted
    }

    pub(crate) fn wait(&self, deadline: Instant) -> WaitOutcome<Resolution> {
        self.inner.bridge.wait(deadline)
    }

    pub(crate) fn close(&self) {
        self.inner.bridge.close();
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("id", &self.inner.id)
            .field("mode", &self.inner.request.mode)
            .field("open", &self.is_open())
            .finish()
    }
}

/// Run surface code on a dedicated named thread.
///
/// A panic in `body` is reported through [`SessionHandle::fail`].
pub fn spawn_surface_thread<F>(
    session: &SessionHandle,
    name: impl Into<String>,
    body: F,
) -> Result<JoinHandle<()>, SessionError>
where
    F: FnOnce(SessionHandle) + Send + 'static,
{
    let session = session.clone();
    thread::Builder::new()
        .name(name.into())
        .spawn(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| body(session.clone())));
            if let Err(payload) = outcome {
                session.fail(format!("surface panicked: {}", panic_message(payload.as_ref())));
            }
        })
        .map_err(|e| SessionError::Internal(format!("failed to spawn surface thread: {e}")))
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}
