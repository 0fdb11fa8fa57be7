//! Session lifecycle: start the surface, wait with a deadline, tear down.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

use crate::bridge::WaitOutcome;
use crate::error::SessionError;
use crate::model::{FeedbackRequest, FeedbackResult, SessionState};
use crate::surface::{InteractionSurface, Resolution, SessionHandle};

/// Runs feedback sessions against an interaction surface.
///
/// Every `run` call gets its own session state, images and bridge; nothing
/// is shared between calls. Clones share the set of running sessions, so
/// [`SessionController::shutdown`] on any clone reaches all of them.
#[derive(Clone)]
pub struct SessionController {
    surface: Arc<dyn InteractionSurface>,
    active: Arc<Mutex<ActiveSessions>>,
}

#[derive(Default)]
struct ActiveSessions {
    closed: bool,
    sessions: HashMap<Uuid, SessionHandle>,
}

/// Message reported to sessions ended by [`SessionController::shutdown`].
const SHUTDOWN_MESSAGE: &str = "feedback collector is shutting down";

impl SessionController {
    pub fn new(surface: Arc<dyn InteractionSurface>) -> Self {
        Self {
            surface,
            active: Arc::new(Mutex::new(ActiveSessions::default())),
        }
    }

    /// Present `request` and block until the human answers or the timeout elapses.
    pub fn run(&self, request: FeedbackRequest) -> Result<FeedbackResult, SessionError> {
        if request.timeout.is_zero() {
            return Err(SessionError::InvalidConfiguration(
                "timeout must be greater than zero".to_string(),
            ));
        }

        let timeout = request.timeout;
        let started = Instant::now();
        let Some(deadline) = started.checked_add(timeout) else {
            return Err(SessionError::InvalidConfiguration(format!(
                "timeout of {} seconds is too large",
                timeout.as_secs()
            )));
        };

        let session = SessionHandle::new(request);
        let _registration = self.register(&session)?;
        let span = info_span!("feedback_session", session_id = %session.id());
        let _entered = span.enter();

        let mut state = StateTracker::new(session.id());
        info!(
            timeout_secs = timeout.as_secs(),
            mode = ?session.request().mode,
            "Feedback session started"
        );

        state.advance(SessionState::AwaitingInput)?;
        let guard = match self.surface.start(session.clone()) {
            Ok(guard) => guard,
            Err(e) => {
                session.close();
                state.advance(SessionState::Failed)?;
                warn!(error = %e, "Interaction surface failed to start");
                return Err(e);
            }
        };

        let outcome = session.wait(deadline);
        drop(guard);
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let result = match outcome {
            WaitOutcome::Expired => {
                state.advance(SessionState::Expired)?;
                info!(elapsed_ms, "Feedback session expired");
                Err(SessionError::Timeout(timeout))
            }
            WaitOutcome::Resolved(Resolution::Submitted(result)) => {
                state.advance(SessionState::Resolved)?;
                info!(elapsed_ms, images = result.images.len(), "Feedback session resolved");
                Ok(result)
            }
            WaitOutcome::Resolved(Resolution::Cancelled(reason)) => {
                state.advance(SessionState::Resolved)?;
                info!(elapsed_ms, "Feedback session cancelled");
                Err(SessionError::UserCancelled { reason })
            }
            WaitOutcome::Resolved(Resolution::Failed(message)) => {
                state.advance(SessionState::Failed)?;
                Err(SessionError::Internal(message))
            }
        };

        // The surface may still hold a handle; drop the image bytes now.
        session.pipeline().clear();
        result
    }

    /// End every running session as failed and refuse new ones.
    pub fn shutdown(&self) {
        let sessions: Vec<SessionHandle> = {
            let mut active = self.active.lock();
            active.closed = true;
            active.sessions.drain().map(|(_, session)| session).collect()
        };
        if !sessions.is_empty() {
            info!(count = sessions.len(), "Closing running feedback sessions");
        }
        for session in sessions {
            session.fail(SHUTDOWN_MESSAGE);
        }
    }

    /// Number of sessions currently waiting on the human.
    pub fn active_sessions(&self) -> usize {
        self.active.lock().sessions.len()
    }

    fn register(&self, session: &SessionHandle) -> Result<Registration, SessionError> {
        let mut active = self.active.lock();
        if active.closed {
            return Err(SessionError::Internal(SHUTDOWN_MESSAGE.to_string()));
        }
        active.sessions.insert(session.id(), session.clone());
        Ok(Registration {
            id: session.id(),
            active: Arc::clone(&self.active),
        })
    }
}

/// Removes a session from the running set when dropped.
struct Registration {
    id: Uuid,
    active: Arc<Mutex<ActiveSessions>>,
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.active.lock().sessions.remove(&self.id);
    }
}

struct StateTracker {
    session_id: Uuid,
    state: SessionState,
}

impl StateTracker {
    fn new(session_id: Uuid) -> Self {
        Self {
            session_id,
            state: SessionState::Created,
        }
    }

    fn advance(&mut self, next: SessionState) -> Result<(), SessionError> {
        if !self.state.can_transition_to(next) {
            return Err(SessionError::Internal(format!(
                "illegal session transition {} -> {next}",
                self.state
            )));
        }
        debug!(session_id = %self.session_id, from = %self.state, state = %next, "Session state changed");
        self.state = next;
        Ok(())
    }
}
