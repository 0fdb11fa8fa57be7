//! A surface that replays a fixed list of human actions.
//!
//! Used by tests and by anything that needs a session without a real UI.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use crate::error::{IngestError, SessionError};
use crate::images::CapturedImage;
use crate::model::ImageSource;
use crate::surface::{InteractionSurface, SessionHandle, SurfaceGuard, spawn_surface_thread};

/// One simulated human action.
#[derive(Debug, Clone)]
pub enum ScriptStep {
    /// Pause before the next step.
    Delay(Duration),
    /// Attach image bytes as `file:<name>`.
    AddBytes { name: String, bytes: Vec<u8> },
    /// Attach a clipboard capture (`None` is an empty clipboard).
    AddCapture(Option<CapturedImage>),
    /// Remove the attachment at an index.
    Remove(usize),
    /// Remove all attachments.
    Clear,
    /// Press submit with the given text.
    Submit(String),
    /// Press cancel.
    Cancel(Option<String>),
    /// Report a surface fault.
    Fail(String),
    /// Crash the surface thread.
    Panic(String),
}

/// Replays [`ScriptStep`]s on its own thread for every session it starts.
///
/// Each step's result is appended to [`ScriptedSurface::events`].
#[derive(Clone, Default)]
pub struct ScriptedSurface {
    steps: Vec<ScriptStep>,
    start_error: Option<String>,
    events: Arc<Mutex<Vec<String>>>,
    torn_down: Arc<AtomicBool>,
}

impl ScriptedSurface {
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        Self {
            steps,
            ..Self::default()
        }
    }

    /// A surface whose `start` always fails.
    pub fn failing_start(message: impl Into<String>) -> Self {
        Self {
            start_error: Some(message.into()),
            ..Self::default()
        }
    }

    /// What happened so far, one line per step outcome.
    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    /// Whether the last started session was torn down.
    pub fn was_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::SeqCst)
    }
}

impl InteractionSurface for ScriptedSurface {
    fn start(&self, session: SessionHandle) -> Result<SurfaceGuard, SessionError> {
        if let Some(message) = &self.start_error {
            return Err(SessionError::Internal(message.clone()));
        }

        let stop = Arc::new(AtomicBool::new(false));
        self.torn_down.store(false, Ordering::SeqCst);

        let steps = self.steps.clone();
        let events = Arc::clone(&self.events);
        let stopped = Arc::clone(&stop);
        spawn_surface_thread(&session, "scripted-surface", move |session| {
            for step in steps {
                if stopped.load(Ordering::SeqCst) {
                    break;
                }
                let event = play(&session, step);
                events.lock().push(event);
            }
        })?;

        let torn_down = Arc::clone(&self.torn_down);
        Ok(SurfaceGuard::new(move || {
            stop.store(true, Ordering::SeqCst);
            torn_down.store(true, Ordering::SeqCst);
        }))
    }
}

fn play(session: &SessionHandle, step: ScriptStep) -> String {
    match step {
        ScriptStep::Delay(duration) => {
            std::thread::sleep(duration);
            format!("waited {}ms", duration.as_millis())
        }
        ScriptStep::AddBytes { name, bytes } => {
            let mut pipeline = session.pipeline();
            match pipeline.add_from_bytes(bytes, ImageSource::File(name)) {
                Ok(attachment) => format!("added {}", attachment.source()),
                Err(e) => format!("rejected: {e}"),
            }
        }
        ScriptStep::AddCapture(captured) => {
            let capture = move || -> Result<Option<CapturedImage>, IngestError> { Ok(captured.clone()) };
            let mut pipeline = session.pipeline();
            match pipeline.add_from_capture(&capture) {
                Ok(attachment) => format!("added {}", attachment.source()),
                Err(e) => format!("rejected: {e}"),
            }
        }
        ScriptStep::Remove(index) => match session.pipeline().remove_at(index) {
            Ok(removed) => format!("removed {}", removed.source()),
            Err(e) => format!("rejected: {e}"),
        },
        ScriptStep::Clear => {
            session.pipeline().clear();
            "cleared".to_string()
        }
        ScriptStep::Submit(text) => match session.submit(&text) {
            Ok(()) => "submitted".to_string(),
            Err(e) => format!("submit rejected: {e}"),
        },
        ScriptStep::Cancel(reason) => {
            if session.cancel(reason) {
                "cancelled".to_string()
            } else {
                "cancel ignored".to_string()
            }
        }
        ScriptStep::Fail(message) => {
            if session.fail(message) {
                "failed".to_string()
            } else {
                "failure ignored".to_string()
            }
        }
        ScriptStep::Panic(message) => panic!("{message}"),
    }
}
