//! [`InteractionSurface`] backed by a per-session loopback HTTP server.

use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;

use feedback_core::{
    ClipboardCapture, InteractionSurface, SessionError, SessionHandle, SurfaceConfig,
    SurfaceGuard, SystemClipboard, spawn_surface_thread,
};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::browser::open_browser;
use crate::routes::router;

type ReadyHook = Arc<dyn Fn(SocketAddr) + Send + Sync>;

/// Serves each session on its own HTTP server.
///
/// The listener is bound before `start` returns, so a bad address fails the
/// session immediately. Serving happens on a dedicated thread with a
/// current-thread runtime; dropping the guard shuts the server down.
#[derive(Clone)]
pub struct WebSurface {
    config: SurfaceConfig,
    clipboard: Arc<dyn ClipboardCapture>,
    on_ready: Option<ReadyHook>,
}

impl WebSurface {
    pub fn new(config: SurfaceConfig) -> Self {
        Self {
            config,
            clipboard: Arc::new(SystemClipboard),
            on_ready: None,
        }
    }

    /// Replace the system clipboard.
    pub fn with_clipboard(mut self, clipboard: Arc<dyn ClipboardCapture>) -> Self {
        self.clipboard = clipboard;
        self
    }

    /// Call `hook` with the bound address each time a session page is ready.
    pub fn on_ready(mut self, hook: impl Fn(SocketAddr) + Send + Sync + 'static) -> Self {
        self.on_ready = Some(Arc::new(hook));
        self
    }

    fn bind(&self) -> Result<TcpListener, SessionError> {
        let addr: SocketAddr = self.config.bind_addr.parse().map_err(|e| {
            SessionError::InvalidConfiguration(format!(
                "invalid bind address '{}': {e}",
                self.config.bind_addr
            ))
        })?;
        let listener = TcpListener::bind(addr)
            .map_err(|e| SessionError::Internal(format!("failed to bind {addr}: {e}")))?;
        listener
            .set_nonblocking(true)
            .map_err(|e| SessionError::Internal(format!("failed to configure listener: {e}")))?;
        Ok(listener)
    }
}

impl InteractionSurface for WebSurface {
    fn start(&self, session: SessionHandle) -> Result<SurfaceGuard, SessionError> {
        let listener = self.bind()?;
        let addr = listener
            .local_addr()
            .map_err(|e| SessionError::Internal(format!("failed to read local address: {e}")))?;

        let app = router(
            session.clone(),
            Arc::clone(&self.clipboard),
            self.config.max_upload_bytes,
        );
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        spawn_surface_thread(&session, "feedback-web", move |session| {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    session.fail(format!("failed to start web runtime: {e}"));
                    return;
                }
            };

            let served = runtime.block_on(async move {
                let listener = tokio::net::TcpListener::from_std(listener)?;
                axum::serve(listener, app)
                    .with_graceful_shutdown(async move {
                        let _ = shutdown_rx.await;
                    })
                    .await
            });

            match served {
                Ok(()) => debug!(session_id = %session.id(), "Web surface stopped"),
                Err(e) => {
                    session.fail(format!("web surface stopped: {e}"));
                }
            }
        })?;

        let url = format!("http://{addr}/");
        info!(session_id = %session.id(), url = %url, "Feedback page ready");

        if let Some(hook) = &self.on_ready {
            hook(addr);
        }
        if self.config.open_browser {
            if let Err(e) = open_browser(&url) {
                warn!(url = %url, error = %e, "Failed to open browser, open the URL manually");
            }
        }

        Ok(SurfaceGuard::new(move || {
            let _ = shutdown_tx.send(());
        }))
    }
}
