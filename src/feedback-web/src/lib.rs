//! Browser-based interaction surface.
//!
//! Every session gets its own loopback HTTP server serving a single page and
//! a small JSON API. The page talks to the session through the API; the
//! server stops when the session's [`SurfaceGuard`](feedback_core::SurfaceGuard)
//! is dropped.

mod browser;
mod error;
mod handlers;
mod page;
mod routes;
mod surface;

pub use browser::open_browser;
pub use error::{ErrorDetail, ErrorResponse, SurfaceApiError};
pub use handlers::{ImageView, IngestReportView, SessionView};
pub use page::{escape_html, render_page};
pub use routes::router;
pub use surface::WebSurface;
