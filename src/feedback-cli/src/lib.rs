//! MCP feedback collector.
//!
//! Exposes `collect_feedback`, `pick_image` and `get_image_info` over a stdio
//! MCP server. Feedback sessions are presented in the browser by
//! [`feedback_web::WebSurface`].

mod cli;
mod logging;
mod server;
mod tools;

pub use cli::Args;
pub use logging::setup_logging;
pub use server::{SERVER_NAME, build_server};
pub use tools::{
    COLLECT_FEEDBACK, CollectFeedbackTool, GET_IMAGE_INFO, ImageInfoTool, PICK_IMAGE,
    PickImageTool, feedback_content, image_content,
};
