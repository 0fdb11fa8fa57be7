//! MCP server assembly.

use std::sync::Arc;

use anyhow::Result;
use feedback_core::{FeedbackConfig, InteractionSurface, SessionController};
use feedback_mcp_server::{McpServer, McpServerBuilder};

use crate::tools::{CollectFeedbackTool, ImageInfoTool, PickImageTool};

/// Server name reported on `initialize`.
pub const SERVER_NAME: &str = "mcp-feedback-collector";

const INSTRUCTIONS: &str = "Call collect_feedback after finishing a piece of work to show the \
user a summary and receive their feedback. Use pick_image to ask the user for an image and \
get_image_info to describe an image file.";

/// Build the server with all tools registered against `surface`.
///
/// Sessions still waiting when the client disconnects are closed.
pub fn build_server(
    config: Arc<FeedbackConfig>,
    surface: Arc<dyn InteractionSurface>,
) -> Result<Arc<McpServer>> {
    let controller = SessionController::new(surface);
    let on_disconnect = controller.clone();

    McpServerBuilder::new(SERVER_NAME, env!("CARGO_PKG_VERSION"))
        .with_logging_capability()
        .instructions(INSTRUCTIONS)
        .on_shutdown(move || on_disconnect.shutdown())
        .tool_handler(Arc::new(CollectFeedbackTool::new(
            controller.clone(),
            Arc::clone(&config),
        )))
        .tool_handler(Arc::new(PickImageTool::new(controller, config)))
        .tool_handler(Arc::new(ImageInfoTool))
        .build()
}
