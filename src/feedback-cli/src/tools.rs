//! The collector's MCP tools.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use feedback_core::{
    FeedbackConfig, FeedbackRequest, FeedbackResult, ImageAttachment, SessionController,
    describe_image,
};
use feedback_mcp_server::ToolHandler;
use feedback_mcp_types::{CallToolResult, Content, PropertySchema, Tool, ToolInputSchema};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::info;

pub const COLLECT_FEEDBACK: &str = "collect_feedback";
pub const PICK_IMAGE: &str = "pick_image";
pub const GET_IMAGE_INFO: &str = "get_image_info";

fn parse_arguments<T: DeserializeOwned>(tool: &str, arguments: Value) -> Result<T> {
    serde_json::from_value(arguments).with_context(|| format!("Invalid arguments for {tool}"))
}

/// Run a session on a blocking thread so the server keeps answering other requests.
async fn run_session(
    controller: &SessionController,
    request: FeedbackRequest,
) -> Result<FeedbackResult> {
    let controller = controller.clone();
    let result = tokio::task::spawn_blocking(move || controller.run(request))
        .await
        .context("Feedback session task failed")??;
    Ok(result)
}

/// An attachment as a base64 image item.
pub fn image_content(image: &ImageAttachment) -> Content {
    Content::image(STANDARD.encode(image.bytes()), image.mime_type())
}

/// Tool content for a submitted result: the text item, if any, then one
/// image item per attachment in collection order.
pub fn feedback_content(result: &FeedbackResult) -> Vec<Content> {
    let mut content = Vec::with_capacity(result.images.len() + 1);
    if let Some(text) = &result.text {
        content.push(Content::text(format!(
            "User feedback: {text}\nSubmitted at: {}",
            result.submitted_at.to_rfc3339()
        )));
    }
    content.extend(result.images.iter().map(image_content));
    content
}

/// `collect_feedback(work_summary, timeout_seconds)`.
pub struct CollectFeedbackTool {
    controller: SessionController,
    config: Arc<FeedbackConfig>,
}

#[derive(Debug, Deserialize)]
struct CollectFeedbackArgs {
    #[serde(default)]
    work_summary: String,
    #[serde(default)]
    timeout_seconds: Option<i64>,
}

impl CollectFeedbackTool {
    pub fn new(controller: SessionController, config: Arc<FeedbackConfig>) -> Self {
        Self { controller, config }
    }
}

#[async_trait]
impl ToolHandler for CollectFeedbackTool {
    fn tool(&self) -> Tool {
        Tool::new(
            COLLECT_FEEDBACK,
            "Show a summary of the work done to the user and wait for their feedback. \
             Returns the user's text and any images they attached.",
        )
        .with_schema(
            ToolInputSchema::object()
                .property(
                    "work_summary",
                    PropertySchema::string()
                        .description("Summary of the work done, shown to the user")
                        .default_value(json!("")),
                )
                .property(
                    "timeout_seconds",
                    PropertySchema::integer()
                        .description("How long to wait for the user, in seconds")
                        .default_value(json!(self.config.timeout_secs))
                        .min(1.0),
                ),
        )
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args: CollectFeedbackArgs = parse_arguments(COLLECT_FEEDBACK, arguments)?;
        let request = self
            .config
            .feedback_request(args.work_summary, args.timeout_seconds)?;

        let result = run_session(&self.controller, request).await?;
        info!(
            has_text = result.text.is_some(),
            images = result.images.len(),
            "Feedback collected"
        );
        Ok(CallToolResult::with_content(feedback_content(&result)))
    }
}

/// `pick_image()`: ask the user for one image.
pub struct PickImageTool {
    controller: SessionController,
    config: Arc<FeedbackConfig>,
}

impl PickImageTool {
    pub fn new(controller: SessionController, config: Arc<FeedbackConfig>) -> Self {
        Self { controller, config }
    }
}

#[async_trait]
impl ToolHandler for PickImageTool {
    fn tool(&self) -> Tool {
        Tool::new(
            PICK_IMAGE,
            "Ask the user to choose an image from a file or the clipboard and return it.",
        )
    }

    async fn execute(&self, _arguments: Value) -> Result<CallToolResult> {
        let request = self.config.pick_image_request();
        let result = run_session(&self.controller, request).await?;

        let Some(image) = result.images.first() else {
            bail!("No image selected");
        };
        Ok(CallToolResult::with_content(vec![image_content(image)]))
    }
}

/// `get_image_info(image_path)`: describe an image file. Lookup failures are
/// returned as text.
pub struct ImageInfoTool;

#[derive(Debug, Deserialize)]
struct ImageInfoArgs {
    image_path: String,
}

#[async_trait]
impl ToolHandler for ImageInfoTool {
    fn tool(&self) -> Tool {
        Tool::new(
            GET_IMAGE_INFO,
            "Describe an image file: name, format, dimensions, color mode and size.",
        )
        .with_schema(
            ToolInputSchema::object()
                .property(
                    "image_path",
                    PropertySchema::string().description("Path of the image file"),
                )
                .required(vec!["image_path"]),
        )
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args: ImageInfoArgs = parse_arguments(GET_IMAGE_INFO, arguments)?;
        let text = match describe_image(Path::new(&args.image_path)) {
            Ok(info) => info.to_string(),
            Err(e) => e.to_string(),
        };
        Ok(CallToolResult::text(text))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use feedback_core::{ImagePipeline, ImageSource, assemble};
    use image::{ImageFormat, RgbaImage};
    use pretty_assertions::assert_eq;

    use super::*;

    fn attachment(name: &str) -> ImageAttachment {
        let mut png = Cursor::new(Vec::new());
        RgbaImage::new(2, 2)
            .write_to(&mut png, ImageFormat::Png)
            .unwrap();
        let mut pipeline = ImagePipeline::new();
        pipeline
            .add_from_bytes(png.into_inner(), ImageSource::File(name.to_string()))
            .unwrap()
            .clone()
    }

    #[test]
    fn test_text_item_comes_first() {
        let images = vec![attachment("a.png"), attachment("b.png")];
        let result = assemble("  Looks good ", images.clone()).unwrap();

        let content = feedback_content(&result);

        assert_eq!(content.len(), 3);
        let text = content[0].as_text().unwrap();
        assert!(text.starts_with("User feedback: Looks good\nSubmitted at: "));
        assert_eq!(content[1], image_content(&images[0]));
        assert_eq!(
            content[2].as_image().map(|(_, mime)| mime),
            Some("image/png")
        );
    }

    #[test]
    fn test_images_only_has_no_text_item() {
        let result = assemble("", vec![attachment("a.png")]).unwrap();
        let content = feedback_content(&result);
        assert_eq!(content.len(), 1);
        assert!(content[0].as_text().is_none());
    }

    #[test]
    fn test_image_content_is_base64() {
        let image = attachment("a.png");
        let content = image_content(&image);
        let (data, mime) = content.as_image().unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(STANDARD.decode(data).unwrap(), image.bytes());
    }

    #[test]
    fn test_collect_feedback_schema_advertises_default_timeout() {
        let config = Arc::new(FeedbackConfig {
            timeout_secs: 90,
            ..FeedbackConfig::default()
        });
        let controller = SessionController::new(Arc::new(feedback_core::ScriptedSurface::default()));
        let tool = CollectFeedbackTool::new(controller, config).tool();

        let schema = serde_json::to_value(&tool.input_schema).unwrap();
        assert_eq!(tool.name, COLLECT_FEEDBACK);
        assert_eq!(schema["properties"]["timeout_seconds"]["default"], 90);
        assert_eq!(schema["properties"]["work_summary"]["type"], "string");
    }
}
