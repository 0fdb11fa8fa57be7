//! The three tools driven through the MCP server against a scripted surface.

use std::io::Cursor;
use std::sync::Arc;
use std::time::{Duration, Instant};

use feedback_cli::{COLLECT_FEEDBACK, GET_IMAGE_INFO, PICK_IMAGE, build_server};
use feedback_core::{FeedbackConfig, ScriptStep, ScriptedSurface};
use feedback_mcp_server::McpServer;
use feedback_mcp_types::{CallToolResult, JsonRpcRequest, ListToolsResult, methods};
use image::{ImageFormat, RgbaImage};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tokio::io::AsyncWriteExt;

fn png(width: u32, height: u32) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    RgbaImage::new(width, height)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

fn server(steps: Vec<ScriptStep>) -> Arc<McpServer> {
    build_server(
        Arc::new(FeedbackConfig::default()),
        Arc::new(ScriptedSurface::new(steps)),
    )
    .unwrap()
}

async fn call(server: &McpServer, name: &str, arguments: Value) -> CallToolResult {
    let request = JsonRpcRequest::new(1, methods::TOOLS_CALL)
        .with_params(json!({ "name": name, "arguments": arguments }));
    let response = server.handle_request(request).await;
    serde_json::from_value(response.result.unwrap()).unwrap()
}

#[tokio::test]
async fn lists_all_tools() {
    let server = server(vec![]);
    let response = server
        .handle_request(JsonRpcRequest::new(1, methods::TOOLS_LIST))
        .await;
    let result: ListToolsResult = serde_json::from_value(response.result.unwrap()).unwrap();

    let names: Vec<_> = result.tools.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec![COLLECT_FEEDBACK, GET_IMAGE_INFO, PICK_IMAGE]);
}

#[tokio::test]
async fn collect_feedback_returns_text_then_images() {
    let server = server(vec![
        ScriptStep::AddBytes {
            name: "imgA.png".to_string(),
            bytes: png(2, 2),
        },
        ScriptStep::Submit("Looks good".to_string()),
    ]);

    let result = call(
        &server,
        COLLECT_FEEDBACK,
        json!({ "work_summary": "Implemented feature X", "timeout_seconds": 5 }),
    )
    .await;

    assert!(!result.is_error());
    assert_eq!(result.content.len(), 2);
    assert!(
        result.content[0]
            .as_text()
            .unwrap()
            .starts_with("User feedback: Looks good\nSubmitted at: ")
    );
    assert_eq!(result.content[1].as_image().unwrap().1, "image/png");
}

#[tokio::test]
async fn collect_feedback_timeout_is_reported() {
    let server = server(vec![ScriptStep::Delay(Duration::from_secs(3))]);

    let result = call(&server, COLLECT_FEEDBACK, json!({ "timeout_seconds": 1 })).await;

    assert!(result.is_error());
    assert_eq!(
        result.content[0].as_text(),
        Some("Operation timed out after 1 seconds, please retry")
    );
}

#[tokio::test]
async fn collect_feedback_cancel_is_reported() {
    let server = server(vec![ScriptStep::Cancel(None)]);

    let result = call(&server, COLLECT_FEEDBACK, json!({})).await;

    assert!(result.is_error());
    assert_eq!(
        result.content[0].as_text(),
        Some("User cancelled the feedback request")
    );
}

#[tokio::test]
async fn collect_feedback_rejects_non_positive_timeout() {
    let server = server(vec![ScriptStep::Submit("unused".to_string())]);

    let result = call(&server, COLLECT_FEEDBACK, json!({ "timeout_seconds": 0 })).await;

    assert!(result.is_error());
    assert!(
        result.content[0]
            .as_text()
            .unwrap()
            .starts_with("Invalid configuration")
    );
}

#[tokio::test]
async fn pick_image_returns_first_image() {
    let server = server(vec![
        ScriptStep::AddCapture(Some(feedback_core::CapturedImage::Encoded(png(3, 3)))),
        ScriptStep::Submit(String::new()),
    ]);

    let result = call(&server, PICK_IMAGE, json!({})).await;

    assert!(!result.is_error());
    assert_eq!(result.content.len(), 1);
    assert_eq!(result.content[0].as_image().unwrap().1, "image/png");
}

#[tokio::test]
async fn pick_image_keeps_waiting_after_text_only_submit() {
    let surface = ScriptedSurface::new(vec![
        ScriptStep::Submit("no picture".to_string()),
        ScriptStep::Cancel(None),
    ]);
    let server = build_server(
        Arc::new(FeedbackConfig::default()),
        Arc::new(surface.clone()),
    )
    .unwrap();

    let result = call(&server, PICK_IMAGE, json!({})).await;

    assert!(result.is_error());
    assert_eq!(
        result.content[0].as_text(),
        Some("User cancelled the feedback request")
    );
    assert_eq!(
        surface.events()[0],
        "submit rejected: Select exactly one image (0 attached)"
    );
}

#[tokio::test]
async fn disconnect_closes_waiting_session() {
    let surface = ScriptedSurface::new(vec![
        ScriptStep::AddCapture(None),
        ScriptStep::Delay(Duration::from_secs(30)),
    ]);
    let server = build_server(
        Arc::new(FeedbackConfig::default()),
        Arc::new(surface.clone()),
    )
    .unwrap();

    let (mut client, server_io) = tokio::io::duplex(4096);
    let (server_read, server_write) = tokio::io::split(server_io);
    let serve = tokio::spawn(Arc::clone(&server).serve(server_read, server_write));

    let request = JsonRpcRequest::new(1, methods::TOOLS_CALL)
        .with_params(json!({ "name": COLLECT_FEEDBACK, "arguments": {} }));
    let line = format!("{}\n", serde_json::to_string(&request).unwrap());
    client.write_all(line.as_bytes()).await.unwrap();

    let started = Instant::now();
    while surface.events().is_empty() {
        assert!(started.elapsed() < Duration::from_secs(5), "session never started");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    drop(client);
    serve.await.unwrap().unwrap();

    let stopped = Instant::now();
    while !surface.was_torn_down() {
        assert!(stopped.elapsed() < Duration::from_secs(5), "session left open");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn image_info_describes_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shot.png");
    std::fs::write(&path, png(640, 480)).unwrap();

    let server = server(vec![]);
    let result = call(
        &server,
        GET_IMAGE_INFO,
        json!({ "image_path": path.to_str().unwrap() }),
    )
    .await;

    assert!(!result.is_error());
    let text = result.content[0].as_text().unwrap();
    assert!(text.contains("File name: shot.png"), "{text}");
    assert!(text.contains("Format: PNG"), "{text}");
    assert!(text.contains("Dimensions: 640 x 480"), "{text}");
    assert!(text.contains("Color mode: RGBA"), "{text}");
}

#[tokio::test]
async fn image_info_missing_file_is_text() {
    let server = server(vec![]);

    let result = call(&server, GET_IMAGE_INFO, json!({ "image_path": "/no/such/file.png" })).await;

    assert!(!result.is_error());
    assert_eq!(
        result.content[0].as_text(),
        Some("File not found: /no/such/file.png")
    );
}
