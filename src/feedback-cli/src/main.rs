//! MCP feedback collector binary.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use feedback_core::FeedbackConfig;
use feedback_web::WebSurface;
use tracing::{error, info};

use feedback_cli::{Args, build_server, setup_logging};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let mut config = match FeedbackConfig::discover(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("mcp-feedback-collector: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Logging comes up before the environment is applied so bad values get reported.
    args.apply_logging_overrides(&mut config.logging);
    setup_logging(&config.logging);

    config.apply_env();
    args.apply_overrides(&mut config);
    if let Err(e) = config.validate() {
        error!("{e}");
        return ExitCode::FAILURE;
    }

    info!(
        timeout_secs = config.timeout_secs,
        bind_addr = %config.surface.bind_addr,
        open_browser = config.surface.open_browser,
        "Starting MCP feedback collector"
    );

    let surface = Arc::new(WebSurface::new(config.surface.clone()));
    let server = match build_server(Arc::new(config), surface) {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to build MCP server: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = server.run_stdio().await {
        error!("MCP server error: {e:#}");
        return ExitCode::FAILURE;
    }

    info!("Client disconnected, exiting");
    ExitCode::SUCCESS
}
