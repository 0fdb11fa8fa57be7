//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;
use feedback_core::{FeedbackConfig, LoggingConfig};

/// MCP server that collects human feedback through a browser page.
#[derive(Debug, Parser)]
#[command(name = "mcp-feedback-collector")]
#[command(about = "MCP server that collects human feedback through a browser page")]
#[command(version)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Default session timeout in seconds
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Listen address of the feedback page
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Do not open the feedback page in a browser
    #[arg(long)]
    pub no_browser: bool,

    /// Log level
    #[arg(long)]
    pub log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long)]
    pub json_logs: bool,
}

impl Args {
    /// Apply the logging flags.
    pub fn apply_logging_overrides(&self, logging: &mut LoggingConfig) {
        if let Some(level) = &self.log_level {
            logging.level = level.clone();
        }
        if self.json_logs {
            logging.json = true;
        }
    }

    /// Apply every flag. Flags win over the file and the environment.
    pub fn apply_overrides(&self, config: &mut FeedbackConfig) {
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
        if let Some(bind) = &self.bind {
            config.surface.bind_addr = bind.clone();
        }
        if self.no_browser {
            config.surface.open_browser = false;
        }
        self.apply_logging_overrides(&mut config.logging);
    }
}
