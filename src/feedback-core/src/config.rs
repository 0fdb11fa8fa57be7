//! Collector configuration.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ConfigError, SessionError};
use crate::model::FeedbackRequest;

/// Default session timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Overrides [`FeedbackConfig::timeout_secs`].
pub const TIMEOUT_ENV_VAR: &str = "MCP_DIALOG_TIMEOUT";

/// Overrides [`SurfaceConfig::bind_addr`].
pub const BIND_ENV_VAR: &str = "MCP_FEEDBACK_BIND";

/// Overrides [`SurfaceConfig::open_browser`].
pub const OPEN_BROWSER_ENV_VAR: &str = "MCP_FEEDBACK_OPEN_BROWSER";

/// Directory name under the platform config dir.
pub const APP_DIR_NAME: &str = "mcp-feedback-collector";

/// Collector configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackConfig {
    /// Session timeout when the caller does not pass one.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Web surface configuration.
    #[serde(default)]
    pub surface: SurfaceConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            surface: SurfaceConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Web surface configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceConfig {
    /// Listen address; port 0 picks a free port per session.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Open the session page in the default browser.
    #[serde(default = "default_true")]
    pub open_browser: bool,

    /// Maximum upload body size in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_bind_addr() -> String {
    "127.0.0.1:0".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_upload_bytes() -> usize {
    20 * 1024 * 1024 // 20MB
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            open_browser: true,
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl FeedbackConfig {
    /// Load from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|err| ConfigError::Io {
            path: path.to_path_buf(),
            err,
        })?;
        toml::from_str(&content).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            err,
        })
    }

    /// `<config_dir>/mcp-feedback-collector/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join("config.toml"))
    }

    /// Load `explicit` if given, else the default file if it exists, else defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => {
                debug!(path = %path.display(), "Loading config file");
                Self::load(path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Apply overrides from `lookup`. Unparsable values are ignored with a warning.
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(raw) = lookup(TIMEOUT_ENV_VAR) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => self.timeout_secs = secs,
                _ => warn!(var = TIMEOUT_ENV_VAR, value = %raw, "Ignoring invalid timeout"),
            }
        }

        if let Some(addr) = lookup(BIND_ENV_VAR) {
            self.surface.bind_addr = addr.trim().to_string();
        }

        if let Some(raw) = lookup(OPEN_BROWSER_ENV_VAR) {
            match parse_bool(&raw) {
                Some(open) => self.surface.open_browser = open,
                None => warn!(var = OPEN_BROWSER_ENV_VAR, value = %raw, "Ignoring invalid flag"),
            }
        }
    }

    /// Check values that cannot be checked by the type system.
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.timeout_secs == 0 {
            return Err(SessionError::InvalidConfiguration(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        if Instant::now().checked_add(self.default_timeout()).is_none() {
            return Err(SessionError::InvalidConfiguration(format!(
                "timeout_secs {} is too large",
                self.timeout_secs
            )));
        }
        self.bind_socket_addr()?;
        Ok(())
    }

    pub fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Parsed [`SurfaceConfig::bind_addr`].
    pub fn bind_socket_addr(&self) -> Result<SocketAddr, SessionError> {
        self.surface.bind_addr.parse().map_err(|e| {
            SessionError::InvalidConfiguration(format!(
                "invalid bind address '{}': {e}",
                self.surface.bind_addr
            ))
        })
    }

    /// Timeout for a session: `requested` seconds, or the default when absent.
    pub fn request_timeout(&self, requested: Option<i64>) -> Result<Duration, SessionError> {
        match requested {
            None => Ok(self.default_timeout()),
            Some(secs) if secs > 0 => Ok(Duration::from_secs(secs.unsigned_abs())),
            Some(secs) => Err(SessionError::InvalidConfiguration(format!(
                "timeout_seconds must be greater than zero, got {secs}"
            ))),
        }
    }

    /// Build a feedback request.
    pub fn feedback_request(
        &self,
        work_summary: impl Into<String>,
        timeout_secs: Option<i64>,
    ) -> Result<FeedbackRequest, SessionError> {
        Ok(FeedbackRequest::new(
            work_summary,
            self.request_timeout(timeout_secs)?,
        ))
    }

    /// Build an image-picking request with the default timeout.
    pub fn pick_image_request(&self) -> FeedbackRequest {
        FeedbackRequest::pick_image(self.default_timeout())
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = FeedbackConfig::default();
        assert_eq!(config.timeout_secs, 300);
        assert_eq!(config.surface.bind_addr, "127.0.0.1:0");
        assert!(config.surface.open_browser);
        assert_eq!(config.surface.max_upload_bytes, 20 * 1024 * 1024);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "timeout_secs = 60\n\n[surface]\nopen_browser = false\n",
        )
        .unwrap();

        let config = FeedbackConfig::load(&path).unwrap();
        assert_eq!(config.timeout_secs, 60);
        assert!(!config.surface.open_browser);
        assert_eq!(config.surface.bind_addr, "127.0.0.1:0");
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        assert_eq!(
            FeedbackConfig::load(&missing).unwrap_err().error_code(),
            "config_io"
        );

        let broken = dir.path().join("broken.toml");
        std::fs::write(&broken, "timeout_secs = \"soon\"").unwrap();
        assert_eq!(
            FeedbackConfig::load(&broken).unwrap_err().error_code(),
            "config_parse"
        );
    }

    #[test]
    fn test_discover_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "timeout_secs = 42\n").unwrap();
        let config = FeedbackConfig::discover(Some(&path)).unwrap();
        assert_eq!(config.timeout_secs, 42);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = FeedbackConfig::default();
        config.apply_env_with(env(&[
            (TIMEOUT_ENV_VAR, "120"),
            (BIND_ENV_VAR, "127.0.0.1:8765"),
            (OPEN_BROWSER_ENV_VAR, "false"),
        ]));
        assert_eq!(config.timeout_secs, 120);
        assert_eq!(config.surface.bind_addr, "127.0.0.1:8765");
        assert!(!config.surface.open_browser);
    }

    #[test]
    fn test_invalid_env_values_ignored() {
        let mut config = FeedbackConfig::default();
        config.apply_env_with(env(&[
            (TIMEOUT_ENV_VAR, "soon"),
            (OPEN_BROWSER_ENV_VAR, "maybe"),
        ]));
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert!(config.surface.open_browser);

        config.apply_env_with(env(&[(TIMEOUT_ENV_VAR, "0")]));
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_validate() {
        let mut config = FeedbackConfig {
            timeout_secs: 0,
            ..FeedbackConfig::default()
        };
        assert!(config.validate().is_err());

        config.timeout_secs = u64::MAX;
        assert_eq!(
            config.validate().unwrap_err().error_code(),
            "invalid_configuration"
        );

        config.timeout_secs = 10;
        config.surface.bind_addr = "localhost-ish".to_string();
        assert_eq!(
            config.validate().unwrap_err().error_code(),
            "invalid_configuration"
        );
    }

    #[test]
    fn test_request_timeout() {
        let config = FeedbackConfig::default();
        assert_eq!(config.request_timeout(None).unwrap(), Duration::from_secs(300));
        assert_eq!(config.request_timeout(Some(5)).unwrap(), Duration::from_secs(5));
        assert!(config.request_timeout(Some(0)).is_err());
        assert!(config.request_timeout(Some(-3)).is_err());

        let request = config.feedback_request("done", Some(1)).unwrap();
        assert_eq!(request.work_summary, "done");
        assert_eq!(request.timeout, Duration::from_secs(1));
    }
}
