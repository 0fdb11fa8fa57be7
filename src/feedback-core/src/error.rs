//! Error types for feedback sessions.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Terminal failure of a feedback session, as seen by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The request could not be turned into a session (bad timeout, bad bind address).
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Nobody answered before the deadline.
    #[error("Operation timed out after {} seconds, please retry", .0.as_secs())]
    Timeout(Duration),

    /// The human cancelled the request.
    #[error("User cancelled the feedback request{}", reason_suffix(.reason))]
    UserCancelled {
        /// Context supplied by the human, if any.
        reason: Option<String>,
    },

    /// The interaction surface failed to start or crashed.
    #[error("Internal error: {0}")]
    Internal(String),
}

fn reason_suffix(reason: &Option<String>) -> String {
    match reason.as_deref().map(str::trim) {
        Some(r) if !r.is_empty() => format!(": {r}"),
        _ => String::new(),
    }
}

impl SessionError {
    /// Get the error code string.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidConfiguration(_) => "invalid_configuration",
            Self::Timeout(_) => "timeout",
            Self::UserCancelled { .. } => "user_cancelled",
            Self::Internal(_) => "internal_error",
        }
    }
}

/// Failure to ingest one image. Never ends the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    /// The bytes are empty or not a decodable image.
    #[error("Failed to decode image from {label}: {reason}")]
    Decode {
        /// Source label of the rejected image.
        label: String,
        /// Decoder message.
        reason: String,
    },

    /// Capture was requested but the clipboard holds no image.
    #[error("No image found on the clipboard")]
    ClipboardEmpty,

    /// The clipboard itself could not be opened.
    #[error("Clipboard unavailable: {0}")]
    ClipboardUnavailable(String),

    /// Removal of an attachment that does not exist.
    #[error("Image index {index} out of range (collection has {len} images)")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Collection length at the time of the request.
        len: usize,
    },

    /// A file could not be read.
    #[error("Failed to read {}: {reason}", .path.display())]
    Read {
        /// Path that failed.
        path: PathBuf,
        /// I/O error message.
        reason: String,
    },
}

impl IngestError {
    /// Get the error code string.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Decode { .. } => "decode_error",
            Self::ClipboardEmpty => "clipboard_empty",
            Self::ClipboardUnavailable(_) => "clipboard_unavailable",
            Self::IndexOutOfRange { .. } => "index_out_of_range",
            Self::Read { .. } => "read_error",
        }
    }
}

/// Submission with neither text nor images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Please enter feedback text or attach at least one image")]
pub struct ValidationEmpty;

impl ValidationEmpty {
    /// Get the error code string.
    pub fn error_code(&self) -> &'static str {
        "validation_empty"
    }
}

/// Rejection of a surface-side submit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// Nothing to submit; the human should be asked again.
    #[error(transparent)]
    Empty(#[from] ValidationEmpty),

    /// An image-picking session needs exactly one image; holds how many are attached.
    #[error("Select exactly one image ({0} attached)")]
    ImageCount(usize),

    /// The session already resolved or expired.
    #[error("Session is closed")]
    Closed,
}

impl SubmitError {
    /// Get the error code string.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Empty(e) => e.error_code(),
            Self::ImageCount(_) => "image_count",
            Self::Closed => "session_closed",
        }
    }
}

/// Failure of an image info lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageInfoError {
    /// Nothing exists at the path.
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The path exists but is not a readable image.
    #[error("Failed to read image info: {0}")]
    Path(String),
}

impl ImageInfoError {
    /// Get the error code string.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::FileNotFound(_) => "file_not_found",
            Self::Path(_) => "path_error",
        }
    }
}

/// Configuration loading failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Failed to read config file {}: {err}", .path.display())]
    Io {
        /// Config file path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        err: std::io::Error,
    },

    /// The file is not valid TOML for [`FeedbackConfig`](crate::FeedbackConfig).
    #[error("Failed to parse config file {}: {err}", .path.display())]
    Parse {
        /// Config file path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        err: toml::de::Error,
    },

    /// A value is out of range.
    #[error(transparent)]
    Invalid(#[from] SessionError),
}

impl ConfigError {
    /// Get the error code string.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Io { .. } => "config_io",
            Self::Parse { .. } => "config_parse",
            Self::Invalid(e) => e.error_code(),
        }
    }
}
