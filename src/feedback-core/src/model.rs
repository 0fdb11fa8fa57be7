//! Requests, attachments, results and session states.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Local};
use image::ImageFormat;
use serde::{Deserialize, Serialize};

/// What the surface asks the human for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    /// Free text and/or images.
    #[default]
    Feedback,
    /// Exactly one image.
    PickImage,
}

/// A request for human feedback. Immutable once a session starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackRequest {
    /// Summary of the work being reviewed; may be empty.
    pub work_summary: String,
    /// How long to wait for the human.
    pub timeout: Duration,
    /// What to ask for.
    pub mode: SessionMode,
}

impl FeedbackRequest {
    /// Create a feedback request.
    pub fn new(work_summary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            work_summary: work_summary.into(),
            timeout,
            mode: SessionMode::Feedback,
        }
    }

    /// Create a request asking the human to pick one image.
    pub fn pick_image(timeout: Duration) -> Self {
        Self {
            work_summary: String::new(),
            timeout,
            mode: SessionMode::PickImage,
        }
    }
}

/// Where an attachment came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ImageSource {
    /// A file, by file name.
    File(String),
    /// A clipboard capture.
    Clipboard,
}

impl fmt::Display for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(name) => write!(f, "file:{name}"),
            Self::Clipboard => f.write_str("clipboard"),
        }
    }
}

/// One validated image.
///
/// Only the ingestion pipeline constructs attachments, and only after the
/// bytes decoded, so `width`/`height`/`format` always describe `bytes`.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    bytes: Vec<u8>,
    source: ImageSource,
    width: u32,
    height: u32,
    format: ImageFormat,
}

impl ImageAttachment {
    pub(crate) fn new(
        bytes: Vec<u8>,
        source: ImageSource,
        width: u32,
        height: u32,
        format: ImageFormat,
    ) -> Self {
        Self {
            bytes,
            source,
            width,
            height,
            format,
        }
    }

    /// Encoded image bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the attachment, returning its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn source(&self) -> &ImageSource {
        &self.source
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// MIME type of the encoded bytes, e.g. `image/png`.
    pub fn mime_type(&self) -> &'static str {
        self.format.to_mime_type()
    }

    /// Size of the encoded bytes.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

impl fmt::Debug for ImageAttachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageAttachment")
            .field("source", &self.source.to_string())
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// Short upper-case name of an image format, e.g. `PNG`.
pub fn format_name(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "PNG",
        ImageFormat::Jpeg => "JPEG",
        ImageFormat::Gif => "GIF",
        ImageFormat::WebP => "WEBP",
        ImageFormat::Bmp => "BMP",
        ImageFormat::Tiff => "TIFF",
        ImageFormat::Ico => "ICO",
        ImageFormat::Tga => "TGA",
        ImageFormat::Pnm => "PNM",
        ImageFormat::Avif => "AVIF",
        ImageFormat::Qoi => "QOI",
        ImageFormat::Hdr => "HDR",
        ImageFormat::OpenExr => "EXR",
        ImageFormat::Dds => "DDS",
        ImageFormat::Farbfeld => "FARBFELD",
        _ => "UNKNOWN",
    }
}

/// Terminal classification of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Submitted,
    Cancelled,
    TimedOut,
}

/// What the human submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackResult {
    /// Trimmed text; `None` when the human entered nothing.
    pub text: Option<String>,
    /// Attachments in collection order.
    pub images: Vec<ImageAttachment>,
    pub submitted_at: DateTime<Local>,
    pub outcome: Outcome,
}

/// Lifecycle of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Created,
    AwaitingInput,
    Resolved,
    Expired,
    Failed,
}

impl SessionState {
    /// Whether `self -> next` is a legal transition.
    pub fn can_transition_to(self, next: SessionState) -> bool {
        matches!(
            (self, next),
            (Self::Created, Self::AwaitingInput)
                | (Self::Created, Self::Failed)
                | (Self::AwaitingInput, Self::Resolved)
                | (Self::AwaitingInput, Self::Expired)
                | (Self::AwaitingInput, Self::Failed)
        )
    }

    /// Whether no further transition is possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Resolved | Self::Expired | Self::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::AwaitingInput => "awaiting_input",
            Self::Resolved => "resolved",
            Self::Expired => "expired",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_labels() {
        assert_eq!(ImageSource::File("a.png".to_string()).to_string(), "file:a.png");
        assert_eq!(ImageSource::Clipboard.to_string(), "clipboard");
    }

    #[test]
    fn test_state_transitions() {
        use SessionState::*;

        assert!(Created.can_transition_to(AwaitingInput));
        assert!(AwaitingInput.can_transition_to(Resolved));
        assert!(AwaitingInput.can_transition_to(Expired));
        assert!(AwaitingInput.can_transition_to(Failed));

        assert!(!Created.can_transition_to(Resolved));
        for terminal in [Resolved, Expired, Failed] {
            assert!(terminal.is_terminal());
            for next in [Created, AwaitingInput, Resolved, Expired, Failed] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_request_modes() {
        let request = FeedbackRequest::new("Implemented feature X", Duration::from_secs(5));
        assert_eq!(request.mode, SessionMode::Feedback);
        assert_eq!(
            FeedbackRequest::pick_image(Duration::from_secs(5)).mode,
            SessionMode::PickImage
        );
    }
}
