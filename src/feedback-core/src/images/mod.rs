//! Image ingestion, capture capabilities and image info.

mod capture;
mod info;
mod pipeline;

pub use capture::{CapturedImage, ClipboardCapture, FileSelector, SystemClipboard};
pub use info::{ImageInfo, describe_image};
pub use pipeline::{ImagePipeline, IngestReport};
