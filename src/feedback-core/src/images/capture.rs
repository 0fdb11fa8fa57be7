//! OS capabilities the pipeline depends on: clipboard capture and file selection.

use std::path::PathBuf;

use crate::error::IngestError;

/// Image data read from a clipboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapturedImage {
    /// Encoded bytes in some image format.
    Encoded(Vec<u8>),
    /// Raw 8-bit RGBA pixels, row-major.
    Rgba {
        width: u32,
        height: u32,
        pixels: Vec<u8>,
    },
}

/// Source of clipboard images.
pub trait ClipboardCapture: Send + Sync {
    /// Read the current clipboard image. `Ok(None)` means the clipboard
    /// holds no image.
    fn capture(&self) -> Result<Option<CapturedImage>, IngestError>;
}

impl<F> ClipboardCapture for F
where
    F: Fn() -> Result<Option<CapturedImage>, IngestError> + Send + Sync,
{
    fn capture(&self) -> Result<Option<CapturedImage>, IngestError> {
        self()
    }
}

/// The system clipboard.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClipboard;

impl ClipboardCapture for SystemClipboard {
    fn capture(&self) -> Result<Option<CapturedImage>, IngestError> {
        let mut clipboard = arboard::Clipboard::new()
            .map_err(|e| IngestError::ClipboardUnavailable(e.to_string()))?;

        let image = match clipboard.get_image() {
            Ok(image) => image,
            Err(arboard::Error::ContentNotAvailable) => return Ok(None),
            Err(e) => return Err(IngestError::ClipboardUnavailable(e.to_string())),
        };

        let dimension = |value: usize| {
            u32::try_from(value).map_err(|_| IngestError::Decode {
                label: "clipboard".to_string(),
                reason: format!("dimension {value} too large"),
            })
        };

        Ok(Some(CapturedImage::Rgba {
            width: dimension(image.width)?,
            height: dimension(image.height)?,
            pixels: image.bytes.into_owned(),
        }))
    }
}

/// Source of file paths chosen by the human.
pub trait FileSelector: Send + Sync {
    /// Paths in selection order; empty when nothing was chosen.
    fn select_files(&self) -> Vec<PathBuf>;
}

impl<F> FileSelector for F
where
    F: Fn() -> Vec<PathBuf> + Send + Sync,
{
    fn select_files(&self) -> Vec<PathBuf> {
        self()
    }
}
