//! Validation and storage of image attachments for one session.

use std::io::Cursor;
use std::path::Path;

use image::{ImageFormat, ImageReader, RgbaImage};
use tracing::{debug, warn};

use super::capture::{CapturedImage, ClipboardCapture, FileSelector};
use crate::error::IngestError;
use crate::model::{ImageAttachment, ImageSource};

/// Outcome of ingesting a multi-file selection.
#[derive(Debug, Default)]
pub struct IngestReport {
    /// Number of files that became attachments.
    pub added: usize,
    /// One entry per rejected file, in selection order.
    pub errors: Vec<IngestError>,
}

/// Ordered collection of validated images.
///
/// Failed ingestions never change the collection.
#[derive(Debug, Default)]
pub struct ImagePipeline {
    images: Vec<ImageAttachment>,
}

impl ImagePipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `bytes` and append them as an attachment.
    pub fn add_from_bytes(
        &mut self,
        bytes: Vec<u8>,
        source: ImageSource,
    ) -> Result<&ImageAttachment, IngestError> {
        let (width, height, format) = match probe(&bytes, &source) {
            Ok(probed) => probed,
            Err(e) => {
                warn!(source = %source, error = %e, "Rejected image");
                return Err(e);
            }
        };

        debug!(source = %source, width, height, format = ?format, "Image added");
        let index = self.images.len();
        self.images
            .push(ImageAttachment::new(bytes, source, width, height, format));
        Ok(&self.images[index])
    }

    /// Read a file and ingest it as `file:<file name>`.
    pub fn add_from_path(&mut self, path: &Path) -> Result<&ImageAttachment, IngestError> {
        let bytes = std::fs::read(path).map_err(|e| IngestError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.add_from_bytes(bytes, ImageSource::File(name))
    }

    /// Ingest every path the selector returns. A bad file does not stop the rest.
    pub fn add_selected(&mut self, selector: &dyn FileSelector) -> IngestReport {
        let mut report = IngestReport::default();
        for path in selector.select_files() {
            match self.add_from_path(&path) {
                Ok(_) => report.added += 1,
                Err(e) => report.errors.push(e),
            }
        }
        report
    }

    /// Ingest the current clipboard image, stored as PNG.
    pub fn add_from_capture(
        &mut self,
        capture: &dyn ClipboardCapture,
    ) -> Result<&ImageAttachment, IngestError> {
        let captured = capture.capture()?.ok_or(IngestError::ClipboardEmpty)?;
        let png = normalize_to_png(captured)?;
        self.add_from_bytes(png, ImageSource::Clipboard)
    }

    /// Remove the attachment at `index`; later attachments shift down.
    pub fn remove_at(&mut self, index: usize) -> Result<ImageAttachment, IngestError> {
        if index >= self.images.len() {
            return Err(IngestError::IndexOutOfRange {
                index,
                len: self.images.len(),
            });
        }
        let removed = self.images.remove(index);
        debug!(index, source = %removed.source(), "Image removed");
        Ok(removed)
    }

    pub fn clear(&mut self) {
        self.images.clear();
    }

    /// Copy of the collection in insertion order.
    pub fn snapshot(&self) -> Vec<ImageAttachment> {
        self.images.clone()
    }

    pub fn get(&self, index: usize) -> Option<&ImageAttachment> {
        self.images.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ImageAttachment> {
        self.images.iter()
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

fn decode_error(source: &ImageSource, reason: impl Into<String>) -> IngestError {
    IngestError::Decode {
        label: source.to_string(),
        reason: reason.into(),
    }
}

/// Fully decode `bytes`, returning dimensions and detected format.
fn probe(bytes: &[u8], source: &ImageSource) -> Result<(u32, u32, ImageFormat), IngestError> {
    if bytes.is_empty() {
        return Err(decode_error(source, "empty image data"));
    }

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| decode_error(source, e.to_string()))?;
    let format = reader
        .format()
        .ok_or_else(|| decode_error(source, "unrecognized image format"))?;
    let image = reader
        .decode()
        .map_err(|e| decode_error(source, e.to_string()))?;

    Ok((image.width(), image.height(), format))
}

fn normalize_to_png(captured: CapturedImage) -> Result<Vec<u8>, IngestError> {
    let source = ImageSource::Clipboard;
    let image = match captured {
        CapturedImage::Encoded(bytes) => {
            if bytes.is_empty() {
                return Err(IngestError::ClipboardEmpty);
            }
            if image::guess_format(&bytes).ok() == Some(ImageFormat::Png) {
                return Ok(bytes);
            }
            image::load_from_memory(&bytes).map_err(|e| decode_error(&source, e.to_string()))?
        }
        CapturedImage::Rgba {
            width,
            height,
            pixels,
        } => RgbaImage::from_raw(width, height, pixels)
            .map(image::DynamicImage::ImageRgba8)
            .ok_or_else(|| decode_error(&source, "pixel buffer does not match dimensions"))?,
    };

    let mut png = Cursor::new(Vec::new());
    image
        .write_to(&mut png, ImageFormat::Png)
        .map_err(|e| decode_error(&source, e.to_string()))?;
    Ok(png.into_inner())
}
