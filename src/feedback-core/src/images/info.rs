//! Human-readable description of an image file.

use std::fmt;
use std::path::Path;

use image::{ColorType, ImageDecoder, ImageFormat, ImageReader};

use crate::error::ImageInfoError;
use crate::model::format_name;

/// Header facts about an image file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    pub file_name: String,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    /// Conventional short mode name, e.g. `RGBA` or `I;16`.
    pub color_mode: &'static str,
    /// Size on disk in bytes.
    pub file_size: u64,
}

impl fmt::Display for ImageInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "File name: {}", self.file_name)?;
        writeln!(f, "Format: {}", format_name(self.format))?;
        writeln!(f, "Dimensions: {} x {}", self.width, self.height)?;
        writeln!(f, "Color mode: {}", self.color_mode)?;
        #[allow(clippy::cast_precision_loss)]
        let kb = self.file_size as f64 / 1024.0;
        write!(f, "File size: {kb:.1} KB")
    }
}

/// Read the header of the image at `path`.
pub fn describe_image(path: &Path) -> Result<ImageInfo, ImageInfoError> {
    if !path.exists() {
        return Err(ImageInfoError::FileNotFound(path.to_path_buf()));
    }

    let file_size = std::fs::metadata(path).map_err(path_error)?.len();
    let reader = ImageReader::open(path)
        .map_err(path_error)?
        .with_guessed_format()
        .map_err(path_error)?;
    let format = reader
        .format()
        .ok_or_else(|| ImageInfoError::Path("unrecognized image format".to_string()))?;
    let decoder = reader.into_decoder().map_err(path_error)?;
    let (width, height) = decoder.dimensions();

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    Ok(ImageInfo {
        file_name,
        format,
        width,
        height,
        color_mode: color_mode(decoder.color_type()),
        file_size,
    })
}

fn path_error(e: impl fmt::Display) -> ImageInfoError {
    ImageInfoError::Path(e.to_string())
}

fn color_mode(color: ColorType) -> &'static str {
    match color {
        ColorType::L8 => "L",
        ColorType::La8 => "LA",
        ColorType::Rgb8 => "RGB",
        ColorType::Rgba8 => "RGBA",
        ColorType::L16 => "I;16",
        ColorType::La16 => "LA;16",
        ColorType::Rgb16 => "RGB;16",
        ColorType::Rgba16 => "RGBA;16",
        ColorType::Rgb32F => "RGB;F",
        ColorType::Rgba32F => "RGBA;F",
        _ => "unknown",
    }
}
