//! Per-format image encoders.
//!
//! One entry point, [`encode_rgb`], encodes an already-flattened RGB buffer
//! into the bytes of the asset's own format. Encoders are tuned for the
//! slowest/best effort their format offers: WebP method 6, PNG best
//! compression, JPEG at the configured quality.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder, RgbImage};
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("WebP encode failed: {0}")]
    WebP(String),
    #[error("encode failed: {0}")]
    Image(#[from] image::ImageError),
}

/// Output formats the normalizer can re-encode. The asset keeps its own
/// format — a `.webp` stays WebP, a `.jpg` stays JPEG.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    WebP,
    Jpeg,
    Png,
}

impl OutputFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "webp" => Some(OutputFormat::WebP),
            "jpg" | "jpeg" => Some(OutputFormat::Jpeg),
            "png" => Some(OutputFormat::Png),
            _ => None,
        }
    }
}

/// Encode an RGB image into `format` at the given quality (0-100).
///
/// Quality applies to the lossy formats; PNG is lossless and uses best
/// compression as its effort knob instead.
pub fn encode_rgb(img: &RgbImage, format: OutputFormat, quality: u32) -> Result<Vec<u8>, EncodeError> {
    match format {
        OutputFormat::WebP => encode_webp(img, quality),
        OutputFormat::Jpeg => {
            let mut buf = Cursor::new(Vec::new());
            let mut encoder =
                JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100) as u8);
            encoder.encode_image(img)?;
            Ok(buf.into_inner())
        }
        OutputFormat::Png => {
            let mut buf = Cursor::new(Vec::new());
            PngEncoder::new_with_quality(&mut buf, CompressionType::Best, PngFilterType::Adaptive)
                .write_image(
                    img.as_raw(),
                    img.width(),
                    img.height(),
                    ExtendedColorType::Rgb8,
                )?;
            Ok(buf.into_inner())
        }
    }
}

/// Lossy WebP through libwebp. Method 6 is the slowest, best-compressing
/// effort setting — the same trade the rest of the acceptance policy makes.
fn encode_webp(img: &RgbImage, quality: u32) -> Result<Vec<u8>, EncodeError> {
    let mut config = webp::WebPConfig::new()
        .map_err(|_| EncodeError::WebP("config init failed".to_string()))?;
    config.quality = quality.clamp(0, 100) as f32;
    config.method = 6;

    let encoder = webp::Encoder::from_rgb(img.as_raw(), img.width(), img.height());
    let memory = encoder
        .encode_advanced(&config)
        .map_err(|e| EncodeError::WebP(format!("{e:?}")))?;
    Ok(memory.to_vec())
}
