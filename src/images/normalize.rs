//! Per-asset normalization policy and the image corpus stage.
//!
//! For every raster asset under the uploads subtree:
//!
//! 1. Decode. Failure skips the file entirely — its bytes stay untouched
//!    and the skip is counted, not raised.
//! 2. Resize when wider than the threshold, height scaled by the same
//!    ratio (Lanczos3, integer-rounded height). Width never increases.
//! 3. Flatten any alpha onto an opaque white canvas. Indexed sources are
//!    promoted to RGBA first, so no re-encoded asset retains transparency.
//! 4. Re-encode in the asset's own format and overwrite **only if the new
//!    encoding is strictly smaller** than the original on-disk size.
//!
//! The size gate is the single source of truth: a resize can shrink
//! dimensions while recompression at fixed quality exceeds the original's
//! size (input already heavily compressed), and in that case the original
//! bytes — and dimensions — are kept.

use crate::config::OptimizeConfig;
use crate::corpus::{self, FileClass};
use crate::images::encode::{self, OutputFormat};
use crate::stats::RunStats;
use image::imageops::FilterType;
use image::{DynamicImage, Rgb, RgbImage};
use rayon::prelude::*;
use std::fs;
use std::path::Path;

/// Why an asset was left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The bytes could not be parsed as an image.
    Decode,
    /// Re-encoding failed.
    Encode,
    /// The file could not be read or written.
    Io,
}

/// Result of normalizing one asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The new encoding was strictly smaller and replaced the original.
    Accepted { resized: bool },
    /// The new encoding was not smaller; original bytes kept.
    Rejected { resized: bool },
    /// The asset was not processed at all.
    Skipped(SkipReason),
}

/// Target dimensions for the width threshold: wider images scale down to
/// `max_width` with the height rounded from the same ratio, everything
/// else keeps its size.
pub fn scaled_dimensions((width, height): (u32, u32), max_width: u32) -> (u32, u32) {
    if width <= max_width {
        return (width, height);
    }
    let ratio = max_width as f64 / width as f64;
    let scaled = (height as f64 * ratio).round() as u32;
    (max_width, scaled.max(1))
}

/// Composite an image onto an opaque white canvas, discarding alpha.
pub fn flatten_onto_white(img: &DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }
    // Indexed/low-channel sources are promoted by to_rgba8 before blending.
    let rgba = img.to_rgba8();
    let mut out = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let alpha = pixel[3] as u32;
        let blend = |c: u8| (((c as u32) * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        out.put_pixel(x, y, Rgb([blend(pixel[0]), blend(pixel[1]), blend(pixel[2])]));
    }
    out
}

/// Apply the full normalization policy to one asset on disk.
pub fn normalize_file(path: &Path, max_width: u32, quality: u32) -> Outcome {
    let Ok(meta) = fs::metadata(path) else {
        return Outcome::Skipped(SkipReason::Io);
    };
    let original_size = meta.len();

    let Ok(img) = image::open(path) else {
        return Outcome::Skipped(SkipReason::Decode);
    };

    let (width, height) = (img.width(), img.height());
    let (target_w, target_h) = scaled_dimensions((width, height), max_width);
    let resized = target_w != width;
    let img = if resized {
        img.resize_exact(target_w, target_h, FilterType::Lanczos3)
    } else {
        img
    };

    let flattened = flatten_onto_white(&img);

    let Some(format) = OutputFormat::from_path(path) else {
        return Outcome::Skipped(SkipReason::Encode);
    };
    let Ok(encoded) = encode::encode_rgb(&flattened, format, quality) else {
        return Outcome::Skipped(SkipReason::Encode);
    };

    if (encoded.len() as u64) < original_size {
        if fs::write(path, &encoded).is_err() {
            return Outcome::Skipped(SkipReason::Io);
        }
        Outcome::Accepted { resized }
    } else {
        Outcome::Rejected { resized }
    }
}

/// Normalize every image under `<root>/<uploads_dir>`.
///
/// The resized and compressed counters are independent: a file can be
/// resized yet rejected by the size gate, or accepted without having
/// needed a resize.
pub fn normalize_images(root: &Path, config: &OptimizeConfig) -> RunStats {
    let uploads = root.join(&config.uploads_dir);
    let files = corpus::files_of_class(&uploads, FileClass::Image);

    files
        .par_iter()
        .map(|path| {
            let mut stats = RunStats::default();
            match normalize_file(path, config.images.max_width, config.images.quality) {
                Outcome::Accepted { resized } => {
                    stats.images_compressed += 1;
                    if resized {
                        stats.images_resized += 1;
                    }
                }
                Outcome::Rejected { resized } => {
                    if resized {
                        stats.images_resized += 1;
                    }
                }
                Outcome::Skipped(_) => {
                    stats.images_skipped += 1;
                }
            }
            stats
        })
        .reduce(RunStats::default, RunStats::merged)
}
