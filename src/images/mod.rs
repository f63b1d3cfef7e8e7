//! Image normalization — pure Rust decode/resize, libwebp lossy encode.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** (WebP, JPEG, PNG) | `image` crate |
//! | **Resize** | `image::imageops::resize` with `Lanczos3` filter |
//! | **Flatten** | alpha composite onto an opaque white canvas |
//! | **Encode → WebP** | `webp` (libwebp, quality + method 6) |
//! | **Encode → JPEG/PNG** | `image` crate encoders |
//!
//! The module is split into:
//! - **Encode**: per-format encoders behind one `encode_rgb` entry point
//! - **Normalize**: the per-asset policy (resize threshold, flatten,
//!   strictly-smaller acceptance gate) and the corpus stage

pub mod encode;
pub mod normalize;

pub use encode::{EncodeError, OutputFormat, encode_rgb};
pub use normalize::{Outcome, SkipReason, normalize_file, normalize_images};
