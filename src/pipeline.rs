//! Stage orchestration.
//!
//! Runs the five stages in their fixed order, each as a complete pass over
//! its file class before the next begins:
//!
//! ```text
//! 1. links    rewrite domain/base-path references        (HTML)
//! 2. images   resize, flatten, re-encode with size gate  (uploads)
//! 3. html     six-rule mutation engine                   (HTML)
//! 4. css      font-display injection                     (CSS)
//! 5. minify   size-gated compaction                      (HTML/CSS/JS)
//! ```
//!
//! Stage boundaries are full barriers — later rules assume earlier rules'
//! output, so no file enters stage N+1 until stage N has finished writing.
//! Within a stage every file is independent; the stage functions shard the
//! corpus across rayon workers and merge per-worker statistics.

use crate::config::OptimizeConfig;
use crate::stats::RunStats;
use crate::{css, html, images, links, minify};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("corpus root not found: {0}")]
    RootNotFound(PathBuf),
}

/// Run the full pipeline over the corpus at `root`.
///
/// Returns the merged statistics for the whole run. Per-file failures are
/// counted, never raised — the only error is a missing corpus root.
pub fn run(root: &Path, config: &OptimizeConfig) -> Result<RunStats, PipelineError> {
    if !root.is_dir() {
        return Err(PipelineError::RootNotFound(root.to_path_buf()));
    }

    let mut stats = RunStats::default();

    println!("==> Stage 1: Rewriting links");
    stats.merge(links::rewrite_links(root, config));

    println!("==> Stage 2: Normalizing images");
    stats.merge(images::normalize_images(root, config));

    println!("==> Stage 3: Mutating documents");
    stats.merge(html::rewrite_documents(root, config));

    println!("==> Stage 4: Mutating stylesheets");
    stats.merge(css::rewrite_stylesheets(root));

    let capabilities = minify::Capabilities::detect();
    let missing = capabilities.missing();
    if missing.is_empty() {
        println!("==> Stage 5: Minifying");
    } else {
        println!("==> Stage 5: Minifying (unavailable: {})", missing.join(", "));
    }
    stats.merge(minify::minify_corpus(root));

    Ok(stats)
}
