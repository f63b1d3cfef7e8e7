//! Best-effort minification.
//!
//! Runs last, over the already-mutated corpus. Each compaction capability
//! (HTML, CSS, JS) is an optional cargo feature; availability is resolved
//! once at stage start via [`Capabilities::detect`], and an absent
//! capability degrades that sub-stage to a no-op without blocking the
//! others.
//!
//! Acceptance mirrors the image policy: a minified result replaces the
//! file only when it is strictly shorter than the input. A minifier error
//! skips that file; nothing in this stage is fatal to the run.

use crate::corpus::{self, FileClass};
use crate::stats::RunStats;
use rayon::prelude::*;
use std::fs;
use std::path::Path;

/// Which compaction capabilities were compiled in. Resolved once at stage
/// start, not probed per file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub html: bool,
    pub css: bool,
    pub js: bool,
}

impl Capabilities {
    pub fn detect() -> Self {
        Self {
            html: cfg!(feature = "minify-html"),
            css: cfg!(feature = "minify-css"),
            js: cfg!(feature = "minify-js"),
        }
    }

    /// Classes with no compiled-in minifier, for the stage's progress line.
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if !self.html {
            missing.push("html");
        }
        if !self.css {
            missing.push("css");
        }
        if !self.js {
            missing.push("js");
        }
        missing
    }
}

#[cfg(feature = "minify-html")]
fn minify_html_text(text: &str) -> Option<String> {
    let cfg = minify_html::Cfg::new();
    String::from_utf8(minify_html::minify(text.as_bytes(), &cfg)).ok()
}

#[cfg(not(feature = "minify-html"))]
fn minify_html_text(_text: &str) -> Option<String> {
    None
}

#[cfg(feature = "minify-css")]
fn minify_css_text(text: &str) -> Option<String> {
    use css_minify::optimizations::{Level, Minifier};
    Minifier::default().minify(text, Level::Two).ok()
}

#[cfg(not(feature = "minify-css"))]
fn minify_css_text(_text: &str) -> Option<String> {
    None
}

#[cfg(feature = "minify-js")]
fn minify_js_text(text: &str) -> Option<String> {
    let session = minify_js::Session::new();
    let mut out = Vec::new();
    minify_js::minify(
        &session,
        minify_js::TopLevelMode::Global,
        text.as_bytes(),
        &mut out,
    )
    .ok()?;
    String::from_utf8(out).ok()
}

#[cfg(not(feature = "minify-js"))]
fn minify_js_text(_text: &str) -> Option<String> {
    None
}

/// Minify one class of files, accepting only strictly shorter results.
fn minify_class(
    root: &Path,
    class: FileClass,
    minifier: fn(&str) -> Option<String>,
) -> RunStats {
    let files = corpus::files_of_class(root, class);

    files
        .par_iter()
        .map(|path| {
            let mut stats = RunStats::default();
            let Ok(text) = fs::read_to_string(path) else {
                stats.documents_skipped += 1;
                return stats;
            };
            let Some(minified) = minifier(&text) else {
                return stats;
            };
            if minified.len() < text.len() && fs::write(path, &minified).is_ok() {
                stats.files_minified += 1;
            }
            stats
        })
        .reduce(RunStats::default, RunStats::merged)
}

/// Run the minification stage over the whole corpus.
pub fn minify_corpus(root: &Path) -> RunStats {
    let capabilities = Capabilities::detect();
    let mut stats = RunStats::default();

    if capabilities.html {
        stats.merge(minify_class(root, FileClass::Html, minify_html_text));
    }
    if capabilities.css {
        stats.merge(minify_class(root, FileClass::Stylesheet, minify_css_text));
    }
    if capabilities.js {
        stats.merge(minify_class(root, FileClass::Script, minify_js_text));
    }
    stats
}
