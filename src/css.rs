//! Stylesheet mutation.
//!
//! Injects `font-display:swap;` into every `@font-face` block that does not
//! already declare a font-display, so text stays visible while a custom
//! font loads. Blocks within one file are handled independently.
//!
//! The block pattern only matches a balanced `{ ... }` pair; a stylesheet
//! with an unclosed block simply produces no match for that block and the
//! file's content is left unchanged for this rule — best effort, never
//! fatal.

use crate::corpus::{self, FileClass};
use crate::stats::RunStats;
use rayon::prelude::*;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

static FONT_FACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)(@font-face\s*\{)([^}]*?)(\})").unwrap());

/// Append `font-display:swap;` before the closing brace of `@font-face`
/// blocks that lack one. Returns the rewritten text and insertion count.
pub fn apply_font_display(text: &str) -> (String, u64) {
    let mut count = 0u64;
    let out = FONT_FACE_RE.replace_all(text, |caps: &regex::Captures| {
        if caps[2].to_lowercase().contains("font-display") {
            return caps[0].to_string();
        }
        count += 1;
        format!("{}{}font-display:swap;{}", &caps[1], &caps[2], &caps[3])
    });
    (out.into_owned(), count)
}

/// Run the stylesheet engine over every CSS file under `root`.
pub fn rewrite_stylesheets(root: &Path) -> RunStats {
    let files = corpus::files_of_class(root, FileClass::Stylesheet);

    files
        .par_iter()
        .map(|path| {
            let mut stats = RunStats::default();
            let Ok(text) = fs::read_to_string(path) else {
                stats.documents_skipped += 1;
                return stats;
            };
            let (rewritten, added) = apply_font_display(&text);
            if added > 0 {
                if fs::write(path, &rewritten).is_ok() {
                    stats.stylesheets_rewritten += 1;
                    stats.font_display_added += added;
                } else {
                    stats.documents_skipped += 1;
                }
            }
            stats
        })
        .reduce(RunStats::default, RunStats::merged)
}
