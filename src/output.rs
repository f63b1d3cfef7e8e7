//! CLI output formatting.
//!
//! Each display has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure — no I/O, no side effects.
//!
//! The run report groups counters by stage, mirroring the order the
//! pipeline executes them:
//!
//! ```text
//! Links
//!     documents rewritten: 12
//! Images
//!     resized: 34
//!     compressed: 31
//!     skipped: 1
//! ...
//! ```

use crate::stats::RunStats;

/// Format the end-of-run report, grouped by stage.
pub fn format_report(stats: &RunStats) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push("Links".to_string());
    lines.push(format!("    documents rewritten: {}", stats.links_rewritten));

    lines.push("Images".to_string());
    lines.push(format!("    resized: {}", stats.images_resized));
    lines.push(format!("    compressed: {}", stats.images_compressed));
    lines.push(format!("    skipped: {}", stats.images_skipped));

    lines.push("Documents".to_string());
    lines.push(format!("    rewritten: {}", stats.documents_rewritten));
    lines.push(format!("    lazy-loading added: {}", stats.lazy_added));
    lines.push(format!(
        "    priority hints removed: {}",
        stats.fetchpriority_removed
    ));
    lines.push(format!("    srcset entries pruned: {}", stats.srcset_pruned));
    lines.push(format!("    comments removed: {}", stats.comments_removed));
    lines.push(format!(
        "    empty elements removed: {}",
        stats.empty_tags_removed
    ));
    lines.push(format!("    defer added: {}", stats.defer_added));
    if stats.documents_skipped > 0 {
        lines.push(format!("    skipped: {}", stats.documents_skipped));
    }

    lines.push("Stylesheets".to_string());
    lines.push(format!("    rewritten: {}", stats.stylesheets_rewritten));
    lines.push(format!(
        "    font-display added: {}",
        stats.font_display_added
    ));

    lines.push("Minify".to_string());
    lines.push(format!("    files minified: {}", stats.files_minified));

    lines
}

/// Format the corpus composition listing for the `check` command.
pub fn format_check(html: usize, stylesheets: usize, scripts: usize, images: usize) -> Vec<String> {
    vec![
        "Corpus".to_string(),
        format!("    HTML documents: {html}"),
        format!("    stylesheets: {stylesheets}"),
        format!("    scripts: {scripts}"),
        format!("    images (uploads): {images}"),
    ]
}

pub fn print_report(stats: &RunStats) {
    for line in format_report(stats) {
        println!("{}", line);
    }
}

pub fn print_check(html: usize, stylesheets: usize, scripts: usize, images: usize) {
    for line in format_check(html, stylesheets, scripts, images) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_covers_every_stage() {
        let lines = format_report(&RunStats::default());
        let text = lines.join("\n");
        for header in ["Links", "Images", "Documents", "Stylesheets", "Minify"] {
            assert!(text.contains(header), "missing stage header {header}");
        }
    }

    #[test]
    fn report_shows_counter_values() {
        let stats = RunStats {
            lazy_added: 42,
            images_compressed: 7,
            ..Default::default()
        };
        let text = format_report(&stats).join("\n");
        assert!(text.contains("lazy-loading added: 42"));
        assert!(text.contains("compressed: 7"));
    }

    #[test]
    fn document_skip_line_only_when_nonzero() {
        let none = format_report(&RunStats::default()).join("\n");
        // Only the unconditional image-skip line is present
        assert_eq!(none.matches("skipped:").count(), 1);

        let some = format_report(&RunStats {
            documents_skipped: 2,
            ..Default::default()
        })
        .join("\n");
        assert_eq!(some.matches("skipped:").count(), 2);
        assert!(some.contains("skipped: 2"));
    }

    #[test]
    fn check_lists_all_classes() {
        let text = format_check(3, 2, 1, 9).join("\n");
        assert!(text.contains("HTML documents: 3"));
        assert!(text.contains("images (uploads): 9"));
    }
}
