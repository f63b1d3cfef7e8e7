//! HTML mutation engine.
//!
//! Applies an ordered sequence of rewrite rules to each document. Order is
//! load-bearing: earlier rules can create or remove matches for later ones.
//!
//! | # | Rule | Effect |
//! |---|------|--------|
//! | 1 | Lazy-loading injection | `loading="lazy"` on every image but the first |
//! | 2 | Priority-hint stripping | remove `fetchpriority="high"` |
//! | 3 | Source-set validation | drop `srcset` candidates with no file on disk |
//! | 4 | Editor-comment stripping | remove namespaced block comments |
//! | 5 | Empty-element elimination | remove configured empty tags, to a fixpoint |
//! | 6 | External script deferral | `defer` on scripts with a `src` |
//!
//! Every rule is a narrow `(text) -> (text, count)` function so a future
//! parser-backed implementation can replace any single rule without touching
//! the sequencing. Rules operate on pattern matches, not a DOM — acceptable
//! for this corpus's narrow, well-formed-enough markup; anything a pattern
//! fails to match is left alone.
//!
//! A document is written back only when the full pass changed its text,
//! which makes the engine idempotent over an unchanged corpus: the second
//! run produces zero diffs.

use crate::config::OptimizeConfig;
use crate::corpus::{self, FileClass};
use crate::stats::RunStats;
use rayon::prelude::*;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static IMG_TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<img\s[^>]*>").unwrap());

static FETCHPRIORITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\s*fetchpriority\s*=\s*["']high["']"#).unwrap());

static SRCSET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)srcset\s*=\s*["']([^"']+)["']"#).unwrap());

static SCRIPT_SRC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<script\s+([^>]*?)src\s*=\s*["']([^"']+)["']([^>]*)>"#).unwrap()
});

/// Per-document rule application counts, folded into [`RunStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuleCounts {
    pub lazy_added: u64,
    pub fetchpriority_removed: u64,
    pub srcset_pruned: u64,
    pub comments_removed: u64,
    pub empty_tags_removed: u64,
    pub defer_added: u64,
}

impl RuleCounts {
    fn fold_into(self, stats: &mut RunStats) {
        stats.lazy_added += self.lazy_added;
        stats.fetchpriority_removed += self.fetchpriority_removed;
        stats.srcset_pruned += self.srcset_pruned;
        stats.comments_removed += self.comments_removed;
        stats.empty_tags_removed += self.empty_tags_removed;
        stats.defer_added += self.defer_added;
    }
}

/// Rule 1: inject `loading="lazy"` into every image tag after the first.
///
/// The first image in document order is treated as the largest-contentful
/// element and stays eagerly loaded. Tags that already declare a `loading`
/// attribute are left alone.
pub fn inject_lazy_loading(text: &str) -> (String, u64) {
    let mut out = String::with_capacity(text.len() + 64);
    let mut last = 0;
    let mut count = 0u64;

    for (idx, m) in IMG_TAG_RE.find_iter(text).enumerate() {
        out.push_str(&text[last..m.start()]);
        let tag = m.as_str();
        if idx == 0 || tag.to_lowercase().contains("loading=") {
            out.push_str(tag);
        } else {
            // "<img" is 4 bytes regardless of the source's casing
            out.push_str(&tag[..4]);
            out.push_str(r#" loading="lazy""#);
            out.push_str(&tag[4..]);
            count += 1;
        }
        last = m.end();
    }
    out.push_str(&text[last..]);
    (out, count)
}

/// Rule 2: remove `fetchpriority="high"` unconditionally.
pub fn strip_priority_hints(text: &str) -> (String, u64) {
    let count = FETCHPRIORITY_RE.find_iter(text).count() as u64;
    if count == 0 {
        return (text.to_string(), 0);
    }
    (FETCHPRIORITY_RE.replace_all(text, "").into_owned(), count)
}

/// The engine owns the config-derived patterns and the corpus root used for
/// source-set existence checks.
pub struct HtmlEngine {
    root: PathBuf,
    comment_re: Option<Regex>,
    empty_tag_res: Vec<Regex>,
    defer_exempt: Vec<String>,
}

impl HtmlEngine {
    pub fn new(root: &Path, config: &OptimizeConfig) -> Self {
        let comment_re = if config.comment_prefix.is_empty() {
            None
        } else {
            let escaped = regex::escape(&config.comment_prefix);
            Some(Regex::new(&format!(r"(?i)<!--\s*/?{escaped}:[^>]*-->")).unwrap())
        };
        let empty_tag_res = config
            .html
            .empty_tags
            .iter()
            .map(|tag| {
                let escaped = regex::escape(tag);
                Regex::new(&format!(r"(?is)<{escaped}(\s[^>]*)?>\s*</{escaped}>")).unwrap()
            })
            .collect();
        let defer_exempt = config
            .html
            .defer_exempt
            .iter()
            .map(|attr| attr.to_lowercase())
            .collect();
        Self {
            root: root.to_path_buf(),
            comment_re,
            empty_tag_res,
            defer_exempt,
        }
    }

    /// Apply all six rules in order to one document's text.
    pub fn rewrite(&self, text: &str, doc_dir: &Path) -> (String, RuleCounts) {
        let mut counts = RuleCounts::default();

        let (text, n) = inject_lazy_loading(text);
        counts.lazy_added = n;
        let (text, n) = strip_priority_hints(&text);
        counts.fetchpriority_removed = n;
        let (text, n) = self.validate_srcsets(&text, doc_dir);
        counts.srcset_pruned = n;
        let (text, n) = self.strip_editor_comments(&text);
        counts.comments_removed = n;
        let (text, n) = self.remove_empty_elements(&text);
        counts.empty_tags_removed = n;
        let (text, n) = self.defer_external_scripts(&text);
        counts.defer_added = n;

        (text, counts)
    }

    /// Rule 3: drop `srcset` candidates whose target does not exist.
    ///
    /// Absolute candidate paths resolve against the corpus root, relative
    /// ones against the document's directory; `http(s)://` URLs are always
    /// considered valid. When no candidate survives, the whole attribute is
    /// removed rather than emitting an empty one.
    pub fn validate_srcsets(&self, text: &str, doc_dir: &Path) -> (String, u64) {
        let mut pruned = 0u64;
        let out = SRCSET_RE.replace_all(text, |caps: &regex::Captures| {
            let mut valid: Vec<&str> = Vec::new();
            for candidate in caps[1].split(',') {
                let candidate = candidate.trim();
                let Some(url) = candidate.split_whitespace().next() else {
                    continue;
                };
                if self.candidate_exists(url, doc_dir) {
                    valid.push(candidate);
                } else {
                    pruned += 1;
                }
            }
            if valid.is_empty() {
                String::new()
            } else {
                format!(r#"srcset="{}""#, valid.join(", "))
            }
        });
        (out.into_owned(), pruned)
    }

    fn candidate_exists(&self, url: &str, doc_dir: &Path) -> bool {
        if url.starts_with("http://") || url.starts_with("https://") {
            return true;
        }
        if let Some(rooted) = url.strip_prefix('/') {
            self.root.join(rooted).exists()
        } else {
            doc_dir.join(url).exists()
        }
    }

    /// Rule 4: strip namespaced editor block comments, opening and closing.
    pub fn strip_editor_comments(&self, text: &str) -> (String, u64) {
        let Some(re) = &self.comment_re else {
            return (text.to_string(), 0);
        };
        let count = re.find_iter(text).count() as u64;
        if count == 0 {
            return (text.to_string(), 0);
        }
        (re.replace_all(text, "").into_owned(), count)
    }

    /// Rule 5: remove configured elements whose content is empty, iterating
    /// the whole tag set to a fixpoint — removing an inner empty element can
    /// expose an outer one that is now also empty.
    pub fn remove_empty_elements(&self, text: &str) -> (String, u64) {
        let mut text = text.to_string();
        let mut total = 0u64;
        loop {
            let mut removed = 0u64;
            for re in &self.empty_tag_res {
                let count = re.find_iter(&text).count() as u64;
                if count > 0 {
                    text = re.replace_all(&text, "").into_owned();
                    removed += count;
                }
            }
            if removed == 0 {
                break;
            }
            total += removed;
        }
        (text, total)
    }

    /// Rule 6: add `defer` to external scripts lacking an exempt attribute.
    /// Inline scripts (no `src`) never match.
    pub fn defer_external_scripts(&self, text: &str) -> (String, u64) {
        let mut count = 0u64;
        let out = SCRIPT_SRC_RE.replace_all(text, |caps: &regex::Captures| {
            let attrs = format!("{} {}", &caps[1], &caps[3]).to_lowercase();
            if self.defer_exempt.iter().any(|t| attrs.contains(t.as_str())) {
                return caps[0].to_string();
            }
            count += 1;
            format!(r#"<script defer {}src="{}"{}>"#, &caps[1], &caps[2], &caps[3])
        });
        (out.into_owned(), count)
    }
}

/// Run the mutation engine over every HTML document under `root`.
pub fn rewrite_documents(root: &Path, config: &OptimizeConfig) -> RunStats {
    let engine = HtmlEngine::new(root, config);
    let files = corpus::files_of_class(root, FileClass::Html);

    files
        .par_iter()
        .map(|path| {
            let mut stats = RunStats::default();
            let Ok(text) = fs::read_to_string(path) else {
                stats.documents_skipped += 1;
                return stats;
            };
            let doc_dir = path.parent().unwrap_or(root);
            let (rewritten, counts) = engine.rewrite(&text, doc_dir);
            if rewritten != text {
                if fs::write(path, &rewritten).is_ok() {
                    counts.fold_into(&mut stats);
                    stats.documents_rewritten += 1;
                } else {
                    stats.documents_skipped += 1;
                }
            }
            stats
        })
        .reduce(RunStats::default, RunStats::merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn engine(root: &Path) -> HtmlEngine {
        HtmlEngine::new(root, &OptimizeConfig::default())
    }

    // =========================================================================
    // Rule 1: lazy loading
    // =========================================================================

    #[test]
    fn lazy_skips_first_image_only() {
        let input = r#"<img src="a.webp"><img src="b.webp"><img src="c.webp">"#;
        let (out, count) = inject_lazy_loading(input);
        assert_eq!(count, 2);
        assert_eq!(
            out,
            r#"<img src="a.webp"><img loading="lazy" src="b.webp"><img loading="lazy" src="c.webp">"#
        );
    }

    #[test]
    fn lazy_respects_existing_loading_attribute() {
        let input = r#"<img src="a.webp"><img loading="eager" src="b.webp">"#;
        let (out, count) = inject_lazy_loading(input);
        assert_eq!(count, 0);
        assert_eq!(out, input);
    }

    #[test]
    fn lazy_is_idempotent() {
        let input = r#"<img src="a.webp"><img src="b.webp">"#;
        let (once, _) = inject_lazy_loading(input);
        let (twice, count) = inject_lazy_loading(&once);
        assert_eq!(once, twice);
        assert_eq!(count, 0);
    }

    #[test]
    fn lazy_preserves_uppercase_tag() {
        let input = r#"<IMG src="a.webp"><IMG src="b.webp">"#;
        let (out, count) = inject_lazy_loading(input);
        assert_eq!(count, 1);
        assert!(out.contains(r#"<IMG loading="lazy" src="b.webp">"#));
    }

    // =========================================================================
    // Rule 2: priority hints
    // =========================================================================

    #[test]
    fn fetchpriority_high_removed() {
        let input = r#"<img src="a.webp" fetchpriority="high">"#;
        let (out, count) = strip_priority_hints(input);
        assert_eq!(count, 1);
        assert_eq!(out, r#"<img src="a.webp">"#);
    }

    #[test]
    fn fetchpriority_low_kept() {
        let input = r#"<img src="a.webp" fetchpriority="low">"#;
        let (out, count) = strip_priority_hints(input);
        assert_eq!(count, 0);
        assert_eq!(out, input);
    }

    // =========================================================================
    // Rule 3: srcset validation
    // =========================================================================

    #[test]
    fn srcset_keeps_existing_drops_missing() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.webp"), "x").unwrap();

        let e = engine(tmp.path());
        let input = r#"<img srcset="/a.webp 400w, /missing.webp 800w">"#;
        let (out, pruned) = e.validate_srcsets(input, tmp.path());
        assert_eq!(pruned, 1);
        assert_eq!(out, r#"<img srcset="/a.webp 400w">"#);
    }

    #[test]
    fn srcset_removed_entirely_when_all_missing() {
        let tmp = TempDir::new().unwrap();
        let e = engine(tmp.path());
        let input = r#"<img src="a.webp" srcset="/gone.webp 400w, /also-gone.webp 800w">"#;
        let (out, pruned) = e.validate_srcsets(input, tmp.path());
        assert_eq!(pruned, 2);
        assert_eq!(out, r#"<img src="a.webp" >"#);
        // The surrounding tag is still valid markup
        assert!(out.starts_with("<img ") && out.ends_with('>'));
    }

    #[test]
    fn srcset_relative_paths_resolve_against_document_dir() {
        let tmp = TempDir::new().unwrap();
        let post_dir = tmp.path().join("posts");
        fs::create_dir_all(&post_dir).unwrap();
        fs::write(post_dir.join("pic.webp"), "x").unwrap();

        let e = engine(tmp.path());
        let input = r#"<img srcset="pic.webp 400w">"#;
        let (out, pruned) = e.validate_srcsets(input, &post_dir);
        assert_eq!(pruned, 0);
        assert_eq!(out, r#"<img srcset="pic.webp 400w">"#);
    }

    #[test]
    fn srcset_external_urls_always_valid() {
        let tmp = TempDir::new().unwrap();
        let e = engine(tmp.path());
        let input = r#"<img srcset="https://cdn.example.com/pic.webp 400w">"#;
        let (out, pruned) = e.validate_srcsets(input, tmp.path());
        assert_eq!(pruned, 0);
        assert_eq!(out, input);
    }

    // =========================================================================
    // Rule 4: editor comments
    // =========================================================================

    #[test]
    fn editor_comments_removed_open_and_close() {
        let tmp = TempDir::new().unwrap();
        let e = engine(tmp.path());
        let input = "<!-- wp:paragraph --><p>text</p><!-- /wp:paragraph -->";
        let (out, count) = e.strip_editor_comments(input);
        assert_eq!(count, 2);
        assert_eq!(out, "<p>text</p>");
    }

    #[test]
    fn editor_comments_namespaced_tokens_any_depth() {
        let tmp = TempDir::new().unwrap();
        let e = engine(tmp.path());
        let input = r#"<!-- wp:group/inner {"layout":"flex"} -->x<!-- /wp:group/inner -->"#;
        let (out, count) = e.strip_editor_comments(input);
        assert_eq!(count, 2);
        assert_eq!(out, "x");
    }

    #[test]
    fn plain_comments_kept() {
        let tmp = TempDir::new().unwrap();
        let e = engine(tmp.path());
        let input = "<!-- copyright notice --><p>text</p>";
        let (out, count) = e.strip_editor_comments(input);
        assert_eq!(count, 0);
        assert_eq!(out, input);
    }

    // =========================================================================
    // Rule 5: empty elements
    // =========================================================================

    #[test]
    fn nested_empty_elements_reduce_to_nothing() {
        let tmp = TempDir::new().unwrap();
        let e = engine(tmp.path());
        let (out, count) = e.remove_empty_elements("<div><span></span></div>");
        assert_eq!(out, "");
        assert_eq!(count, 2);
    }

    #[test]
    fn empty_elements_with_attributes_removed() {
        let tmp = TempDir::new().unwrap();
        let e = engine(tmp.path());
        let (out, count) = e.remove_empty_elements(r#"<p class="spacer">  </p>ok"#);
        assert_eq!(out, "ok");
        assert_eq!(count, 1);
    }

    #[test]
    fn non_empty_elements_kept() {
        let tmp = TempDir::new().unwrap();
        let e = engine(tmp.path());
        let input = "<p>text</p><div><img src=\"a.webp\"></div>";
        let (out, count) = e.remove_empty_elements(input);
        assert_eq!(out, input);
        assert_eq!(count, 0);
    }

    #[test]
    fn deeply_nested_shells_collapse_in_one_invocation() {
        let tmp = TempDir::new().unwrap();
        let e = engine(tmp.path());
        let (out, count) = e.remove_empty_elements("<div><div><p><span></span></p></div></div>x");
        assert_eq!(out, "x");
        assert_eq!(count, 4);
    }

    // =========================================================================
    // Rule 6: script deferral
    // =========================================================================

    #[test]
    fn external_script_gains_defer() {
        let tmp = TempDir::new().unwrap();
        let e = engine(tmp.path());
        let (out, count) = e.defer_external_scripts(r#"<script src="x.js"></script>"#);
        assert_eq!(count, 1);
        assert_eq!(out, r#"<script defer src="x.js"></script>"#);
    }

    #[test]
    fn async_script_left_byte_identical() {
        let tmp = TempDir::new().unwrap();
        let e = engine(tmp.path());
        let input = r#"<script src="x.js" async></script>"#;
        let (out, count) = e.defer_external_scripts(input);
        assert_eq!(count, 0);
        assert_eq!(out, input);
    }

    #[test]
    fn deferred_script_left_alone() {
        let tmp = TempDir::new().unwrap();
        let e = engine(tmp.path());
        let input = r#"<script defer src="x.js"></script>"#;
        let (out, count) = e.defer_external_scripts(input);
        assert_eq!(count, 0);
        assert_eq!(out, input);
    }

    #[test]
    fn inline_script_untouched() {
        let tmp = TempDir::new().unwrap();
        let e = engine(tmp.path());
        let input = "<script>var x = 1;</script>";
        let (out, count) = e.defer_external_scripts(input);
        assert_eq!(count, 0);
        assert_eq!(out, input);
    }

    // =========================================================================
    // Full engine
    // =========================================================================

    #[test]
    fn engine_applies_all_rules_in_order() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.webp"), "x").unwrap();

        let e = engine(tmp.path());
        let input = concat!(
            "<!-- wp:image -->",
            r#"<img src="/a.webp" fetchpriority="high">"#,
            r#"<img src="/a.webp" srcset="/a.webp 400w, /gone.webp 800w">"#,
            "<p></p>",
            r#"<script src="x.js"></script>"#,
            "<!-- /wp:image -->",
        );
        let (out, counts) = e.rewrite(input, tmp.path());

        assert_eq!(counts.lazy_added, 1);
        assert_eq!(counts.fetchpriority_removed, 1);
        assert_eq!(counts.srcset_pruned, 1);
        assert_eq!(counts.comments_removed, 2);
        assert_eq!(counts.empty_tags_removed, 1);
        assert_eq!(counts.defer_added, 1);
        assert!(out.contains(r#"<img loading="lazy" src="/a.webp" srcset="/a.webp 400w">"#));
        assert!(out.contains(r#"<script defer src="x.js">"#));
        assert!(!out.contains("wp:image"));
    }

    #[test]
    fn engine_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.webp"), "x").unwrap();

        let e = engine(tmp.path());
        let input = concat!(
            r#"<img src="/a.webp"><img src="/a.webp">"#,
            "<div><span></span></div>",
            r#"<script src="x.js"></script>"#,
        );
        let (once, _) = e.rewrite(input, tmp.path());
        let (twice, counts) = e.rewrite(&once, tmp.path());
        assert_eq!(once, twice);
        assert_eq!(counts, RuleCounts::default());
    }

    #[test]
    fn stage_rewrites_only_changed_documents() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("page.html"),
            r#"<img src="a.webp"><img src="b.webp">"#,
        )
        .unwrap();
        fs::write(tmp.path().join("clean.html"), "<p>hello</p>").unwrap();

        let stats = rewrite_documents(tmp.path(), &OptimizeConfig::default());
        assert_eq!(stats.documents_rewritten, 1);
        assert_eq!(stats.lazy_added, 1);

        let again = rewrite_documents(tmp.path(), &OptimizeConfig::default());
        assert_eq!(again.documents_rewritten, 0);
    }
}
