//! Link and path rewriting.
//!
//! First pipeline stage. Rewrites absolute references to the source domain
//! into base-path-relative links, prefixes root-relative attribute values
//! with the base path, and strips the synthetic variant suffix from asset
//! references.
//!
//! Rule order is load-bearing: the domain rules must run before the generic
//! root-attribute rule, otherwise a domain URL still carrying its scheme
//! would be mis-prefixed. The duplicate-prefix collapse runs after all
//! prefixing rules so a document whose links already carry the base path
//! comes out unchanged (and is therefore not rewritten on disk).

use crate::config::OptimizeConfig;
use crate::corpus::{self, FileClass};
use crate::stats::RunStats;
use rayon::prelude::*;
use regex::{NoExpand, Regex};
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

/// Root-relative values of the attributes that carry asset/page references.
static ROOT_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)(href|src|content)="(/[^"]*)""#).unwrap());

/// Compiled rewrite rules for one run. Build once, apply per document.
pub struct LinkRewriter {
    base_path: String,
    /// `scheme://domain/` — only when a domain is configured.
    absolute_domain_re: Option<Regex>,
    /// `//domain/` — matched after the scheme rule has run.
    protocol_domain_re: Option<Regex>,
    /// `suffix.ext` for the known image extensions.
    suffix_re: Option<Regex>,
}

impl LinkRewriter {
    pub fn new(config: &OptimizeConfig) -> Self {
        let (absolute_domain_re, protocol_domain_re) = if config.domain.is_empty() {
            (None, None)
        } else {
            let escaped = regex::escape(&config.domain);
            (
                Some(Regex::new(&format!("https?://{escaped}/")).unwrap()),
                Some(Regex::new(&format!("//{escaped}/")).unwrap()),
            )
        };
        let suffix_re = if config.strip_suffix.is_empty() {
            None
        } else {
            let escaped = regex::escape(&config.strip_suffix);
            Some(Regex::new(&format!(r"{escaped}(\.(?:png|jpe?g|webp|gif))")).unwrap())
        };
        Self {
            base_path: config.base_path.clone(),
            absolute_domain_re,
            protocol_domain_re,
            suffix_re,
        }
    }

    /// Apply all rules in order. Returns the rewritten text and the number
    /// of replacements made; the caller writes only when the text differs.
    pub fn rewrite(&self, text: &str) -> (String, u64) {
        let mut text = text.to_string();
        let mut applied = 0u64;
        let rooted = format!("{}/", self.base_path);

        if let Some(re) = &self.absolute_domain_re {
            applied += re.find_iter(&text).count() as u64;
            text = re.replace_all(&text, NoExpand(&rooted)).into_owned();
        }
        if let Some(re) = &self.protocol_domain_re {
            applied += re.find_iter(&text).count() as u64;
            text = re.replace_all(&text, NoExpand(&rooted)).into_owned();
        }

        // The remaining prefix rules are identities for root-relative
        // deployment; skipping them keeps the rewrite allocation-free there.
        if !self.base_path.is_empty() {
            let home = r#"href="/""#;
            let home_count = text.matches(home).count() as u64;
            if home_count > 0 {
                applied += home_count;
                text = text.replace(home, &format!(r#"href="{rooted}""#));
            }

            applied += ROOT_ATTR_RE.find_iter(&text).count() as u64;
            let base = self.base_path.as_str();
            text = ROOT_ATTR_RE
                .replace_all(&text, |caps: &regex::Captures| {
                    format!(r#"{}="{}{}""#, &caps[1], base, &caps[2])
                })
                .into_owned();

            // A value that already began with the base path now carries it
            // twice; collapse the artifact.
            let doubled = format!("{base}{base}");
            let doubled_count = text.matches(&doubled).count() as u64;
            if doubled_count > 0 {
                applied += doubled_count;
                text = text.replace(&doubled, base);
            }
        }

        if let Some(re) = &self.suffix_re {
            applied += re.find_iter(&text).count() as u64;
            text = re.replace_all(&text, "$1").into_owned();
        }

        (text, applied)
    }
}

/// Rewrite links in every HTML document under `root`.
///
/// A document is written back only when its content changed. Unreadable or
/// unwritable documents are counted as skipped and left untouched.
pub fn rewrite_links(root: &Path, config: &OptimizeConfig) -> RunStats {
    let rewriter = LinkRewriter::new(config);
    let files = corpus::files_of_class(root, FileClass::Html);

    files
        .par_iter()
        .map(|path| {
            let mut stats = RunStats::default();
            let Ok(text) = fs::read_to_string(path) else {
                stats.documents_skipped += 1;
                return stats;
            };
            let (rewritten, applied) = rewriter.rewrite(&text);
            if applied > 0 && rewritten != text {
                if fs::write(path, &rewritten).is_ok() {
                    stats.links_rewritten += 1;
                } else {
                    stats.documents_skipped += 1;
                }
            }
            stats
        })
        .reduce(RunStats::default, RunStats::merged)
}
