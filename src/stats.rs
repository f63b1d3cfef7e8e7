//! Run statistics accumulation.
//!
//! Every stage reports its work through a [`RunStats`] value: one counter per
//! observable event, incremented once per event, read only at the end of the
//! run. Counters never drive control decisions — a stage that consulted its
//! own statistics would couple observability to behavior.
//!
//! The accumulator is run-scoped, not process-wide: each stage builds its own
//! `RunStats` (workers accumulate privately and [`merge`](RunStats::merge) at
//! stage end) and the pipeline folds the stage results together. Running two
//! pipelines in one process — the test suite does — cannot leak counts
//! between runs.

use serde::Serialize;

/// Counters for a single pipeline run.
///
/// Serialized as the machine-readable run report (`--report-json`); the
/// field names are the report contract a test harness asserts against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// HTML documents whose link targets were rewritten.
    pub links_rewritten: u64,
    /// HTML documents changed by the mutation engine.
    pub documents_rewritten: u64,
    /// Stylesheets changed by the mutation engine.
    pub stylesheets_rewritten: u64,
    /// Text files that could not be read or written (left untouched).
    pub documents_skipped: u64,
    /// Images whose width exceeded the threshold and were scaled down.
    pub images_resized: u64,
    /// Images whose re-encoding was accepted (strictly smaller).
    pub images_compressed: u64,
    /// Images that failed to decode or encode (left untouched).
    pub images_skipped: u64,
    /// `loading="lazy"` attributes injected.
    pub lazy_added: u64,
    /// `fetchpriority="high"` attributes removed.
    pub fetchpriority_removed: u64,
    /// `srcset` candidates pruned because their file is missing.
    pub srcset_pruned: u64,
    /// Editor block comments removed.
    pub comments_removed: u64,
    /// Empty elements removed (all fixpoint iterations counted).
    pub empty_tags_removed: u64,
    /// `defer` attributes added to external scripts.
    pub defer_added: u64,
    /// `font-display:swap` declarations inserted.
    pub font_display_added: u64,
    /// Files accepted by the minification stage.
    pub files_minified: u64,
}

impl RunStats {
    /// Fold another accumulator into this one. Used both for per-worker
    /// accumulation within a stage and for combining stage results.
    pub fn merge(&mut self, other: RunStats) {
        self.links_rewritten += other.links_rewritten;
        self.documents_rewritten += other.documents_rewritten;
        self.stylesheets_rewritten += other.stylesheets_rewritten;
        self.documents_skipped += other.documents_skipped;
        self.images_resized += other.images_resized;
        self.images_compressed += other.images_compressed;
        self.images_skipped += other.images_skipped;
        self.lazy_added += other.lazy_added;
        self.fetchpriority_removed += other.fetchpriority_removed;
        self.srcset_pruned += other.srcset_pruned;
        self.comments_removed += other.comments_removed;
        self.empty_tags_removed += other.empty_tags_removed;
        self.defer_added += other.defer_added;
        self.font_display_added += other.font_display_added;
        self.files_minified += other.files_minified;
    }

    /// Merging variant for rayon's `reduce`.
    pub fn merged(mut self, other: RunStats) -> RunStats {
        self.merge(other);
        self
    }

    /// True when no file on disk was changed by the run.
    ///
    /// Skip counters are ignored: a skipped file is observed, not mutated.
    pub fn no_writes(&self) -> bool {
        self.links_rewritten == 0
            && self.documents_rewritten == 0
            && self.stylesheets_rewritten == 0
            && self.images_compressed == 0
            && self.files_minified == 0
    }
}
