//! # Static Press
//!
//! Turns a directory tree of web assets extracted from a dynamic CMS export
//! into a static, deploy-ready corpus. The filesystem is the data source and
//! the destination: there is no manifest, no database — files are mutated in
//! place, and only when a stage's acceptance condition holds.
//!
//! # Architecture: Five-Stage Pipeline
//!
//! ```text
//! 1. Links    absolute/domain references → base-path links   (HTML)
//! 2. Images   resize + flatten + re-encode, size-gated       (uploads)
//! 3. HTML     six ordered mutation rules                     (HTML)
//! 4. CSS      font-display injection                         (CSS)
//! 5. Minify   best-effort compaction, size-gated             (HTML/CSS/JS)
//! ```
//!
//! Each stage is a complete pass over its file class before the next stage
//! begins; later rules assume earlier rules' output. Within a stage, files
//! are independent and processed in parallel.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`corpus`] | File enumeration by extension class |
//! | [`config`] | `config.toml` loading, defaults, validation |
//! | [`links`] | Stage 1 — domain and base-path link rewriting |
//! | [`images`] | Stage 2 — image normalization with the size gate |
//! | [`html`] | Stage 3 — the six-rule document mutation engine |
//! | [`css`] | Stage 4 — `@font-face` font-display injection |
//! | [`minify`] | Stage 5 — capability-gated compaction |
//! | [`pipeline`] | Stage ordering and barriers |
//! | [`stats`] | Run-scoped counters and the report contract |
//! | [`output`] | CLI report formatting |
//!
//! # Design Decisions
//!
//! ## Acceptance Over Faith
//!
//! Every lossy or destructive transformation is gated on a measurable
//! improvement. Images are overwritten only when the re-encoding is
//! strictly smaller than the original bytes; minified text replaces a file
//! only when strictly shorter. A transformation that cannot demonstrate an
//! improvement is discarded and the original kept — size reduction is never
//! bought with correctness.
//!
//! ## Pattern Rules, Not a DOM
//!
//! The mutation engines run regex pattern passes over markup rather than
//! parsing a document tree. The corpus is narrow, machine-generated, and
//! well-formed enough for patterns to locate real markup; anything a
//! pattern fails to match is left alone. Each rule sits behind a
//! `(text) -> (text, count)` interface so a parser-backed implementation
//! could replace any single rule without touching the sequencing.
//!
//! ## Idempotent Reruns
//!
//! Rules either detect their own prior output (`loading=` present, `defer`
//! present, `font-display` present), iterate to a fixpoint (empty-element
//! elimination), or normalize to a stable form (base-path collapse). A
//! second run over an already-processed corpus produces zero diffs, so the
//! tool can be re-run after every fresh export without damage.
//!
//! ## Forward Progress Over Any Single File
//!
//! No per-file failure aborts the run. Undecodable images, unreadable
//! documents, and unparseable scripts are skipped and counted; the skip
//! counters make the failures observable in the run report instead of
//! swallowed.

pub mod config;
pub mod corpus;
pub mod css;
pub mod html;
pub mod images;
pub mod links;
pub mod minify;
pub mod output;
pub mod pipeline;
pub mod stats;
