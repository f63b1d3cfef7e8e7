//! Run configuration.
//!
//! Handles loading and validating `config.toml` from the corpus root. All
//! options have stock defaults; a config file only needs the values it wants
//! to override, and unknown keys are rejected to catch typos early.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! domain = ""                    # Source domain to rewrite away from
//! base_path = ""                 # Deployment base path ("" = site root)
//! uploads_dir = "wp-content/uploads"  # Image subtree, relative to the root
//! comment_prefix = "wp"          # Namespace token of strippable comments
//! strip_suffix = "-optimized"    # Synthetic filename suffix to remove
//!
//! [images]
//! max_width = 800                # Resize threshold in pixels
//! quality = 85                   # Lossy re-encode quality (0-100)
//!
//! [html]
//! empty_tags = ["p", "span", "div"]     # Tags removed when empty
//! defer_exempt = ["defer", "async"]     # Attributes exempting a script
//!
//! [processing]
//! max_processes = 4              # Max parallel workers (omit for auto)
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Pipeline configuration loaded from `config.toml`.
///
/// All fields have defaults. Unknown keys are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptimizeConfig {
    /// Source domain whose absolute URLs are rewritten to the base path.
    /// Empty disables the domain rules (the corpus never carried them).
    pub domain: String,
    /// Target base path. Empty means root-relative deployment; otherwise
    /// must start with `/` and not end with one (e.g. `/blog`).
    pub base_path: String,
    /// Image subtree relative to the corpus root.
    pub uploads_dir: String,
    /// Namespace token of editor block comments (`<!-- token:... -->`)
    /// stripped from documents. Empty disables the rule.
    pub comment_prefix: String,
    /// Synthetic filename suffix (from an upstream variant generator) that
    /// has no physical file; stripped from asset references. Empty disables.
    pub strip_suffix: String,
    /// Image normalization settings.
    pub images: ImagesConfig,
    /// HTML mutation settings.
    pub html: HtmlConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Default for OptimizeConfig {
    fn default() -> Self {
        Self {
            domain: String::new(),
            base_path: String::new(),
            uploads_dir: "wp-content/uploads".to_string(),
            comment_prefix: "wp".to_string(),
            strip_suffix: "-optimized".to_string(),
            images: ImagesConfig::default(),
            html: HtmlConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl OptimizeConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.images.quality > 100 {
            return Err(ConfigError::Validation(
                "images.quality must be 0-100".into(),
            ));
        }
        if self.images.max_width == 0 {
            return Err(ConfigError::Validation(
                "images.max_width must be non-zero".into(),
            ));
        }
        if !self.base_path.is_empty() {
            if !self.base_path.starts_with('/') {
                return Err(ConfigError::Validation(
                    "base_path must start with '/' when set".into(),
                ));
            }
            if self.base_path.ends_with('/') {
                return Err(ConfigError::Validation(
                    "base_path must not end with '/'".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Image normalization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// Images wider than this are scaled down to it (height keeps ratio).
    pub max_width: u32,
    /// Lossy re-encode quality (0 = worst, 100 = best).
    pub quality: u32,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            max_width: 800,
            quality: 85,
        }
    }
}

/// HTML mutation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HtmlConfig {
    /// Tags removed when their trimmed content is empty.
    pub empty_tags: Vec<String>,
    /// Attributes whose presence exempts a script tag from deferral.
    pub defer_exempt: Vec<String>,
}

impl Default for HtmlConfig {
    fn default() -> Self {
        Self {
            empty_tags: vec!["p".into(), "span".into(), "div".into()],
            defer_exempt: vec!["defer".into(), "async".into()],
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

/// Load `config.toml` from the corpus root (defaults if absent), validated.
pub fn load_config(root: &Path) -> Result<OptimizeConfig, ConfigError> {
    let config_path = root.join("config.toml");
    let config = if config_path.exists() {
        let content = fs::read_to_string(&config_path)?;
        toml::from_str(&content)?
    } else {
        OptimizeConfig::default()
    };
    config.validate()?;
    Ok(config)
}

/// A fully documented stock `config.toml`, printed by `gen-config`.
pub fn stock_config_toml() -> String {
    let defaults = OptimizeConfig::default();
    format!(
        r#"# static-press configuration
# All options are optional - the values below are the stock defaults.

# Source domain to rewrite away from. Absolute references to this domain
# (scheme://domain/... and //domain/...) become base_path-relative links.
# Empty string disables the domain rules.
domain = "{domain}"

# Deployment base path. Empty string means the site is deployed at the
# server root; otherwise use a leading slash and no trailing slash,
# e.g. "/blog" for project-page hosting.
base_path = "{base_path}"

# Image subtree relative to the corpus root. Only images under this
# directory are normalized.
uploads_dir = "{uploads_dir}"

# Namespace token of editor block comments to strip, matching
# <!-- token:... --> and <!-- /token:... -->.
comment_prefix = "{comment_prefix}"

# Synthetic filename suffix produced by an upstream image-variant
# generator but absent from the delivered file set; removed from asset
# references so links resolve to files that exist.
strip_suffix = "{strip_suffix}"

[images]
# Images wider than max_width are resized down to it, height scaled by
# the same ratio. Width is never increased.
max_width = {max_width}
# Lossy re-encode quality (0-100). The re-encoded file replaces the
# original only when it is strictly smaller.
quality = {quality}

[html]
# Elements removed when their trimmed content is empty, iterated to a
# fixpoint so nested empty shells collapse fully.
empty_tags = ["p", "span", "div"]
# A script tag already carrying one of these attributes is not deferred.
defer_exempt = ["defer", "async"]

[processing]
# Maximum parallel workers. Omit for auto (one per CPU core).
# max_processes = 4
"#,
        domain = defaults.domain,
        base_path = defaults.base_path,
        uploads_dir = defaults.uploads_dir,
        comment_prefix = defaults.comment_prefix,
        strip_suffix = defaults.strip_suffix,
        max_width = defaults.images.max_width,
        quality = defaults.images.quality,
    )
}
