//! Configuration file parsing, defaults, and merging.
//!
//! Configuration is loaded in layers (last wins):
//! 1. Built-in defaults
//! 2. Global config from `~/.ripple/config.toml`
//! 3. Per-project config from `<root>/.ripple/config.toml`
//!
//! Each layer only overrides fields it explicitly sets; absent fields
//! keep their previous value. Command-line flags are applied on top by the
//! caller.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Name of the per-user and per-project configuration directory.
pub const CONFIG_DIR: &str = ".ripple";

// ---------------------------------------------------------------------------
// Resolved config types
// ---------------------------------------------------------------------------

/// Top-level configuration, fully resolved with defaults applied.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Config {
    pub refs: RefsConfig,
    pub impact: ImpactConfig,
    pub index: IndexConfig,
    pub ignore: IgnoreConfig,
}

/// Reference query settings.
#[derive(Debug, Clone, PartialEq)]
pub struct RefsConfig {
    /// Soft cap on reference lines per query.
    pub max_results: usize,
}

/// Impact query settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ImpactConfig {
    /// Number of hops to follow from the target.
    pub max_depth: usize,
    /// Budget of affected sites across all layers.
    pub max_results: usize,
}

/// File set settings.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexConfig {
    /// Files larger than this (in KiB) are left out of the file set.
    pub max_file_size_kb: u64,
    /// Extensions scanned for references in addition to the parsed languages.
    pub additional_extensions: Vec<String>,
}

/// Exclusion settings.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IgnoreConfig {
    /// Extra glob patterns excluded from the walk.
    pub patterns: Vec<String>,
}

impl Default for RefsConfig {
    fn default() -> Self {
        Self { max_results: 50 }
    }
}

impl Default for ImpactConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            max_results: 100,
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            max_file_size_kb: 1024,
            additional_extensions: Vec::new(),
        }
    }
}

impl IndexConfig {
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_kb.saturating_mul(1024)
    }

    /// `additional_extensions` normalised to the `.ext` form.
    pub fn extra_extensions(&self) -> Vec<String> {
        self.additional_extensions
            .iter()
            .map(|e| e.trim())
            .filter(|e| !e.is_empty() && *e != ".")
            .map(|e| {
                if e.starts_with('.') {
                    e.to_string()
                } else {
                    format!(".{e}")
                }
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Option-based overlay types (for partial deserialization)
// ---------------------------------------------------------------------------

/// Mirror of [`Config`] where every field is `Option`, so a partial TOML
/// file only touches the keys it contains.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigOverlay {
    refs: Option<RefsOverlay>,
    impact: Option<ImpactOverlay>,
    index: Option<IndexOverlay>,
    ignore: Option<IgnoreOverlay>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RefsOverlay {
    max_results: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ImpactOverlay {
    max_depth: Option<usize>,
    max_results: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct IndexOverlay {
    max_file_size_kb: Option<u64>,
    additional_extensions: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct IgnoreOverlay {
    patterns: Option<Vec<String>>,
}

impl Config {
    fn apply_overlay(&mut self, overlay: ConfigOverlay) {
        if let Some(refs) = overlay.refs
            && let Some(v) = refs.max_results
        {
            self.refs.max_results = v;
        }
        if let Some(imp) = overlay.impact {
            if let Some(v) = imp.max_depth {
                self.impact.max_depth = v;
            }
            if let Some(v) = imp.max_results {
                self.impact.max_results = v;
            }
        }
        if let Some(idx) = overlay.index {
            if let Some(v) = idx.max_file_size_kb {
                self.index.max_file_size_kb = v;
            }
            if let Some(v) = idx.additional_extensions {
                self.index.additional_extensions = v;
            }
        }
        if let Some(ign) = overlay.ignore
            && let Some(v) = ign.patterns
        {
            self.ignore.patterns = v;
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

fn home_dir() -> Option<PathBuf> {
    #[allow(deprecated)]
    std::env::home_dir()
}

fn parse_overlay(contents: &str, path: &Path) -> Result<ConfigOverlay> {
    toml::from_str(contents)
        .with_context(|| format!("failed to parse config file: {}", path.display()))
}

/// Read and parse one layer. A missing file is `Ok(None)`.
fn load_overlay(path: &Path) -> Result<Option<ConfigOverlay>> {
    match std::fs::read_to_string(path) {
        Ok(contents) => parse_overlay(&contents, path).map(Some),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => {
            Err(e).with_context(|| format!("failed to read config file {}", path.display()))
        }
    }
}

impl Config {
    /// Load configuration by merging
    /// defaults -> `~/.ripple/config.toml` -> `<root>/.ripple/config.toml`.
    pub fn load(project_root: Option<&Path>) -> Result<Config> {
        let global_dir = home_dir().map(|h| h.join(CONFIG_DIR));
        Self::load_with_global_dir(global_dir.as_deref(), project_root)
    }

    /// Load with an explicit global config directory instead of the home
    /// directory.
    fn load_with_global_dir(global_dir: Option<&Path>, project_root: Option<&Path>) -> Result<Config> {
        let mut config = Config::default();

        let layers = [
            global_dir.map(|dir| dir.join("config.toml")),
            project_root.map(|root| root.join(CONFIG_DIR).join("config.toml")),
        ];
        for path in layers.iter().flatten() {
            if let Some(overlay) = load_overlay(path)? {
                config.apply_overlay(overlay);
            }
        }

        Ok(config)
    }
}
