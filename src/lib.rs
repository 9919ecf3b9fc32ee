//! ripple - polyglot symbol extraction with reference and impact analysis.
//!
//! Symbols are extracted per file by the extractor registered for its
//! extension ([`registry`]). [`RefFinder`] classifies every occurrence of a
//! name across a [`FileSet`] as definition or usage, and [`ImpactAnalyzer`]
//! turns those occurrences (or import edges) into a layered blast radius.

pub mod brace;
pub mod config;
pub mod corpus;
pub mod errors;
pub mod golang;
pub mod impact;
pub mod imports;
pub mod indent;
pub mod refs;
pub mod registry;
pub mod types;
pub mod walker;

pub use config::Config;
pub use corpus::{DefinitionHints, DiskFileSet, FileSet, ImportResolver, MemoryFileSet, NoHints, is_binary};
pub use errors::{ParseError, RippleError, SearchError};
pub use impact::{ImpactAnalyzer, looks_like_path};
pub use imports::ImportGraph;
pub use refs::RefFinder;
pub use registry::{LanguageParser, Registry, parse_source};
pub use types::{
    ImpactLayer, ImpactMode, ImpactRef, ImpactResult, ImpactSummary, ImpactTarget, RefMatch, RefsResult, Symbol,
    SymbolKind,
};
