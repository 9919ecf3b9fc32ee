//! Parser registry: file extension to symbol extractor.
//!
//! The set of extractors is closed ([`LanguageParser`]); the registry only
//! decides which extensions route to which extractor. The process-wide table
//! is built once on first use and never changes afterwards.

use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use crate::errors::ParseError;
use crate::types::Symbol;
use crate::{brace, golang, indent};

/// One supported extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LanguageParser {
    /// Go, parsed with a full grammar.
    Go,
    /// TypeScript and JavaScript, via brace tracking.
    Script,
    /// Python, via indentation tracking.
    Python,
}

impl LanguageParser {
    /// Every extractor, in registration order.
    pub const ALL: [LanguageParser; 3] = [
        LanguageParser::Go,
        LanguageParser::Script,
        LanguageParser::Python,
    ];

    /// Returns the human-readable name for this extractor.
    pub fn name(self) -> &'static str {
        match self {
            LanguageParser::Go => "Go",
            LanguageParser::Script => "TypeScript/JavaScript",
            LanguageParser::Python => "Python",
        }
    }

    /// Extensions claimed by this extractor, leading dot included.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            LanguageParser::Go => &[".go"],
            LanguageParser::Script => &[".ts", ".tsx", ".mts", ".cts", ".js", ".jsx", ".mjs", ".cjs"],
            LanguageParser::Python => &[".py", ".pyi"],
        }
    }

    /// Extract symbols from `content`. `path` is only used in error labels.
    ///
    /// Only the grammar-parsed extractor can fail; the heuristic ones
    /// degrade to fewer symbols on odd input.
    pub fn parse(self, path: &str, content: &[u8]) -> Result<Vec<Symbol>, ParseError> {
        match self {
            LanguageParser::Go => golang::extract(path, content),
            LanguageParser::Script => Ok(brace::extract(&String::from_utf8_lossy(content))),
            LanguageParser::Python => Ok(indent::extract(&String::from_utf8_lossy(content))),
        }
    }
}

/// Extension lookup table.
#[derive(Debug, Default, Clone)]
pub struct Registry {
    by_ext: HashMap<&'static str, LanguageParser>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every built-in extractor registered.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for parser in LanguageParser::ALL {
            registry.register(parser);
        }
        registry
    }

    /// Bind `parser` to each extension it declares. A later registration
    /// of the same extension replaces the earlier one.
    pub fn register(&mut self, parser: LanguageParser) {
        for ext in parser.extensions() {
            self.by_ext.insert(*ext, parser);
        }
    }

    /// Look up the extractor for an extension such as `".go"`.
    /// Matching is case-sensitive.
    pub fn for_extension(&self, ext: &str) -> Option<LanguageParser> {
        self.by_ext.get(ext).copied()
    }

    /// Look up the extractor for a file path by its extension.
    pub fn for_path(&self, path: &str) -> Option<LanguageParser> {
        self.for_extension(extension_of(path)?)
    }

    /// All registered extensions, sorted.
    pub fn extensions(&self) -> Vec<&'static str> {
        let mut exts: Vec<&'static str> = self.by_ext.keys().copied().collect();
        exts.sort_unstable();
        exts
    }
}

static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::builtin);

/// The process-wide registry of built-in extractors.
pub fn registry() -> &'static Registry {
    &REGISTRY
}

/// The extension of the last path component, with its leading dot.
///
/// Dotfiles without a further extension (`.gitignore`) have none.
pub fn extension_of(path: &str) -> Option<&str> {
    let ext = Path::new(path).extension()?.to_str()?;
    let stem = path.strip_suffix(ext)?.strip_suffix('.')?;
    Some(&path[stem.len()..])
}

/// Parse `content` with whichever extractor is registered for `path`.
///
/// An unsupported extension is not an error: it yields no symbols.
pub fn parse_source(path: &str, content: &[u8]) -> Result<Vec<Symbol>, ParseError> {
    match registry().for_path(path) {
        Some(parser) => parser.parse(path, content),
        None => Ok(Vec::new()),
    }
}
