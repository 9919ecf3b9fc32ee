//! Shared types and data structures.

use std::fmt;

use serde::Serialize;

/// The kind of a symbol definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Func,
    Method,
    Struct,
    Interface,
    Type,
    Const,
    Var,
    Class,
    Enum,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SymbolKind::Func => "func",
            SymbolKind::Method => "method",
            SymbolKind::Struct => "struct",
            SymbolKind::Interface => "interface",
            SymbolKind::Type => "type",
            SymbolKind::Const => "const",
            SymbolKind::Var => "var",
            SymbolKind::Class => "class",
            SymbolKind::Enum => "enum",
        };
        write!(f, "{s}")
    }
}

/// A symbol declaration extracted from one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Symbol {
    /// The symbol name (e.g. function name, class name).
    pub name: String,
    /// What kind of symbol this is.
    pub kind: SymbolKind,
    /// 1-based line number where the declaration starts.
    pub line: usize,
    /// 1-based line number where the declaration ends, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_line: Option<usize>,
    /// Whether the symbol is visible outside its module.
    pub exported: bool,
    /// One-line signature text for display.
    pub signature: String,
    /// Enclosing type name. Set exactly when `kind` is [`SymbolKind::Method`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

impl Symbol {
    /// Last line covered by this declaration. An unknown end collapses to
    /// the start line.
    pub fn last_line(&self) -> usize {
        self.end_line.unwrap_or(self.line).max(self.line)
    }

    /// Whether `line` falls inside `[line, last_line]`.
    pub fn contains_line(&self, line: usize) -> bool {
        self.line <= line && line <= self.last_line()
    }
}

/// One line in which a symbol name occurs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefMatch {
    /// Relative path of the file.
    pub path: String,
    /// 1-based line number.
    pub line: usize,
    /// The source line, trimmed.
    pub content: String,
    /// Whether this line was classified as the definition.
    pub is_definition: bool,
}

/// Result of a reference query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RefsResult {
    pub definition: Option<RefMatch>,
    pub references: Vec<RefMatch>,
    /// Number of usage lines found before the scan stopped.
    pub total_references: usize,
}

/// How an impact target was interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactMode {
    Symbol,
    File,
}

/// The subject of an impact query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImpactTarget {
    pub name: String,
    pub mode: ImpactMode,
    /// Definition site, symbol mode only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<RefMatch>,
}

/// One affected site within an impact layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImpactRef {
    pub path: String,
    /// 1-based line of the usage or import; 0 when the importer line is unknown.
    pub line: usize,
    pub content: String,
    /// The symbol whose line range contains this site.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enclosing_symbol: Option<String>,
    /// The symbol name or file this site depends on.
    pub via: String,
}

/// All sites discovered at one hop from the target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImpactLayer {
    /// 1 for direct references, increasing by one per hop.
    pub depth: usize,
    pub refs: Vec<ImpactRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImpactSummary {
    /// Distinct files across all layers.
    pub total_files: usize,
    /// Sum of site counts across layers.
    pub total_ref_sites: usize,
    /// Deepest layer emitted. Never exceeds the requested depth.
    pub max_depth_reached: usize,
}

/// Layered blast radius of a symbol or file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImpactResult {
    pub target: ImpactTarget,
    pub layers: Vec<ImpactLayer>,
    pub summary: ImpactSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(line: usize, end_line: Option<usize>) -> Symbol {
        Symbol {
            name: "f".into(),
            kind: SymbolKind::Func,
            line,
            end_line,
            exported: true,
            signature: String::new(),
            parent: None,
        }
    }

    #[test]
    fn unknown_end_collapses_to_start() {
        let s = sym(7, None);
        assert_eq!(s.last_line(), 7);
        assert!(s.contains_line(7));
        assert!(!s.contains_line(8));
    }

    #[test]
    fn contains_line_is_inclusive() {
        let s = sym(3, Some(9));
        assert!(s.contains_line(3));
        assert!(s.contains_line(9));
        assert!(!s.contains_line(2));
        assert!(!s.contains_line(10));
    }

    #[test]
    fn kind_display_matches_serde_name() {
        for kind in [
            SymbolKind::Func,
            SymbolKind::Method,
            SymbolKind::Struct,
            SymbolKind::Interface,
            SymbolKind::Type,
            SymbolKind::Const,
            SymbolKind::Var,
            SymbolKind::Class,
            SymbolKind::Enum,
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{kind}\""));
        }
    }
}
