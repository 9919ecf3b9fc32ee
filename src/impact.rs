//! Impact analysis: the layered blast radius of a symbol or a file.
//!
//! Symbol mode walks the reference graph breadth first. Layer 1 holds the
//! references of the target; every later layer holds the references of the
//! symbols that enclosed the previous layer's sites. File mode does the same
//! over importers.
//!
//! Both walks keep a per-query visited set (symbol names or file paths), so
//! cyclic graphs terminate: a visited symbol's sites are still reported but
//! it is never queued again. Beyond layer 1, sites enclosed by the target
//! itself are dropped. The set lives and dies with one call; nothing is
//! cached between queries.

use std::collections::{HashMap, HashSet};

use tracing::{debug, trace};

use crate::corpus::{DefinitionHints, FileSet, ImportResolver, is_binary};
use crate::errors::RippleError;
use crate::refs::RefFinder;
use crate::registry::{extension_of, parse_source};
use crate::types::{
    ImpactLayer, ImpactMode, ImpactRef, ImpactResult, ImpactSummary, ImpactTarget, RefMatch, Symbol,
};

/// Whether an impact target names a file rather than a symbol: it has a
/// path separator or an extension.
pub fn looks_like_path(target: &str) -> bool {
    target.contains('/') || target.contains('\\') || extension_of(target).is_some()
}

/// Canonical form of a file target: `/` separators, no leading `./`.
fn normalize_target(target: &str) -> String {
    let unified = target.replace('\\', "/");
    let mut path = unified.as_str();
    while let Some(rest) = path.strip_prefix("./") {
        path = rest;
    }
    path.to_string()
}

// ---------------------------------------------------------------------------
// Enclosing-symbol resolution
// ---------------------------------------------------------------------------

/// Symbols of the files touched by one query, parsed on first use.
struct SymbolTable<'a> {
    files: &'a dyn FileSet,
    by_path: HashMap<String, Vec<Symbol>>,
}

impl<'a> SymbolTable<'a> {
    fn new(files: &'a dyn FileSet) -> Self {
        Self {
            files,
            by_path: HashMap::new(),
        }
    }

    fn symbols(&mut self, path: &str) -> &[Symbol] {
        if !self.by_path.contains_key(path) {
            let parsed = self.parse(path);
            self.by_path.insert(path.to_string(), parsed);
        }
        self.by_path.get(path).map(Vec::as_slice).unwrap_or_default()
    }

    /// Unreadable, binary and unparsable files contribute no symbols.
    fn parse(&self, path: &str) -> Vec<Symbol> {
        let bytes = match self.files.read(path) {
            Ok(b) => b,
            Err(err) => {
                debug!(path, error = %err, "skipping unreadable file");
                return Vec::new();
            }
        };
        if is_binary(&bytes) {
            return Vec::new();
        }
        parse_source(path, &bytes).unwrap_or_else(|err| {
            debug!(path, error = %err, "skipping unparsable file");
            Vec::new()
        })
    }

    /// The smallest symbol in `path` whose range contains `line`; among
    /// equally small ranges, the one starting latest.
    fn enclosing(&mut self, path: &str, line: usize) -> Option<String> {
        self.symbols(path)
            .iter()
            .filter(|s| s.contains_line(line))
            .min_by(|a, b| {
                let span_a = a.last_line() - a.line;
                let span_b = b.last_line() - b.line;
                span_a.cmp(&span_b).then(b.line.cmp(&a.line))
            })
            .map(|s| s.name.clone())
    }
}

// ---------------------------------------------------------------------------
// The analyzer
// ---------------------------------------------------------------------------

/// Computes impact layers over a file set.
pub struct ImpactAnalyzer<'a> {
    files: &'a dyn FileSet,
    finder: RefFinder<'a>,
    imports: &'a dyn ImportResolver,
}

impl<'a> ImpactAnalyzer<'a> {
    pub fn new(files: &'a dyn FileSet, imports: &'a dyn ImportResolver) -> Self {
        Self {
            files,
            finder: RefFinder::new(files),
            imports,
        }
    }

    /// Use an authoritative definition source for every reference query.
    pub fn with_hints(mut self, hints: &'a dyn DefinitionHints) -> Self {
        self.finder = self.finder.with_hints(hints);
        self
    }

    /// Impact of `target`, as a file when it [looks like a path](looks_like_path)
    /// and as a symbol name otherwise.
    ///
    /// At most `max_depth` layers and `max_results` sites are returned.
    pub fn impact(&self, target: &str, max_depth: usize, max_results: usize) -> Result<ImpactResult, RippleError> {
        if looks_like_path(target) {
            self.impact_file(target, max_depth, max_results)
        } else {
            self.impact_symbol(target, max_depth, max_results)
        }
    }

    /// Symbol-mode impact. An unknown name gives an empty result.
    pub fn impact_symbol(&self, name: &str, max_depth: usize, max_results: usize) -> Result<ImpactResult, RippleError> {
        let direct = self.finder.refs(name, max_results)?;
        let target = ImpactTarget {
            name: name.to_string(),
            mode: ImpactMode::Symbol,
            definition: direct.definition,
        };

        let mut symbols = SymbolTable::new(self.files);
        let mut visited: HashSet<String> = HashSet::from([name.to_string()]);
        let mut layers: Vec<ImpactLayer> = Vec::new();
        let mut total = 0;
        let mut frontier: Vec<(String, Vec<RefMatch>)> = vec![(name.to_string(), direct.references)];

        for depth in 1..=max_depth {
            let mut refs = Vec::new();
            let mut discovered = Vec::new();

            'layer: for (via, matches) in &frontier {
                for m in matches {
                    if total + refs.len() >= max_results {
                        break 'layer;
                    }
                    let enclosing = symbols.enclosing(&m.path, m.line);
                    // A later site inside the target itself is a back-edge.
                    if depth > 1 && enclosing.as_deref() == Some(name) {
                        continue;
                    }
                    if let Some(e) = &enclosing
                        && visited.insert(e.clone())
                    {
                        discovered.push(e.clone());
                    }
                    refs.push(ImpactRef {
                        path: m.path.clone(),
                        line: m.line,
                        content: m.content.clone(),
                        enclosing_symbol: enclosing,
                        via: via.clone(),
                    });
                }
            }

            if refs.is_empty() {
                break;
            }
            total += refs.len();
            trace!(depth, sites = refs.len(), discovered = discovered.len(), "impact layer");
            layers.push(ImpactLayer { depth, refs });
            if total >= max_results || depth == max_depth {
                break;
            }

            frontier = Vec::with_capacity(discovered.len());
            for next in discovered {
                let found = self.finder.refs(&next, max_results - total)?;
                frontier.push((next, found.references));
            }
        }

        Ok(finish(target, layers))
    }

    /// File-mode impact over importers. The target must be in the file set.
    pub fn impact_file(&self, path: &str, max_depth: usize, max_results: usize) -> Result<ImpactResult, RippleError> {
        let path = normalize_target(path);
        if !self.files.contains(&path) {
            return Err(RippleError::TargetFileNotIndexed(path));
        }
        let target = ImpactTarget {
            name: path.clone(),
            mode: ImpactMode::File,
            definition: None,
        };

        let mut visited: HashSet<String> = HashSet::from([path.clone()]);
        let mut layers: Vec<ImpactLayer> = Vec::new();
        let mut total = 0;
        let mut frontier = vec![path];

        for depth in 1..=max_depth {
            let mut refs = Vec::new();

            'layer: for file in &frontier {
                for importer in self.imports.importers_of(file) {
                    if total + refs.len() >= max_results {
                        break 'layer;
                    }
                    if !visited.insert(importer.clone()) {
                        continue;
                    }
                    let (line, content) = self.imports.import_site(&importer, file).unwrap_or_default();
                    refs.push(ImpactRef {
                        path: importer,
                        line,
                        content,
                        enclosing_symbol: None,
                        via: file.clone(),
                    });
                }
            }

            if refs.is_empty() {
                break;
            }
            total += refs.len();
            trace!(depth, sites = refs.len(), "impact layer");
            frontier = refs.iter().map(|r| r.path.clone()).collect();
            layers.push(ImpactLayer { depth, refs });
            if total >= max_results {
                break;
            }
        }

        Ok(finish(target, layers))
    }
}

fn finish(target: ImpactTarget, layers: Vec<ImpactLayer>) -> ImpactResult {
    let files: HashSet<&str> = layers
        .iter()
        .flat_map(|l| l.refs.iter().map(|r| r.path.as_str()))
        .collect();
    let summary = ImpactSummary {
        total_files: files.len(),
        total_ref_sites: layers.iter().map(|l| l.refs.len()).sum(),
        max_depth_reached: layers.last().map_or(0, |l| l.depth),
    };
    debug!(
        target = %target.name,
        layers = layers.len(),
        sites = summary.total_ref_sites,
        "impact complete"
    );
    ImpactResult {
        target,
        layers,
        summary,
    }
}
