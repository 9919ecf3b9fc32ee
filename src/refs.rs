//! Reference finder: every line a symbol name occurs on, split into the
//! definition and its usages.
//!
//! Lines are found with a word-bounded literal matcher from the `grep`
//! crate. The definition is the first line, in file-then-line order, whose
//! trimmed text has a declaration shape for the name (see
//! [`DefinitionShapes`]), unless a [`DefinitionHints`] source names the
//! site outright. Everything else is a reference.

use std::io;

use grep::regex::{RegexMatcher, RegexMatcherBuilder};
use grep::searcher::{BinaryDetection, Searcher, SearcherBuilder, Sink, SinkMatch};
use regex::Regex;
use tracing::debug;

use crate::corpus::{DefinitionHints, FileSet, NoHints, is_binary};
use crate::errors::{RippleError, SearchError};
use crate::types::{RefMatch, RefsResult};

/// Declaration shapes, `{name}` standing for the escaped symbol name.
/// Matched against the trimmed line.
const DEFINITION_TEMPLATES: &[&str] = &[
    // func Name( / func (r *T) Name( / func Name[T any](
    r"^func\s+(?:\([^)]*\)\s*)?{name}\s*[\[(]",
    r"^(?:export\s+)?(?:default\s+)?(?:async\s+)?function\s*\*?\s*{name}\b",
    r"^(?:async\s+)?def\s+{name}\s*\(",
    r"^(?:export\s+)?(?:default\s+)?(?:abstract\s+)?class\s+{name}\b",
    r"^(?:export\s+)?(?:declare\s+)?interface\s+{name}\b",
    r"^(?:export\s+)?(?:declare\s+)?(?:const\s+)?enum\s+{name}\b",
    r"^(?:export\s+)?(?:declare\s+)?type\s+{name}\b",
    // a spec inside a grouped `type ( ... )`
    r"^{name}(?:\[[^\]]*\])?\s+(?:struct|interface)\b",
    r"^(?:export\s+)?(?:declare\s+)?(?:const|let|var)\s+{name}\b",
    // NAME = value, NAME: T = value, Go grouped `Name Type = value`
    r"^{name}(?:\s*:[^=]+|\s+[\w.*\[\]]+)?\s*=[^=]",
    // class member shorthand: name(args) {
    r"^(?:(?:public|private|protected|static|readonly|async|abstract|override|get|set)\s+)*{name}\s*(?:<[^>]*>)?\([^)]*\)\s*(?::[^{]*)?\{",
];

/// The compiled declaration shapes for one symbol name.
#[derive(Debug)]
pub struct DefinitionShapes {
    shapes: Vec<Regex>,
}

impl DefinitionShapes {
    pub fn new(name: &str) -> Result<Self, SearchError> {
        let escaped = regex::escape(name);
        let shapes = DEFINITION_TEMPLATES
            .iter()
            .map(|t| {
                Regex::new(&t.replace("{name}", &escaped))
                    .map_err(|e| SearchError::SearchFailed(format!("definition pattern for {name}: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { shapes })
    }

    /// Whether the trimmed line declares the name.
    pub fn is_match(&self, line: &str) -> bool {
        self.shapes.iter().any(|re| re.is_match(line))
    }
}

fn word_matcher(name: &str) -> Result<RegexMatcher, SearchError> {
    RegexMatcherBuilder::new()
        .word(true)
        .fixed_strings(true)
        .line_terminator(Some(b'\n'))
        .build(name)
        .map_err(|e| SearchError::SearchFailed(format!("{name}: {e}")))
}

/// Finds the definition and usages of symbol names across a [`FileSet`].
pub struct RefFinder<'a> {
    files: &'a dyn FileSet,
    hints: &'a dyn DefinitionHints,
}

impl<'a> RefFinder<'a> {
    pub fn new(files: &'a dyn FileSet) -> Self {
        Self { files, hints: &NoHints }
    }

    /// Use an authoritative definition source. A hinted site is always the
    /// definition and never a reference.
    pub fn with_hints(mut self, hints: &'a dyn DefinitionHints) -> Self {
        self.hints = hints;
        self
    }

    /// Definition and references of `name`.
    ///
    /// `max_results` is a soft cap on references. Once reached, the current
    /// file is still scanned for a missing definition, then the scan stops.
    /// Binary and unreadable files are skipped. A name that occurs nowhere
    /// gives an empty result.
    pub fn refs(&self, name: &str, max_results: usize) -> Result<RefsResult, RippleError> {
        let mut result = RefsResult::default();
        if name.trim().is_empty() {
            return Ok(result);
        }

        let matcher = word_matcher(name)?;
        let shapes = DefinitionShapes::new(name)?;
        let hint = self.hints.definition_of(name);
        if let Some((path, line)) = &hint {
            result.definition = Some(self.hinted_definition(path, *line));
        }

        let mut searcher = SearcherBuilder::new()
            .binary_detection(BinaryDetection::none())
            .line_number(true)
            .build();

        for path in self.files.files() {
            let bytes = match self.files.read(&path) {
                Ok(b) => b,
                Err(err) => {
                    debug!(path = %path, error = %err, "skipping unreadable file");
                    continue;
                }
            };
            if is_binary(&bytes) {
                debug!(path = %path, "skipping binary file");
                continue;
            }

            let mut sink = RefSink {
                path: &path,
                shapes: &shapes,
                hint: hint.as_ref(),
                max_results,
                result: &mut result,
            };
            if let Err(err) = searcher.search_slice(&matcher, &bytes, &mut sink) {
                debug!(path = %path, error = %err, "search failed, skipping file");
            }

            if result.references.len() >= max_results {
                break;
            }
        }

        result.total_references = result.references.len();
        debug!(
            symbol = name,
            references = result.total_references,
            defined = result.definition.is_some(),
            "refs complete"
        );
        Ok(result)
    }

    fn hinted_definition(&self, path: &str, line: usize) -> RefMatch {
        let content = self
            .files
            .read(path)
            .ok()
            .and_then(|bytes| {
                let text = String::from_utf8_lossy(&bytes);
                text.lines().nth(line.checked_sub(1)?).map(|l| l.trim().to_string())
            })
            .unwrap_or_default();
        RefMatch {
            path: path.to_string(),
            line,
            content,
            is_definition: true,
        }
    }
}

/// Classifies each matching line of one file.
struct RefSink<'s> {
    path: &'s str,
    shapes: &'s DefinitionShapes,
    hint: Option<&'s (String, usize)>,
    max_results: usize,
    result: &'s mut RefsResult,
}

impl RefSink<'_> {
    fn wants_more(&self) -> bool {
        self.result.references.len() < self.max_results || self.result.definition.is_none()
    }
}

impl Sink for RefSink<'_> {
    type Error = io::Error;

    fn matched(&mut self, _searcher: &Searcher, mat: &SinkMatch<'_>) -> Result<bool, io::Error> {
        let line = mat.line_number().unwrap_or(0) as usize;
        let content = String::from_utf8_lossy(mat.bytes()).trim().to_string();

        match self.hint {
            Some((path, hinted)) if path == self.path && *hinted == line => {
                return Ok(self.wants_more());
            }
            None if self.result.definition.is_none() && self.shapes.is_match(&content) => {
                self.result.definition = Some(RefMatch {
                    path: self.path.to_string(),
                    line,
                    content,
                    is_definition: true,
                });
                return Ok(self.wants_more());
            }
            _ => {}
        }

        if self.result.references.len() < self.max_results {
            self.result.references.push(RefMatch {
                path: self.path.to_string(),
                line,
                content,
                is_definition: false,
            });
        }
        Ok(self.wants_more())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::corpus::MemoryFileSet;

    fn helper_project() -> MemoryFileSet {
        MemoryFileSet::new()
            .with("lib.go", "package lib\n\nfunc Helper() {}\n")
            .with(
                "main.go",
                "package main\n\nfunc main() {\n\tlib.Helper()\n\tlib.Helper()\n\tHelperX()\n}\n",
            )
    }

    // ---------- definition shapes ----------

    #[test]
    fn shapes_recognise_declarations() {
        let cases: &[(&str, &str)] = &[
            ("Helper", "func Helper() {}"),
            ("Area", "func (c *Circle) Area() float64 {"),
            ("Map", "func Map[T any](xs []T) []T {"),
            ("load", "export async function load(path: string) {"),
            ("gen", "function* gen() {"),
            ("fetch", "async def fetch(self, key):"),
            ("Service", "export default class Service {"),
            ("Repo", "class Repo(Base):"),
            ("Options", "export interface Options {"),
            ("Color", "export const enum Color {"),
            ("Id", "type Id = string;"),
            ("Shape", "type Shape interface {"),
            ("Point", "Point struct {"),
            ("handler", "const handler = (req) => {"),
            ("MAX_SIZE", "MAX_SIZE = 100"),
            ("Timeout", "Timeout Duration = 30"),
            ("render", "public async render(props: Props): Promise<void> {"),
        ];
        for (name, line) in cases {
            let shapes = DefinitionShapes::new(name).unwrap();
            assert!(shapes.is_match(line), "{name} should be defined by: {line}");
        }
    }

    #[test]
    fn shapes_reject_usages() {
        let cases: &[(&str, &str)] = &[
            ("Helper", "lib.Helper()"),
            ("Helper", "x := Helper()"),
            ("render", "this.render(props);"),
            ("MAX_SIZE", "if size == MAX_SIZE:"),
            ("MAX_SIZE", "MAX_SIZE == 1"),
            ("load", "await load(path)"),
            ("Repo", "repo = Repo(path)"),
        ];
        for (name, line) in cases {
            let shapes = DefinitionShapes::new(name).unwrap();
            assert!(!shapes.is_match(line), "{name} should not be defined by: {line}");
        }
    }

    #[test]
    fn names_with_regex_metacharacters_are_literal() {
        let shapes = DefinitionShapes::new("$store").unwrap();
        assert!(shapes.is_match("const $store = createStore();"));
        assert!(!shapes.is_match("const xstore = createStore();"));
    }

    // ---------- refs ----------

    #[test]
    fn finds_definition_and_call_sites() {
        let files = helper_project();
        let result = RefFinder::new(&files).refs("Helper", 50).unwrap();

        let def = result.definition.expect("definition should be found");
        assert_eq!((def.path.as_str(), def.line), ("lib.go", 3));
        assert!(def.is_definition);
        assert_eq!(def.content, "func Helper() {}");

        let sites: Vec<(&str, usize)> = result
            .references
            .iter()
            .map(|r| (r.path.as_str(), r.line))
            .collect();
        assert_eq!(sites, vec![("main.go", 4), ("main.go", 5)], "HelperX must not match");
        assert_eq!(result.total_references, 2);
        assert!(result.references.iter().all(|r| !r.is_definition));
        assert_eq!(result.references[0].content, "lib.Helper()");
    }

    #[test]
    fn unknown_name_is_empty_not_error() {
        let files = helper_project();
        let result = RefFinder::new(&files).refs("Nowhere", 50).unwrap();
        assert_eq!(result, RefsResult::default());

        let blank = RefFinder::new(&files).refs("  ", 50).unwrap();
        assert_eq!(blank, RefsResult::default());
    }

    #[test]
    fn first_definition_in_file_order_wins() {
        let files = MemoryFileSet::new()
            .with("b.py", "def run():\n    pass\n")
            .with("a.ts", "export function run() {}\n");
        let result = RefFinder::new(&files).refs("run", 50).unwrap();
        assert_eq!(result.definition.unwrap().path, "a.ts");
        assert_eq!(result.references.len(), 1);
        assert_eq!(result.references[0].path, "b.py");
    }

    #[test]
    fn hint_supersedes_heuristic_definition() {
        let files = helper_project();
        let mut hints = HashMap::new();
        hints.insert("Helper".to_string(), ("main.go".to_string(), 4));

        let result = RefFinder::new(&files)
            .with_hints(&hints)
            .refs("Helper", 50)
            .unwrap();

        let def = result.definition.unwrap();
        assert_eq!((def.path.as_str(), def.line), ("main.go", 4));
        assert_eq!(def.content, "lib.Helper()");
        assert!(
            !result.references.iter().any(|r| r.path == "main.go" && r.line == 4),
            "hinted site must not be a reference"
        );
        let sites: Vec<(&str, usize)> = result
            .references
            .iter()
            .map(|r| (r.path.as_str(), r.line))
            .collect();
        assert_eq!(sites, vec![("lib.go", 3), ("main.go", 5)]);
    }

    #[test]
    fn binary_files_contribute_nothing() {
        let mut blob = b"\0\x01\x02".to_vec();
        blob.extend_from_slice(b"\nfunc Helper() {}\nHelper()\n");
        let files = MemoryFileSet::new()
            .with("a.bin.go", blob)
            .with("b.go", "package b\n\nfunc use() { Helper() }\n");

        let result = RefFinder::new(&files).refs("Helper", 50).unwrap();
        assert!(result.definition.is_none());
        assert_eq!(result.references.len(), 1);
        assert_eq!(result.references[0].path, "b.go");
    }

    #[test]
    fn cap_still_finds_definition_in_current_file() {
        let files = MemoryFileSet::new()
            .with("a.ts", "use(x);\nuse(x);\nuse(x);\nuse(x);\nfunction x() {}\n")
            .with("b.ts", "use(x);\n");

        let result = RefFinder::new(&files).refs("x", 2).unwrap();
        assert_eq!(result.references.len(), 2);
        assert_eq!(result.total_references, 2);
        assert_eq!(result.definition.unwrap().line, 5);
        assert!(result.references.iter().all(|r| r.path == "a.ts"), "scan stops after the capped file");
    }

    #[test]
    fn cap_stops_before_later_files() {
        let files = MemoryFileSet::new()
            .with("a.go", "package a\n\nfunc f() { Target() }\n")
            .with("b.go", "package b\n\nfunc Target() {}\n");

        let result = RefFinder::new(&files).refs("Target", 1).unwrap();
        assert_eq!(result.references.len(), 1);
        assert!(result.definition.is_none(), "definition in a later file is past the cap");
    }
}
