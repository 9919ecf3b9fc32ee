//! Heuristic import graph over a file set.
//!
//! Import statements are found per language with line regexes and resolved
//! to files in the same set:
//! - TypeScript / JavaScript: relative specifiers only (`./x`, `../y`)
//! - Python: absolute and relative (`from .mod import x`) module paths
//! - Go: import paths whose trailing segments name an indexed directory
//!
//! Anything that does not resolve to an indexed file (packages from a
//! registry, the standard library) is dropped.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::corpus::{FileSet, ImportResolver, is_binary};
use crate::registry::{LanguageParser, extension_of, registry};

// ---------------------------------------------------------------------------
// Statement patterns
// ---------------------------------------------------------------------------

static JS_FROM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(?:import|export|\})[^'"]*\bfrom\s*['"](?P<spec>[^'"]+)['"]"#)
        .expect("js from regex should compile")
});

static JS_SIDE_EFFECT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^import\s*['"](?P<spec>[^'"]+)['"]"#).expect("js side-effect regex should compile")
});

static JS_CALL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\b(?:require|import)\s*\(\s*['"](?P<spec>[^'"]+)['"]\s*\)"#)
        .expect("js call regex should compile")
});

static PY_FROM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^from\s+(?P<module>\.*[\w.]*)\s+import\s+(?P<names>.+)$").expect("py from regex should compile")
});

static PY_IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^import\s+(?P<modules>[\w.]+(?:\s+as\s+\w+)?(?:\s*,\s*[\w.]+(?:\s+as\s+\w+)?)*)")
        .expect("py import regex should compile")
});

static GO_SINGLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^import\s+(?:[\w.]+\s+)?"(?P<path>[^"]+)""#).expect("go import regex should compile")
});

static GO_GROUP_ENTRY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(?:[\w.]+\s+)?"(?P<path>[^"]+)""#).expect("go group entry regex should compile")
});

const SCRIPT_EXTENSIONS: &[&str] = &[".ts", ".tsx", ".mts", ".cts", ".js", ".jsx", ".mjs", ".cjs"];

/// ESM sources written in TypeScript import `./x.js` for a `./x.ts` file.
const SCRIPT_EXTENSION_SWAPS: &[(&str, &[&str])] = &[
    (".js", &[".ts", ".tsx"]),
    (".jsx", &[".tsx"]),
    (".mjs", &[".mts"]),
    (".cjs", &[".cts"]),
];

/// One import statement and the raw specifiers it names.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ImportStmt {
    /// 1-based line number.
    line: usize,
    /// The statement line, trimmed.
    text: String,
    specs: Vec<String>,
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

/// Directory part of a relative path; `""` for the root.
fn dir_of(path: &str) -> &str {
    path.rfind('/').map_or("", |i| &path[..i])
}

fn join(dir: &str, rest: &str) -> String {
    if dir.is_empty() {
        rest.to_string()
    } else {
        format!("{dir}/{rest}")
    }
}

/// Collapse `.` and `..` segments. `None` when the path climbs above the root.
fn normalize(path: &str) -> Option<String> {
    let mut parts: Vec<&str> = Vec::new();
    for seg in path.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            s => parts.push(s),
        }
    }
    Some(parts.join("/"))
}

// ---------------------------------------------------------------------------
// Statement scanning
// ---------------------------------------------------------------------------

fn scan_script(content: &str) -> Vec<ImportStmt> {
    let mut stmts = Vec::new();
    for (idx, raw) in content.lines().enumerate() {
        let text = raw.trim();
        if text.starts_with("//") || text.starts_with('*') {
            continue;
        }
        let mut specs: Vec<String> = Vec::new();
        for re in [&*JS_FROM_RE, &*JS_SIDE_EFFECT_RE] {
            if let Some(caps) = re.captures(text) {
                specs.push(caps["spec"].to_string());
            }
        }
        for caps in JS_CALL_RE.captures_iter(text) {
            specs.push(caps["spec"].to_string());
        }
        specs.dedup();
        if !specs.is_empty() {
            stmts.push(ImportStmt {
                line: idx + 1,
                text: text.to_string(),
                specs,
            });
        }
    }
    stmts
}

/// Python specifiers are emitted as dotted modules; `from m import a, b`
/// also yields `m.a` and `m.b`, since the names may be submodules.
fn scan_python(content: &str) -> Vec<ImportStmt> {
    let mut stmts = Vec::new();
    for (idx, raw) in content.lines().enumerate() {
        let text = raw.trim();
        let specs: Vec<String> = if let Some(caps) = PY_FROM_RE.captures(text) {
            let module = &caps["module"];
            let names = caps["names"].split('#').next().unwrap_or_default();
            let mut specs = vec![module.to_string()];
            for name in names.trim_matches(|c| c == '(' || c == ')' || c == '\\').split(',') {
                let name = name.split_whitespace().next().unwrap_or_default();
                if name.is_empty() || name == "*" {
                    continue;
                }
                let sep = if module.ends_with('.') { "" } else { "." };
                specs.push(format!("{module}{sep}{name}"));
            }
            specs
        } else if let Some(caps) = PY_IMPORT_RE.captures(text) {
            caps["modules"]
                .split(',')
                .filter_map(|m| m.split_whitespace().next())
                .map(str::to_string)
                .collect()
        } else {
            continue;
        };
        stmts.push(ImportStmt {
            line: idx + 1,
            text: text.to_string(),
            specs,
        });
    }
    stmts
}

fn scan_go(content: &str) -> Vec<ImportStmt> {
    let mut stmts = Vec::new();
    let mut in_group = false;
    for (idx, raw) in content.lines().enumerate() {
        let text = raw.trim();
        let path = if in_group {
            if text.starts_with(')') {
                in_group = false;
                continue;
            }
            GO_GROUP_ENTRY_RE.captures(text).map(|c| c["path"].to_string())
        } else if text.starts_with("import") && text.trim_start_matches("import").trim_start().starts_with('(') {
            in_group = !text.ends_with(')');
            continue;
        } else {
            GO_SINGLE_RE.captures(text).map(|c| c["path"].to_string())
        };
        if let Some(path) = path {
            stmts.push(ImportStmt {
                line: idx + 1,
                text: text.to_string(),
                specs: vec![path],
            });
        }
    }
    stmts
}

// ---------------------------------------------------------------------------
// The graph
// ---------------------------------------------------------------------------

/// Resolved import edges between files of one file set.
#[derive(Debug, Clone, Default)]
pub struct ImportGraph {
    /// importer -> imported files, in statement order
    imports: BTreeMap<String, Vec<String>>,
    /// imported file -> importers, in file-set order
    importers: HashMap<String, Vec<String>>,
    /// (importer, imported) -> first importing statement
    sites: HashMap<(String, String), (usize, String)>,
}

/// Lookup structures over the file list used during resolution.
struct Index<'a> {
    files: HashSet<&'a str>,
    /// directory -> `.go` files in it
    go_dirs: BTreeMap<&'a str, Vec<&'a str>>,
}

impl<'a> Index<'a> {
    fn new(files: &'a [String]) -> Self {
        let mut go_dirs: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for f in files.iter().filter(|f| f.ends_with(".go")) {
            go_dirs.entry(dir_of(f)).or_default().push(f);
        }
        Self {
            files: files.iter().map(String::as_str).collect(),
            go_dirs,
        }
    }

    fn has(&self, path: &str) -> bool {
        self.files.contains(path)
    }

    fn resolve_script(&self, importer: &str, spec: &str) -> Vec<String> {
        let relative = spec == "." || spec == ".." || spec.starts_with("./") || spec.starts_with("../");
        if !relative {
            return Vec::new();
        }
        let Some(base) = normalize(&join(dir_of(importer), spec)) else {
            return Vec::new();
        };

        let mut candidates = vec![base.clone()];
        if let Some(ext) = extension_of(&base)
            && let Some((_, swaps)) = SCRIPT_EXTENSION_SWAPS.iter().find(|(from, _)| *from == ext)
        {
            let stem = &base[..base.len() - ext.len()];
            candidates.extend(swaps.iter().map(|to| format!("{stem}{to}")));
        }
        candidates.extend(SCRIPT_EXTENSIONS.iter().map(|ext| format!("{base}{ext}")));
        candidates.extend(SCRIPT_EXTENSIONS.iter().map(|ext| join(&base, &format!("index{ext}"))));

        candidates.into_iter().find(|c| self.has(c)).into_iter().collect()
    }

    fn resolve_python(&self, importer: &str, spec: &str) -> Vec<String> {
        let dots = spec.chars().take_while(|&c| c == '.').count();
        let module = spec[dots..].replace('.', "/");

        let bases: Vec<String> = if dots > 0 {
            let mut dir = dir_of(importer).to_string();
            for _ in 1..dots {
                if dir.is_empty() {
                    return Vec::new();
                }
                dir = dir_of(&dir).to_string();
            }
            vec![dir]
        } else {
            let here = dir_of(importer).to_string();
            if here.is_empty() { vec![here] } else { vec![here, String::new()] }
        };

        for base in bases {
            let stem = if module.is_empty() { base.clone() } else { join(&base, &module) };
            let mut candidates = Vec::new();
            if !module.is_empty() {
                candidates.push(format!("{stem}.py"));
                candidates.push(format!("{stem}.pyi"));
            }
            candidates.push(join(&stem, "__init__.py"));
            candidates.push(join(&stem, "__init__.pyi"));
            if let Some(found) = candidates.into_iter().find(|c| self.has(c)) {
                return vec![found];
            }
        }
        Vec::new()
    }

    /// Every `.go` file in the deepest indexed directory whose path is a
    /// `/`-suffix of the import path.
    fn resolve_go(&self, importer: &str, spec: &str) -> Vec<String> {
        let own = dir_of(importer);
        let best = self
            .go_dirs
            .keys()
            .filter(|dir| !dir.is_empty() && **dir != own)
            .filter(|dir| spec == **dir || spec.ends_with(&format!("/{dir}")))
            .max_by_key(|dir| dir.len());
        match best {
            Some(dir) => self.go_dirs[dir].iter().map(|f| f.to_string()).collect(),
            None => Vec::new(),
        }
    }
}

impl ImportGraph {
    /// Read every file once and resolve its imports against the set.
    pub fn build(files: &dyn FileSet) -> Self {
        let paths = files.files();
        let index = Index::new(&paths);
        let mut graph = ImportGraph::default();

        for importer in &paths {
            let Some(parser) = registry().for_path(importer) else {
                continue;
            };
            let bytes = match files.read(importer) {
                Ok(b) => b,
                Err(err) => {
                    debug!(path = %importer, error = %err, "skipping unreadable file");
                    continue;
                }
            };
            if is_binary(&bytes) {
                debug!(path = %importer, "skipping binary file");
                continue;
            }
            let content = String::from_utf8_lossy(&bytes);
            let stmts = match parser {
                LanguageParser::Go => scan_go(&content),
                LanguageParser::Script => scan_script(&content),
                LanguageParser::Python => scan_python(&content),
            };

            for stmt in stmts {
                for spec in &stmt.specs {
                    let targets = match parser {
                        LanguageParser::Go => index.resolve_go(importer, spec),
                        LanguageParser::Script => index.resolve_script(importer, spec),
                        LanguageParser::Python => index.resolve_python(importer, spec),
                    };
                    for target in targets {
                        graph.add_edge(importer, target, &stmt);
                    }
                }
            }
        }

        debug!(files = paths.len(), edges = graph.sites.len(), "import graph built");
        graph
    }

    fn add_edge(&mut self, importer: &str, target: String, stmt: &ImportStmt) {
        if target == importer {
            return;
        }
        let key = (importer.to_string(), target.clone());
        if self.sites.contains_key(&key) {
            return;
        }
        self.sites.insert(key, (stmt.line, stmt.text.clone()));
        self.imports.entry(importer.to_string()).or_default().push(target.clone());
        self.importers.entry(target).or_default().push(importer.to_string());
    }

    /// Files imported by `path`.
    pub fn imports_of(&self, path: &str) -> &[String] {
        self.imports.get(path).map(Vec::as_slice).unwrap_or_default()
    }

    /// Number of resolved edges.
    pub fn edge_count(&self) -> usize {
        self.sites.len()
    }
}

impl ImportResolver for ImportGraph {
    fn importers_of(&self, path: &str) -> Vec<String> {
        self.importers.get(path).cloned().unwrap_or_default()
    }

    fn import_site(&self, importer: &str, target: &str) -> Option<(usize, String)> {
        self.sites
            .get(&(importer.to_string(), target.to_string()))
            .cloned()
    }
}
