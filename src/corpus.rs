//! The file set queries run over, and the other collaborators they consult.
//!
//! Reference and impact queries never touch the file system directly. They
//! go through [`FileSet`] for enumeration and reads, [`ImportResolver`] for
//! file-level dependencies and [`DefinitionHints`] for authoritative
//! definition sites. [`DiskFileSet`] is the walker-backed implementation used
//! by the binary; [`MemoryFileSet`] serves embedding callers and tests.

use std::collections::{BTreeMap, HashMap};
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::Config;
use crate::errors::RippleError;
use crate::registry::{extension_of, registry};
use crate::walker::Walker;

/// Bytes inspected by [`is_binary`].
pub const BINARY_SNIFF_LEN: usize = 512;

/// Whether `bytes` looks binary: a NUL within the first 512 bytes.
pub fn is_binary(bytes: &[u8]) -> bool {
    bytes.iter().take(BINARY_SNIFF_LEN).any(|&b| b == 0)
}

// ---------------------------------------------------------------------------
// Seams
// ---------------------------------------------------------------------------

/// An ordered set of indexed files.
pub trait FileSet {
    /// Relative, `/`-separated paths in lexicographic order.
    fn files(&self) -> Vec<String>;

    /// Full contents of one file in the set.
    fn read(&self, path: &str) -> io::Result<Vec<u8>>;

    fn contains(&self, path: &str) -> bool {
        self.files().iter().any(|f| f == path)
    }
}

/// File-level dependency edges.
pub trait ImportResolver {
    /// Files that import `path`, in file-set order.
    fn importers_of(&self, path: &str) -> Vec<String>;

    /// Line and trimmed text of the statement in `importer` that imports
    /// `target`, when known.
    fn import_site(&self, _importer: &str, _target: &str) -> Option<(usize, String)> {
        None
    }
}

/// Authoritative definition sites from a broader symbol index.
pub trait DefinitionHints {
    fn definition_of(&self, name: &str) -> Option<(String, usize)>;
}

/// No hints: definitions are always found heuristically.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHints;

impl DefinitionHints for NoHints {
    fn definition_of(&self, _name: &str) -> Option<(String, usize)> {
        None
    }
}

impl DefinitionHints for HashMap<String, (String, usize)> {
    fn definition_of(&self, name: &str) -> Option<(String, usize)> {
        self.get(name).cloned()
    }
}

impl ImportResolver for HashMap<String, Vec<String>> {
    fn importers_of(&self, path: &str) -> Vec<String> {
        self.get(path).cloned().unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// In-memory file set
// ---------------------------------------------------------------------------

/// A file set held in memory, ordered by path.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSet {
    files: BTreeMap<String, Vec<u8>>,
}

impl MemoryFileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a file.
    pub fn insert(&mut self, path: impl Into<String>, content: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), content.into());
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        self.insert(path, content);
        self
    }
}

impl<P, C> FromIterator<(P, C)> for MemoryFileSet
where
    P: Into<String>,
    C: Into<Vec<u8>>,
{
    fn from_iter<I: IntoIterator<Item = (P, C)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (path, content) in iter {
            set.insert(path, content);
        }
        set
    }
}

impl FileSet for MemoryFileSet {
    fn files(&self) -> Vec<String> {
        self.files.keys().cloned().collect()
    }

    fn read(&self, path: &str) -> io::Result<Vec<u8>> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("not in file set: {path}")))
    }

    fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }
}

// ---------------------------------------------------------------------------
// On-disk file set
// ---------------------------------------------------------------------------

/// The indexed files under a root directory.
///
/// The file list is enumerated once, at construction. Contents are read on
/// every [`read`](FileSet::read), so queries always see current bytes.
#[derive(Debug, Clone)]
pub struct DiskFileSet {
    root: PathBuf,
    files: Vec<String>,
}

impl DiskFileSet {
    /// Enumerate `root`: files with a registered extension or one listed in
    /// `index.additional_extensions`, no larger than `index.max_file_size_kb`,
    /// and not excluded by `.gitignore` or `ignore.patterns`.
    pub fn open(root: &Path, config: &Config) -> Result<Self, RippleError> {
        let extra = config.index.extra_extensions();
        let max_bytes = config.index.max_file_size_bytes();
        let walker = Walker::new(root).exclude(config.ignore.patterns.iter().cloned());

        let mut files = Vec::new();
        for path in walker.collect_paths()? {
            let Some(rel) = relative_path(root, &path) else {
                continue;
            };
            let indexed = match extension_of(&rel) {
                Some(ext) => registry().for_extension(ext).is_some() || extra.iter().any(|e| e == ext),
                None => false,
            };
            if !indexed {
                continue;
            }
            match std::fs::metadata(&path) {
                Ok(meta) if meta.len() > max_bytes => {
                    debug!(path = %rel, size = meta.len(), "skipping oversized file");
                }
                Ok(_) => files.push(rel),
                Err(err) => debug!(path = %rel, error = %err, "skipping unreadable file"),
            }
        }
        files.sort();

        debug!(root = %root.display(), files = files.len(), "file set enumerated");
        Ok(Self {
            root: root.to_path_buf(),
            files,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// `path` relative to `root`, with `/` separators.
fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<&str> = rel
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<_>>()?;
    Some(parts.join("/"))
}

impl FileSet for DiskFileSet {
    fn files(&self) -> Vec<String> {
        self.files.clone()
    }

    fn read(&self, path: &str) -> io::Result<Vec<u8>> {
        std::fs::read(self.root.join(path))
    }

    fn contains(&self, path: &str) -> bool {
        self.files.binary_search_by(|f| f.as_str().cmp(path)).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(root: &Path, relative: &str, content: &[u8]) {
        let p = root.join(relative);
        if let Some(parent) = p.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(p, content).unwrap();
    }

    // ---------- binary sniffing ----------

    #[test]
    fn nul_in_prefix_is_binary() {
        assert!(is_binary(b"abc\0def"));
        assert!(!is_binary(b"plain text\n"));
        assert!(!is_binary(b""));
    }

    #[test]
    fn nul_past_sniff_window_is_text() {
        let mut bytes = vec![b'a'; BINARY_SNIFF_LEN];
        bytes.push(0);
        assert!(!is_binary(&bytes));
        bytes[BINARY_SNIFF_LEN - 1] = 0;
        assert!(is_binary(&bytes));
    }

    // ---------- memory file set ----------

    #[test]
    fn memory_files_are_sorted() {
        let set: MemoryFileSet = [("z.go", "z"), ("a/b.py", "b"), ("m.ts", "m")].into_iter().collect();
        assert_eq!(set.files(), vec!["a/b.py", "m.ts", "z.go"]);
        assert!(set.contains("m.ts"));
        assert!(!set.contains("m"));
    }

    #[test]
    fn memory_read_missing_is_not_found() {
        let set = MemoryFileSet::new().with("a.go", "package a");
        assert_eq!(set.read("a.go").unwrap(), b"package a");
        let err = set.read("b.go").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    // ---------- collaborators ----------

    #[test]
    fn map_backed_collaborators() {
        let mut hints = HashMap::new();
        hints.insert("Helper".to_string(), ("lib.go".to_string(), 3));
        assert_eq!(hints.definition_of("Helper"), Some(("lib.go".to_string(), 3)));
        assert_eq!(hints.definition_of("Other"), None);
        assert_eq!(NoHints.definition_of("Helper"), None);

        let mut graph = HashMap::new();
        graph.insert("a.ts".to_string(), vec!["b.ts".to_string()]);
        assert_eq!(graph.importers_of("a.ts"), vec!["b.ts"]);
        assert!(graph.importers_of("b.ts").is_empty());
        assert_eq!(graph.import_site("b.ts", "a.ts"), None);
    }

    // ---------- disk file set ----------

    #[test]
    fn disk_set_keeps_registered_extensions_only() {
        let td = tempfile::tempdir().unwrap();
        write(td.path(), "main.go", b"package main\n");
        write(td.path(), "web/app.tsx", b"export const x = 1;\n");
        write(td.path(), "tool.py", b"X = 1\n");
        write(td.path(), "README.md", b"# readme\n");
        write(td.path(), "Makefile", b"all:\n");

        let set = DiskFileSet::open(td.path(), &Config::default()).unwrap();
        assert_eq!(set.files(), vec!["main.go", "tool.py", "web/app.tsx"]);
        assert!(set.contains("web/app.tsx"));
        assert!(!set.contains("README.md"));
        assert_eq!(set.read("tool.py").unwrap(), b"X = 1\n");
    }

    #[test]
    fn disk_set_honours_index_and_ignore_config() {
        let td = tempfile::tempdir().unwrap();
        write(td.path(), "docs/guide.md", b"see Helper\n");
        write(td.path(), "small.go", b"package a\n");
        write(td.path(), "big.go", &vec![b'/'; 2048]);
        write(td.path(), "gen/out.go", b"package gen\n");

        let mut config = Config::default();
        config.index.max_file_size_kb = 1;
        config.index.additional_extensions = vec!["md".into()];
        config.ignore.patterns = vec!["gen/".into()];

        let set = DiskFileSet::open(td.path(), &config).unwrap();
        assert_eq!(set.files(), vec!["docs/guide.md", "small.go"]);
    }

    #[test]
    fn disk_set_reads_current_contents() {
        let td = tempfile::tempdir().unwrap();
        write(td.path(), "a.py", b"A = 1\n");
        let set = DiskFileSet::open(td.path(), &Config::default()).unwrap();

        write(td.path(), "a.py", b"A = 2\n");
        assert_eq!(set.read("a.py").unwrap(), b"A = 2\n");
    }
}
