//! Source tree enumeration with gitignore support and default exclusions.
//!
//! Wraps the `ignore` crate's `WalkBuilder`:
//! - `.gitignore` / `.ignore` rules are honoured
//! - dependency and build output directories are always skipped
//! - hidden entries are skipped, except `.github`
//! - caller-supplied globs exclude further paths
//!
//! The walk is sequential and its output sorted, so every consumer sees the
//! same file order on an unchanged tree.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ignore::WalkBuilder;
use ignore::overrides::{Override, OverrideBuilder};
use tracing::debug;

/// Directories excluded from every walk, regardless of `.gitignore`.
const DEFAULT_EXCLUSIONS: &[&str] = &[
    "node_modules",
    "vendor",
    "target",
    "build",
    "dist",
    "__pycache__",
    ".venv",
];

/// Hidden names that are walked anyway.
const HIDDEN_ALLOWLIST: &[&str] = &[".github"];

/// A file-system walker rooted at one directory.
#[derive(Debug, Clone)]
pub struct Walker {
    root: PathBuf,
    exclude: Vec<String>,
}

impl Walker {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            exclude: Vec::new(),
        }
    }

    /// Extra gitignore-style globs to exclude (`"*.gen.ts"`, `"fixtures/"`).
    pub fn exclude<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.extend(patterns.into_iter().map(Into::into));
        self
    }

    fn overrides(&self) -> Result<Override> {
        let mut overrides = OverrideBuilder::new(&self.root);
        // `!` marks an exclusion in override globs.
        for dir in DEFAULT_EXCLUSIONS {
            overrides
                .add(&format!("!{dir}/"))
                .with_context(|| format!("invalid default exclusion: {dir}"))?;
        }
        for pattern in &self.exclude {
            let glob = pattern.strip_prefix('!').unwrap_or(pattern);
            overrides
                .add(&format!("!{glob}"))
                .with_context(|| format!("invalid ignore pattern: {pattern}"))?;
        }
        overrides.build().context("failed to build ignore overrides")
    }

    fn make_builder(&self) -> Result<WalkBuilder> {
        let mut builder = WalkBuilder::new(&self.root);
        builder.standard_filters(true);
        // Hidden entries get the allowlist policy below instead.
        builder.hidden(false);
        builder.overrides(self.overrides()?);
        builder.filter_entry(|entry| {
            let name = entry.file_name().to_string_lossy();
            if name.starts_with('.') && entry.depth() > 0 {
                return HIDDEN_ALLOWLIST.iter().any(|a| *a == &*name);
            }
            true
        });
        Ok(builder)
    }

    /// Walk the tree and collect every file path, sorted.
    ///
    /// Entries that cannot be read are skipped.
    pub fn collect_paths(&self) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for result in self.make_builder()?.build() {
            let entry = match result {
                Ok(e) => e,
                Err(err) => {
                    debug!(error = %err, "skipping unreadable entry");
                    continue;
                }
            };
            if entry.file_type().is_some_and(|ft| ft.is_file()) {
                paths.push(entry.into_path());
            }
        }
        paths.sort();
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(root: &Path, relative: &str) {
        let p = root.join(relative);
        if let Some(parent) = p.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&p, "package x\n").unwrap();
    }

    fn relative(root: &Path, paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .filter_map(|p| p.strip_prefix(root).ok())
            .map(|r| r.to_string_lossy().replace('\\', "/"))
            .collect()
    }

    fn walk(root: &Path, walker: Walker) -> Vec<String> {
        relative(root, &walker.collect_paths().unwrap())
    }

    #[test]
    fn respects_gitignore_inside_repo() {
        let td = tempfile::tempdir().unwrap();
        // `.gitignore` only applies inside a git repository.
        fs::create_dir(td.path().join(".git")).unwrap();
        fs::write(td.path().join(".gitignore"), "gen/\n").unwrap();
        touch(td.path(), "main.go");
        touch(td.path(), "gen/out.go");

        let rel = walk(td.path(), Walker::new(td.path()));
        assert_eq!(rel, vec!["main.go"]);
    }

    #[test]
    fn skips_dependency_and_build_dirs() {
        let td = tempfile::tempdir().unwrap();
        touch(td.path(), "app/main.py");
        for dir in DEFAULT_EXCLUSIONS {
            touch(td.path(), &format!("{dir}/pkg/mod.js"));
        }

        let rel = walk(td.path(), Walker::new(td.path()));
        assert_eq!(rel, vec!["app/main.py"], "only app/main.py should remain, got: {rel:?}");
    }

    #[test]
    fn skips_hidden_except_github() {
        let td = tempfile::tempdir().unwrap();
        touch(td.path(), "visible.ts");
        touch(td.path(), ".cache/blob.ts");
        touch(td.path(), ".ripple/config.toml");
        touch(td.path(), ".github/scripts/release.js");

        let rel = walk(td.path(), Walker::new(td.path()));
        assert_eq!(rel, vec![".github/scripts/release.js", "visible.ts"]);
    }

    #[test]
    fn exclude_patterns_filter_files_and_dirs() {
        let td = tempfile::tempdir().unwrap();
        touch(td.path(), "src/a.ts");
        touch(td.path(), "src/a.gen.ts");
        touch(td.path(), "fixtures/data.ts");

        let walker = Walker::new(td.path()).exclude(["*.gen.ts", "fixtures/"]);
        let rel = walk(td.path(), walker);
        assert_eq!(rel, vec!["src/a.ts"]);
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        let td = tempfile::tempdir().unwrap();
        let err = Walker::new(td.path())
            .exclude(["src/[unclosed"])
            .collect_paths()
            .unwrap_err();
        assert!(format!("{err:#}").contains("invalid ignore pattern"), "got: {err:#}");
    }

    #[test]
    fn output_is_sorted() {
        let td = tempfile::tempdir().unwrap();
        for name in ["z.go", "a/b.go", "m.go", "a/a.go"] {
            touch(td.path(), name);
        }

        let rel = walk(td.path(), Walker::new(td.path()));
        assert_eq!(rel, vec!["a/a.go", "a/b.go", "m.go", "z.go"]);
    }
}
