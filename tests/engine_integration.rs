//! End-to-end tests over on-disk fixtures.
//!
//! Each test writes a small project into a temp directory, opens it as a
//! [`DiskFileSet`] and drives the public query API.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use ripple::{Config, DiskFileSet, ImpactAnalyzer, ImpactMode, ImportGraph, RefFinder, RippleError};
use tempfile::TempDir;

fn project(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (path, content) in files {
        let full = dir.path().join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(full, content).unwrap();
    }
    dir
}

fn open(root: &Path) -> DiskFileSet {
    DiskFileSet::open(root, &Config::default()).unwrap()
}

const LIB_GO: &str = "package main\n\nfunc Helper() {}\n";
const MAIN_GO: &str = "package main\n\nfunc main() {\n\tHelper()\n\tHelper()\n}\n";

#[test]
fn refs_finds_definition_and_call_sites() {
    let dir = project(&[("lib.go", LIB_GO), ("main.go", MAIN_GO)]);
    let files = open(dir.path());

    let result = RefFinder::new(&files).refs("Helper", 50).unwrap();

    let def = result.definition.expect("Helper should have a definition");
    assert_eq!(def.path, "lib.go");
    assert_eq!(def.line, 3);
    assert!(def.is_definition);
    assert!(result.total_references >= 2);
    let sites: Vec<(&str, usize)> = result.references.iter().map(|r| (r.path.as_str(), r.line)).collect();
    assert_eq!(sites, vec![("main.go", 4), ("main.go", 5)]);
}

#[test]
fn refs_for_unknown_symbol_is_empty() {
    let dir = project(&[("lib.go", LIB_GO)]);
    let files = open(dir.path());

    let result = RefFinder::new(&files).refs("Missing", 50).unwrap();
    assert!(result.definition.is_none());
    assert!(result.references.is_empty());
    assert_eq!(result.total_references, 0);
}

#[test]
fn hinted_definition_wins_and_is_not_repeated() {
    let dir = project(&[("lib.go", LIB_GO), ("main.go", MAIN_GO)]);
    let files = open(dir.path());
    let hints: HashMap<String, (String, usize)> =
        HashMap::from([("Helper".to_string(), ("main.go".to_string(), 4))]);

    let result = RefFinder::new(&files).with_hints(&hints).refs("Helper", 50).unwrap();

    let def = result.definition.unwrap();
    assert_eq!((def.path.as_str(), def.line), ("main.go", 4));
    assert!(
        !result.references.iter().any(|r| r.path == "main.go" && r.line == 4),
        "hinted site must not also appear as a reference"
    );
    assert!(result.references.iter().any(|r| r.path == "lib.go" && r.line == 3));
}

#[test]
fn binary_files_contribute_nothing() {
    let dir = project(&[
        ("lib.go", LIB_GO),
        ("blob.go", "\x00\x01\x02Helper()\nHelper()\n"),
    ]);
    let files = open(dir.path());

    let result = RefFinder::new(&files).refs("Helper", 50).unwrap();
    assert!(result.references.iter().all(|r| r.path != "blob.go"));
    assert_eq!(result.definition.map(|d| d.path), Some("lib.go".to_string()));
}

#[test]
fn impact_chain_places_callers_by_depth() {
    let dir = project(&[
        ("a.go", "package x\n\nfunc A() {}\n"),
        ("b.go", "package x\n\nfunc B() {\n\tA()\n}\n"),
        ("c.go", "package x\n\nfunc C() {\n\tB()\n}\n"),
    ]);
    let files = open(dir.path());
    let imports = ImportGraph::default();

    let result = ImpactAnalyzer::new(&files, &imports).impact("A", 3, 100).unwrap();

    assert_eq!(result.target.mode, ImpactMode::Symbol);
    assert_eq!(result.layers[0].depth, 1);
    assert_eq!(result.layers[0].refs[0].path, "b.go");
    assert_eq!(result.layers[0].refs[0].enclosing_symbol.as_deref(), Some("B"));
    assert_eq!(result.layers[1].depth, 2);
    assert_eq!(result.layers[1].refs[0].path, "c.go");
    assert_eq!(result.summary.max_depth_reached, 2);
}

#[test]
fn impact_survives_mutual_recursion() {
    let dir = project(&[
        ("a.go", "package x\n\nfunc A() {\n\tB()\n}\n"),
        ("b.go", "package x\n\nfunc B() {\n\tA()\n}\n"),
    ]);
    let files = open(dir.path());
    let imports = ImportGraph::default();

    let result = ImpactAnalyzer::new(&files, &imports).impact("A", 5, 100).unwrap();

    assert!(result.summary.max_depth_reached <= 5);
    for layer in result.layers.iter().filter(|l| l.depth > 1) {
        assert!(layer.refs.iter().all(|r| r.enclosing_symbol.as_deref() != Some("A")));
    }
}

#[test]
fn impact_respects_depth_and_result_bounds() {
    let mut calls = String::from("package x\n\nfunc Many() {\n");
    for _ in 0..20 {
        calls.push_str("\tA()\n");
    }
    calls.push_str("}\n");
    let dir = project(&[
        ("a.go", "package x\n\nfunc A() {}\n"),
        ("many.go", calls.as_str()),
        ("top.go", "package x\n\nfunc Top() {\n\tMany()\n}\n"),
    ]);
    let files = open(dir.path());
    let imports = ImportGraph::default();
    let analyzer = ImpactAnalyzer::new(&files, &imports);

    let shallow = analyzer.impact("A", 1, 100).unwrap();
    assert_eq!(shallow.layers.len(), 1);
    assert_eq!(shallow.summary.max_depth_reached, 1);

    let capped = analyzer.impact("A", 3, 5).unwrap();
    assert!(capped.summary.total_ref_sites <= 5);
    let counted: usize = capped.layers.iter().map(|l| l.refs.len()).sum();
    assert_eq!(counted, capped.summary.total_ref_sites);
}

#[test]
fn file_impact_follows_importers() {
    let dir = project(&[
        ("src/a.ts", "export function a() {\n  return 1;\n}\n"),
        ("src/b.ts", "import { a } from './a';\n\nexport const b = () => a();\n"),
        ("src/c.ts", "import { b } from './b';\n\nb();\n"),
        ("src/unrelated.ts", "export const z = 0;\n"),
    ]);
    let files = open(dir.path());
    let imports = ImportGraph::build(&files);

    let result = ImpactAnalyzer::new(&files, &imports).impact("src/a.ts", 3, 100).unwrap();

    assert_eq!(result.target.mode, ImpactMode::File);
    assert_eq!(result.target.name, "src/a.ts");
    assert_eq!(result.layers.len(), 2);

    let direct = &result.layers[0].refs[0];
    assert_eq!(direct.path, "src/b.ts");
    assert_eq!(direct.line, 1);
    assert_eq!(direct.content, "import { a } from './a';");
    assert_eq!(direct.via, "src/a.ts");

    assert_eq!(result.layers[1].refs[0].path, "src/c.ts");
    assert_eq!(result.summary.total_files, 2);
}

#[test]
fn file_impact_rejects_unindexed_target() {
    let dir = project(&[("src/a.ts", "export const a = 1;\n")]);
    let files = open(dir.path());
    let imports = ImportGraph::build(&files);

    let err = ImpactAnalyzer::new(&files, &imports)
        .impact("src/missing.ts", 3, 100)
        .unwrap_err();
    assert!(matches!(err, RippleError::TargetFileNotIndexed(ref p) if p == "src/missing.ts"));
    assert_eq!(err.exit_code(), 1);
}

#[test]
fn project_config_overrides_defaults() {
    let dir = project(&[
        (".ripple/config.toml", "[refs]\nmax_results = 1\n\n[ignore]\npatterns = [\"generated/**\"]\n"),
        ("lib.go", LIB_GO),
        ("generated/gen.go", "package gen\n\nvar x = Helper\n"),
    ]);
    let config = Config::load(Some(dir.path())).unwrap();
    assert_eq!(config.refs.max_results, 1);

    let files = DiskFileSet::open(dir.path(), &config).unwrap();
    let result = RefFinder::new(&files).refs("Helper", 50).unwrap();
    assert!(result.references.iter().all(|r| !r.path.starts_with("generated/")));
}
