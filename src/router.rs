use std::io::Write;
use std::path::{Path, PathBuf};

use ripple::errors::RippleError;
use ripple::registry::registry;
use ripple::{Config, DiskFileSet, FileSet, ImpactAnalyzer, ImportGraph, RefFinder, looks_like_path};
use tracing::debug;

use crate::cli::{Cli, Command, ImpactArgs, RefsArgs, SymbolsArgs};
use crate::output::{self, Formatter};

pub fn dispatch(cli: Cli) -> Result<(), RippleError> {
    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir()?,
    };
    if !root.is_dir() {
        return Err(RippleError::Usage(format!("root is not a directory: {}", root.display())));
    }
    let config = Config::load(Some(&root))?;

    let stdout = std::io::stdout();
    let mut fmt = Formatter::new(stdout.lock(), cli.json);

    match cli.command {
        Command::Symbols(args) => cmd_symbols(&root, &args, cli.json, &mut fmt),
        Command::Refs(args) => cmd_refs(&root, &config, &args, &mut fmt),
        Command::Impact(args) => cmd_impact(&root, &config, &args, &mut fmt),
    }
}

fn cmd_symbols<W: Write>(
    root: &Path,
    args: &SymbolsArgs,
    json: bool,
    fmt: &mut Formatter<W>,
) -> Result<(), RippleError> {
    let path: PathBuf = root.join(&args.file);
    let label = args.file.to_string_lossy().replace('\\', "/");
    let Some(parser) = registry().for_path(&label) else {
        let supported = registry().extensions().join(", ");
        output::print_hint(&format!("no parser registered for {label}; supported: {supported}"), json);
        return Ok(());
    };
    let content = std::fs::read(&path)?;
    let symbols = parser.parse(&label, &content)?;
    debug!(file = %label, language = parser.name(), count = symbols.len(), "parsed symbols");
    for sym in &symbols {
        fmt.format_symbol(&label, sym)?;
    }
    Ok(())
}

fn open_files(root: &Path, config: &Config) -> Result<DiskFileSet, RippleError> {
    let files = DiskFileSet::open(root, config)?;
    debug!(root = %files.root().display(), files = files.files().len(), "opened file set");
    Ok(files)
}

fn cmd_refs<W: Write>(
    root: &Path,
    config: &Config,
    args: &RefsArgs,
    fmt: &mut Formatter<W>,
) -> Result<(), RippleError> {
    let files = open_files(root, config)?;
    let max = args.max.unwrap_or(config.refs.max_results);
    let result = RefFinder::new(&files).refs(&args.name, max)?;
    fmt.format_refs(&result)?;
    Ok(())
}

fn cmd_impact<W: Write>(
    root: &Path,
    config: &Config,
    args: &ImpactArgs,
    fmt: &mut Formatter<W>,
) -> Result<(), RippleError> {
    let files = open_files(root, config)?;
    let imports = if looks_like_path(&args.target) {
        let graph = ImportGraph::build(&files);
        debug!(edges = graph.edge_count(), "built import graph");
        graph
    } else {
        ImportGraph::default()
    };
    let depth = args.depth.unwrap_or(config.impact.max_depth);
    let max = args.max.unwrap_or(config.impact.max_results);
    let result = ImpactAnalyzer::new(&files, &imports).impact(&args.target, depth, max)?;
    fmt.format_impact(&result)?;
    Ok(())
}
