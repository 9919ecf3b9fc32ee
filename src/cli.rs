use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// ripple - symbol, reference and impact queries over a source tree
#[derive(Parser, Debug)]
#[command(name = "ripple", version, about)]
pub struct Cli {
    /// Output results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Project root to query (defaults to the current directory)
    #[arg(long, global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Log debug diagnostics to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the symbols declared in one file
    Symbols(SymbolsArgs),

    /// Find the definition and references of a symbol
    Refs(RefsArgs),

    /// Show what depends on a symbol or file, layer by layer
    Impact(ImpactArgs),
}

#[derive(clap::Args, Debug)]
pub struct SymbolsArgs {
    /// Source file to parse
    pub file: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct RefsArgs {
    /// Symbol name to find references for
    pub name: String,

    /// Maximum number of references (default from config)
    #[arg(long)]
    pub max: Option<usize>,
}

#[derive(clap::Args, Debug)]
pub struct ImpactArgs {
    /// Symbol name, or a file path relative to the root
    pub target: String,

    /// Number of hops to follow (default from config)
    #[arg(long)]
    pub depth: Option<usize>,

    /// Maximum number of affected sites (default from config)
    #[arg(long)]
    pub max: Option<usize>,
}

pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["ripple", "refs", "Helper", "--json", "--root", "/src", "--max", "5"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.root, Some(PathBuf::from("/src")));
        match cli.command {
            Command::Refs(args) => {
                assert_eq!(args.name, "Helper");
                assert_eq!(args.max, Some(5));
            }
            other => panic!("expected refs, got {other:?}"),
        }
    }

    #[test]
    fn impact_limits_default_to_none() {
        let cli = Cli::try_parse_from(["ripple", "-v", "impact", "src/a.ts"]).unwrap();
        assert!(cli.verbose);
        match cli.command {
            Command::Impact(args) => {
                assert_eq!(args.target, "src/a.ts");
                assert_eq!(args.depth, None);
                assert_eq!(args.max, None);
            }
            other => panic!("expected impact, got {other:?}"),
        }
    }

    #[test]
    fn missing_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["ripple"]).is_err());
    }
}
