mod cli;
mod output;
mod router;

use ripple::errors::EXIT_SUCCESS;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let env_filter = EnvFilter::try_from_env("RIPPLE_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}

fn main() {
    let cli = cli::parse();
    init_logging(cli.verbose);
    let json = cli.json;
    let code = match router::dispatch(cli) {
        Ok(()) => EXIT_SUCCESS,
        Err(err) => output::format_error(&err, json),
    };
    std::process::exit(code);
}
