//! patternmine CLI - pattern mining over business records.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log to stderr, filtered by `PATTERNMINE_LOG` (default `patternmine=info`).
fn init_tracing(verbose: bool) {
    let default = if verbose { "patternmine=debug" } else { "patternmine=info" };
    let filter = EnvFilter::try_from_env("PATTERNMINE_LOG").unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.config.as_deref();
    let result = match cli.command {
        Commands::Detect {
            agent,
            data,
            prompt,
            json,
        } => commands::detect::run(agent, data, prompt, json, config, cli.verbose),

        Commands::Report { data, json } => commands::report::run(data, json, config, cli.verbose),

        Commands::Clean {
            dataset,
            data,
            output,
            outliers,
        } => commands::clean::run(dataset, data, output, outliers, config, cli.verbose),

        Commands::Agents => commands::agents::run(cli.verbose),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
