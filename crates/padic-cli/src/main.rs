//! Padic CLI: the `padic` command.

mod cli;
mod commands;
mod support;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let outcome = support::load_config(cli.config.as_deref()).and_then(|config| {
        match cli.command {
            Commands::Appr {
                value,
                prime,
                precision,
                json,
            } => commands::appr::run(&config, &value, prime, precision, json),

            Commands::Residue {
                value,
                prime,
                level,
                json,
            } => commands::residue::run(&config, &value, prime, level, json),

            Commands::Lift {
                value,
                prime,
                precision,
                family,
                json,
            } => commands::lift::run(
                &config,
                commands::lift::Args {
                    value,
                    prime,
                    precision,
                    family,
                    json,
                },
            ),

            Commands::Gate {
                case,
                profile,
                json,
            } => commands::gate::run(&case, &profile, json),
        }
    });

    if let Err(e) = outcome {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
