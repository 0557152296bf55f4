//! `scopecfg` command-line entry point.
//!
//! Loads the tool settings, initialises logging and hands the parsed
//! subcommand to [`scopecfg_cli::run`].

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use scopecfg_cli::{load_settings, run, Cli};

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let settings = load_settings(cli.settings.as_deref())?;

    // Structured logging to stderr.  `RUST_LOG` overrides the settings file.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log_level)),
        )
        .with_writer(io::stderr)
        .init();

    debug!(?settings, "settings loaded");

    let stdout = io::stdout();
    let status = run(&cli.command, &settings, &mut stdout.lock())?;
    Ok(ExitCode::from(status.exit_code()))
}
