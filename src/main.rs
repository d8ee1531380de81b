// src/main.rs

use anyhow::Result;
use clap::Parser;
use tracing::debug;

mod cli;
mod commands;

use cli::Cli;

/// Default log level for a given `-v` count
fn default_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = cli.pack_config();
    debug!("Configuration: {:?}", config);
    commands::cmd_pack(config, cli.dry_run, cli.quiet)
}

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr so the build report on stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter(cli.verbose))),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(cli) {
        let pack_error = err.chain().find_map(|e| e.downcast_ref::<wgtpack::Error>());

        if let Some(wgtpack::Error::OutputExists(path)) = pack_error {
            commands::report_collision(path);
            std::process::exit(1);
        }

        eprintln!("Error: {:#}", err);
        std::process::exit(pack_error.map(|e| e.exit_code()).unwrap_or(2));
    }
}
