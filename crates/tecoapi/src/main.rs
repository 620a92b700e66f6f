mod cli;
mod commands;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use tecoapi_core::{Hub, HubConfig};

use crate::cli::{Cli, Command, GlobalOpts};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't need a device
        Command::Config(args) => commands::config_cmd::handle(&args, &cli.global),

        cmd => {
            let hub = Hub::new(build_hub_config(&cli.global)?);
            tracing::debug!(command = ?cmd, "dispatching command");
            commands::dispatch(cmd, &hub, &cli.global).await
        }
    }
}

/// Load the config file (plus `TECOAPI_*` overrides) and validate it.
fn build_hub_config(global: &GlobalOpts) -> Result<HubConfig, CliError> {
    let path = commands::config_file(global);
    let config = tecoapi_config::load_config_from(&path)?;
    if config.resource.is_empty() && !path.exists() {
        return Err(CliError::NoConfig {
            path: path.display().to_string(),
        });
    }
    Ok(config.to_hub_config()?)
}
