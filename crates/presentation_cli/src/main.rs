//! Weather Watch
//!
//! Polls current weather for a list of cities and raises alerts on
//! sustained threshold breaches.

#![allow(clippy::print_stdout)]

use anyhow::Context;
use clap::Parser;
use infrastructure::{ConfigSource, init_telemetry};
use presentation_cli::{Cli, Command, ReloadableConfig, app};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let source = ConfigSource::new(cli.config.as_ref());
    let config = source.load().context("Failed to load configuration")?;

    init_telemetry(&config.telemetry.clone().with_verbosity(cli.verbose))
        .context("Failed to initialize logging")?;

    match cli.command {
        Command::Run => app::run(ReloadableConfig::new(config, source)).await?,

        Command::Fetch { city } => {
            let reading = app::fetch_once(&config, &city).await?;
            println!("{}", serde_json::to_string_pretty(&reading)?);
        },

        Command::CheckConfig => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            let key_status = if config.weather.has_api_key() {
                "set"
            } else {
                "missing"
            };
            println!("weather.api_key: {key_status}");
            config.require_api_key()?;
        },
    }

    Ok(())
}
