mod args;
mod commands;

use std::{process::ExitCode, time::Duration};

use anyhow::Context;
use clap::Parser;
use shelf_client::HttpBooksApi;
use shelf_kernel::settings::Settings;

use args::{Cli, Commands};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut settings = Settings::load().context("failed to load shelf settings")?;

    settings.telemetry.level = if cli.verbose { "debug" } else { "warn" }.to_string();
    shelf_telemetry::init_stderr(&settings.telemetry)?;

    if let Some(base_url) = cli.base_url {
        settings.client.base_url = base_url;
    }

    let api = HttpBooksApi::new(
        settings.client.base_url.clone(),
        Duration::from_millis(settings.client.request_timeout_ms),
    )
    .context("failed to build HTTP client")?;
    tracing::debug!(base_url = %api.base_url(), "using book api");

    match cli.command {
        Commands::Books(command) => {
            commands::run(&api, command, settings.books.default_page_size).await
        }
    }
}
