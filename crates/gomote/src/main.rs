use anyhow::Result;
use clap::Parser;
use gomote::app::{render_error, App};
use gomote::cli::Cli;
use gomote::config::GomoteConfig;
use gomote::shared::console::Console;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr so stdout carries only instance ids.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gomote=warn")),
        )
        .init();

    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(error) => {
            eprintln!("{}", render_error(&error));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = GomoteConfig::from_env();
    debug!(server_addr = %config.server_addr, group_dir = %config.group_dir.display(), "Loaded configuration");

    let app = App::new(config, Console::stdio());
    Ok(app.run(cli).await?)
}
