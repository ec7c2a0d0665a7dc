use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, error};

use attendance_cli::commands::{self, App, Cli};
use attendance_cli::config::Config;
use attendance_cli::logging::init_logging;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => {
            error!(error = %err, "Command failed");
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<ExitCode> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_deref())?;

    // Initialize logging
    init_logging(&config.logging)?;

    debug!(
        "Attendance client v{} using {}",
        env!("CARGO_PKG_VERSION"),
        config.api.base_url
    );

    let app = App::new(config)?;
    commands::execute(cli.command, &app).await
}
