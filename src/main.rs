use std::process::ExitCode;

use clap::Parser;
use tabletop::config::HostConfig;

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = HostConfig::parse();
    match tabletop::run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "tabletop host stopped");
            ExitCode::FAILURE
        }
    }
}
