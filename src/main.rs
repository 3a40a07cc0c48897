use anyhow::Context;
use env_logger::Env;
use secretary::config::AppConfig;
use secretary::pipeline::Secretary;
use std::env;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    // Parse the specified (or default) .env file
    let dotenv_path = env::var("SECRETARY_DOTENV_PATH").unwrap_or_else(|_| ".env".to_string());
    let dotenv_result = dotenvy::from_path(&dotenv_path);

    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    match dotenv_result {
        Ok(()) => log::info!("Loaded env from {}", dotenv_path),
        Err(err) => log::debug!("No .env loaded from {}: {}", dotenv_path, err),
    }

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("report run failed: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("Reading configuration")?;
    let secretary = Secretary::from_config(&config).context("Building pipeline")?;
    let summary = secretary.run().await?;
    log::info!(
        "sent '{}' ({} of {} quotes available, {} articles)",
        summary.subject,
        summary.symbols - summary.symbols_unavailable,
        summary.symbols,
        summary.articles
    );
    Ok(())
}
