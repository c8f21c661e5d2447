use analysis::{write_report, Analysis};
use database::Database;
use harvester_core::{AppConfig, CoreError, ErrorReporter};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "analyze=info,analysis=info,database=info";

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            ErrorReporter::new().report_error(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), CoreError> {
    let config = AppConfig::load()?;
    let database = Database::new(config.database.url.clone());

    tracing::info!("Loading stored opportunities...");
    let records = database.fetch_all().await?;
    tracing::info!("Loaded {} records", records.len());

    let analysis = Analysis::with_config(&records, &config.report);
    write_report(&analysis, &config.report.output_path).await
}
