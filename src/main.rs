use database::Database;
use feed_client::FeedClient;
use harvester_core::{AppConfig, CoreError, ErrorReporter};
use ingestion::{IngestSettings, Ingestor};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "harvest=info,ingestion=info,feed_client=info,database=info";

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    tracing::info!("Starting opportunity harvest");

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
    tracing::debug!(
        "Harvesting {} to {} into {}",
        config.feed.start_date,
        config.feed.end_date,
        config.database.url
    );

    let client = FeedClient::new(&config.feed)?;
    let database = Database::new(config.database.url.clone());
    let ingestor = Ingestor::new(client, database, IngestSettings::from_config(&config.feed));

    let summary = ingestor.run().await?;

    let metrics = ingestor.source().get_metrics().await;
    tracing::info!(
        "Feed requests: {} ({:.0}% ok), avg response {:?}",
        metrics.total_requests,
        metrics.success_rate() * 100.0,
        metrics.average_response_time
    );
    tracing::debug!("Feed metrics: {}", ingestor.source().export_metrics().await?);

    let stored = ingestor.store().count().await?;
    tracing::info!(
        "Harvest complete: {} rows added this run, {} rows stored",
        summary.rows_persisted,
        stored
    );
    Ok(())
}
