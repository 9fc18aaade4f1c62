use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use medrec_core::{CoreConfig, DirectoryMode};

/// Main entry point for the MedRec voice backend
///
/// Loads `.env`, initialises tracing, resolves configuration once and serves the REST API.
///
/// # Environment Variables
/// - `AIRTABLE_API_KEY`, `AIRTABLE_BASE_ID`: directory store credentials
/// - `AIRTABLE_TABLE`: table name (default: "Patients_PostOp")
/// - `AIRTABLE_VIEW`: optional named view
/// - `N8N_WEBHOOK_URL`: webhook sink for start-call events
/// - `CORS_ORIGINS`: comma-separated allowed origins (default: "*")
/// - `MEDREC_DIRECTORY`: "airtable" (default) or "none"
/// - `MEDREC_REST_ADDR` / `PORT`: listen address (default: "0.0.0.0:8000")
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration is invalid,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("medrec_run=info".parse()?)
                .add_directive("medrec_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = CoreConfig::from_env()?;

    if cfg.sink_url().is_none() {
        tracing::warn!("N8N_WEBHOOK_URL not set; /api/start will answer 500");
    }
    match cfg.directory_mode() {
        DirectoryMode::Airtable if cfg.directory().api_key.is_none() => {
            tracing::warn!("AIRTABLE_API_KEY not set; directory lookups will fail")
        }
        DirectoryMode::Disabled => {
            tracing::info!("Directory disabled; start calls need name and phone")
        }
        DirectoryMode::Airtable => {}
    }

    tracing::info!("++ Starting MedRec REST on {}", cfg.rest_addr());
    api_rest::serve(&cfg).await
}
