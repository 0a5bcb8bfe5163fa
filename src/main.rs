use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{AppConfig, AppState};

/// Main entry point for the Medical Report Portal.
///
/// Serves the portal (pages, upload flow, Q&A proxy) on the configured
/// address, fronting the external analysis service.
///
/// # Environment Variables
/// - `MRP_ADDR`: bind address (default: "0.0.0.0:3000")
/// - `MRP_UPSTREAM_URL`: analysis service base URL
///   (default: "http://127.0.0.1:8000")
/// - `MRP_SESSION_TTL_MINS`: result-slot inactivity TTL (default: 60)
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration cannot be read, or
/// - the server address cannot be bound.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mrp_run=info".parse()?)
                .add_directive("api_rest=info".parse()?)
                .add_directive("mrp_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = AppConfig::from_env()?;

    tracing::info!("++ Starting MRP portal on {}", cfg.addr);
    tracing::info!("++ Analysis upstream at {}", cfg.upstream_url);

    let state = AppState::new(&cfg);
    let app = api_rest::router(state);

    let listener = tokio::net::TcpListener::bind(&cfg.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
