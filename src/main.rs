use std::sync::Arc;
use std::time::Duration;

use tower_http::trace::TraceLayer;
use tracing::{info, instrument, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use debut_tracker_service::api::{create_router, AppState};
use debut_tracker_service::config::Config;
use debut_tracker_service::importers::HttpFileFetcher;
use debut_tracker_service::services::{AuthService, DatasetService, SessionStore};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing with environment filter support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,debut_tracker_service=debug")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true),
        )
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    info!("Starting debut tracker service with config: {:?}", config);

    if config.credentials.is_none() {
        warn!("DASHBOARD_USERNAME/DASHBOARD_PASSWORD not set; every login will fail");
    }

    let fetcher = HttpFileFetcher::new(Duration::from_secs(config.download_timeout_secs))?;
    let dataset_service = DatasetService::new(Arc::new(fetcher), config.data_sheet.clone());

    let app_state = AppState {
        dataset_service,
        auth_service: AuthService::new(config.credentials.clone()),
        sessions: SessionStore::with_idle_timeout(config.session_idle_timeout()),
        dataset_key: config.dataset_key(),
    };
    let app = create_router(app_state).layer(TraceLayer::new_for_http());

    let addr = config.server_addr();
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
