use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use autoescola::config::AppConfig;
use autoescola::handlers;
use autoescola::services::availability::{AvailabilityBackend, InMemoryBackend, SheetsBackend};
use autoescola::services::messaging::ultramsg::UltraMsgProvider;
use autoescola::services::session::SessionStore;
use autoescola::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let availability: Arc<dyn AvailabilityBackend> = match &config.sheets {
        Some(sheets) => match SheetsBackend::connect(sheets.clone()).await {
            Ok(backend) => {
                tracing::info!(
                    spreadsheet = %sheets.spreadsheet_id,
                    worksheet = %sheets.worksheet,
                    cache = sheets.use_cache,
                    "using Google Sheets availability backend"
                );
                Arc::new(backend)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Sheets backend unavailable, falling back to in-memory bookings");
                Arc::new(InMemoryBackend::new())
            }
        },
        None => {
            tracing::info!("no Sheets configuration, using in-memory availability backend");
            Arc::new(InMemoryBackend::new())
        }
    };

    let messaging = UltraMsgProvider::new(
        config.ultramsg_instance_id.clone(),
        config.ultramsg_token.clone(),
    );

    let state = Arc::new(AppState {
        config: config.clone(),
        sessions: SessionStore::new(),
        availability,
        messaging: Box::new(messaging),
    });

    let app = Router::new()
        .route("/", get(handlers::health::health))
        .route(
            "/webhook/whatsapp",
            post(handlers::webhook::whatsapp_webhook),
        )
        .route("/api/bookings", get(handlers::admin::get_bookings))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
