use std::sync::{Arc, Mutex};

use axum::http::HeaderValue;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use deskbook::config::AppConfig;
use deskbook::db::{self, SqliteStore};
use deskbook::handlers;
use deskbook::services::notification::log::LogNotifier;
use deskbook::services::notification::webhook::WebhookNotifier;
use deskbook::services::notification::Notifier;
use deskbook::services::payment::stub::StubGateway;
use deskbook::services::reservation::BookingService;
use deskbook::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url, config.store_timeout)?;
    let db = Arc::new(Mutex::new(conn));

    let notifier: Arc<dyn Notifier> = match &config.notify_webhook_url {
        Some(url) => {
            tracing::info!("sending booking confirmations to webhook (url: {url})");
            Arc::new(WebhookNotifier::new(url.clone()))
        }
        None => {
            tracing::info!("NOTIFY_WEBHOOK_URL not set, logging booking confirmations");
            Arc::new(LogNotifier)
        }
    };

    let bookings = BookingService::new(
        Arc::new(SqliteStore::new(Arc::clone(&db), config.store_timeout)),
        Arc::new(StubGateway),
        notifier,
        config.check_in_base_url.clone(),
    );

    let cors = match &config.cors_origin {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin.parse::<HeaderValue>()?)
            .allow_methods(Any)
            .allow_headers(Any),
        None => CorsLayer::permissive(),
    };

    let state = Arc::new(AppState {
        db,
        config: config.clone(),
        bookings,
    });

    let app = handlers::router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
