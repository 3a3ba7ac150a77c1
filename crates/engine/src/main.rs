//! Tabletide Engine - authoritative session server.

use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tabletide_engine::{ConnectionManager, DuplicateIdPolicy, SessionStore, WsState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tabletide_engine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let host = std::env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("SERVER_PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{host}:{port}");

    let duplicate_ids = match std::env::var("TABLETIDE_DUPLICATE_ID_POLICY") {
        Ok(raw) => raw.parse::<DuplicateIdPolicy>()?,
        Err(_) => DuplicateIdPolicy::default(),
    };
    tracing::info!(policy = ?duplicate_ids, "Duplicate-id policy configured");

    let state = Arc::new(WsState {
        store: Arc::new(SessionStore::new(duplicate_ids)),
        connections: Arc::new(ConnectionManager::new()),
    });

    let mut app = tabletide_engine::router(state).layer(TraceLayer::new_for_http());

    // Optional CORS for browser-based clients
    if let Ok(origins) = std::env::var("CORS_ALLOWED_ORIGINS") {
        let origins: Vec<HeaderValue> = origins
            .split(',')
            .filter_map(|o| o.trim().parse().ok())
            .collect();
        if !origins.is_empty() {
            let cors = CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([Method::GET])
                .allow_headers([header::CONTENT_TYPE]);
            app = app.layer(cors);
        }
    }

    tracing::info!("Tabletide Engine listening on {addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
