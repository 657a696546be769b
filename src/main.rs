use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use hogfarm_backend::api;
use hogfarm_backend::auth::GatewayAuthConfig;
use hogfarm_backend::config::Config;
use hogfarm_backend::db::Database;
use hogfarm_backend::dispatch::Dispatcher;
use hogfarm_backend::engine::GameEngine;
use hogfarm_backend::metrics;

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok", "service": "hogfarm-backend" }))
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = Config::load();
    metrics::register_metrics();

    let db = Database::new(&config.database_url)
        .await
        .expect("Failed to initialize database");
    let db = Arc::new(db);

    let engine = Arc::new(GameEngine::new(db.clone(), config.store_timeout()));
    let dispatcher = Arc::new(Dispatcher::new(engine, config.operator_chat_id));

    if config.gateway_token.is_none() {
        tracing::warn!("GATEWAY_TOKEN not set, API runs unauthenticated");
    }

    // Inject the auth config into request extensions so the gateway auth
    // extractor can check tokens without needing access to AppState.
    let auth_config = Arc::new(GatewayAuthConfig::from_token(
        config.gateway_token.as_deref(),
    ));

    let app = Router::new()
        .route("/health", get(health_check))
        .merge(api::router(db, dispatcher))
        .layer(CorsLayer::permissive())
        .layer(axum::middleware::from_fn(api::track_metrics))
        .layer(axum::middleware::from_fn(
            move |mut req: axum::http::Request<axum::body::Body>, next: axum::middleware::Next| {
                let auth_config = auth_config.clone();
                async move {
                    req.extensions_mut().insert(auth_config);
                    next.run(req).await
                }
            },
        ));

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .expect("Failed to bind port");

    tracing::info!("Hogfarm backend listening on port {}", config.port);
    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
