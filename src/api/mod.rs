// HTTP API routes (gateway action dispatch, leaderboards, ops endpoints).

use axum::{
    body::Body,
    extract::{Json, Path, Query, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::auth::GatewayAuth;
use crate::db::{Database, Scope, SubscriptionTier};
use crate::dispatch::{ActionRequest, Dispatcher};
use crate::engine::PAGE_SIZE;
use crate::metrics;

// ── Request types ─────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct LeaderboardParams {
    pub offset: Option<i64>,
}

#[derive(Deserialize)]
pub struct UpdateChatSettingsRequest {
    pub min_top_weight: i64,
}

#[derive(Deserialize)]
pub struct UpdateTierRequest {
    pub tier: String,
}

// ── Shared application state ─────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub dispatcher: Arc<Dispatcher>,
}

// ── Error helpers ─────────────────────────────────────────────────────

fn json_error(status: StatusCode, msg: &str) -> impl IntoResponse {
    (status, Json(json!({ "error": msg })))
}

fn internal_error(e: sqlx::Error) -> impl IntoResponse {
    tracing::error!("Database error: {e}");
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

// ── Router ────────────────────────────────────────────────────────────

pub fn router(db: Arc<Database>, dispatcher: Arc<Dispatcher>) -> Router {
    let state = AppState { db, dispatcher };

    Router::new()
        // Gateway actions
        .route("/api/actions", post(handle_actions))
        // Leaderboard pages (ops/debug view of what the bot renders)
        .route("/api/leaderboard/{scope}", get(get_leaderboard))
        // Pig records
        .route("/api/pigs/{scope}/{user_id}", get(get_pig))
        // Per-chat settings
        .route("/api/chats/{chat_id}/settings", put(update_chat_settings))
        // Subscription tier updates from the platform's payment events
        .route("/api/users/{user_id}/tier", put(update_user_tier))
        // Prometheus exposition
        .route("/metrics", get(get_metrics))
        .with_state(state)
}

// ── Request metrics ───────────────────────────────────────────────────

/// Counts every request by method, normalized path, and status, and feeds
/// the per-endpoint latency histogram.
pub async fn track_metrics(req: Request<Body>, next: Next) -> Response {
    let method = req.method().to_string();
    let endpoint = metrics::normalize_path(req.uri().path());
    let timer = metrics::API_REQUEST_DURATION_SECONDS
        .with_label_values(&[&endpoint])
        .start_timer();
    let response = next.run(req).await;
    timer.observe_duration();
    metrics::API_REQUESTS_TOTAL
        .with_label_values(&[&method, &endpoint, response.status().as_str()])
        .inc();
    response
}

// ── Action handlers ───────────────────────────────────────────────────

async fn handle_actions(
    State(state): State<AppState>,
    _auth: GatewayAuth,
    Json(req): Json<ActionRequest>,
) -> impl IntoResponse {
    let responses = state.dispatcher.handle(req).await;
    (StatusCode::OK, Json(json!(responses)))
}

// ── Leaderboard handlers ──────────────────────────────────────────────

async fn get_leaderboard(
    State(state): State<AppState>,
    _auth: GatewayAuth,
    Path(scope): Path<String>,
    Query(params): Query<LeaderboardParams>,
) -> impl IntoResponse {
    let Some(scope) = Scope::parse(&scope) else {
        return json_error(StatusCode::BAD_REQUEST, "Invalid scope").into_response();
    };
    let offset = params.offset.unwrap_or(0).max(0);
    let min_weight = match state.db.min_top_weight(&scope).await {
        Ok(value) => value,
        Err(e) => return internal_error(e).into_response(),
    };
    match state
        .db
        .top_by_weight(&scope, min_weight, PAGE_SIZE, offset)
        .await
    {
        Ok((rows, total)) => (
            StatusCode::OK,
            Json(json!({ "rows": rows, "total": total, "offset": offset })),
        )
            .into_response(),
        Err(e) => internal_error(e).into_response(),
    }
}

// ── Pig record handlers ───────────────────────────────────────────────

async fn get_pig(
    State(state): State<AppState>,
    _auth: GatewayAuth,
    Path((scope, user_id)): Path<(String, i64)>,
) -> impl IntoResponse {
    let Some(scope) = Scope::parse(&scope) else {
        return json_error(StatusCode::BAD_REQUEST, "Invalid scope").into_response();
    };
    match state.db.get_record(&scope, user_id).await {
        Ok(Some(record)) => (StatusCode::OK, Json(json!(record))).into_response(),
        Ok(None) => json_error(StatusCode::NOT_FOUND, "Pig not found").into_response(),
        Err(e) => internal_error(e).into_response(),
    }
}

// ── Settings handlers ─────────────────────────────────────────────────

async fn update_chat_settings(
    State(state): State<AppState>,
    _auth: GatewayAuth,
    Path(chat_id): Path<i64>,
    Json(req): Json<UpdateChatSettingsRequest>,
) -> impl IntoResponse {
    if req.min_top_weight < 0 {
        return json_error(StatusCode::BAD_REQUEST, "min_top_weight must be >= 0")
            .into_response();
    }
    let scope = Scope::Chat(chat_id);
    match state
        .db
        .set_min_top_weight(&scope, req.min_top_weight)
        .await
    {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "scope": scope.key(), "min_top_weight": req.min_top_weight })),
        )
            .into_response(),
        Err(e) => internal_error(e).into_response(),
    }
}

async fn update_user_tier(
    State(state): State<AppState>,
    _auth: GatewayAuth,
    Path(user_id): Path<i64>,
    Json(req): Json<UpdateTierRequest>,
) -> impl IntoResponse {
    let Some(tier) = SubscriptionTier::from_str_name(&req.tier) else {
        return json_error(StatusCode::BAD_REQUEST, "Unknown tier").into_response();
    };
    match state.db.set_tier(user_id, tier.as_str()).await {
        Ok(true) => (
            StatusCode::OK,
            Json(json!({ "user_id": user_id, "tier": tier.as_str() })),
        )
            .into_response(),
        Ok(false) => json_error(StatusCode::NOT_FOUND, "Pig not found").into_response(),
        Err(e) => internal_error(e).into_response(),
    }
}

// ── Metrics handler ───────────────────────────────────────────────────

async fn get_metrics(_auth: GatewayAuth) -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4")],
        metrics::gather_metrics(),
    )
        .into_response()
}
