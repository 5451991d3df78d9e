use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::engine::SharedEngine;
use crate::ingest::types::RawCandidate;

#[derive(Clone)]
pub struct AppState {
    engine: SharedEngine,
}

pub fn create_router(engine: SharedEngine) -> Router {
    let state = AppState { engine };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/curate", post(curate))
        .route("/news", get(news))
        .route("/news/raw", get(news_raw))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

fn error_body(status: StatusCode, msg: String) -> Response {
    (status, Json(json!({ "error": msg }))).into_response()
}

/// Body: optional JSON array of partial candidates used as manual seeds.
async fn curate(State(state): State<AppState>, body: Bytes) -> Response {
    let seeds: Vec<RawCandidate> = if body.iter().all(u8::is_ascii_whitespace) {
        Vec::new()
    } else {
        match serde_json::from_slice(&body) {
            Ok(v) => v,
            Err(e) => {
                return error_body(StatusCode::BAD_REQUEST, format!("invalid seed list: {e}"))
            }
        }
    };

    match state.engine.run_curation(seeds).await {
        Ok(run) => Json(run).into_response(),
        Err(e) => {
            tracing::error!(target: "curator", error = %e, "curation run failed");
            error_body(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

async fn news(State(state): State<AppState>) -> Response {
    Json(state.engine.get_curated().await).into_response()
}

async fn news_raw(State(state): State<AppState>) -> Response {
    Json(state.engine.get_raw().await).into_response()
}
