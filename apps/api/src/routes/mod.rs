pub mod health;
pub mod recommendations;
pub mod validation;

use axum::{
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/recommendations/predict",
            post(recommendations::handle_predict),
        )
        .route(
            "/api/recommendations/health",
            get(recommendations::handle_health),
        )
        .route(
            "/api/recommendations/careers",
            get(recommendations::handle_careers),
        )
        .route(
            "/api/recommendations/soft-skills-labels",
            get(recommendations::handle_soft_skill_labels),
        )
        .route(
            "/api/recommendations/info",
            get(recommendations::handle_info),
        )
        .route(
            "/api/recommendations/clear-cache",
            post(recommendations::handle_clear_cache),
        )
        .with_state(state)
}

/// Success envelope shared by every endpoint: `{success, message, data}`.
pub(crate) fn success(data: impl Serialize, message: &str) -> Json<Value> {
    Json(json!({
        "success": true,
        "message": message,
        "data": data,
    }))
}
