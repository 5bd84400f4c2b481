pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::enforcement::handlers as enforcement;
use crate::fitting::handlers as fitting;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Text width & line-fit engine
        .route("/api/v1/fit/render", post(fitting::handle_render))
        .route("/api/v1/fit/optimize", post(fitting::handle_optimize))
        .route("/api/v1/fit/analyze", post(fitting::handle_analyze))
        .route("/api/v1/fit/transform", post(fitting::handle_transform))
        // Character-count enforcement
        .route("/api/v1/enforce", post(enforcement::handle_enforce))
        .route("/api/v1/enforce/batch", post(enforcement::handle_enforce_batch))
        .route("/api/v1/enforce/validate", post(enforcement::handle_validate))
        .route("/api/v1/enforce/check", post(enforcement::handle_check))
        .with_state(state)
}
