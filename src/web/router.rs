//! Route table for the readmission risk server

use axum::routing::{get, post};
use axum::Router;

use super::handlers;
use super::AppState;

/// Build the router with every page and API route mounted.
///
/// `/` and `/predict` serve HTML; everything under `/api/` speaks JSON.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/predict", post(handlers::predict_json))
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics));

    Router::new()
        .route("/", get(handlers::index))
        .route("/predict", post(handlers::predict_form))
        .nest("/api", api)
        .with_state(state)
}
