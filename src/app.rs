use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/dashboard", get(handlers::get_dashboard))
        .route("/api/status", get(handlers::get_status))
        .route("/api/refresh", post(handlers::refresh))
        .with_state(state)
}
