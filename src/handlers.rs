use crate::errors::AppError;
use crate::models::{Dashboard, RefreshOutcome, RefreshResponse, RefreshStatus};
use crate::state::AppState;
use crate::ui::render_index;
use axum::{extract::State, response::Html, Json};

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let status = state.refresher.status().await;
    Html(render_index(&status.source, state.refresh_interval))
}

pub async fn get_dashboard(State(state): State<AppState>) -> Result<Json<Dashboard>, AppError> {
    match state.refresher.dashboard().await {
        Some(dashboard) => Ok(Json(dashboard)),
        None => {
            let status = state.refresher.status().await;
            let message = match status.last_error {
                Some(err) => format!("no dashboard yet: {err}"),
                None => "no dashboard yet".to_string(),
            };
            Err(AppError::unavailable(message))
        }
    }
}

pub async fn get_status(State(state): State<AppState>) -> Json<RefreshStatus> {
    Json(state.refresher.status().await)
}

pub async fn refresh(State(state): State<AppState>) -> Result<Json<RefreshResponse>, AppError> {
    let response = state.refresher.refresh_once().await;
    if response.outcome == RefreshOutcome::Failed {
        let message = response.error.unwrap_or_else(|| "refresh failed".to_string());
        return Err(AppError::bad_gateway(message));
    }
    Ok(Json(response))
}
