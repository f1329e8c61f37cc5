//! Prometheus metrics endpoint

use axum::{extract::State, response::IntoResponse};

use crate::state::AppState;

/// GET /metrics - Render request and upstream counters in Prometheus text format
pub async fn get(State(state): State<AppState>) -> impl IntoResponse {
    state.prometheus.render()
}
