pub mod health;
pub mod metrics;
pub mod query;
pub mod suggest;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Build the query API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/query", post(query::run))
        .route("/suggest", get(suggest::get))
}
