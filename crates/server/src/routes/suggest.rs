//! Query completion endpoint

use axum::{Json, extract::Query};
use serde::{Deserialize, Serialize};

/// Query parameters for suggestions
#[derive(Debug, Deserialize, Default)]
pub struct SuggestParams {
    #[serde(default)]
    pub q: String,
}

#[derive(Serialize)]
pub struct SuggestResponse {
    suggestions: Vec<String>,
}

/// GET /suggest?q= - Next-word completions for a partially typed query
pub async fn get(Query(params): Query<SuggestParams>) -> Json<SuggestResponse> {
    Json(SuggestResponse {
        suggestions: fhir_query_core::suggest(&params.q),
    })
}
