//! Free-text patient query endpoint

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use fhir_query_core::PatientRecord;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::search::QueryPipeline;
use crate::state::AppState;

/// Request body for a patient query
#[derive(Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    query: Option<String>,
}

/// Response body for a patient query
#[derive(Serialize)]
pub struct QueryResponse {
    patients: Vec<PatientRecord>,
}

/// POST /query - Resolve a free-text query such as "diabetic patients over 50"
///
/// Returns at most five patients. Unusable text is a 400, a failed
/// Condition search on the remote server a 500.
pub async fn run(
    State(state): State<AppState>,
    body: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>, AppError> {
    let Json(body) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let query = body.query.unwrap_or_default();

    tracing::info!(query = %query, "Patient query");

    let patients = QueryPipeline::new(&state.fhir, state.settings)
        .run(&query)
        .await?;

    tracing::info!(matched = patients.len(), "Patient query resolved");
    Ok(Json(QueryResponse { patients }))
}
