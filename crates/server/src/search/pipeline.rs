//! Query orchestration: text to filter, Condition search, patient resolution
//!
//! Only an empty query or one without a known diagnosis is rejected up front;
//! a failed Condition search ends the query, failed patient fetches do not.

use std::time::Duration;

use chrono::Local;
use fhir_query_core::{PatientRecord, extract};
use tokio::time::Instant;

use super::QueryError;
use super::client::FhirApi;
use super::conditions::ConditionSearch;
use super::patients::PatientResolver;
use crate::config::Config;

/// Limits applied to every query
#[derive(Debug, Clone, Copy)]
pub struct PipelineSettings {
    pub query_deadline: Duration,
    pub patient_fetch_concurrency: usize,
}

impl From<&Config> for PipelineSettings {
    fn from(config: &Config) -> Self {
        Self {
            query_deadline: config.query_deadline,
            patient_fetch_concurrency: config.patient_fetch_concurrency,
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            query_deadline: Duration::from_secs(120),
            patient_fetch_concurrency: 1,
        }
    }
}

/// One request/response cycle: text in, patient records out
pub struct QueryPipeline<'a, A: ?Sized> {
    api: &'a A,
    settings: PipelineSettings,
}

impl<'a, A: FhirApi + ?Sized> QueryPipeline<'a, A> {
    pub fn new(api: &'a A, settings: PipelineSettings) -> Self {
        Self { api, settings }
    }

    pub async fn run(&self, query: &str) -> Result<Vec<PatientRecord>, QueryError> {
        if query.is_empty() {
            return Err(QueryError::Input("no query provided".to_string()));
        }

        let Some(filter) = extract(query).into_filter() else {
            return Err(QueryError::Input("no valid condition found".to_string()));
        };
        tracing::info!(
            diagnosis = filter.diagnosis,
            age_filter = ?filter.age_filter,
            "Resolved query filters"
        );

        let deadline = Instant::now() + self.settings.query_deadline;
        let patient_ids = ConditionSearch::new(self.api)
            .with_deadline(deadline)
            .run(filter.diagnosis)
            .await?;

        let today = Local::now().date_naive();
        let records = PatientResolver::new(self.api, today)
            .with_concurrency(self.settings.patient_fetch_concurrency)
            .resolve(patient_ids, filter.age_filter, filter.diagnosis)
            .await;

        Ok(records)
    }
}
