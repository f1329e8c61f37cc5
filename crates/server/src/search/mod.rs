//! Query resolution against a remote FHIR server
//!
//! Free text is reduced to a diagnosis keyword and optional age comparison,
//! Condition pages are walked for patients carrying that diagnosis, and the
//! patients are fetched, filtered and de-duplicated into a short result list.

mod client;
mod conditions;
mod patients;
mod pipeline;
#[cfg(test)]
mod testing;

pub use client::{FetchError, FhirApi, FhirClient};
pub use conditions::{ConditionSearch, MAX_PAGES, PAGE_SIZE, first_page_url};
pub use patients::{MAX_RESULTS, PatientResolver};
pub use pipeline::{PipelineSettings, QueryPipeline};

/// Failures that end a query
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// The query text cannot be used; the caller must rephrase
    #[error("{0}")]
    Input(String),
    /// The remote server failed the Condition search
    #[error("{0}")]
    Upstream(String),
}
