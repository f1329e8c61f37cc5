//! Shared application state

use metrics_exporter_prometheus::PrometheusHandle;

use crate::search::{FhirClient, PipelineSettings};

/// Process-wide, read-only state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub fhir: FhirClient,
    pub settings: PipelineSettings,
    pub prometheus: PrometheusHandle,
}
