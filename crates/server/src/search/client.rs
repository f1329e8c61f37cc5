//! HTTP client for the remote FHIR server

use std::time::Duration;

use async_trait::async_trait;
use fhir_query_core::{Bundle, Condition, PatientResource};
use reqwest::{StatusCode, header};
use serde::de::DeserializeOwned;

const FHIR_JSON: &str = "application/fhir+json";

/// Failure of a single upstream request
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("{0}")]
    Status(StatusCode),
    #[error("request failed: {0}")]
    Transport(String),
    #[error("invalid response body: {0}")]
    Decode(String),
}

/// Read access to the remote FHIR server
///
/// Implemented by [`FhirClient`] over HTTP. The search and resolve stages are
/// generic over this trait so they can run against in-memory data in tests.
#[async_trait]
pub trait FhirApi: Send + Sync {
    /// Base URL, without trailing slash
    fn base_url(&self) -> &str;

    /// Fetch one page of a Condition search. `url` is absolute: either the
    /// first page built from the base URL or a `next` link returned earlier.
    async fn fetch_condition_page(&self, url: &str) -> Result<Bundle<Condition>, FetchError>;

    /// Fetch `Patient/{id}`
    async fn fetch_patient(&self, id: &str) -> Result<PatientResource, FetchError>;

    /// Check that the server answers its capability endpoint
    async fn ping(&self) -> Result<(), FetchError>;
}

/// Client for a FHIR R4 REST server
///
/// Holds a single connection pool for the life of the process.
#[derive(Clone)]
pub struct FhirClient {
    http: reqwest::Client,
    base_url: String,
}

impl FhirClient {
    /// Create a client for `base_url` with a per-request `timeout`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// GET `url` and decode the JSON body, recording the outcome per `kind`
    async fn get_json<T: DeserializeOwned>(
        &self,
        kind: &'static str,
        url: &str,
    ) -> Result<T, FetchError> {
        let result = self.send(url).await;
        let outcome = match &result {
            Ok(_) => "ok",
            Err(FetchError::Status(_)) => "status",
            Err(FetchError::Transport(_)) => "transport",
            Err(FetchError::Decode(_)) => "decode",
        };
        metrics::counter!(
            "fhir_upstream_requests_total",
            "kind" => kind,
            "outcome" => outcome
        )
        .increment(1);

        result
    }

    async fn send<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let response = self
            .http
            .get(url)
            .header(header::ACCEPT, FHIR_JSON)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(url, status = %status, "Upstream returned non-success status");
            return Err(FetchError::Status(status));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))
    }
}

#[async_trait]
impl FhirApi for FhirClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch_condition_page(&self, url: &str) -> Result<Bundle<Condition>, FetchError> {
        self.get_json("condition_page", url).await
    }

    async fn fetch_patient(&self, id: &str) -> Result<PatientResource, FetchError> {
        let url = format!("{}/Patient/{}", self.base_url, id);
        self.get_json("patient", &url).await
    }

    async fn ping(&self) -> Result<(), FetchError> {
        let url = format!("{}/metadata", self.base_url);
        self.get_json::<serde::de::IgnoredAny>("metadata", &url)
            .await
            .map(|_| ())
    }
}
