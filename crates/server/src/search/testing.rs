//! In-memory FHIR server used by unit tests

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use fhir_query_core::{Bundle, Condition, PatientResource};
use reqwest::StatusCode;
use serde_json::{Value as JsonValue, json};

use super::client::{FetchError, FhirApi};

pub(crate) struct FakeFhir {
    conditions: Mutex<HashMap<String, Result<JsonValue, StatusCode>>>,
    condition_delays: Mutex<HashMap<String, Duration>>,
    patients: Mutex<HashMap<String, Result<JsonValue, StatusCode>>>,
    condition_requests: AtomicUsize,
    patient_requests: Mutex<Vec<String>>,
}

impl FakeFhir {
    pub(crate) fn new() -> Self {
        Self {
            conditions: Mutex::new(HashMap::new()),
            condition_delays: Mutex::new(HashMap::new()),
            patients: Mutex::new(HashMap::new()),
            condition_requests: AtomicUsize::new(0),
            patient_requests: Mutex::new(Vec::new()),
        }
    }

    /// Serve a searchset page at `url` with the given entries
    pub(crate) fn condition_page(&self, url: &str, entries: Vec<JsonValue>, next: Option<&str>) {
        let mut link = vec![json!({"relation": "self", "url": url})];
        if let Some(next) = next {
            link.push(json!({"relation": "next", "url": next}));
        }
        let bundle = json!({
            "resourceType": "Bundle",
            "type": "searchset",
            "link": link,
            "entry": entries
        });
        self.conditions.lock().unwrap().insert(url.to_string(), Ok(bundle));
    }

    pub(crate) fn condition_status(&self, url: &str, status: StatusCode) {
        self.conditions.lock().unwrap().insert(url.to_string(), Err(status));
    }

    /// Answer requests for `url` only after `delay`
    pub(crate) fn condition_delay(&self, url: &str, delay: Duration) {
        self.condition_delays.lock().unwrap().insert(url.to_string(), delay);
    }

    pub(crate) fn patient(&self, id: &str, resource: JsonValue) {
        self.patients.lock().unwrap().insert(id.to_string(), Ok(resource));
    }

    pub(crate) fn patient_status(&self, id: &str, status: StatusCode) {
        self.patients.lock().unwrap().insert(id.to_string(), Err(status));
    }

    pub(crate) fn condition_requests(&self) -> usize {
        self.condition_requests.load(Ordering::SeqCst)
    }

    pub(crate) fn patient_requests(&self) -> Vec<String> {
        self.patient_requests.lock().unwrap().clone()
    }
}

fn lookup<T: serde::de::DeserializeOwned>(
    table: &Mutex<HashMap<String, Result<JsonValue, StatusCode>>>,
    key: &str,
) -> Result<T, FetchError> {
    match table.lock().unwrap().get(key) {
        Some(Ok(body)) => {
            serde_json::from_value(body.clone()).map_err(|e| FetchError::Decode(e.to_string()))
        }
        Some(Err(status)) => Err(FetchError::Status(*status)),
        None => Err(FetchError::Status(StatusCode::NOT_FOUND)),
    }
}

#[async_trait]
impl FhirApi for FakeFhir {
    fn base_url(&self) -> &str {
        "http://fake"
    }

    async fn fetch_condition_page(&self, url: &str) -> Result<Bundle<Condition>, FetchError> {
        self.condition_requests.fetch_add(1, Ordering::SeqCst);
        let delay = self.condition_delays.lock().unwrap().get(url).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        lookup(&self.conditions, url)
    }

    async fn fetch_patient(&self, id: &str) -> Result<PatientResource, FetchError> {
        self.patient_requests.lock().unwrap().push(id.to_string());
        lookup(&self.patients, id)
    }

    async fn ping(&self) -> Result<(), FetchError> {
        Ok(())
    }
}
