//! Patient lookup, age filtering and de-duplication

use std::collections::HashSet;
use std::fmt;

use chrono::NaiveDate;
use fhir_query_core::{AgeFilter, PatientRecord, PatientResource};
use futures::stream::{self, StreamExt};

use super::client::{FetchError, FhirApi};

/// Most records a single query returns
pub const MAX_RESULTS: usize = 5;

/// Why a candidate identifier produced no record
#[derive(Debug)]
enum Rejection {
    /// The patient could not be fetched or decoded
    Fetch(FetchError),
    /// No parsable `YYYY-MM-DD` birth date
    NoAge,
    OutsideAgeFilter(u32, AgeFilter),
    /// Same (name, age) as a record already accepted
    Duplicate(String, u32),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Fetch(e) => write!(f, "fetch failed: {e}"),
            Rejection::NoAge => f.write_str("no usable birth date"),
            Rejection::OutsideAgeFilter(age, filter) => {
                write!(f, "age {age} does not meet {filter}")
            }
            Rejection::Duplicate(name, age) => write!(f, "duplicate of {name} ({age})"),
        }
    }
}

/// Turns patient identifiers into at most [`MAX_RESULTS`] patient records
pub struct PatientResolver<'a, A: ?Sized> {
    api: &'a A,
    today: NaiveDate,
    concurrency: usize,
}

impl<'a, A: FhirApi + ?Sized> PatientResolver<'a, A> {
    /// Resolver computing ages as of `today`, fetching one patient at a time
    pub fn new(api: &'a A, today: NaiveDate) -> Self {
        Self {
            api,
            today,
            concurrency: 1,
        }
    }

    /// Allow up to `concurrency` patient fetches in flight
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Fetch patients in ascending identifier order and keep those passing
    /// `age_filter`, skipping any (name, age) already kept.
    ///
    /// Fetches may run ahead of each other but results are judged one by one
    /// in identifier order, and the walk ends at the [`MAX_RESULTS`]th
    /// accepted record. A failed fetch only skips that identifier.
    pub async fn resolve<I>(
        &self,
        ids: I,
        age_filter: Option<AgeFilter>,
        condition: &str,
    ) -> Vec<PatientRecord>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let mut ids: Vec<String> = ids.into_iter().map(Into::into).collect();
        ids.sort();
        ids.dedup();

        let api = self.api;
        let mut fetches = stream::iter(ids)
            .map(move |id| async move {
                let result = api.fetch_patient(&id).await;
                (id, result)
            })
            .buffered(self.concurrency);

        let mut records: Vec<PatientRecord> = Vec::new();
        let mut seen: HashSet<(String, u32)> = HashSet::new();

        while let Some((id, result)) = fetches.next().await {
            match self.judge(&id, result, age_filter, condition, &seen) {
                Ok(record) => {
                    tracing::debug!(patient_id = %id, age = record.age, "Patient accepted");
                    seen.insert((record.name.clone(), record.age));
                    records.push(record);
                }
                Err(Rejection::Fetch(e)) => {
                    tracing::warn!(patient_id = %id, error = %e, "Failed to fetch patient, skipping");
                }
                Err(rejection) => {
                    tracing::debug!(patient_id = %id, reason = %rejection, "Patient skipped");
                }
            }

            if records.len() >= MAX_RESULTS {
                break;
            }
        }

        records
    }

    fn judge(
        &self,
        id: &str,
        fetched: Result<PatientResource, FetchError>,
        age_filter: Option<AgeFilter>,
        condition: &str,
        seen: &HashSet<(String, u32)>,
    ) -> Result<PatientRecord, Rejection> {
        let patient = fetched.map_err(Rejection::Fetch)?;
        tracing::debug!(patient_id = %id, resource = ?patient, "Fetched patient");

        let age = patient.age_on(self.today).ok_or(Rejection::NoAge)?;
        if let Some(filter) = age_filter {
            if !filter.accepts(age) {
                return Err(Rejection::OutsideAgeFilter(age, filter));
            }
        }

        let name = patient.display_name();
        if seen.contains(&(name.clone(), age)) {
            return Err(Rejection::Duplicate(name, age));
        }

        Ok(PatientRecord {
            id: id.to_string(),
            name,
            age,
            gender: patient.gender_or_default(),
            condition: condition.to_string(),
            country: patient.country(),
        })
    }
}
