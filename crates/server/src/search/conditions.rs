//! Paged Condition search collecting the patients a diagnosis applies to

use std::collections::BTreeSet;

use tokio::time::Instant;

use super::QueryError;
use super::client::FhirApi;

/// Entries requested per Condition page
pub const PAGE_SIZE: u32 = 50;

/// Pages read before the search stops, successfully, with what it has
pub const MAX_PAGES: usize = 50;

/// First page of an unfiltered Condition search
pub fn first_page_url(base_url: &str) -> String {
    format!("{base_url}/Condition?_count={PAGE_SIZE}&_format=json")
}

/// Walks Condition search pages and gathers matching patient identifiers
pub struct ConditionSearch<'a, A: ?Sized> {
    api: &'a A,
    deadline: Option<Instant>,
}

impl<'a, A: FhirApi + ?Sized> ConditionSearch<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self { api, deadline: None }
    }

    /// Stop following `next` links once `deadline` passes
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Identifiers of patients with a Condition mentioning `diagnosis`.
    ///
    /// Pages are fetched strictly in sequence. The walk ends when a page has
    /// no `next` link, after [`MAX_PAGES`] pages, or at the deadline; the
    /// last two are truncations, not errors. Any failed page fails the whole
    /// search and nothing gathered so far is returned.
    pub async fn run(&self, diagnosis: &str) -> Result<BTreeSet<String>, QueryError> {
        let mut patient_ids = BTreeSet::new();
        let mut next_url = Some(first_page_url(self.api.base_url()));
        let mut pages_loaded = 0;

        while let Some(url) = next_url.take() {
            if pages_loaded >= MAX_PAGES {
                tracing::warn!(pages = pages_loaded, "Condition page cap reached, stopping search");
                break;
            }

            if self.deadline.is_some_and(|d| Instant::now() >= d) {
                tracing::warn!(pages = pages_loaded, "Condition search deadline reached, stopping search");
                break;
            }

            let fetch = self.api.fetch_condition_page(&url);
            let result = match self.deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline, fetch).await {
                    Ok(result) => result,
                    Err(_) => {
                        tracing::warn!(pages = pages_loaded, "Condition search deadline reached mid-page, stopping search");
                        break;
                    }
                },
                None => fetch.await,
            };
            let page = result.map_err(|e| {
                tracing::error!(error = %e, url = %url, "Condition search failed");
                QueryError::Upstream(format!("Error fetching condition data: {e}"))
            })?;
            pages_loaded += 1;

            let before = patient_ids.len();
            for condition in page.resources().filter(|c| c.mentions(diagnosis)) {
                if let Some(id) = condition.subject_id() {
                    patient_ids.insert(id.to_string());
                }
            }

            tracing::debug!(
                page = pages_loaded,
                entries = page.entry.len(),
                new_patients = patient_ids.len() - before,
                "Condition page scanned"
            );

            next_url = page.next_link().map(str::to_string);
        }

        tracing::info!(
            diagnosis,
            pages = pages_loaded,
            patients = patient_ids.len(),
            "Condition search complete"
        );
        Ok(patient_ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::testing::FakeFhir;
    use reqwest::StatusCode;
    use serde_json::json;
    use std::time::Duration;

    fn condition(display: &str, patient: &str) -> serde_json::Value {
        json!({
            "resource": {
                "resourceType": "Condition",
                "code": {"coding": [{"display": display}]},
                "subject": {"reference": format!("Patient/{patient}")}
            }
        })
    }

    #[tokio::test]
    async fn follows_next_links_and_collapses_duplicates() {
        let fake = FakeFhir::new();
        fake.condition_page(
            &first_page_url(fake.base_url()),
            vec![
                condition("Diabetes mellitus, diabetic", "b"),
                condition("Asthma", "x"),
                condition("Diabetic nephropathy", "a"),
            ],
            Some("http://fake/page2"),
        );
        fake.condition_page(
            "http://fake/page2",
            vec![condition("diabetic foot", "a"), condition("DIABETIC eye", "c")],
            None,
        );

        let ids = ConditionSearch::new(&fake).run("diabetic").await.unwrap();

        assert_eq!(ids.into_iter().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(fake.condition_requests(), 2);
    }

    #[tokio::test]
    async fn free_text_code_description_matches() {
        let fake = FakeFhir::new();
        fake.condition_page(
            &first_page_url(fake.base_url()),
            vec![json!({"resource": {
                "code": {"text": "Community acquired pneumonia"},
                "subject": {"reference": "Patient/p9"}
            }})],
            None,
        );

        let ids = ConditionSearch::new(&fake).run("pneumonia").await.unwrap();
        assert!(ids.contains("p9"));
    }

    #[tokio::test]
    async fn stops_after_page_cap_without_error() {
        let fake = FakeFhir::new();
        // Every page links to itself, so only the cap ends the walk
        let url = first_page_url(fake.base_url());
        fake.condition_page(&url, vec![condition("cancer", "p1")], Some(&url));

        let ids = ConditionSearch::new(&fake).run("cancer").await.unwrap();

        assert_eq!(ids.len(), 1);
        assert_eq!(fake.condition_requests(), MAX_PAGES);
    }

    #[tokio::test]
    async fn failed_page_aborts_whole_search() {
        let fake = FakeFhir::new();
        fake.condition_page(
            &first_page_url(fake.base_url()),
            vec![condition("asthma", "p1")],
            Some("http://fake/page2"),
        );
        fake.condition_status("http://fake/page2", StatusCode::SERVICE_UNAVAILABLE);

        let err = ConditionSearch::new(&fake).run("asthma").await.unwrap_err();

        assert_eq!(
            err,
            QueryError::Upstream("Error fetching condition data: 503 Service Unavailable".into())
        );
    }

    #[tokio::test]
    async fn passed_deadline_truncates_without_error() {
        let fake = FakeFhir::new();
        let url = first_page_url(fake.base_url());
        fake.condition_page(&url, vec![condition("obesity", "p1")], Some(&url));

        let deadline = Instant::now();
        let ids = ConditionSearch::new(&fake)
            .with_deadline(deadline)
            .run("obesity")
            .await
            .unwrap();

        assert!(ids.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_during_slow_page_keeps_earlier_pages() {
        let fake = FakeFhir::new();
        fake.condition_page(
            &first_page_url(fake.base_url()),
            vec![condition("obesity", "early-1"), condition("Obesity class II", "early-2")],
            Some("http://fake/page2"),
        );
        fake.condition_page("http://fake/page2", vec![condition("obesity", "late")], None);
        fake.condition_delay("http://fake/page2", Duration::from_secs(10));

        let deadline = Instant::now() + Duration::from_secs(5);
        let ids = ConditionSearch::new(&fake)
            .with_deadline(deadline)
            .run("obesity")
            .await
            .unwrap();

        assert_eq!(ids.into_iter().collect::<Vec<_>>(), vec!["early-1", "early-2"]);
        assert_eq!(fake.condition_requests(), 2);
    }
}
