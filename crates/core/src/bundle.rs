use serde::{Deserialize, Serialize};

/// FHIR Bundle resource (simplified for paged search responses)
///
/// Only the parts needed to walk a searchset are modelled. Unknown fields
/// are ignored so real server payloads decode without loss of the bits we use.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle<R> {
    #[serde(default = "bundle_resource_type")]
    pub resource_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u32>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub link: Vec<BundleLink>,

    #[serde(default = "Vec::new", skip_serializing_if = "Vec::is_empty")]
    pub entry: Vec<BundleEntry<R>>,
}

fn bundle_resource_type() -> String {
    "Bundle".to_string()
}

/// Pagination link inside a Bundle
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BundleLink {
    #[serde(default)]
    pub relation: String,
    #[serde(default)]
    pub url: String,
}

/// One entry of a Bundle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleEntry<R> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_url: Option<String>,
    pub resource: Option<R>,
}

impl<R> Bundle<R> {
    /// URL of the `next` page, if the server advertised one
    pub fn next_link(&self) -> Option<&str> {
        self.link
            .iter()
            .find(|l| l.relation == "next")
            .map(|l| l.url.as_str())
            .filter(|url| !url.is_empty())
    }

    /// Resources carried by the entries, skipping entries without one
    pub fn resources(&self) -> impl Iterator<Item = &R> {
        self.entry.iter().filter_map(|e| e.resource.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Stub {
        id: String,
    }

    #[test]
    fn next_link_is_found_among_other_relations() {
        let bundle: Bundle<Stub> = serde_json::from_value(json!({
            "resourceType": "Bundle",
            "link": [
                {"relation": "self", "url": "http://x/Condition?page=1"},
                {"relation": "next", "url": "http://x/Condition?page=2"}
            ],
            "entry": [{"resource": {"id": "c1"}}, {"fullUrl": "http://x/Condition/c2"}]
        }))
        .unwrap();

        assert_eq!(bundle.next_link(), Some("http://x/Condition?page=2"));
        let ids: Vec<_> = bundle.resources().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["c1"]);
    }

    #[test]
    fn missing_link_and_entry_decode_as_empty() {
        let bundle: Bundle<Stub> =
            serde_json::from_value(json!({"resourceType": "Bundle", "type": "searchset"})).unwrap();
        assert!(bundle.next_link().is_none());
        assert_eq!(bundle.resources().count(), 0);
    }

    #[test]
    fn empty_next_url_is_ignored() {
        let bundle: Bundle<Stub> = serde_json::from_value(json!({
            "link": [{"relation": "next", "url": ""}]
        }))
        .unwrap();
        assert!(bundle.next_link().is_none());
    }
}
