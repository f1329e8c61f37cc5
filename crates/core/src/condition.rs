use serde::{Deserialize, Serialize};

/// FHIR Condition resource, reduced to what diagnosis matching needs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Condition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeableConcept>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<Reference>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CodeableConcept {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub coding: Vec<Coding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Coding {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Reference {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl Condition {
    /// True when `term` appears, ignoring case, in any coding display or in
    /// the free-text description of the condition code.
    pub fn mentions(&self, term: &str) -> bool {
        let Some(code) = &self.code else {
            return false;
        };
        let term = term.to_lowercase();

        code.coding
            .iter()
            .filter_map(|c| c.display.as_deref())
            .chain(code.text.as_deref())
            .any(|text| text.to_lowercase().contains(&term))
    }

    /// Identifier of the referenced patient: the trailing path segment of
    /// `subject.reference` (`Patient/123` yields `123`).
    pub fn subject_id(&self) -> Option<&str> {
        let reference = self.subject.as_ref()?.reference.as_deref()?;
        reference.rsplit('/').next().filter(|id| !id.is_empty())
    }
}
