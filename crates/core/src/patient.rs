//! Patient resource shape and the flattened record returned to callers

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Placeholder used when a patient carries no usable name
pub const UNKNOWN_NAME: &str = "Unknown";

/// Placeholder for absent gender or country
pub const MISSING_FIELD: &str = "-";

/// FHIR Patient resource, reduced to the demographics we report
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientResource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub name: Vec<HumanName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub address: Vec<Address>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HumanName {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub given: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Address {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl PatientResource {
    /// First given name and family name of the first listed name.
    ///
    /// Falls back to [`UNKNOWN_NAME`] when no name entry exists or the
    /// first entry has neither part.
    pub fn display_name(&self) -> String {
        let Some(first) = self.name.first() else {
            return UNKNOWN_NAME.to_string();
        };
        let given = first.given.first().map(String::as_str).unwrap_or("");
        let family = first.family.as_deref().unwrap_or("");

        let name = format!("{given} {family}").trim().to_string();
        if name.is_empty() {
            UNKNOWN_NAME.to_string()
        } else {
            name
        }
    }

    pub fn gender_or_default(&self) -> String {
        self.gender
            .clone()
            .unwrap_or_else(|| MISSING_FIELD.to_string())
    }

    /// Country of the first listed address
    pub fn country(&self) -> String {
        self.address
            .first()
            .and_then(|a| a.country.clone())
            .unwrap_or_else(|| MISSING_FIELD.to_string())
    }

    /// Age in whole years on `today`, or `None` when the birth date is
    /// missing, not `YYYY-MM-DD`, or lies after `today`.
    pub fn age_on(&self, today: NaiveDate) -> Option<u32> {
        calculate_age(self.birth_date.as_deref()?, today)
    }
}

/// Whole calendar years elapsed between `birth_date` (`YYYY-MM-DD`) and `today`.
///
/// One year is taken off when today's (month, day) is before the birthday's.
pub fn calculate_age(birth_date: &str, today: NaiveDate) -> Option<u32> {
    let birth = NaiveDate::parse_from_str(birth_date.trim(), "%Y-%m-%d").ok()?;
    if birth > today {
        return None;
    }

    let mut years = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        years -= 1;
    }
    u32::try_from(years).ok()
}

/// Flattened patient row returned by a query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub id: String,
    pub name: String,
    pub age: u32,
    pub gender: String,
    pub condition: String,
    pub country: String,
}

impl PatientRecord {
    /// Key used to collapse duplicate rows within one result set
    pub fn dedup_key(&self) -> (&str, u32) {
        (&self.name, self.age)
    }
}
