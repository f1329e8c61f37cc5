//! Free-text query to filter extraction
//!
//! Recognises one diagnosis keyword from a closed vocabulary and an optional
//! age comparison such as "over 50" or "younger than 30".

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Diagnosis keywords a query can filter on
pub const DIAGNOSIS_VOCABULARY: [&str; 6] = [
    "diabetic",
    "asthma",
    "hypertension",
    "cancer",
    "obesity",
    "pneumonia",
];

/// Age phrases in priority order. The first pattern that matches anywhere
/// in the text wins, regardless of where it sits in the text.
static AGE_PATTERNS: LazyLock<Vec<(Regex, AgeOperator)>> = LazyLock::new(|| {
    [
        (r"over (\d+)", AgeOperator::GreaterThan),
        (r"under (\d+)", AgeOperator::LessThan),
        (r"older than (\d+)", AgeOperator::GreaterThan),
        (r"younger than (\d+)", AgeOperator::LessThan),
    ]
    .into_iter()
    .map(|(pattern, op)| (Regex::new(pattern).expect("static age pattern"), op))
    .collect()
});

/// Comparison applied to a patient's age
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgeOperator {
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = "<")]
    LessThan,
}

impl fmt::Display for AgeOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgeOperator::GreaterThan => f.write_str(">"),
            AgeOperator::LessThan => f.write_str("<"),
        }
    }
}

/// Age comparison extracted from a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeFilter {
    pub operator: AgeOperator,
    pub value: u32,
}

impl AgeFilter {
    pub fn new(operator: AgeOperator, value: u32) -> Self {
        Self { operator, value }
    }

    /// Strict comparison: `> 50` rejects 50, `< 30` rejects 30
    pub fn accepts(&self, age: u32) -> bool {
        match self.operator {
            AgeOperator::GreaterThan => age > self.value,
            AgeOperator::LessThan => age < self.value,
        }
    }
}

impl fmt::Display for AgeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "age {} {}", self.operator, self.value)
    }
}

/// Result of scanning a query. Both halves are resolved independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Extraction {
    pub diagnosis: Option<&'static str>,
    pub age_filter: Option<AgeFilter>,
}

impl Extraction {
    /// Resolved filter, present only when a diagnosis was recognised
    pub fn into_filter(self) -> Option<Filter> {
        Some(Filter {
            diagnosis: self.diagnosis?,
            age_filter: self.age_filter,
        })
    }
}

/// A diagnosis keyword plus optional age comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Filter {
    pub diagnosis: &'static str,
    pub age_filter: Option<AgeFilter>,
}

/// Extract the diagnosis keyword and age comparison from `text`.
pub fn extract(text: &str) -> Extraction {
    let lowered = text.to_lowercase();
    Extraction {
        diagnosis: find_diagnosis(&lowered),
        age_filter: find_age_filter(&lowered),
    }
}

/// First token, left to right, that is exactly a vocabulary keyword
fn find_diagnosis(lowered: &str) -> Option<&'static str> {
    tokenize(lowered).find_map(|token| {
        DIAGNOSIS_VOCABULARY
            .iter()
            .copied()
            .find(|keyword| *keyword == token)
    })
}

fn find_age_filter(lowered: &str) -> Option<AgeFilter> {
    AGE_PATTERNS.iter().find_map(|(pattern, operator)| {
        // A number too large for u32 does not count as a match
        let value = pattern.captures(lowered)?.get(1)?.as_str().parse().ok()?;
        Some(AgeFilter::new(*operator, value))
    })
}

/// Word tokens: maximal runs of alphanumeric characters
fn tokenize(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
}
