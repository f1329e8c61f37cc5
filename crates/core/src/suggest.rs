//! Next-word suggestions for partially typed queries

use crate::filter::DIAGNOSIS_VOCABULARY;

const QUERY_VERBS: [&str; 4] = ["list", "show", "find", "get"];
const AGE_WORDS: [&str; 4] = ["over", "under", "younger", "older"];
const AGE_VALUES: [&str; 5] = ["30", "40", "50", "60", "70"];

/// Words that may follow `word`, if `word` triggers any
fn follow_ups(word: &str) -> Option<&'static [&'static str]> {
    if QUERY_VERBS.contains(&word) {
        Some(&DIAGNOSIS_VOCABULARY)
    } else if DIAGNOSIS_VOCABULARY.contains(&word) {
        Some(&["patients"])
    } else if word == "patients" {
        Some(&AGE_WORDS)
    } else if AGE_WORDS.contains(&word) {
        Some(&AGE_VALUES)
    } else {
        None
    }
}

/// Complete a partially typed query.
///
/// When the last word triggers follow-ups, each follow-up is appended.
/// Otherwise, when the word before it does, the last word is treated as a
/// prefix and replaced by each follow-up it starts.
pub fn suggest(text: &str) -> Vec<String> {
    let trimmed = text.trim();
    let words: Vec<&str> = trimmed.split_whitespace().collect();
    let Some((last, head)) = words.split_last() else {
        return Vec::new();
    };
    let last = last.to_lowercase();

    if let Some(next) = follow_ups(&last) {
        return next.iter().map(|w| format!("{trimmed} {w}")).collect();
    }

    let Some(previous) = head.last() else {
        return Vec::new();
    };
    let Some(candidates) = follow_ups(&previous.to_lowercase()) else {
        return Vec::new();
    };

    let stem = head.join(" ");
    candidates
        .iter()
        .filter(|w| w.starts_with(last.as_str()))
        .map(|w| format!("{stem} {w}"))
        .collect()
}
