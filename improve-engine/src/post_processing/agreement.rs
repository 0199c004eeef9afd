use super::TextProcessor;
use once_cell::sync::Lazy;
use regex::Regex;

/// "<Name> and I was" → "<Name> and I were".
///
/// Only fires when the word before "and" is a capitalized name or a subject
/// pronoun, so clauses like "he left and I was sad" are left alone.
static COMPOUND_SUBJECT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([A-Z][a-z]+|[Hh]e|[Ss]he|[Tt]hey|[Ww]e|[Yy]ou)\s+and\s+[Ii]\s+was\b")
        .expect("Invalid compound subject regex pattern")
});

/// Subject-verb agreement nudge for compound subjects with "I".
pub struct AgreementProcessor;

impl AgreementProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AgreementProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextProcessor for AgreementProcessor {
    fn process(&self, text: &str) -> String {
        COMPOUND_SUBJECT_REGEX
            .replace_all(text, "${1} and I were")
            .into_owned()
    }
}
