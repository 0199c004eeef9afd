//! Positional application of grammar-checker replacements.
//!
//! The checker reports offsets in UTF-16 code units against the plain-text
//! projection of the input. Edits are resolved to byte ranges, screened for
//! overlaps, then applied from the highest offset down so an applied edit never
//! shifts the offsets of the edits still pending.

use improve_types::EngineReplacement;
use tracing::debug;

/// A replacement resolved to a byte range of the text.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ByteEdit {
    start: usize,
    end: usize,
    value: String,
}

/// Apply `replacements` to `text`.
///
/// Replacements outside the text, splitting a character, or overlapping an
/// earlier-starting replacement are dropped.
pub fn apply_replacements(text: &str, replacements: &[EngineReplacement]) -> String {
    let edits = resolve_edits(text, replacements);
    apply_descending(text, edits)
}

fn resolve_edits(text: &str, replacements: &[EngineReplacement]) -> Vec<ByteEdit> {
    let boundaries = utf16_boundaries(text);

    let mut edits: Vec<ByteEdit> = replacements
        .iter()
        .filter_map(|replacement| {
            let start = utf16_to_byte(&boundaries, replacement.offset);
            let end = replacement
                .end()
                .and_then(|end| utf16_to_byte(&boundaries, end));
            match (start, end) {
                (Some(start), Some(end)) if start <= end => Some(ByteEdit {
                    start,
                    end,
                    value: replacement.replacement_value.clone(),
                }),
                _ => {
                    debug!(
                        "Dropping replacement at {}+{}: outside text or inside a character",
                        replacement.offset, replacement.length
                    );
                    None
                }
            }
        })
        .collect();

    // Stable: equal offsets keep the checker's order
    edits.sort_by_key(|edit| edit.start);

    let mut accepted: Vec<ByteEdit> = Vec::with_capacity(edits.len());
    for edit in edits {
        if let Some(previous) = accepted.last() {
            if edit.start < previous.end {
                debug!(
                    "Dropping replacement {}..{} overlapping {}..{}",
                    edit.start, edit.end, previous.start, previous.end
                );
                continue;
            }
        }
        accepted.push(edit);
    }

    accepted
}

fn apply_descending(text: &str, mut edits: Vec<ByteEdit>) -> String {
    edits.sort_by(|a, b| b.start.cmp(&a.start));

    let mut result = text.to_string();
    for edit in edits {
        result.replace_range(edit.start..edit.end, &edit.value);
    }
    result
}

/// `(utf16_offset, byte_offset)` for every character boundary, end included.
fn utf16_boundaries(text: &str) -> Vec<(usize, usize)> {
    let mut boundaries = Vec::with_capacity(text.len() + 1);
    let mut utf16 = 0;
    for (byte, ch) in text.char_indices() {
        boundaries.push((utf16, byte));
        utf16 += ch.len_utf16();
    }
    boundaries.push((utf16, text.len()));
    boundaries
}

fn utf16_to_byte(boundaries: &[(usize, usize)], offset: usize) -> Option<usize> {
    boundaries
        .binary_search_by_key(&offset, |&(utf16, _)| utf16)
        .ok()
        .map(|index| boundaries[index].1)
}
