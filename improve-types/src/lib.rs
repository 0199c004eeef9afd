//! Wire types shared between the improve server and its clients.

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

/// Body of `POST /improve`.
///
/// The field is named for markup but plain text is accepted as well. Values
/// that are not strings (`false`, `0`, `null`, objects) read as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImproveRequest {
    #[serde(rename = "contentHtml", default, deserialize_with = "string_or_none")]
    pub content_html: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MaybeString {
    Text(String),
    Other(IgnoredAny),
}

fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match MaybeString::deserialize(deserializer)? {
        MaybeString::Text(text) => Some(text),
        MaybeString::Other(_) => None,
    })
}

impl ImproveRequest {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content_html: Some(content.into()),
        }
    }

    /// The content if present and not blank.
    pub fn content(&self) -> Option<&str> {
        self.content_html
            .as_deref()
            .filter(|content| !content.trim().is_empty())
    }
}

/// Successful response of `POST /improve`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImproveResult {
    pub suggestion: String,
}

/// Error body returned by every failing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Response of `GET /health`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub ok: bool,
}

/// A single edit proposed by the grammar checker.
///
/// `offset` and `length` address the plain-text projection of the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineReplacement {
    pub offset: usize,
    pub length: usize,
    #[serde(rename = "replacementValue")]
    pub replacement_value: String,
}

impl EngineReplacement {
    pub fn new(offset: usize, length: usize, replacement_value: impl Into<String>) -> Self {
        Self {
            offset,
            length,
            replacement_value: replacement_value.into(),
        }
    }

    /// End of the replaced span (exclusive), `None` if it overflows.
    pub fn end(&self) -> Option<usize> {
        self.offset.checked_add(self.length)
    }
}
