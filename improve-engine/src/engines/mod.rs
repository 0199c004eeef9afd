//! Rewrite engines.
//!
//! Each engine takes a fragment plus the format it was detected as and returns
//! a corrected fragment in that same format.

mod fake;
mod generative;
mod grammar_check;
mod polish_only;
pub mod shapes;

pub use fake::FakeEngine;
pub use generative::GenerativeEngine;
pub use grammar_check::GrammarCheckEngine;
pub use polish_only::PolishOnlyEngine;

use crate::format::ContentFormat;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Error type for a single engine call.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("API returned error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("No supported API shape at {base_url}")]
    NoSupportedShape { base_url: String },

    #[error("Engine produced no usable output")]
    EmptyOutput,

    #[error("Engine output is not {expected}")]
    FormatMismatch { expected: ContentFormat },
}

/// A text rewriting backend.
#[async_trait]
pub trait RewriteEngine: Send + Sync + fmt::Debug {
    /// Rewrite `content`, which was detected as `format`.
    async fn rewrite(&self, content: &str, format: ContentFormat) -> Result<String, EngineError>;

    /// Short name used in logs and CLI output (e.g. "generative", "grammar-check").
    fn engine_name(&self) -> &'static str;
}

/// Shared HTTP client for an engine. `None` leaves requests unbounded.
pub(crate) fn build_client(timeout: Option<Duration>) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().context("Failed to build HTTP client")
}

/// Map a transport failure, keeping timeouts recognizable in logs.
pub(crate) fn request_failed(e: reqwest::Error) -> EngineError {
    if e.is_timeout() {
        EngineError::RequestFailed(format!("timed out: {}", e))
    } else {
        EngineError::RequestFailed(e.to_string())
    }
}
