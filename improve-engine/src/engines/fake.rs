//! Fake engine for testing.
//!
//! Returns a canned reply or a canned failure and counts calls, so fallback
//! behavior can be exercised without network access.

use super::{EngineError, RewriteEngine};
use crate::format::ContentFormat;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone)]
enum FakeReply {
    Text(String),
    Failure(String),
}

#[derive(Debug)]
pub struct FakeEngine {
    name: &'static str,
    reply: FakeReply,
    calls: AtomicUsize,
}

impl FakeEngine {
    /// An engine that always answers `text`.
    pub fn replying(name: &'static str, text: &str) -> Self {
        Self {
            name,
            reply: FakeReply::Text(text.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    /// An engine that always fails with `RequestFailed(message)`.
    pub fn failing(name: &'static str, message: &str) -> Self {
        Self {
            name,
            reply: FakeReply::Failure(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RewriteEngine for FakeEngine {
    async fn rewrite(&self, _content: &str, _format: ContentFormat) -> Result<String, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            FakeReply::Text(text) => Ok(text.clone()),
            FakeReply::Failure(message) => Err(EngineError::RequestFailed(message.clone())),
        }
    }

    fn engine_name(&self) -> &'static str {
        self.name
    }
}
