//! The fallback chain: generative engine first, then the fallback engine.
//!
//! Both steps produce values. A failed or unusable primary result becomes the
//! input to the fallback step instead of unwinding through the caller.

use crate::config::Config;
use crate::engines::{
    EngineError, GenerativeEngine, GrammarCheckEngine, PolishOnlyEngine, RewriteEngine,
};
use crate::format::ContentFormat;
use anyhow::Result;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ImproveError {
    #[error("Missing contentHtml")]
    EmptyContent,

    #[error("All engines failed (primary: {}, fallback: {fallback})", describe_primary(.primary))]
    AllEnginesFailed {
        primary: Option<EngineError>,
        fallback: EngineError,
    },
}

fn describe_primary(primary: &Option<EngineError>) -> String {
    match primary {
        Some(e) => e.to_string(),
        None => "disabled".to_string(),
    }
}

/// A successful rewrite and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Improvement {
    pub suggestion: String,
    pub engine: &'static str,
    pub format: ContentFormat,
}

#[derive(Debug, Clone)]
pub struct Improver {
    primary: Option<Arc<dyn RewriteEngine>>,
    fallback: Arc<dyn RewriteEngine>,
}

impl Improver {
    pub fn new(primary: Option<Arc<dyn RewriteEngine>>, fallback: Arc<dyn RewriteEngine>) -> Self {
        Self { primary, fallback }
    }

    /// Build the chain described by `config`.
    ///
    /// The grammar checker fills the fallback slot unless disabled, in which
    /// case the polisher runs alone.
    pub fn from_config(config: &Config) -> Result<Self> {
        let primary: Option<Arc<dyn RewriteEngine>> = if config.generative.enabled {
            Some(Arc::new(GenerativeEngine::new(&config.generative)?))
        } else {
            None
        };

        let fallback: Arc<dyn RewriteEngine> = if config.grammar_check.enabled {
            Arc::new(GrammarCheckEngine::new(&config.grammar_check, &config.polish)?)
        } else {
            Arc::new(PolishOnlyEngine::new(&config.polish))
        };

        let improver = Self::new(primary, fallback);
        info!("Engine chain: {}", improver.describe());
        Ok(improver)
    }

    /// Engine names in try order, e.g. "generative -> grammar-check".
    pub fn describe(&self) -> String {
        let mut names: Vec<&str> = Vec::new();
        if let Some(primary) = &self.primary {
            names.push(primary.engine_name());
        }
        names.push(self.fallback.engine_name());
        names.join(" -> ")
    }

    /// Improve `content`, keeping its format family.
    pub async fn improve(&self, content: &str) -> Result<Improvement, ImproveError> {
        if content.trim().is_empty() {
            return Err(ImproveError::EmptyContent);
        }

        // Binding for every engine and for the response
        let format = ContentFormat::detect(content);

        let primary_error = match &self.primary {
            Some(engine) => match attempt(engine.as_ref(), content, format).await {
                Ok(improvement) => return Ok(improvement),
                Err(e) => {
                    warn!("{} engine failed, falling back: {}", engine.engine_name(), e);
                    Some(e)
                }
            },
            None => None,
        };

        attempt(self.fallback.as_ref(), content, format)
            .await
            .map_err(|fallback| ImproveError::AllEnginesFailed {
                primary: primary_error,
                fallback,
            })
    }
}

async fn attempt(
    engine: &dyn RewriteEngine,
    content: &str,
    format: ContentFormat,
) -> Result<Improvement, EngineError> {
    let output = engine.rewrite(content, format).await?;
    accept(engine.engine_name(), &output, format)
}

/// Sanitize engine output and check it is non-empty and in `format`.
fn accept(
    engine: &'static str,
    output: &str,
    format: ContentFormat,
) -> Result<Improvement, EngineError> {
    let suggestion = format.extract(output);

    if suggestion.is_empty() {
        return Err(EngineError::EmptyOutput);
    }
    if !format.conforms(&suggestion) {
        return Err(EngineError::FormatMismatch { expected: format });
    }

    Ok(Improvement {
        suggestion,
        engine,
        format,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::FakeEngine;

    fn improver(primary: &Arc<FakeEngine>, fallback: &Arc<FakeEngine>) -> Improver {
        Improver::new(
            Some(primary.clone() as Arc<dyn RewriteEngine>),
            fallback.clone() as Arc<dyn RewriteEngine>,
        )
    }

    #[tokio::test]
    async fn test_primary_success() {
        let primary = Arc::new(FakeEngine::replying("generative", "Hello there."));
        let fallback = Arc::new(FakeEngine::replying("grammar-check", "unused"));

        let result = improver(&primary, &fallback).improve("hello there").await.unwrap();

        assert_eq!(result.suggestion, "Hello there.");
        assert_eq!(result.engine, "generative");
        assert_eq!(result.format, ContentFormat::PlainText);
        assert_eq!(fallback.call_count(), 0);
    }

    #[tokio::test]
    async fn test_primary_failure_falls_back() {
        let primary = Arc::new(FakeEngine::failing("generative", "connection refused"));
        let fallback = Arc::new(FakeEngine::replying("grammar-check", "<p>Hello.</p>"));

        let result = improver(&primary, &fallback).improve("<p>hello</p>").await.unwrap();

        assert_eq!(result.suggestion, "<p>Hello.</p>");
        assert_eq!(result.engine, "grammar-check");
        assert_eq!(primary.call_count(), 1);
        assert_eq!(fallback.call_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_primary_output_falls_back() {
        let primary = Arc::new(FakeEngine::replying("generative", "   "));
        let fallback = Arc::new(FakeEngine::replying("grammar-check", "Hello."));

        let result = improver(&primary, &fallback).improve("hello").await.unwrap();
        assert_eq!(result.engine, "grammar-check");
    }

    #[tokio::test]
    async fn test_format_mismatch_falls_back() {
        let primary = Arc::new(FakeEngine::replying("generative", "<p>Hello.</p>"));
        let fallback = Arc::new(FakeEngine::replying("grammar-check", "Hello."));

        let result = improver(&primary, &fallback).improve("hello").await.unwrap();
        assert_eq!(result.suggestion, "Hello.");
        assert_eq!(result.engine, "grammar-check");
    }

    #[tokio::test]
    async fn test_fallback_output_is_sanitized() {
        let primary = Arc::new(FakeEngine::failing("generative", "down"));
        let fallback = Arc::new(FakeEngine::replying("grammar-check", "```\nHello.\n```"));

        let result = improver(&primary, &fallback).improve("hello").await.unwrap();
        assert_eq!(result.suggestion, "Hello.");
    }

    #[tokio::test]
    async fn test_all_engines_fail() {
        let primary = Arc::new(FakeEngine::failing("generative", "down"));
        let fallback = Arc::new(FakeEngine::failing("grammar-check", "also down"));

        let err = improver(&primary, &fallback).improve("hello").await.unwrap_err();
        match err {
            ImproveError::AllEnginesFailed { primary, fallback } => {
                assert!(matches!(primary, Some(EngineError::RequestFailed(_))));
                assert!(matches!(fallback, EngineError::RequestFailed(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_fallback_format_mismatch_is_failure() {
        let primary = Arc::new(FakeEngine::failing("generative", "down"));
        let fallback = Arc::new(FakeEngine::replying("grammar-check", "no tags here"));

        let err = improver(&primary, &fallback).improve("<p>hi</p>").await.unwrap_err();
        assert!(matches!(err, ImproveError::AllEnginesFailed { .. }));
    }

    #[tokio::test]
    async fn test_empty_content_never_reaches_engines() {
        let primary = Arc::new(FakeEngine::replying("generative", "x"));
        let fallback = Arc::new(FakeEngine::replying("grammar-check", "x"));
        let improver = improver(&primary, &fallback);

        assert!(matches!(improver.improve("").await, Err(ImproveError::EmptyContent)));
        assert!(matches!(improver.improve(" \n ").await, Err(ImproveError::EmptyContent)));
        assert_eq!(primary.call_count(), 0);
        assert_eq!(fallback.call_count(), 0);
    }

    #[tokio::test]
    async fn test_without_primary() {
        let fallback = Arc::new(FakeEngine::replying("polish", "Hello."));
        let improver = Improver::new(None, fallback.clone() as Arc<dyn RewriteEngine>);

        assert_eq!(improver.describe(), "polish");
        let result = improver.improve("hello").await.unwrap();
        assert_eq!(result.engine, "polish");

        let failing = Improver::new(None, Arc::new(FakeEngine::failing("polish", "nope")));
        let err = failing.improve("hello").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "All engines failed (primary: disabled, fallback: Request failed: nope)"
        );
    }

    #[test]
    fn test_from_config() {
        let mut config = Config::default();
        let improver = Improver::from_config(&config).unwrap();
        assert_eq!(improver.describe(), "generative -> grammar-check");

        config.generative.enabled = false;
        config.grammar_check.enabled = false;
        let improver = Improver::from_config(&config).unwrap();
        assert_eq!(improver.describe(), "polish");
    }
}
