use super::{EngineError, RewriteEngine};
use crate::config::PolishConfig;
use crate::format::ContentFormat;
use crate::post_processing::Pipeline;
use async_trait::async_trait;

/// Offline fallback: the rule-based polisher on its own.
#[derive(Debug)]
pub struct PolishOnlyEngine {
    polisher: Pipeline,
}

impl PolishOnlyEngine {
    pub fn new(config: &PolishConfig) -> Self {
        Self {
            polisher: Pipeline::from_config(config),
        }
    }
}

impl Default for PolishOnlyEngine {
    fn default() -> Self {
        Self::new(&PolishConfig::default())
    }
}

#[async_trait]
impl RewriteEngine for PolishOnlyEngine {
    async fn rewrite(&self, content: &str, format: ContentFormat) -> Result<String, EngineError> {
        let text = format.to_plain_text(content);
        let polished = self.polisher.process_paragraphs(&text);
        let output = format.extract(&format.from_plain_text(&polished));

        if output.is_empty() {
            return Err(EngineError::EmptyOutput);
        }
        Ok(output)
    }

    fn engine_name(&self) -> &'static str {
        "polish"
    }
}
