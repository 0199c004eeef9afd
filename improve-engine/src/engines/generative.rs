use super::shapes::{default_shapes, ApiShape, ShapeError, ShapeRequest};
use super::{build_client, EngineError, RewriteEngine};
use crate::config::{GenerativeConfig, PromptConfig};
use crate::format::ContentFormat;
use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, info};

/// Rewrites through a self-hosted language model.
#[derive(Debug)]
pub struct GenerativeEngine {
    client: reqwest::Client,
    base_url: String,
    model: String,
    temperature: f64,
    prompt: PromptConfig,
    shapes: Vec<Box<dyn ApiShape>>,
}

impl GenerativeEngine {
    pub fn new(config: &GenerativeConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config.timeout())?,
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            prompt: config.prompt.clone(),
            shapes: default_shapes(),
        })
    }

    /// Replace the negotiated shapes, in try order.
    pub fn with_shapes(mut self, shapes: Vec<Box<dyn ApiShape>>) -> Self {
        self.shapes = shapes;
        self
    }

    /// Instruction, optional style directive, then the labelled content.
    pub fn build_prompt(&self, content: &str, format: ContentFormat) -> String {
        let (instruction, label) = match format {
            ContentFormat::Markup => (&self.prompt.markup_instruction, "HTML"),
            ContentFormat::PlainText => (&self.prompt.text_instruction, "TEXT"),
        };

        let mut prompt = instruction.trim_end().to_string();
        let directive = self.prompt.style_directive.trim();
        if !directive.is_empty() {
            prompt.push('\n');
            prompt.push_str(directive);
        }
        prompt.push_str(&format!("\n\n{}:\n{}", label, content));
        prompt
    }

    fn system_message(&self, format: ContentFormat) -> &str {
        match format {
            ContentFormat::Markup => &self.prompt.markup_system,
            ContentFormat::PlainText => &self.prompt.text_system,
        }
    }

    /// Try each shape in order until one answers with anything but 404.
    async fn negotiate(&self, request: &ShapeRequest<'_>) -> Result<String, EngineError> {
        for shape in &self.shapes {
            match shape.attempt(&self.client, &self.base_url, request).await {
                Ok(text) => {
                    debug!("Model answered via {} shape", shape.name());
                    return Ok(text);
                }
                Err(ShapeError::NotFound) => {
                    debug!("{} shape not served at {}", shape.name(), self.base_url);
                }
                Err(ShapeError::Engine(e)) => return Err(e),
            }
        }

        Err(EngineError::NoSupportedShape {
            base_url: self.base_url.clone(),
        })
    }
}

#[async_trait]
impl RewriteEngine for GenerativeEngine {
    async fn rewrite(&self, content: &str, format: ContentFormat) -> Result<String, EngineError> {
        let prompt = self.build_prompt(content, format);
        let request = ShapeRequest {
            model: &self.model,
            temperature: self.temperature,
            system: self.system_message(format),
            prompt: &prompt,
        };

        info!("Requesting {} rewrite from {}", format, self.model);
        let raw = self.negotiate(&request).await?;

        // Empty extraction is not an error here; the caller falls through on it
        Ok(format.extract(&raw))
    }

    fn engine_name(&self) -> &'static str {
        "generative"
    }
}
