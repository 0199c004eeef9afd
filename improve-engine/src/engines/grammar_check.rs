use super::{build_client, request_failed, EngineError, RewriteEngine};
use crate::config::{GrammarCheckConfig, PolishConfig};
use crate::format::ContentFormat;
use crate::post_processing::Pipeline;
use crate::replacements::apply_replacements;
use anyhow::Result;
use async_trait::async_trait;
use improve_types::EngineReplacement;
use serde::Deserialize;
use tracing::{debug, info};

/// Remote grammar checker followed by the local polisher.
///
/// The checker only reads plain text, so markup is projected down before the
/// check and rebuilt from paragraphs afterwards.
#[derive(Debug)]
pub struct GrammarCheckEngine {
    client: reqwest::Client,
    endpoint: String,
    language: String,
    level: String,
    polisher: Pipeline,
}

#[derive(Debug, Deserialize)]
struct CheckResponse {
    #[serde(default)]
    matches: Vec<CheckMatch>,
}

#[derive(Debug, Deserialize)]
struct CheckMatch {
    offset: usize,
    length: usize,
    #[serde(default)]
    replacements: Vec<CheckReplacement>,
}

#[derive(Debug, Deserialize)]
struct CheckReplacement {
    value: String,
}

impl CheckResponse {
    /// First suggestion of each match; matches without one are skipped.
    fn into_replacements(self) -> Vec<EngineReplacement> {
        self.matches
            .into_iter()
            .filter_map(|m| {
                let first = m.replacements.into_iter().next()?;
                Some(EngineReplacement::new(m.offset, m.length, first.value))
            })
            .collect()
    }
}

impl GrammarCheckEngine {
    pub fn new(config: &GrammarCheckConfig, polish: &PolishConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config.timeout())?,
            endpoint: config.endpoint.clone(),
            language: config.language.clone(),
            level: config.level.clone(),
            polisher: Pipeline::from_config(polish),
        })
    }

    /// Ask the checker for replacements against plain `text`.
    pub async fn check(&self, text: &str) -> Result<Vec<EngineReplacement>, EngineError> {
        let params = [
            ("text", text),
            ("language", self.language.as_str()),
            ("level", self.level.as_str()),
            ("enabledOnly", "false"),
        ];

        let response = self
            .client
            .post(&self.endpoint)
            .form(&params)
            .send()
            .await
            .map_err(request_failed)?;

        let status = response.status();
        let body = response.text().await.map_err(request_failed)?;

        if !status.is_success() {
            return Err(EngineError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let parsed: CheckResponse =
            serde_json::from_str(&body).map_err(|e| EngineError::ParseError(e.to_string()))?;
        Ok(parsed.into_replacements())
    }
}

#[async_trait]
impl RewriteEngine for GrammarCheckEngine {
    async fn rewrite(&self, content: &str, format: ContentFormat) -> Result<String, EngineError> {
        let text = format.to_plain_text(content);

        let replacements = if text.trim().is_empty() {
            Vec::new()
        } else {
            info!("Checking {} characters with {}", text.chars().count(), self.endpoint);
            self.check(&text).await?
        };
        debug!("Applying {} replacements", replacements.len());

        let fixed = apply_replacements(&text, &replacements);
        let polished = self.polisher.process_paragraphs(&fixed);
        let output = format.extract(&format.from_plain_text(&polished));

        if output.is_empty() {
            return Err(EngineError::EmptyOutput);
        }
        Ok(output)
    }

    fn engine_name(&self) -> &'static str {
        "grammar-check"
    }
}
