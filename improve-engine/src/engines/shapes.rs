//! API shapes a self-hosted model server may expose.
//!
//! One logical backend, three endpoint conventions. Shapes are tried in order;
//! a 404 means "this convention is not served here, try the next one", any
//! other failure ends the negotiation.

use super::{request_failed, EngineError};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt;
use thiserror::Error;

/// Everything a shape needs to build its request body.
#[derive(Debug, Clone, Copy)]
pub struct ShapeRequest<'a> {
    pub model: &'a str,
    pub temperature: f64,
    pub system: &'a str,
    pub prompt: &'a str,
}

#[derive(Debug, Error)]
pub enum ShapeError {
    #[error("endpoint not found")]
    NotFound,

    #[error(transparent)]
    Engine(#[from] EngineError),
}

#[async_trait]
pub trait ApiShape: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    /// Path appended to the configured base URL.
    fn path(&self) -> &'static str;

    fn body(&self, request: &ShapeRequest<'_>) -> Value;

    /// POST the request and pull the model's text out of the reply.
    async fn attempt<'a>(
        &self,
        client: &reqwest::Client,
        base_url: &str,
        request: &ShapeRequest<'a>,
    ) -> Result<String, ShapeError> {
        let url = format!("{}{}", base_url.trim_end_matches('/'), self.path());

        let response = client
            .post(&url)
            .json(&self.body(request))
            .send()
            .await
            .map_err(request_failed)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ShapeError::NotFound);
        }

        let body = response.text().await.map_err(request_failed)?;

        if !status.is_success() {
            return Err(EngineError::ApiError {
                status: status.as_u16(),
                message: body,
            }
            .into());
        }

        let reply: ModelReply =
            serde_json::from_str(&body).map_err(|e| EngineError::ParseError(e.to_string()))?;
        Ok(reply.text())
    }
}

/// Native chat endpoint: system + user messages.
#[derive(Debug, Default)]
pub struct ChatShape;

#[async_trait]
impl ApiShape for ChatShape {
    fn name(&self) -> &'static str {
        "chat"
    }

    fn path(&self) -> &'static str {
        "/api/chat"
    }

    fn body(&self, request: &ShapeRequest<'_>) -> Value {
        json!({
            "model": request.model,
            "options": { "temperature": request.temperature },
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": request.prompt },
            ],
            "stream": false,
        })
    }
}

/// Single-prompt completion endpoint.
#[derive(Debug, Default)]
pub struct GenerateShape;

#[async_trait]
impl ApiShape for GenerateShape {
    fn name(&self) -> &'static str {
        "generate"
    }

    fn path(&self) -> &'static str {
        "/api/generate"
    }

    fn body(&self, request: &ShapeRequest<'_>) -> Value {
        json!({
            "model": request.model,
            "prompt": request.prompt,
            "stream": false,
            "options": { "temperature": request.temperature },
        })
    }
}

/// OpenAI-compatible chat completions.
#[derive(Debug, Default)]
pub struct OpenAiChatShape;

#[async_trait]
impl ApiShape for OpenAiChatShape {
    fn name(&self) -> &'static str {
        "openai-chat"
    }

    fn path(&self) -> &'static str {
        "/v1/chat/completions"
    }

    fn body(&self, request: &ShapeRequest<'_>) -> Value {
        json!({
            "model": request.model,
            "temperature": request.temperature,
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": request.prompt },
            ],
        })
    }
}

/// Chat, then generate, then OpenAI-compatible.
pub fn default_shapes() -> Vec<Box<dyn ApiShape>> {
    vec![
        Box::new(ChatShape),
        Box::new(GenerateShape),
        Box::new(OpenAiChatShape),
    ]
}

/// Union of the three reply envelopes.
#[derive(Debug, Default, Deserialize)]
struct ModelReply {
    #[serde(default)]
    message: Option<ReplyMessage>,
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    choices: Vec<ReplyChoice>,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReplyChoice {
    #[serde(default)]
    message: Option<ReplyMessage>,
}

impl ModelReply {
    /// First populated field in chat, generate, choices order; empty if none.
    fn text(self) -> String {
        let chat = self.message.and_then(|m| m.content);
        let choice = self
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content);

        [chat, self.response, choice]
            .into_iter()
            .flatten()
            .map(|text| text.trim().to_string())
            .find(|text| !text.is_empty())
            .unwrap_or_default()
    }
}
