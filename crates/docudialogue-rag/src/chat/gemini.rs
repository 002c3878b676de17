//! Google Gemini generate-content backend

use std::time::Duration;

use async_stream::try_stream;
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::{BackendConfig, SamplingParams};
use crate::error::{Error, Result};
use crate::types::{Role, Turn};

use super::backend::{check_status, transport_error, ChatBackend, TokenStream};
use super::sse;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Streaming backend for the Gemini generate-content API.
///
/// Gemini names the assistant role `model`; the history is normalized on the
/// way out and the system prompt travels as `systemInstruction`.
pub struct GeminiBackend {
    client: Client,
    api_key: String,
    model: &'static str,
    base_url: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "systemInstruction")]
    system_instruction: Content<'a>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "topP")]
    top_p: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

impl GeminiBackend {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| Error::transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.as_str(),
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }

    fn wire_role(role: Role) -> &'static str {
        match role {
            Role::User => "user",
            Role::Assistant => "model",
        }
    }
}

#[async_trait]
impl ChatBackend for GeminiBackend {
    async fn stream_chat(
        &self,
        system_prompt: &str,
        turns: &[Turn],
        params: &SamplingParams,
    ) -> Result<TokenStream> {
        let contents: Vec<Content> = turns
            .iter()
            .map(|turn| Content {
                role: Some(Self::wire_role(turn.role)),
                parts: vec![Part {
                    text: &turn.content,
                }],
            })
            .collect();

        let request = GenerateRequest {
            contents,
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: system_prompt,
                }],
            },
            generation_config: GenerationConfig {
                temperature: params.temperature,
                top_p: params.top_p,
                max_output_tokens: params.max_output_tokens,
            },
        };

        let url = format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse&key={}",
            self.base_url, self.model, self.api_key
        );
        tracing::debug!(model = self.model, turns = turns.len(), "gemini request");

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error("gemini", e))?;
        let response = check_status(response, "gemini").await?;

        let events = sse::data_events(response, "gemini");
        let stream = try_stream! {
            let mut events = Box::pin(events);
            while let Some(event) = events.next().await {
                let data = event?;
                let frame: GenerateResponse = serde_json::from_str(&data)
                    .map_err(|e| Error::provider(format!("gemini sent a malformed frame: {e}")))?;
                let text: String = frame
                    .candidates
                    .into_iter()
                    .next()
                    .and_then(|c| c.content)
                    .map(|content| {
                        content
                            .parts
                            .into_iter()
                            .map(|p| p.text)
                            .collect::<Vec<_>>()
                            .join("")
                    })
                    .unwrap_or_default();
                if !text.is_empty() {
                    yield text;
                }
            }
        };
        Ok(Box::pin(stream))
    }

    fn name(&self) -> &str {
        "gemini"
    }
}
