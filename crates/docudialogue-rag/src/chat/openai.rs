//! OpenAI chat-completions backend

use std::time::Duration;

use async_stream::try_stream;
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::{BackendConfig, SamplingParams};
use crate::error::{Error, Result};
use crate::types::Turn;

use super::backend::{check_status, transport_error, ChatBackend, TokenStream};
use super::sse;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Streaming backend for the OpenAI chat-completions API.
pub struct OpenAiBackend {
    client: Client,
    api_key: String,
    model: &'static str,
    base_url: String,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    stream: bool,
    temperature: f32,
    max_completion_tokens: u32,
    top_p: f32,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Deserialize, Default)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiBackend {
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
}

#[async_trait]
impl ChatBackend for OpenAiBackend {
    async fn stream_chat(
        &self,
        system_prompt: &str,
        turns: &[Turn],
        params: &SamplingParams,
    ) -> Result<TokenStream> {
        let mut messages = Vec::with_capacity(turns.len() + 1);
        messages.push(WireMessage {
            role: "system",
            content: system_prompt,
        });
        for turn in turns {
            messages.push(WireMessage {
                role: turn.role.as_str(),
                content: &turn.content,
            });
        }

        let request = ChatCompletionRequest {
            model: self.model,
            messages,
            stream: true,
            temperature: params.temperature,
            max_completion_tokens: params.max_output_tokens,
            top_p: params.top_p,
        };

        let url = format!("{}/v1/chat/completions", self.base_url);
        tracing::debug!(model = self.model, turns = turns.len(), "openai request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error("openai", e))?;
        let response = check_status(response, "openai").await?;

        let events = sse::data_events(response, "openai");
        let stream = try_stream! {
            let mut events = Box::pin(events);
            while let Some(event) = events.next().await {
                let data = event?;
                if data == "[DONE]" {
                    break;
                }
                let chunk: ChatCompletionChunk = serde_json::from_str(&data)
                    .map_err(|e| Error::provider(format!("openai sent a malformed frame: {e}")))?;
                if let Some(content) = chunk
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|choice| choice.delta.content)
                {
                    if !content.is_empty() {
                        yield content;
                    }
                }
            }
        };
        Ok(Box::pin(stream))
    }

    fn name(&self) -> &str {
        "openai"
    }
}
