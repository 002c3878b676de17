//! Backend abstraction for streaming chat providers

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::Stream;

use crate::config::{BackendConfig, ProviderKind, SamplingParams};
use crate::error::{Error, Result};
use crate::types::Turn;

use super::gemini::GeminiBackend;
use super::openai::OpenAiBackend;

/// A finite, non-restartable stream of answer fragments.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Capability every generation backend exposes to the orchestrator.
///
/// Implementations translate the uniform system-prompt + turn-history shape
/// into their provider's message/role format and stream back text fragments.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Start a streaming completion for the conversation so far.
    async fn stream_chat(
        &self,
        system_prompt: &str,
        turns: &[Turn],
        params: &SamplingParams,
    ) -> Result<TokenStream>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}

/// Select and construct the backend for a configuration.
///
/// Missing credentials fail here with a typed [`Error::Auth`] so an
/// unconfigured key is distinguishable from "no relevant context found".
pub fn backend_for(config: &BackendConfig) -> Result<Arc<dyn ChatBackend>> {
    if config.api_key.trim().is_empty() {
        return Err(Error::Auth(format!(
            "no API key configured for {}",
            config.model
        )));
    }
    config.sampling.validate()?;

    Ok(match config.model.provider() {
        ProviderKind::OpenAi => Arc::new(OpenAiBackend::new(config)?),
        ProviderKind::Gemini => Arc::new(GeminiBackend::new(config)?),
    })
}

/// Map a non-success HTTP response to the typed error taxonomy.
pub(crate) async fn check_status(
    response: reqwest::Response,
    provider: &str,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(match status.as_u16() {
        401 | 403 => Error::Auth(format!("{provider} rejected the API key ({status}): {body}")),
        429 => Error::RateLimited(format!("{provider} throttled the request: {body}")),
        _ => Error::Provider(format!("{provider} request failed ({status}): {body}")),
    })
}

/// Map a request-level failure (DNS, connect, timeout) to a transport error.
pub(crate) fn transport_error(provider: &str, err: reqwest::Error) -> Error {
    Error::transport(format!("{provider}: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelId;

    #[test]
    fn missing_api_key_is_a_typed_auth_error() {
        let config = BackendConfig::new(ModelId::Gpt4oMini, "  ");
        assert!(matches!(backend_for(&config), Err(Error::Auth(_))));
    }

    #[test]
    fn each_model_maps_to_its_provider_backend() {
        let openai = backend_for(&BackendConfig::new(ModelId::Gpt4o, "sk-test")).unwrap();
        assert_eq!(openai.name(), "openai");

        let gemini = backend_for(&BackendConfig::new(ModelId::Gemini2Flash, "key")).unwrap();
        assert_eq!(gemini.name(), "gemini");
    }

    #[test]
    fn invalid_sampling_params_are_rejected_at_selection() {
        let mut config = BackendConfig::new(ModelId::Gpt4o, "sk-test");
        config.sampling.temperature = 9.0;
        assert!(matches!(backend_for(&config), Err(Error::Config(_))));
    }
}
