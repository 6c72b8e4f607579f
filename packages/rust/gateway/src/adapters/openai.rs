//! OpenAI-compatible chat-completions adapter.
//!
//! Also serves any OpenAI-compatible endpoint via `base_url` override.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use opsplit_shared::{BackendConfig, OpsplitError, Result};

use crate::{GenerationBackend, GenerationParams, SYSTEM_PROMPT};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Adapter for the OpenAI chat-completions API.
#[derive(Debug)]
pub struct OpenAiBackend {
    client: reqwest::Client,
    model: String,
    base_url: String,
    api_key: String,
}

impl OpenAiBackend {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| OpsplitError::config("openai backend requires an API key"))?;

        Ok(Self {
            client: super::build_client(config.timeout_secs)?,
            model: config.model.clone(),
            base_url: super::base_url(config.base_url.as_deref(), DEFAULT_BASE_URL)?,
            api_key,
        })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

#[async_trait]
impl GenerationBackend for OpenAiBackend {
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        };

        debug!(model = %self.model, prompt_len = prompt.len(), "sending chat completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| OpsplitError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OpsplitError::Backend(format!(
                "HTTP {status} from {url}: {}",
                super::snippet(&body)
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| OpsplitError::Backend(format!("invalid response body: {e}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| OpsplitError::Backend("response contained no choices".into()))?;

        Ok(content.trim().to_string())
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}
