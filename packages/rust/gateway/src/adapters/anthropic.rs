//! Anthropic messages-API adapter.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use opsplit_shared::{BackendConfig, OpsplitError, Result};

use crate::{GenerationBackend, GenerationParams, SYSTEM_PROMPT};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";

/// Adapter for the Anthropic messages API.
#[derive(Debug)]
pub struct AnthropicBackend {
    client: reqwest::Client,
    model: String,
    base_url: String,
    api_key: String,
}

impl AnthropicBackend {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| OpsplitError::config("anthropic backend requires an API key"))?;

        Ok(Self {
            client: super::build_client(config.timeout_secs)?,
            model: config.model.clone(),
            base_url: super::base_url(config.base_url.as_deref(), DEFAULT_BASE_URL)?,
            api_key,
        })
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<UserMessage<'a>>,
}

#[derive(Serialize)]
struct UserMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: String,
}

#[async_trait]
impl GenerationBackend for AnthropicBackend {
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        let url = format!("{}/v1/messages", self.base_url);

        let request = MessagesRequest {
            model: &self.model,
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            system: SYSTEM_PROMPT,
            messages: vec![UserMessage {
                role: "user",
                content: prompt,
            }],
        };

        debug!(model = %self.model, prompt_len = prompt.len(), "sending messages request");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
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

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| OpsplitError::Backend(format!("invalid response body: {e}")))?;

        let text = parsed
            .content
            .into_iter()
            .next()
            .map(|block| block.text)
            .ok_or_else(|| OpsplitError::Backend("response contained no content blocks".into()))?;

        Ok(text.trim().to_string())
    }

    fn name(&self) -> &'static str {
        "anthropic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn generate_extracts_first_content_block() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "ak-test"))
            .and(header("anthropic-version", API_VERSION))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": [{"type": "text", "text": "步骤1: 打开登录页面"}]
            })))
            .mount(&server)
            .await;

        let backend = AnthropicBackend::new(&BackendConfig {
            kind: opsplit_shared::BackendKind::Anthropic,
            model: "claude-3-sonnet-20240229".into(),
            api_key: Some("ak-test".into()),
            base_url: Some(server.uri()),
            timeout_secs: 5,
        })
        .unwrap();

        let text = backend
            .generate("登录系统", &GenerationParams::default())
            .await
            .unwrap();
        assert_eq!(text, "步骤1: 打开登录页面");
    }

    #[test]
    fn missing_api_key_rejected_at_construction() {
        let err = AnthropicBackend::new(&BackendConfig {
            kind: opsplit_shared::BackendKind::Anthropic,
            model: "claude-3-sonnet-20240229".into(),
            api_key: None,
            base_url: None,
            timeout_secs: 5,
        })
        .unwrap_err();
        assert!(matches!(err, OpsplitError::Config { .. }));
    }
}
