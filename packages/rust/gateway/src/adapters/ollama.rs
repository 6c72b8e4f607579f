//! Local model adapter (Ollama-style `/api/generate` endpoint).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use opsplit_shared::{BackendConfig, OpsplitError, Result};

use crate::{GenerationBackend, GenerationParams, SYSTEM_PROMPT};

const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Adapter for a local Ollama server.
pub struct OllamaBackend {
    client: reqwest::Client,
    model: String,
    base_url: String,
}

impl OllamaBackend {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        Ok(Self {
            client: super::build_client(config.timeout_secs)?,
            model: config.model.clone(),
            base_url: super::base_url(config.base_url.as_deref(), DEFAULT_BASE_URL)?,
        })
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[async_trait]
impl GenerationBackend for OllamaBackend {
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);

        // The generate endpoint has no separate system slot; prepend it.
        let request = GenerateRequest {
            model: &self.model,
            prompt: format!("{SYSTEM_PROMPT}\n\n{prompt}"),
            stream: false,
            options: GenerateOptions {
                temperature: params.temperature,
            },
        };

        debug!(model = %self.model, prompt_len = prompt.len(), "sending generate request");

        let response = self
            .client
            .post(&url)
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

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| OpsplitError::Backend(format!("invalid response body: {e}")))?;

        Ok(parsed.response.trim().to_string())
    }

    fn name(&self) -> &'static str {
        "ollama"
    }
}
