//! Generation gateway: the capability that turns a prompt into free text.
//!
//! Every backend is a thin adapter implementing [`GenerationBackend`];
//! [`create_backend`] is the factory keyed by the configured backend kind.
//! The core pipeline treats all implementations uniformly and never
//! inspects which backend is behind the boxed trait object.

pub mod adapters;

use async_trait::async_trait;

use opsplit_shared::{BackendConfig, BackendKind, Result};

pub use adapters::{AnthropicBackend, MockBackend, OllamaBackend, OpenAiBackend};

/// System prompt shared by the chat-style backends.
pub(crate) const SYSTEM_PROMPT: &str =
    "你是一个专业的操作步骤拆分助手，能够将粗粒度的操作序列拆分为详细的、可执行的子步骤。";

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Generation parameters forwarded to the backend.
#[derive(Debug, Clone, Copy)]
pub struct GenerationParams {
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum output length in tokens.
    pub max_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 2000,
        }
    }
}

/// A text-generation backend: accepts a prompt, returns free-form text.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate a response for `prompt`. Transport failures surface as
    /// `Network` errors, protocol/shape failures as `Backend` errors.
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String>;

    /// Human-readable backend name for tracing.
    fn name(&self) -> &'static str;
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// Construct the backend selected by `config.kind`.
pub fn create_backend(config: &BackendConfig) -> Result<Box<dyn GenerationBackend>> {
    let backend: Box<dyn GenerationBackend> = match config.kind {
        BackendKind::OpenAi => Box::new(OpenAiBackend::new(config)?),
        BackendKind::Anthropic => Box::new(AnthropicBackend::new(config)?),
        BackendKind::Ollama => Box::new(OllamaBackend::new(config)?),
        BackendKind::Mock => Box::new(MockBackend),
    };

    tracing::debug!(backend = backend.name(), model = %config.model, "backend created");
    Ok(backend)
}
