//! Backend adapters. Each adapter owns its HTTP client and the request/
//! response shapes of one provider; none of them reads ambient state.

mod anthropic;
mod mock;
mod ollama;
mod openai;

pub use anthropic::AnthropicBackend;
pub use mock::MockBackend;
pub use ollama::OllamaBackend;
pub use openai::OpenAiBackend;

use opsplit_shared::{OpsplitError, Result};

/// Build a reqwest client with the adapter's timeout.
pub(crate) fn build_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("opsplit/", env!("CARGO_PKG_VERSION")))
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| OpsplitError::Network(format!("failed to build HTTP client: {e}")))
}

/// First 200 characters of an error body for diagnostics. Counts
/// characters, not bytes — bodies may be non-ASCII.
pub(crate) fn snippet(body: &str) -> String {
    body.chars().take(200).collect()
}

/// Resolve a backend base URL: validate any override, fall back to the
/// adapter default, and trim the trailing slash so `{base}{path}` joins
/// cleanly.
pub(crate) fn base_url(override_url: Option<&str>, default: &str) -> Result<String> {
    let base = override_url.unwrap_or(default);
    url::Url::parse(base)
        .map_err(|e| OpsplitError::config(format!("invalid backend base URL '{base}': {e}")))?;
    Ok(base.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_prefers_override() {
        let base = base_url(Some("http://127.0.0.1:8080/"), "https://api.openai.com/v1").unwrap();
        assert_eq!(base, "http://127.0.0.1:8080");
    }

    #[test]
    fn base_url_rejects_garbage() {
        let err = base_url(Some("not a url"), "https://api.openai.com/v1").unwrap_err();
        assert!(matches!(err, OpsplitError::Config { .. }));
    }
}
