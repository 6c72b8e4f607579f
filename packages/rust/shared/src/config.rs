//! Application configuration for opsplit.
//!
//! User config lives at `~/.opsplit/opsplit.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{OpsplitError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "opsplit.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".opsplit";

// ---------------------------------------------------------------------------
// Config structs (matching opsplit.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Generation backend settings.
    #[serde(default)]
    pub backend: BackendSection,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Default knowledge-base directory.
    #[serde(default = "default_knowledge_base")]
    pub knowledge_base: String,

    /// Whether prompts include the knowledge-base digest.
    #[serde(default = "default_true")]
    pub include_context: bool,

    /// Character budget for the knowledge-base digest.
    #[serde(default = "default_context_max_chars")]
    pub context_max_chars: usize,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            knowledge_base: default_knowledge_base(),
            include_context: true,
            context_max_chars: default_context_max_chars(),
        }
    }
}

fn default_knowledge_base() -> String {
    "data/knowledge_base".into()
}
fn default_true() -> bool {
    true
}
fn default_context_max_chars() -> usize {
    1500
}

/// `[backend]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSection {
    /// Which backend adapter to use.
    #[serde(default)]
    pub kind: BackendKind,

    /// Model name passed to the backend.
    #[serde(default = "default_model")]
    pub model: String,

    /// Name of the env var holding the API key (never store the key itself).
    /// Defaults per backend kind when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    /// Override for the backend's base URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum output length in tokens.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BackendSection {
    fn default() -> Self {
        Self {
            kind: BackendKind::default(),
            model: default_model(),
            api_key_env: None,
            base_url: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_model() -> String {
    "gpt-3.5-turbo".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    2000
}
fn default_timeout_secs() -> u64 {
    120
}

// ---------------------------------------------------------------------------
// Backend kind
// ---------------------------------------------------------------------------

/// Tag selecting a generation backend adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    OpenAi,
    Anthropic,
    Ollama,
    Mock,
}

impl BackendKind {
    /// The env var consulted for this backend's API key, if it needs one.
    pub fn default_api_key_env(&self) -> Option<&'static str> {
        match self {
            Self::OpenAi => Some("OPENAI_API_KEY"),
            Self::Anthropic => Some("ANTHROPIC_API_KEY"),
            Self::Ollama | Self::Mock => None,
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Ollama => "ollama",
            Self::Mock => "mock",
        };
        write!(f, "{name}")
    }
}

impl std::str::FromStr for BackendKind {
    type Err = OpsplitError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "anthropic" => Ok(Self::Anthropic),
            "ollama" | "local" => Ok(Self::Ollama),
            "mock" => Ok(Self::Mock),
            other => Err(OpsplitError::config(format!(
                "unknown backend kind '{other}': expected openai, anthropic, ollama, or mock"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Resolved backend config (runtime value handed to adapter constructors)
// ---------------------------------------------------------------------------

/// Runtime backend configuration, resolved once at startup.
///
/// Credentials are read from the environment exactly once here; adapters
/// receive this value and never consult ambient state themselves.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub kind: BackendKind,
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
}

impl BackendConfig {
    /// Resolve the `[backend]` section into a runtime value, reading the
    /// API key env var for backends that require one.
    pub fn resolve(section: &BackendSection) -> Result<Self> {
        let api_key = match section
            .api_key_env
            .as_deref()
            .or_else(|| section.kind.default_api_key_env())
        {
            Some(var_name) => match std::env::var(var_name) {
                Ok(val) if !val.is_empty() => Some(val),
                _ => {
                    return Err(OpsplitError::config(format!(
                        "API key not found for backend '{}'. Set the {var_name} environment variable.",
                        section.kind
                    )));
                }
            },
            None => None,
        };

        Ok(Self {
            kind: section.kind,
            model: section.model.clone(),
            api_key,
            base_url: section.base_url.clone(),
            timeout_secs: section.timeout_secs,
        })
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.opsplit/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| OpsplitError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.opsplit/opsplit.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| OpsplitError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| OpsplitError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| OpsplitError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| OpsplitError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| OpsplitError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("knowledge_base"));
        assert!(toml_str.contains("gpt-3.5-turbo"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.defaults.context_max_chars, 1500);
        assert!(parsed.defaults.include_context);
        assert_eq!(parsed.backend.kind, BackendKind::OpenAi);
        assert_eq!(parsed.backend.max_tokens, 2000);
    }

    #[test]
    fn backend_section_overrides() {
        let toml_str = r#"
[defaults]
knowledge_base = "/srv/manuals"
include_context = false

[backend]
kind = "ollama"
model = "llama2"
base_url = "http://127.0.0.1:11434"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.defaults.knowledge_base, "/srv/manuals");
        assert!(!config.defaults.include_context);
        assert_eq!(config.backend.kind, BackendKind::Ollama);
        assert_eq!(config.backend.base_url.as_deref(), Some("http://127.0.0.1:11434"));
    }

    #[test]
    fn backend_kind_from_str() {
        assert_eq!("openai".parse::<BackendKind>().unwrap(), BackendKind::OpenAi);
        assert_eq!("local".parse::<BackendKind>().unwrap(), BackendKind::Ollama);
        assert!("gpt".parse::<BackendKind>().is_err());
    }

    #[test]
    fn resolve_missing_api_key_fails() {
        let section = BackendSection {
            kind: BackendKind::OpenAi,
            // Unique env var name to avoid interfering with other tests
            api_key_env: Some("OPSPLIT_TEST_NONEXISTENT_KEY_98231".into()),
            ..Default::default()
        };
        let result = BackendConfig::resolve(&section);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("API key not found"));
    }

    #[test]
    fn resolve_keyless_backends() {
        for kind in [BackendKind::Ollama, BackendKind::Mock] {
            let section = BackendSection {
                kind,
                ..Default::default()
            };
            let resolved = BackendConfig::resolve(&section).expect("resolve");
            assert!(resolved.api_key.is_none());
        }
    }
}
