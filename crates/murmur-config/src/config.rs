//! Configuration structures and loading.

use crate::error::{ConfigError, ConfigResult};
use crate::paths::AppPaths;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub notion: NotionConfig,

    #[serde(default)]
    pub mastodon: MastodonConfig,

    #[serde(default)]
    pub chunking: ChunkingConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> ConfigResult<Self> {
        let paths = AppPaths::new().ok_or(ConfigError::NoConfigDir)?;
        Self::load_from(&paths.config_file)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &PathBuf) -> ConfigResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> ConfigResult<()> {
        let contents = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Create a default config file with comments.
    pub fn create_default_file(path: &PathBuf) -> ConfigResult<()> {
        let default_config = Self::default_config_string();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, default_config)?;
        Ok(())
    }

    /// Generate a default config file with helpful comments.
    pub fn default_config_string() -> String {
        r#"# Murmur Configuration
# Knowledge-base sync and social listeners

[general]
# Data directory for the database
# data_dir = "~/.local/share/murmur"

[llm]
# OpenAI-compatible API endpoint
base_url = "https://openrouter.ai/api/v1"

# Environment variable holding the API key
api_key_env = "OPENROUTER_API_KEY"

# Model for text generation
model = "z-ai/glm-4.5-air"

# Model for embeddings
embedding_model = "text-embedding-3-small"

# Request timeout in seconds
timeout_seconds = 120

[notion]
# Pages to monitor for changes
page_ids = [
    # "a1b2c3d4-...",
]

# Environment variable holding the integration token
api_key_env = "NOTION_API_KEY"

# How often to check for changes (seconds)
poll_interval_seconds = 300

# Generate a draft post when a page changes
generate_drafts = true

# Retrieval query used to seed generated drafts
draft_query = "What is new or interesting about our brand?"

[mastodon]
# Instance base URL
base_url = "https://mastodon.social"

# Environment variable holding the access token
access_token_env = "MASTODON_ACCESS_TOKEN"

# Our own account handle (self-authored mentions are not answered)
account = ""

# How often to check for new interactions (seconds)
poll_interval_seconds = 180

# Post replies automatically instead of saving drafts
auto_reply = false

# Max notifications fetched per poll
fetch_limit = 20

[chunking]
# Strategy: fixed_chars, paragraphs, sentences, hybrid
strategy = "paragraphs"

# Size parameter: characters (fixed_chars, paragraphs, hybrid)
# or sentence count (sentences)
chunk_size = 500

# Character overlap between fixed_chars windows
overlap = 50

[retrieval]
# Number of fragments returned per query
top_k = 5
"#
        .to_string()
    }
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    pub data_dir: Option<String>,
}

/// LLM API settings (embeddings + generation).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key_env: String,
    pub model: String,
    pub embedding_model: String,
    pub timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1".to_string(),
            api_key_env: "OPENROUTER_API_KEY".to_string(),
            model: "z-ai/glm-4.5-air".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            timeout_seconds: 120,
        }
    }
}

impl LlmConfig {
    /// Resolve the API key from the configured environment variable.
    pub fn api_key(&self) -> ConfigResult<String> {
        std::env::var(&self.api_key_env)
            .map_err(|_| ConfigError::MissingEnvVar(self.api_key_env.clone()))
    }
}

/// Notion document source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotionConfig {
    pub page_ids: Vec<String>,
    pub api_key_env: String,
    pub poll_interval_seconds: u64,
    pub generate_drafts: bool,
    pub draft_query: String,
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            page_ids: vec![],
            api_key_env: "NOTION_API_KEY".to_string(),
            poll_interval_seconds: 300,
            generate_drafts: true,
            draft_query: "What is new or interesting about our brand?".to_string(),
        }
    }
}

impl NotionConfig {
    pub fn api_key(&self) -> ConfigResult<String> {
        std::env::var(&self.api_key_env)
            .map_err(|_| ConfigError::MissingEnvVar(self.api_key_env.clone()))
    }
}

/// Mastodon feed and publishing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MastodonConfig {
    pub base_url: String,
    pub access_token_env: String,
    pub account: String,
    pub poll_interval_seconds: u64,
    pub auto_reply: bool,
    pub fetch_limit: usize,
}

impl Default for MastodonConfig {
    fn default() -> Self {
        Self {
            base_url: "https://mastodon.social".to_string(),
            access_token_env: "MASTODON_ACCESS_TOKEN".to_string(),
            account: String::new(),
            poll_interval_seconds: 180,
            auto_reply: false,
            fetch_limit: 20,
        }
    }
}

impl MastodonConfig {
    pub fn access_token(&self) -> ConfigResult<String> {
        std::env::var(&self.access_token_env)
            .map_err(|_| ConfigError::MissingEnvVar(self.access_token_env.clone()))
    }
}

/// Chunking settings for the sync pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub strategy: String,
    pub chunk_size: usize,
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            strategy: "paragraphs".to_string(),
            chunk_size: 500,
            overlap: 50,
        }
    }
}

/// Retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 5 }
    }
}
