//! Server configuration

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Server configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind the HTTP server
    pub bind_address: SocketAddr,
    /// Directory holding per-save JSON documents
    pub data_dir: PathBuf,
    /// Path to the static nation registry file
    pub nations_path: PathBuf,
    /// Generation backend settings
    pub llm: LlmConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".parse().expect("static address"),
            data_dir: PathBuf::from("data/saves"),
            nations_path: PathBuf::from("data/nations.json"),
            llm: LlmConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by environment variables where present
    /// (`PORT`, `CONCORDAT_DATA_DIR`, `CONCORDAT_NATIONS_PATH`,
    /// `LLM_API_URL`, `LLM_MODEL`).
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(port) = env::var("PORT") {
            if let Ok(port) = port.parse::<u16>() {
                config.bind_address = SocketAddr::new(config.bind_address.ip(), port);
            }
        }
        if let Ok(dir) = env::var("CONCORDAT_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(path) = env::var("CONCORDAT_NATIONS_PATH") {
            config.nations_path = PathBuf::from(path);
        }
        if let Ok(url) = env::var("LLM_API_URL") {
            config.llm.base_url = LlmConfig::normalize_base_url(&url);
        }
        if let Ok(model) = env::var("LLM_MODEL") {
            config.llm.model = model;
        }

        config
    }

    /// Debug-sink file for raw generation responses, under the data dir.
    pub fn debug_sink_path(&self) -> PathBuf {
        self.data_dir.join("debug").join("last_response.txt")
    }
}

/// Generation backend configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LlmConfig {
    /// OpenAI-compatible base URL, normalized to end in `/v1`
    pub base_url: String,
    /// Model identifier passed through to the backend
    pub model: String,
    /// Sampling temperature for turn-event generation and advisor calls
    pub temperature: f32,
    /// Sampling temperature for diplomatic roleplay
    pub diplomacy_temperature: f32,
    /// Token budget for turn-event generation
    pub max_tokens: u32,
    /// Token budget for diplomatic replies
    pub diplomacy_max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:1234/v1".to_string(),
            model: "qwen3-vl-8b".to_string(),
            temperature: 0.7,
            diplomacy_temperature: 0.8,
            max_tokens: 3000,
            diplomacy_max_tokens: 1000,
        }
    }
}

impl LlmConfig {
    /// Append `/v1` unless the URL already carries a versioned API path.
    pub fn normalize_base_url(url: &str) -> String {
        let trimmed = url.trim_end_matches('/');
        if trimmed.ends_with("/v1") || trimmed.contains("/api/v1") {
            trimmed.to_string()
        } else {
            format!("{trimmed}/v1")
        }
    }
}
