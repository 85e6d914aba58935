//! Configuration types for the gateway
//!
//! Everything is read from the environment once at startup. Nothing is
//! persisted.

use serde::{Deserialize, Serialize};

use crate::constants::{defaults, env, timeouts};

/// Settings for the sketch generation backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// API base URL, without the `/models/...` suffix
    pub base_url: String,
    /// Model name (e.g., "gemini-3-flash-preview")
    pub model: String,
    /// API key; generation fails with a config error while unset
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::GENERATION_URL.to_string(),
            model: defaults::GENERATION_MODEL.to_string(),
            api_key: None,
            timeout_secs: timeouts::GENERATION_SECS,
        }
    }
}

/// Settings for the n8n deployment client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeployConfig {
    /// Full URL the workflow document is POSTed to
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            api_key: None,
            timeout_secs: timeouts::DEPLOY_SECS,
        }
    }
}

impl DeployConfig {
    /// Whether both the URL and the key are present
    pub fn is_configured(&self) -> bool {
        self.api_url.is_some() && self.api_key.is_some()
    }
}

/// Complete gateway configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub generation: GenerationConfig,
    pub deploy: DeployConfig,
}

impl GatewayConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary lookup function
    ///
    /// Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(url) = get(env::GENERATION_URL) {
            config.generation.base_url = url;
        }
        if let Some(model) = get(env::GENERATION_MODEL) {
            config.generation.model = model;
        }
        config.generation.api_key = get(env::API_KEY).or_else(|| get(env::GEMINI_API_KEY));

        config.deploy.api_url = get(env::N8N_API_URL);
        config.deploy.api_key = get(env::N8N_API_KEY);

        config
    }
}
