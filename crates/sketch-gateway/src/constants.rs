//! Gateway constants
//!
//! Single source of truth for endpoints, header names, environment
//! variables and timeouts used by the generation and deployment clients.

/// Default values for gateway configuration
pub mod defaults {
    /// Base URL of the Gemini REST API
    pub const GENERATION_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
    /// Model used for sketch generation
    pub const GENERATION_MODEL: &str = "gemini-3-flash-preview";
}

/// Timeout configuration (in seconds)
pub mod timeouts {
    /// Upper bound for one generation round trip
    pub const GENERATION_SECS: u64 = 60;
    /// Upper bound for one deployment request
    pub const DEPLOY_SECS: u64 = 30;
}

/// HTTP header names
pub mod headers {
    /// API key header for the generation API
    pub const GENERATION_API_KEY: &str = "x-goog-api-key";
    /// API key header for the n8n REST API
    pub const N8N_API_KEY: &str = "X-N8N-API-KEY";
}

/// Environment variables read by [`crate::config::GatewayConfig::from_env`]
pub mod env {
    pub const GENERATION_URL: &str = "SKETCHBOOK_GENERATION_URL";
    pub const GENERATION_MODEL: &str = "SKETCHBOOK_GENERATION_MODEL";
    /// Checked first
    pub const API_KEY: &str = "API_KEY";
    /// Fallback when `API_KEY` is unset
    pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";
    pub const N8N_API_URL: &str = "N8N_API_URL";
    pub const N8N_API_KEY: &str = "N8N_API_KEY";
}
