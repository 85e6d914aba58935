//! n8n deployment client
//!
//! Sends an exported [`WorkflowDocument`] to the configured n8n endpoint.
//! Success means an HTTP 2xx answer with a JSON body. There is no retry;
//! failures are reported once and the canvas is never touched.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use sketch_engine::WorkflowDocument;

use crate::config::DeployConfig;
use crate::constants::headers;
use crate::gateway::GatewayError;

/// Boolean/message outcome for status displays
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployStatus {
    pub ok: bool,
    pub message: String,
}

impl DeployStatus {
    fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

/// Client for the n8n workflow API
pub struct DeployClient {
    http_client: reqwest::Client,
    config: DeployConfig,
}

impl DeployClient {
    pub fn new(config: DeployConfig) -> Result<Self, GatewayError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GatewayError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http_client,
            config,
        })
    }

    pub fn config(&self) -> &DeployConfig {
        &self.config
    }

    /// POST the document; returns the response body on success
    pub async fn deploy(&self, document: &WorkflowDocument) -> Result<serde_json::Value, GatewayError> {
        let (url, api_key) = match (&self.config.api_url, &self.config.api_key) {
            (Some(url), Some(key)) => (url, key),
            _ => {
                return Err(GatewayError::Config(
                    "missing n8n API URL or API key".to_string(),
                ))
            }
        };

        log::info!(
            "Deploying workflow '{}' ({} nodes) to {}",
            document.name,
            document.nodes.len(),
            url
        );

        let response = self
            .http_client
            .post(url)
            .header(headers::N8N_API_KEY, api_key)
            .json(document)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Transport(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| GatewayError::Transport(format!("Response was not JSON: {}", e)))
    }

    /// Same as [`deploy`](Self::deploy), folded into a status value
    pub async fn deploy_status(&self, document: &WorkflowDocument) -> DeployStatus {
        match self.deploy(document).await {
            Ok(_) => DeployStatus::success(format!("Deployed '{}'", document.name)),
            Err(e) => {
                log::warn!("Deployment failed: {}", e);
                DeployStatus::failure(e.to_string())
            }
        }
    }
}
