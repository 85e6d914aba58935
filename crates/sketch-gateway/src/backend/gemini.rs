//! Gemini backend implementation
//!
//! Calls `models/{model}:generateContent` in JSON mode with the sketch
//! response schema, so the model answers with the payload directly.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use sketch_engine::generation::{response_schema, SYSTEM_INSTRUCTION};

use super::{BackendError, GenerationBackend};
use crate::config::GenerationConfig;
use crate::constants::headers;

/// Generation backend speaking the Gemini REST API
pub struct GeminiBackend {
    /// HTTP client for API requests
    http_client: reqwest::Client,
    config: GenerationConfig,
}

impl GeminiBackend {
    pub fn new(config: GenerationConfig) -> Result<Self, BackendError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http_client,
            config,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    /// Request body for one prompt
    pub fn request_body(prompt: &str) -> Value {
        json!({
            "systemInstruction": {
                "parts": [{ "text": SYSTEM_INSTRUCTION }]
            },
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }]
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": response_schema()
            }
        })
    }

    /// Concatenate the text parts of the first candidate
    fn extract_text(response: &Value) -> Result<String, BackendError> {
        let parts = response
            .get("candidates")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("content"))
            .and_then(|c| c.get("parts"))
            .and_then(|p| p.as_array())
            .ok_or_else(|| BackendError::Decode("response has no candidates".to_string()))?;

        let text: String = parts
            .iter()
            .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
            .collect();
        if text.trim().is_empty() {
            return Err(BackendError::Decode("response has no text".to_string()));
        }
        Ok(text)
    }
}

#[async_trait]
impl GenerationBackend for GeminiBackend {
    fn name(&self) -> &'static str {
        "Gemini"
    }

    async fn generate(&self, prompt: &str) -> Result<String, BackendError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| BackendError::Config("missing generation API key".to_string()))?;

        let url = self.endpoint();
        log::debug!("Requesting sketch from {} ({})", url, self.config.model);

        let response = self
            .http_client
            .post(&url)
            .header(headers::GENERATION_API_KEY, api_key)
            .json(&Self::request_body(prompt))
            .send()
            .await
            .map_err(BackendError::Http)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status { status, body });
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| BackendError::Decode(format!("Failed to parse response: {}", e)))?;
        Self::extract_text(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn config(base_url: String) -> GenerationConfig {
        GenerationConfig {
            base_url,
            api_key: Some("test-key".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_request_body_carries_schema() {
        let body = GeminiBackend::request_body("notify me");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "notify me");
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert!(body["systemInstruction"]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .contains("#FF9900"));
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let response = json!({
            "candidates": [{ "content": { "parts": [{ "text": "{\"a\":" }, { "text": "1}" }] } }]
        });
        assert_eq!(GeminiBackend::extract_text(&response).unwrap(), "{\"a\":1}");
        assert!(matches!(
            GeminiBackend::extract_text(&json!({ "candidates": [] })),
            Err(BackendError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn test_generate_against_mock_server() {
        let app = Router::new().route(
            "/models/gemini-3-flash-preview:generateContent",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                assert_eq!(headers["x-goog-api-key"], "test-key");
                assert!(body["generationConfig"]["responseSchema"].is_object());
                Json(json!({
                    "candidates": [{ "content": { "parts": [{ "text": "{\"ok\":true}" }] } }]
                }))
            }),
        );
        let backend = GeminiBackend::new(config(serve(app).await)).unwrap();
        assert_eq!(backend.generate("anything").await.unwrap(), "{\"ok\":true}");
    }

    #[tokio::test]
    async fn test_error_status_surfaces() {
        let app = Router::new().route(
            "/models/gemini-3-flash-preview:generateContent",
            post(|| async { (StatusCode::TOO_MANY_REQUESTS, "quota") }),
        );
        let backend = GeminiBackend::new(config(serve(app).await)).unwrap();
        match backend.generate("anything").await {
            Err(BackendError::Status { status, body }) => {
                assert_eq!(status, 429);
                assert_eq!(body, "quota");
            }
            other => panic!("Expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_key_is_config_error() {
        let backend = GeminiBackend::new(GenerationConfig::default()).unwrap();
        assert!(matches!(
            backend.generate("anything").await,
            Err(BackendError::Config(_))
        ));
    }
}
