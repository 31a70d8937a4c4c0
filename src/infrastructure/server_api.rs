//! Opaque transport to the AI provider route.
//!
//! The pipeline never talks to a provider directly; it POSTs JSON to a
//! same-origin API route and gets JSON back. API-key handling, provider
//! selection and HTTP headers live behind that route.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppError, ProviderError, Result};

/// The three AI API routes the pipeline calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    GenerateQuestions,
    ExtractQuestionsAi,
    GenerateQuestionsFromFile,
}

impl Endpoint {
    /// Route path segment.
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::GenerateQuestions => "generate-questions",
            Endpoint::ExtractQuestionsAi => "extract-questions-ai",
            Endpoint::GenerateQuestionsFromFile => "generate-questions-from-file",
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// Capability to call the AI provider route.
///
/// One production implementation ([`HttpServerApi`]); tests substitute
/// scripted mocks.
#[async_trait]
pub trait ServerApi: Send + Sync {
    async fn call(&self, endpoint: Endpoint, payload: Value) -> Result<Value>;
}

/// Production transport. Single owner of the `reqwest::Client`.
pub struct HttpServerApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpServerApi {
    pub fn new(config: &Config) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ServerApi for HttpServerApi {
    async fn call(&self, endpoint: Endpoint, payload: Value) -> Result<Value> {
        let url = format!("{}/{}", self.base_url, endpoint.path());
        debug!("POST {}", url);

        let response = self.client.post(&url).json(&payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("route {} answered HTTP {}", endpoint, status);
            return Err(AppError::Provider(ProviderError::from_status(
                status.as_u16(),
                body,
            )));
        }

        let body: Value = response.json().await.map_err(|e| {
            AppError::Provider(ProviderError::Malformed {
                message: e.to_string(),
            })
        })?;

        // Routes report provider-side failures in-band as {"error": "..."}.
        if let Some(message) = body.get("error").and_then(Value::as_str) {
            return Err(AppError::provider_message(message.to_string()));
        }

        Ok(body)
    }
}

/// Pull the model output text out of a route response.
pub fn content_of(response: &Value, endpoint: Endpoint) -> Result<String> {
    response
        .get("content")
        .and_then(Value::as_str)
        .map(str::to_string)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| {
            AppError::Provider(ProviderError::EmptyResponse {
                endpoint: endpoint.path().to_string(),
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn content_of_rejects_missing_and_blank() {
        assert!(content_of(&json!({}), Endpoint::GenerateQuestions).is_err());
        assert!(content_of(&json!({ "content": "  " }), Endpoint::GenerateQuestions).is_err());
        assert_eq!(
            content_of(&json!({ "content": "hello" }), Endpoint::GenerateQuestions).unwrap(),
            "hello"
        );
    }
}
