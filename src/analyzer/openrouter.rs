//! OpenRouter chat-completionクライアント

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error, warn};

use super::types::{ChatCompletionRequest, ChatCompletionResponse};
use super::ChatProvider;
use crate::config::Config;
use crate::error::{Result, ShelfInsightError};

/// OpenRouter互換プロバイダ
pub struct OpenRouterClient {
    client: Client,
    base_url: String,
    site_url: String,
    site_name: String,
    timeout_seconds: u64,
}

impl OpenRouterClient {
    /// `config.timeout_seconds` で打ち切るクライアントを作る
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ShelfInsightError::Transport(format!("HTTP client init failed: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            site_url: config.site_url.clone(),
            site_name: config.site_name.clone(),
            timeout_seconds: config.timeout_seconds,
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    fn transport_error(&self, err: reqwest::Error) -> ShelfInsightError {
        if err.is_timeout() {
            ShelfInsightError::Timeout(self.timeout_seconds)
        } else {
            ShelfInsightError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl ChatProvider for OpenRouterClient {
    fn name(&self) -> &str {
        "openrouter"
    }

    async fn complete(&self, api_key: &str, request: &ChatCompletionRequest) -> Result<String> {
        debug!(model = %request.model, endpoint = %self.endpoint(), "Sending request to OpenRouter");

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .header("HTTP-Referer", &self.site_url)
            .header("X-Title", &self.site_name)
            .json(request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    warn!(status = status.as_u16(), error = %e, "Failed to read OpenRouter error body");
                    format!("<unreadable error body: {}>", e)
                }
            };
            error!(status = status.as_u16(), body = %body, "OpenRouter API error");
            return Err(ShelfInsightError::Upstream {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
                body,
            });
        }

        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        let parsed: ChatCompletionResponse =
            serde_json::from_str(&body).map_err(|e| ShelfInsightError::Parse {
                message: format!("unexpected completion response: {}", e),
                raw: body.clone(),
            })?;

        match parsed.first_content() {
            Some(content) => Ok(content.to_string()),
            None => Err(ShelfInsightError::Parse {
                message: "completion response has no message content".into(),
                raw: body,
            }),
        }
    }
}
