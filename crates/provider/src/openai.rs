//! OpenAI-compatible completion endpoint (NVIDIA NIM, OpenAI, vLLM, ...)

use crate::*;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, trace};

pub const NIM_API_BASE: &str = "https://integrate.api.nvidia.com/v1";
pub const NIM_DEFAULT_MODEL: &str = "meta/llama-3.1-70b-instruct";

/// Client for any `/chat/completions` endpoint
pub struct OpenAiCompatProvider {
    client: Client,
    api_key: String,
    api_base: String,
    default_model: String,
}

impl OpenAiCompatProvider {
    pub fn new(
        api_key: impl Into<String>,
        api_base: Option<String>,
        default_model: Option<String>,
    ) -> Self {
        let api_base = api_base
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| NIM_API_BASE.to_string());

        Self {
            client: Client::new(),
            api_key: api_key.into(),
            api_base: api_base.trim_end_matches('/').to_string(),
            default_model: default_model.unwrap_or_else(|| NIM_DEFAULT_MODEL.to_string()),
        }
    }

    fn build_request(&self, params: &ChatParams) -> serde_json::Value {
        let model = if params.model.is_empty() {
            self.default_model.clone()
        } else {
            params.model.clone()
        };

        json!({
            "model": model,
            "messages": params.messages,
            "max_tokens": params.max_tokens,
            "temperature": params.temperature,
        })
    }

    fn parse_response(&self, json: serde_json::Value) -> Result<ChatResponse> {
        let choice = json["choices"]
            .get(0)
            .ok_or(ProviderError::InvalidResponse)?;
        let content = choice["message"]["content"].as_str().map(|s| s.to_string());
        let finish_reason = choice["finish_reason"]
            .as_str()
            .unwrap_or("stop")
            .to_string();

        let usage = if let Some(usage) = json["usage"].as_object() {
            let field = |name: &str| {
                usage
                    .get(name)
                    .and_then(|v| v.as_u64())
                    .map_or(0, |n| u32::try_from(n).unwrap_or(u32::MAX))
            };
            Usage {
                prompt_tokens: field("prompt_tokens"),
                completion_tokens: field("completion_tokens"),
                total_tokens: field("total_tokens"),
            }
        } else {
            Usage::default()
        };

        Ok(ChatResponse {
            content,
            finish_reason,
            usage,
        })
    }
}

#[async_trait::async_trait]
impl Provider for OpenAiCompatProvider {
    async fn chat(&self, params: ChatParams) -> Result<ChatResponse> {
        if self.api_key.is_empty() {
            return Err(ProviderError::NoApiKey);
        }

        trace!("◆ CALLING COMPLETION ENDPOINT {}", self.api_base);

        let url = format!("{}/chat/completions", self.api_base);
        let body = self.build_request(&params);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(ProviderError::RateLimited);
        }

        let json: serde_json::Value = response.json().await?;

        if !status.is_success() {
            let error = json["error"]["message"]
                .as_str()
                .or_else(|| json["detail"].as_str())
                .unwrap_or("UNKNOWN ERROR")
                .to_string();
            return Err(ProviderError::Api(error));
        }

        let parsed = self.parse_response(json)?;
        debug!(
            "◆ COMPLETION: {} chars, {} tokens",
            parsed.text_or_empty().len(),
            parsed.usage.total_tokens
        );
        Ok(parsed)
    }

    fn default_model(&self) -> String {
        self.default_model.clone()
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}
