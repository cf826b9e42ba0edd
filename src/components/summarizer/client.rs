use super::models::{response_text, ChatMessage, InferenceRequest};
use crate::config::Config;
use crate::error::{summarization_error, DigestResult};
use crate::pipeline::TextGenerator;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::info;

/// Text generation against a hosted inference endpoint (Workers AI REST)
#[derive(Clone)]
pub struct InferenceClient {
    client: Client,
    api_base: String,
    api_token: String,
    model: String,
}

impl InferenceClient {
    pub fn new(config: &Config, client: Client) -> Self {
        Self {
            client,
            api_base: config.endpoints.ai_api_base.clone(),
            api_token: config.ai_api_token.clone(),
            model: config.ai_model.clone(),
        }
    }

    /// Model identifiers such as `@cf/meta/llama-3.1-70b-instruct` are path
    /// suffixes, so they are appended verbatim.
    fn model_url(&self) -> String {
        format!("{}/{}", self.api_base.trim_end_matches('/'), self.model)
    }

    /// Run the model over the messages and return its text unchanged
    pub async fn run(&self, messages: &[ChatMessage]) -> DigestResult<String> {
        info!("Requesting summary from model {}", self.model);

        let response = self
            .client
            .post(self.model_url())
            .bearer_auth(&self.api_token)
            .json(&InferenceRequest { messages })
            .send()
            .await
            .map_err(|e| summarization_error(&format!("Inference request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            return Err(summarization_error(&format!(
                "Inference endpoint returned error: HTTP {} - {}",
                status, error_body
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| summarization_error(&format!("Failed to parse inference response: {}", e)))?;

        match response_text(&body) {
            Some(text) if !text.trim().is_empty() => {
                info!("Received summary ({} characters)", text.chars().count());
                Ok(text.to_string())
            }
            _ => Err(summarization_error("Inference response contained no text")),
        }
    }
}

#[async_trait]
impl TextGenerator for InferenceClient {
    async fn generate(&self, messages: &[ChatMessage]) -> DigestResult<String> {
        self.run(messages).await
    }
}
