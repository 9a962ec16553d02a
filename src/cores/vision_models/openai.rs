use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

use crate::configs::settings::UpstreamConfig;
use crate::cores::errors::AnalyzeError;
use crate::cores::schemas::{ChatMessage, CompletionsResponse, UpstreamErrorBody};
use crate::cores::vision_models::vision_controller::VisionCompletions;

pub struct OpenAIVision {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAIVision {
    pub fn new(config: &UpstreamConfig, api_key: String) -> Result<Self, AnalyzeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| AnalyzeError::Config(format!("Failed to build HTTP client: {}", err)))?;

        Ok(OpenAIVision {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }
}

#[async_trait]
impl VisionCompletions for OpenAIVision {
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, AnalyzeError> {
        // 1. Build the request body
        let request_body = json!({
            "model": self.model,
            "messages": messages,
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
        });

        // 2. Send the POST request
        let url = format!("{}/chat/completions", self.base_url);
        debug!("POST {} model={}", url, self.model);
        let response = self.client.post(&url)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|err| AnalyzeError::Upstream(format!("Request failed: {}", err)))?;

        let status = response.status();
        let response_text = response.text().await
            .map_err(|err| AnalyzeError::Upstream(format!("Failed to read response: {}", err)))?;

        // 3. Surface the server's own message on non-success statuses
        if !status.is_success() {
            let message = serde_json::from_str::<UpstreamErrorBody>(&response_text)
                .map(|body| body.error.message)
                .unwrap_or(response_text);
            return Err(AnalyzeError::Upstream(format!("API returned status {}: {}", status, message)));
        }

        // 4. Take the first choice's text
        let chat_response: CompletionsResponse = serde_json::from_str(&response_text)
            .map_err(|err| AnalyzeError::Upstream(format!("Failed to parse response: {}", err)))?;
        let message = chat_response.choices.into_iter().next()
            .map(|choice| choice.message)
            .ok_or_else(|| AnalyzeError::Upstream("Response contained no choices".into()))?;

        match (message.content, message.refusal) {
            (Some(content), _) if !content.trim().is_empty() => Ok(content),
            (_, Some(refusal)) => Ok(refusal),
            _ => Err(AnalyzeError::Upstream("Response contained no content".into())),
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
