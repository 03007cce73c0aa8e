//! OpenAI-compatible chat completion client

use super::{ChatClient, CompletionOptions, LlmError};
use crate::config::LlmConfig;
use crate::context::Message;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Chat client for any endpoint speaking the OpenAI chat-completions shape
pub struct OpenAiChatClient {
    client: Client,
    endpoint: String,
    api_key: Option<SecretString>,
    model: String,
    max_retries: usize,
}

impl OpenAiChatClient {
    /// Create a new client from configuration
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::Initialization(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_retries: config.max_retries.max(1),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ChatClient for OpenAiChatClient {
    async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<String, LlmError> {
        debug!(
            messages = messages.len(),
            model = %self.model,
            "Requesting chat completion"
        );

        let request = ChatCompletionRequest {
            model: &self.model,
            messages,
            max_tokens: Some(options.max_tokens),
            temperature: Some(options.temperature),
        };

        let mut last_error = None;
        for attempt in 0..self.max_retries {
            if attempt > 0 {
                debug!("Retry attempt {} for chat completion", attempt);
                tokio::time::sleep(Duration::from_millis(100 * (1 << attempt))).await;
            }

            let mut req = self.client.post(&self.endpoint).json(&request);

            if let Some(ref api_key) = self.api_key {
                req = req.bearer_auth(api_key.expose_secret());
            }

            match req.send().await {
                Ok(response) => {
                    if !response.status().is_success() {
                        let status = response.status();
                        let body = response.text().await.unwrap_or_default();
                        last_error = Some(LlmError::Api(format!("HTTP {}: {}", status, body)));
                        continue;
                    }

                    match response.json::<ChatCompletionResponse>().await {
                        Ok(resp) => {
                            if let Some(choice) = resp.choices.into_iter().next() {
                                return Ok(choice.message.content.unwrap_or_default());
                            }
                            last_error = Some(LlmError::Api("No choices in response".to_string()));
                        }
                        Err(e) => {
                            last_error = Some(LlmError::Api(format!(
                                "Failed to parse response: {}",
                                e
                            )));
                        }
                    }
                }
                Err(e) => {
                    last_error = Some(LlmError::Network(e.to_string()));
                }
            }
        }

        warn!("Chat completion failed after {} attempts", self.max_retries);
        Err(last_error.unwrap_or(LlmError::Unknown))
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}
