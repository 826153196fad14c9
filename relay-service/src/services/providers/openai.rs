//! OpenAI chat-completions provider.

use super::{
    api_error, network_error, ChatProvider, ProviderError, ProviderKind, CHAT_TEMPERATURE,
    TRAVEL_ASSISTANT_INSTRUCTION,
};
use crate::config::OpenAiSettings;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use service_core::observability::TracedClientExt;

/// Output cap for chat replies.
pub const CHAT_MAX_TOKENS: u32 = 800;

/// OpenAI chat client (bearer-token auth).
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    settings: OpenAiSettings,
}

impl OpenAiClient {
    pub fn new(client: Client, settings: OpenAiSettings) -> Self {
        Self { client, settings }
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.settings.api_base.trim_end_matches('/')
        )
    }

    fn build_request<'a>(&'a self, message: &'a str) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &self.settings.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: TRAVEL_ASSISTANT_INSTRUCTION,
                },
                ChatMessage {
                    role: "user",
                    content: message,
                },
            ],
            temperature: CHAT_TEMPERATURE,
            max_tokens: CHAT_MAX_TOKENS,
        }
    }
}

#[async_trait]
impl ChatProvider for OpenAiClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    fn is_configured(&self) -> bool {
        self.settings.api_key.is_some()
    }

    async fn reply(&self, message: &str) -> Result<String, ProviderError> {
        let api_key = self
            .settings
            .api_key
            .as_ref()
            .ok_or_else(|| ProviderError::NotConfigured("OPENAI_API_KEY is not set".to_string()))?;

        tracing::info!(
            model = %self.settings.model,
            message_len = message.len(),
            "Sending request to OpenAI API"
        );

        let response = self
            .client
            .traced_post(&self.completions_url())
            .bearer_auth(api_key.expose_secret())
            .json(&self.build_request(message))
            .send()
            .await
            .map_err(network_error)?;

        if !response.status().is_success() {
            let err = api_error(response).await;
            tracing::error!(error = %err, "OpenAI API call failed");
            return Err(err);
        }

        let raw: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::UnexpectedResponse {
                message: format!("invalid JSON: {}", e.without_url()),
                body: None,
            })?;

        let content = serde_json::from_value::<ChatCompletionResponse>(raw.clone())
            .ok()
            .and_then(|completion| completion.choices.into_iter().next())
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .ok_or_else(|| ProviderError::UnexpectedResponse {
                message: "OpenAI response has no choices[0].message.content".to_string(),
                body: Some(raw),
            })?;

        tracing::debug!(reply_len = content.len(), "OpenAI API call succeeded");

        Ok(content)
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_has_system_then_user_message() {
        let client = OpenAiClient::new(Client::new(), OpenAiSettings::default());
        let value = serde_json::to_value(client.build_request("Tell me about Paris")).unwrap();

        assert_eq!(value["model"], "gpt-3.5-turbo");
        assert_eq!(value["max_tokens"], 800);
        assert_eq!(value["temperature"], 0.7);
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["role"], "user");
        assert_eq!(value["messages"][1]["content"], "Tell me about Paris");
    }

    #[test]
    fn unconfigured_without_key() {
        let client = OpenAiClient::new(Client::new(), OpenAiSettings::default());
        assert!(!client.is_configured());
    }
}
