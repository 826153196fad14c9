//! Gemini provider implementation.
//!
//! Calls the `generateContent` endpoint with the API key in the query string.

use super::{
    api_error, network_error, ChatProvider, ProviderError, ProviderKind, CHAT_TEMPERATURE,
    TRAVEL_ASSISTANT_INSTRUCTION,
};
use crate::config::GeminiSettings;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use service_core::observability::TracedClientExt;

/// Output cap for chat replies.
pub const CHAT_MAX_OUTPUT_TOKENS: u32 = 1024;

/// Generation parameters sent with every request.
#[derive(Debug, Clone, Copy)]
pub struct GenerationParams {
    pub temperature: f64,
    pub max_output_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: CHAT_TEMPERATURE,
            max_output_tokens: CHAT_MAX_OUTPUT_TOKENS,
        }
    }
}

/// Successful generation: the extracted text plus the untouched payload.
#[derive(Debug, Clone)]
pub struct GeminiReply {
    pub text: String,
    pub raw: Value,
}

/// Gemini text client.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    settings: GeminiSettings,
}

impl GeminiClient {
    pub fn new(client: Client, settings: GeminiSettings) -> Self {
        Self { client, settings }
    }

    /// Build the API URL for the given method.
    fn api_url(&self, method: &str) -> String {
        format!(
            "{}/models/{}:{}",
            self.settings.api_base.trim_end_matches('/'),
            self.settings.model,
            method
        )
    }

    /// Single-prompt generation.
    pub async fn generate(
        &self,
        prompt: &str,
        params: GenerationParams,
    ) -> Result<GeminiReply, ProviderError> {
        let api_key = self
            .settings
            .api_key
            .as_ref()
            .ok_or_else(|| ProviderError::NotConfigured("GEMINI_API_KEY is not set".to_string()))?;

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: params.temperature,
                max_output_tokens: params.max_output_tokens,
            },
        };

        tracing::info!(
            model = %self.settings.model,
            prompt_len = prompt.len(),
            "Sending request to Gemini API"
        );

        let response = self
            .client
            .traced_post(&self.api_url("generateContent"))
            .query(&[("key", api_key.expose_secret().as_str())])
            .json(&request)
            .send()
            .await
            .map_err(network_error)?;

        if !response.status().is_success() {
            let err = api_error(response).await;
            tracing::error!(error = %err, "Gemini API call failed");
            return Err(err);
        }

        let raw: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::UnexpectedResponse {
                message: format!("invalid JSON: {}", e.without_url()),
                body: None,
            })?;

        let text = extract_text(&raw).ok_or_else(|| {
            tracing::warn!("Gemini response carried no reply text");
            ProviderError::UnexpectedResponse {
                message: "Gemini response has no candidates[0].content.parts[0].text".to_string(),
                body: Some(raw.clone()),
            }
        })?;

        tracing::debug!(reply_len = text.len(), "Gemini API call succeeded");

        Ok(GeminiReply { text, raw })
    }
}

/// Combines the travel instruction and the user message into one prompt.
pub fn chat_prompt(message: &str) -> String {
    format!("{}\n\nUser: {}", TRAVEL_ASSISTANT_INSTRUCTION, message)
}

fn extract_text(raw: &Value) -> Option<String> {
    let response: GenerateContentResponse = serde_json::from_value(raw.clone()).ok()?;
    response
        .candidates
        .into_iter()
        .next()?
        .content?
        .parts
        .into_iter()
        .next()?
        .text
}

#[async_trait]
impl ChatProvider for GeminiClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    fn is_configured(&self) -> bool {
        self.settings.api_key.is_some()
    }

    async fn reply(&self, message: &str) -> Result<String, ProviderError> {
        let reply = self
            .generate(&chat_prompt(message), GenerationParams::default())
            .await?;
        Ok(reply.text)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}
