//! Generative-text provider abstractions and implementations.
//!
//! Chat requests are routed through a [`ProviderChain`]: an ordered list of
//! providers where the first one with a configured key wins.

pub mod gemini;
pub mod openai;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use service_core::error::AppError;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Instruction prepended to every chat message.
pub const TRAVEL_ASSISTANT_INSTRUCTION: &str = "You are a friendly and knowledgeable travel assistant. \
Help users discover destinations, attractions, restaurants, local culture and practical travel tips. \
Keep answers concise, accurate and easy to act on. If a question is unrelated to travel, \
gently steer the conversation back to travel planning.";

/// Sampling temperature used for chat replies.
pub const CHAT_TEMPERATURE: f64 = 0.7;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {status}: {message}")]
    ApiError {
        status: u16,
        message: String,
        body: Option<Value>,
    },

    #[error("Unexpected response: {message}")]
    UnexpectedResponse {
        message: String,
        body: Option<Value>,
    },
}

impl ProviderError {
    /// Maps a provider failure onto the relay's error taxonomy.
    pub fn into_app_error(self, provider: ProviderKind) -> AppError {
        match self {
            ProviderError::NotConfigured(msg) => AppError::ConfigurationError(msg),
            ProviderError::NetworkError(msg) => AppError::upstream(
                format!("Failed to reach {}", provider),
                Some(Value::String(msg)),
            ),
            ProviderError::ApiError {
                status,
                message,
                body,
            } => AppError::upstream(
                format!("{} API returned status {}", provider, status),
                Some(body.unwrap_or(Value::String(message))),
            ),
            ProviderError::UnexpectedResponse { message, body } => {
                AppError::UpstreamContractError {
                    message,
                    payload: body,
                }
            }
        }
    }
}

/// Describes a transport failure. The request URL is dropped because it
/// carries the API key for key-in-query providers.
pub(crate) fn network_error(err: reqwest::Error) -> ProviderError {
    ProviderError::NetworkError(err.without_url().to_string())
}

/// Builds an `ApiError` from a non-success upstream response.
///
/// The body is kept as JSON when it parses, otherwise as a string.
pub(crate) async fn api_error(response: reqwest::Response) -> ProviderError {
    let status = response.status().as_u16();
    let text = response.text().await.unwrap_or_default();
    let body = serde_json::from_str::<Value>(&text).ok();

    let message = body
        .as_ref()
        .and_then(|b| b.pointer("/error/message"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| text.clone());

    ProviderError::ApiError {
        status,
        message,
        body: body.or_else(|| (!text.is_empty()).then(|| Value::String(text))),
    }
}

/// Identifies a chat provider; serialized as the `source` of a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Gemini,
    OpenAi,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::OpenAi => "openai",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Gemini => write!(f, "Gemini"),
            ProviderKind::OpenAi => write!(f, "OpenAI"),
        }
    }
}

/// A generative-text backend able to answer a single chat message.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Whether the provider has the credentials it needs.
    fn is_configured(&self) -> bool;

    /// Answer `message` as the travel assistant.
    async fn reply(&self, message: &str) -> Result<String, ProviderError>;
}

/// Chat providers in priority order.
#[derive(Clone, Default)]
pub struct ProviderChain {
    providers: Vec<Arc<dyn ChatProvider>>,
}

impl ProviderChain {
    pub fn new(providers: Vec<Arc<dyn ChatProvider>>) -> Self {
        Self { providers }
    }

    /// First configured provider. A failure of the selected provider is
    /// never retried against a later one.
    pub fn select(&self) -> Option<Arc<dyn ChatProvider>> {
        self.providers.iter().find(|p| p.is_configured()).cloned()
    }
}
