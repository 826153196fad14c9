use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use service_core::error::AppError;

use crate::{
    dtos::{ChatRequest, ChatResponse},
    services::metrics::record_upstream_call,
    utils::required,
    AppState,
};

pub const MISSING_MESSAGE: &str = "Message is required";
pub const NOT_CONFIGURED_REPLY: &str = "The travel assistant is not configured yet. \
Please set GEMINI_API_KEY or OPENAI_API_KEY on the server and restart it.";
pub const APOLOGY_REPLY: &str =
    "Sorry, I'm having trouble answering right now. Please try again in a moment.";

/// Chat failure: the usual error body plus a user-facing `reply`.
#[derive(Debug)]
pub struct ChatFailure(pub AppError);

impl From<AppError> for ChatFailure {
    fn from(err: AppError) -> Self {
        ChatFailure(err)
    }
}

impl IntoResponse for ChatFailure {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ChatErrorBody {
            error: String,
            reply: &'static str,
            #[serde(skip_serializing_if = "Option::is_none")]
            details: Option<Value>,
        }

        let reply = match &self.0 {
            AppError::ValidationError(_) => "Please type a message so I can help you.",
            AppError::ConfigurationError(_) => NOT_CONFIGURED_REPLY,
            _ => APOLOGY_REPLY,
        };
        let body = self.0.body();

        (
            self.0.status_code(),
            Json(ChatErrorBody {
                error: body.error,
                reply,
                details: body.details,
            }),
        )
            .into_response()
    }
}

/// Answers a chat message with the highest-priority configured provider.
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ChatFailure> {
    let Json(request) =
        payload.map_err(|rejection| AppError::ValidationError(rejection.body_text()))?;

    let user_id = request.user_label();
    let message = required(request.message, MISSING_MESSAGE)?;

    tracing::info!(
        user_id = %user_id,
        message_len = message.len(),
        "Chat request received"
    );

    let provider = state.providers.select().ok_or_else(|| {
        tracing::error!("No chat provider configured");
        AppError::ConfigurationError(
            "No AI provider configured. Set GEMINI_API_KEY or OPENAI_API_KEY.".to_string(),
        )
    })?;
    let source = provider.kind();

    tracing::info!(provider = source.as_str(), "Routing chat request");

    match provider.reply(&message).await {
        Ok(reply) => {
            record_upstream_call(source.as_str(), "success");
            tracing::info!(
                provider = source.as_str(),
                reply_len = reply.len(),
                "Chat reply generated"
            );
            Ok(Json(ChatResponse { reply, source }))
        }
        Err(e) => {
            record_upstream_call(source.as_str(), "error");
            tracing::error!(provider = source.as_str(), error = %e, "Chat provider failed");
            Err(ChatFailure(e.into_app_error(source)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    async fn body_of(failure: ChatFailure) -> (StatusCode, Value) {
        let response = failure.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn configuration_failure_tells_user_to_configure() {
        let (status, body) = body_of(ChatFailure(AppError::ConfigurationError(
            "No AI provider configured".into(),
        )))
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["reply"], NOT_CONFIGURED_REPLY);
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn upstream_failure_apologizes_with_details() {
        let (status, body) = body_of(ChatFailure(AppError::upstream(
            "Gemini API returned status 500",
            Some(serde_json::json!({ "error": { "code": 500 } })),
        )))
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["reply"], APOLOGY_REPLY);
        assert_eq!(body["details"]["error"]["code"], 500);
    }
}
