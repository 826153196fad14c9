use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// A required input field is missing or unreadable.
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// No usable upstream integration is configured.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The upstream answered, but not in the shape we rely on. `payload`
    /// holds what it did answer, when that was readable.
    #[error("Upstream contract error: {message}")]
    UpstreamContractError {
        message: String,
        payload: Option<Value>,
    },

    /// The upstream call failed or reported a failure status.
    #[error("Upstream error ({status}): {message}")]
    UpstreamTransportError {
        status: StatusCode,
        message: String,
        details: Option<Value>,
    },

    #[error("Not found: {message}")]
    NotFound {
        message: String,
        details: Option<Value>,
    },

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// JSON body written for every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl AppError {
    /// Shorthand for a 500 upstream failure.
    pub fn upstream(message: impl Into<String>, details: Option<Value>) -> Self {
        AppError::UpstreamTransportError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
            details,
        }
    }

    /// Shape violation with nothing worth echoing back.
    pub fn contract(message: impl Into<String>) -> Self {
        AppError::UpstreamContractError {
            message: message.into(),
            payload: None,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::UpstreamContractError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::UpstreamTransportError { status, .. } => *status,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn body(&self) -> ErrorBody {
        let (error, details) = match self {
            AppError::ValidationError(msg) => (msg.clone(), None),
            AppError::ConfigurationError(msg) => (msg.clone(), None),
            AppError::UpstreamContractError { message, payload } => (
                "Unexpected response from upstream service".to_string(),
                Some(match payload {
                    Some(payload) => json!({ "message": message, "response": payload }),
                    None => Value::String(message.clone()),
                }),
            ),
            AppError::UpstreamTransportError {
                message, details, ..
            } => (message.clone(), details.clone()),
            AppError::NotFound { message, details } => (message.clone(), details.clone()),
            AppError::InternalError(err) => (
                "Internal server error".to_string(),
                Some(Value::String(format!("{:#}", err))),
            ),
        };

        ErrorBody { error, details }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigurationError(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn response_json(err: AppError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn validation_error_is_bad_request_without_details() {
        let (status, body) =
            response_json(AppError::ValidationError("Message is required".into())).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Message is required" }));
    }

    #[tokio::test]
    async fn transport_error_passes_status_and_details_through() {
        let (status, body) = response_json(AppError::UpstreamTransportError {
            status: StatusCode::FORBIDDEN,
            message: "Places API request denied".into(),
            details: Some(json!("The provided API key is invalid.")),
        })
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Places API request denied");
        assert_eq!(body["details"], "The provided API key is invalid.");
    }

    #[tokio::test]
    async fn not_found_carries_raw_body() {
        let raw = json!({ "status": "NOT_FOUND" });
        let (status, body) = response_json(AppError::NotFound {
            message: "Place not found".into(),
            details: Some(raw.clone()),
        })
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["details"], raw);
    }

    #[tokio::test]
    async fn contract_error_echoes_upstream_payload() {
        let payload = json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        let (status, body) = response_json(AppError::UpstreamContractError {
            message: "no candidates".into(),
            payload: Some(payload.clone()),
        })
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Unexpected response from upstream service");
        assert_eq!(body["details"]["message"], "no candidates");
        assert_eq!(body["details"]["response"], payload);
    }

    #[test]
    fn contract_and_configuration_errors_are_server_errors() {
        assert_eq!(
            AppError::contract("no candidates").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::ConfigurationError("missing key".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
