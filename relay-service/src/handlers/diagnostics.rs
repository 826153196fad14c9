use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use service_core::error::AppError;

use crate::{
    dtos::{HealthResponse, TestGeminiResponse},
    services::{
        metrics::record_upstream_call,
        providers::{gemini::GenerationParams, ProviderKind},
        render_metrics,
    },
    AppState,
};

/// Fixed prompt used by the Gemini connectivity test.
pub const TEST_PROMPT: &str = "Say hello and introduce yourself as a travel assistant in one sentence.";

/// Diagnostic failure: the usual error body with `success: false`.
#[derive(Debug)]
pub struct DiagnosticFailure(pub AppError);

impl IntoResponse for DiagnosticFailure {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct DiagnosticErrorBody {
            success: bool,
            error: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            details: Option<Value>,
        }

        let body = self.0.body();
        (
            self.0.status_code(),
            Json(DiagnosticErrorBody {
                success: false,
                error: body.error,
                details: body.details,
            }),
        )
            .into_response()
    }
}

/// Static process state; never calls upstream.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        message: "Travel assistant relay is running",
        services: state.config.services(),
    })
}

/// Sends a fixed prompt to Gemini and returns its raw answer.
pub async fn test_gemini(
    State(state): State<AppState>,
) -> Result<Json<TestGeminiResponse>, DiagnosticFailure> {
    tracing::info!("Running Gemini connectivity test");

    match state
        .gemini
        .generate(TEST_PROMPT, GenerationParams::default())
        .await
    {
        Ok(reply) => {
            record_upstream_call("gemini", "success");
            tracing::info!(reply_len = reply.text.len(), "Gemini connectivity test passed");
            Ok(Json(TestGeminiResponse {
                success: true,
                response: reply.raw,
                reply: reply.text,
            }))
        }
        Err(e) => {
            record_upstream_call("gemini", "error");
            tracing::error!(error = %e, "Gemini connectivity test failed");
            Err(DiagnosticFailure(e.into_app_error(ProviderKind::Gemini)))
        }
    }
}

/// Prometheus metrics endpoint.
pub async fn metrics() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        render_metrics(),
    )
}
