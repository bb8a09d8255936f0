//! HTTP error mapping with structured JSON bodies

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::collector::FormError;
use crate::pipeline::PipelineError;

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// Request failures with HTTP status mapping
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] FormError),
    #[error("Malformed request: {0}")]
    Malformed(String),
    #[error("Prediction failed: {0}")]
    Prediction(#[from] PipelineError),
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            WebError::InvalidInput(e) => (StatusCode::BAD_REQUEST, "INVALID_INPUT", e.to_string()),
            WebError::Malformed(detail) => (StatusCode::BAD_REQUEST, "MALFORMED", detail.clone()),
            WebError::Prediction(e) => {
                tracing::error!(error = %e, "Prediction failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "PREDICTION_FAILED",
                    "The model could not score this record".to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), 4096).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn invalid_input_returns_400() {
        let err = WebError::from(FormError::OutOfRange {
            field: "time_in_hospital",
            value: 30,
            min: 1,
            max: 14,
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "INVALID_INPUT");
        assert_eq!(json["error"]["message"], "time_in_hospital: 30 is outside 1..=14");
    }

    #[tokio::test]
    async fn malformed_returns_400() {
        let response = WebError::Malformed("expected a number".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "MALFORMED");
    }

    #[tokio::test]
    async fn prediction_failure_hides_details() {
        let err = WebError::from(PipelineError::TypeMismatch {
            feature: "A1Cresult".into(),
            value: "No".into(),
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "PREDICTION_FAILED");
        assert_eq!(json["error"]["message"], "The model could not score this record");
    }
}
