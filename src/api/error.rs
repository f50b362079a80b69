use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::ports::ScoringError;

/// Result type for handlers
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Errors a request can end in
#[derive(Error, Debug)]
pub enum ApiError {
    /// Well-formed JSON with a missing or mistyped field
    #[error("Validation error: {0}")]
    Validation(String),

    /// Body is not JSON at all
    #[error("Malformed request body: {0}")]
    MalformedBody(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Scoring error: {0}")]
    Scoring(#[from] ScoringError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            ApiError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::Scoring(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::MalformedBody(_) => "MALFORMED_BODY",
            ApiError::UnsupportedMediaType(_) => "UNSUPPORTED_MEDIA_TYPE",
            ApiError::Scoring(_) => "SCORING_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(
                error_code = error_code,
                status_code = status.as_u16(),
                message = %message,
                "Request error"
            );
        } else {
            tracing::warn!(
                error_code = error_code,
                status_code = status.as_u16(),
                message = %message,
                "Request rejected"
            );
        }

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
                "status": status.as_u16(),
            }
        }));

        (status, body).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(e) => ApiError::Validation(e.body_text()),
            JsonRejection::JsonSyntaxError(e) => ApiError::MalformedBody(e.body_text()),
            JsonRejection::MissingJsonContentType(e) => {
                ApiError::UnsupportedMediaType(e.body_text())
            }
            other => ApiError::MalformedBody(other.body_text()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::Validation("missing field `age`".into()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::MalformedBody("eof".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        let scoring = ApiError::from(ScoringError::FeatureCount {
            expected: 13,
            got: 12,
        });
        assert_eq!(scoring.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(scoring.error_code(), "SCORING_ERROR");
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = ApiError::Validation("missing field `chol`".into()).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Should read body");
        let body: serde_json::Value = serde_json::from_slice(&bytes).expect("Should be JSON");
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["status"], 422);
        assert!(body["error"]["message"]
            .as_str()
            .expect("message")
            .contains("chol"));
    }
}
