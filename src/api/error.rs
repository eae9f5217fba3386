//! HTTP error mapping.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::error::VellumError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Vellum(#[from] VellumError),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidBody(rejection.body_text())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            ApiError::Vellum(e) => match e {
                VellumError::NotFound { .. } => StatusCode::NOT_FOUND,
                VellumError::Validation { .. }
                | VellumError::InvalidKind(_)
                | VellumError::InvalidValue { .. } => StatusCode::BAD_REQUEST,
                VellumError::UnsupportedOperation(_) => StatusCode::CONFLICT,
                VellumError::Generation(_) => StatusCode::BAD_GATEWAY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            ApiError::InvalidBody(_) => "ValidationError",
            ApiError::Vellum(e) => e.error_type(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Internal error: {}", self);
            "Internal error".to_string()
        } else {
            self.to_string()
        };

        let body = Json(json!({
            "error": self.error_type(),
            "message": message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (VellumError::not_found("rfp", "1"), StatusCode::NOT_FOUND),
            (VellumError::validation("name", "empty"), StatusCode::BAD_REQUEST),
            (
                VellumError::UnsupportedOperation("edit".into()),
                StatusCode::CONFLICT,
            ),
            (
                VellumError::Storage("disk".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
        assert_eq!(
            ApiError::InvalidBody("missing field".into()).status(),
            StatusCode::BAD_REQUEST
        );
    }
}
