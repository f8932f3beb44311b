//! HTTP error responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::error::{LlmError, PromptAssistError, ValidationError};

/// Error returned by HTTP handlers
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
    message: Option<String>,
}

impl ApiError {
    /// Map a service error to a response; `debug` exposes internal details
    pub fn from_error(err: PromptAssistError, debug: bool) -> Self {
        match err {
            PromptAssistError::Validation(ValidationError::InvalidRequest { message }) => Self {
                status: StatusCode::UNPROCESSABLE_ENTITY,
                detail: message,
                message: None,
            },
            PromptAssistError::Validation(e) => Self {
                status: StatusCode::BAD_REQUEST,
                detail: e.to_string(),
                message: None,
            },
            PromptAssistError::Llm(LlmError::Disabled) => Self {
                status: StatusCode::SERVICE_UNAVAILABLE,
                detail: LlmError::Disabled.to_string(),
                message: None,
            },
            other => {
                tracing::error!("Unhandled error: {}", other);
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    detail: "Internal server error".to_string(),
                    message: Some(if debug {
                        other.to_string()
                    } else {
                        "An error occurred".to_string()
                    }),
                }
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.message {
            Some(message) => json!({ "detail": self.detail, "message": message }),
            None => json!({ "detail": self.detail }),
        };
        (self.status, Json(body)).into_response()
    }
}
