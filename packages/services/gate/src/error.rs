//! Gate 에러 타입

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use lk_core::auth::Rejection;
use serde::Serialize;

/// Gate 에러
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("bad request: {message}")]
    BadRequest { message: String },

    #[error("operator auth required")]
    OperatorAuth,

    #[error("not found")]
    NotFound,

    #[error("{0}")]
    Rejected(#[from] Rejection),

    #[error("core error: {0}")]
    Core(#[from] lk_core::Error),
}

/// 에러 응답 JSON
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: u16,
    pub message: String,
    pub details: ErrorDetails,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetails {
    pub reason: &'static str,
    #[serde(rename = "requestId", skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl GateError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            GateError::BadRequest { message } => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", message.clone())
            }
            GateError::OperatorAuth => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "operator auth required".to_string(),
            ),
            GateError::NotFound => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                "The page is invalid, please try again.".to_string(),
            ),
            GateError::Rejected(rejection) => core_parts(&rejection.error),
            GateError::Core(e) => {
                if !e.is_rejection() && e.status_code() >= 500 {
                    tracing::error!(code = e.code(), "internal error: {}", e);
                }
                core_parts(e)
            }
        }
    }
}

fn core_parts(e: &lk_core::Error) -> (StatusCode, &'static str, String) {
    let status =
        StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, e.code(), e.public_message().to_string())
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        let (status, reason, message) = self.parts();

        let body = ErrorResponse {
            error: ErrorBody {
                code: status.as_u16(),
                message,
                details: ErrorDetails {
                    reason,
                    request_id: crate::middleware::current_request_id(),
                },
            },
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, GateError>;
