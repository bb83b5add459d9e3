//! 공통 에러 타입
//!
//! Latchkey 전체에서 사용되는 에러 타입을 정의합니다.
//! 설정/키 에러는 시작 시점에 치명적이며, 토큰 관련 에러는 요청 단위로
//! 401/403으로 변환됩니다.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Latchkey 공통 에러
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────────────────────
    // Startup Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("config error: {message}")]
    Config { message: String },

    #[error("key format error: {message}")]
    KeyFormat { message: String },

    // ─────────────────────────────────────────────────────────────────────────────
    // Token Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("token not provided")]
    MissingToken,

    #[error("malformed token: {reason}")]
    MalformedToken { reason: String },

    #[error("malformed envelope: {reason}")]
    MalformedEnvelope { reason: String },

    #[error("decryption failed")]
    Decryption,

    #[error("signature verification failed")]
    Signature,

    #[error("token expired or not yet valid")]
    TokenExpired,

    #[error("subject mismatch")]
    SubjectMismatch,

    #[error("public key does not match the server key pair")]
    KeyMismatch,

    #[error("permission denied: required {required}, got {actual}")]
    PermissionDenied { required: i64, actual: i64 },

    #[error("invalid ttl: {ttl}s (must exceed the {grace}s not-before grace window and keep exp in range)")]
    InvalidTtl { ttl: i64, grace: i64 },

    // ─────────────────────────────────────────────────────────────────────────────
    // Serialization Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
        }
    }

    pub(crate) fn key_format(message: impl Into<String>) -> Self {
        Error::KeyFormat {
            message: message.into(),
        }
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Error::MalformedToken {
            reason: reason.into(),
        }
    }

    /// HTTP 상태 코드로 변환
    pub fn status_code(&self) -> u16 {
        match self {
            // 401 Unauthorized
            Error::MissingToken
            | Error::MalformedToken { .. }
            | Error::MalformedEnvelope { .. }
            | Error::Decryption
            | Error::Signature
            | Error::TokenExpired
            | Error::SubjectMismatch => 401,

            // 400 Bad Request
            Error::InvalidTtl { .. } => 400,

            // 403 Forbidden
            Error::KeyMismatch | Error::PermissionDenied { .. } => 403,

            // 500 Internal Server Error
            Error::Config { .. } | Error::KeyFormat { .. } | Error::Json(_) => 500,
        }
    }

    /// 에러 코드 (클라이언트용)
    pub fn code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "CONFIG_ERROR",
            Error::KeyFormat { .. } => "KEY_FORMAT_ERROR",
            Error::MissingToken => "TOKEN_MISSING",
            Error::MalformedToken { .. } => "MALFORMED_TOKEN",
            Error::MalformedEnvelope { .. } => "MALFORMED_ENVELOPE",
            Error::Decryption => "DECRYPTION_FAILED",
            Error::Signature => "INVALID_SIGNATURE",
            Error::TokenExpired => "TOKEN_EXPIRED",
            Error::SubjectMismatch => "SUBJECT_MISMATCH",
            Error::KeyMismatch => "KEY_MISMATCH",
            Error::PermissionDenied { .. } => "PERMISSION_DENIED",
            Error::InvalidTtl { .. } => "INVALID_TTL",
            Error::Json(_) => "JSON_ERROR",
        }
    }

    /// 클라이언트에 노출되는 고정 메시지
    ///
    /// 내부 사유(`Display`)는 로그 전용이며, 응답 본문에는 이 메시지만 사용합니다.
    pub fn public_message(&self) -> &'static str {
        match self {
            Error::MissingToken => "Token not provided.",
            Error::MalformedToken { .. } => "Invalid token format.",
            Error::MalformedEnvelope { .. } => "Token is missing or malformed.",
            Error::Decryption | Error::Signature => "Failed to decrypt/validate the token.",
            Error::TokenExpired | Error::SubjectMismatch => "Invalid or expired token.",
            Error::KeyMismatch => "Invalid token.",
            Error::PermissionDenied { .. } => "Insufficient permissions.",
            Error::InvalidTtl { .. } => "Invalid token lifetime.",
            Error::Config { .. } | Error::KeyFormat { .. } | Error::Json(_) => {
                "Internal server error."
            }
        }
    }

    /// 요청 단위 거절 사유인지 여부 (401/403)
    pub fn is_rejection(&self) -> bool {
        matches!(self.status_code(), 401 | 403)
    }

    /// 검증 도중 발생한 예기치 않은 에러를 거절로 변환 (fail-closed)
    pub fn fail_closed(self) -> Self {
        if self.is_rejection() {
            self
        } else {
            Error::Signature
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::MissingToken.status_code(), 401);
        assert_eq!(Error::SubjectMismatch.status_code(), 401);
        assert_eq!(Error::KeyMismatch.status_code(), 403);
        assert_eq!(
            Error::PermissionDenied {
                required: 2,
                actual: 1
            }
            .status_code(),
            403
        );
        assert_eq!(Error::config("bad").status_code(), 500);
    }

    #[test]
    fn test_public_messages_are_stable() {
        assert_eq!(Error::MissingToken.public_message(), "Token not provided.");
        assert_eq!(
            Error::malformed("two segments").public_message(),
            "Invalid token format."
        );
        assert_eq!(
            Error::PermissionDenied {
                required: 2,
                actual: 0
            }
            .public_message(),
            "Insufficient permissions."
        );
    }

    #[test]
    fn test_fail_closed() {
        let err = Error::key_format("garbage").fail_closed();
        assert!(matches!(err, Error::Signature));
        assert_eq!(err.status_code(), 401);

        let err = Error::TokenExpired.fail_closed();
        assert!(matches!(err, Error::TokenExpired));
    }
}
