//! HTTP 핸들러
//!
//! 성공 응답은 `{"data": {"body": ...}}` 형태로 감쌉니다.

pub mod claims;
pub mod health;
pub mod issue;
pub mod secure;

use axum::Json;
use serde::Serialize;
use serde_json::Value;

use crate::error::GateError;

/// 성공 응답 본문
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: DataBody<T>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct DataBody<T: Serialize> {
    pub body: T,
}

/// 본문을 성공 응답으로 감싸기
pub fn respond<T: Serialize>(body: T) -> Json<DataResponse<T>> {
    Json(DataResponse {
        data: DataBody { body },
        meta: None,
    })
}

/// 메타데이터와 함께 응답
pub fn respond_with_meta<T: Serialize>(body: T, meta: Value) -> Json<DataResponse<T>> {
    Json(DataResponse {
        data: DataBody { body },
        meta: Some(meta),
    })
}

/// 라우터 fallback
pub async fn not_found() -> GateError {
    GateError::NotFound
}
