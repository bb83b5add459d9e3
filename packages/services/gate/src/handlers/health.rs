use axum::Json;
use serde_json::{json, Value};

use super::{respond, DataResponse};

pub async fn health_check() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

/// 연결 확인용 고정 응답
pub async fn hello() -> Json<DataResponse<&'static str>> {
    respond("Hello World!")
}
