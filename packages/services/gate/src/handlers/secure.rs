use axum::{Extension, Json};
use lk_core::auth::Principal;
use serde_json::{json, Value};

use super::{respond, DataResponse};
use crate::error::{GateError, Result};

/// 봉투 게이트 통과 확인
pub async fn ping(Extension(principal): Extension<Principal>) -> Result<Json<DataResponse<Value>>> {
    match principal {
        Principal::KeyHolder { fingerprint } => Ok(respond(json!({ "fingerprint": fingerprint }))),
        Principal::Claims(_) => Err(GateError::NotFound),
    }
}
