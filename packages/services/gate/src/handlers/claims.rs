//! claims 게이트를 통과한 요청의 claims 조회

use axum::{Extension, Json};
use lk_core::auth::Principal;
use serde_json::{json, Map, Value};

use super::{respond_with_meta, DataResponse};
use crate::error::{GateError, Result};

/// 게이트가 확정한 claims 반환
pub async fn show_claims(
    Extension(principal): Extension<Principal>,
) -> Result<Json<DataResponse<Map<String, Value>>>> {
    let claims = principal.claims().ok_or(GateError::NotFound)?;
    let now = chrono::Utc::now().timestamp();

    Ok(respond_with_meta(
        claims.to_map(),
        json!({
            "permission": claims.permission(),
            "remainingTtl": claims.remaining_ttl(now),
        }),
    ))
}
