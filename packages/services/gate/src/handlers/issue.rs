//! 운영자 전용 발급 엔드포인트
//!
//! `Authorization: Bearer <LK_OPERATOR_TOKEN>` 또는 `x-operator-token` 헤더가 필요합니다.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use subtle::ConstantTimeEq;

use super::{respond, DataResponse};
use crate::error::{GateError, Result};
use crate::state::AppState;

/// 토큰 발급 요청 본문
#[derive(Debug, Default, Deserialize)]
pub struct IssueRequest {
    /// 사용자 정의 claims (`permission` 등)
    #[serde(default)]
    pub claims: Map<String, Value>,

    /// TTL (초), 없으면 설정값
    #[serde(default)]
    pub ttl: Option<i64>,

    /// 추가 헤더 필드
    #[serde(default)]
    pub headers: Map<String, Value>,
}

#[derive(Debug, Serialize)]
pub struct IssueResponse {
    pub token: String,
}

fn require_operator(state: &AppState, headers: &HeaderMap) -> Result<()> {
    let Some(expected) = state.config.operator_token.as_deref() else {
        return Err(GateError::OperatorAuth);
    };

    let presented = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .or_else(|| headers.get("x-operator-token").and_then(|v| v.to_str().ok()))
        .map(str::trim);

    match presented {
        Some(token) if bool::from(token.as_bytes().ct_eq(expected.as_bytes())) => Ok(()),
        _ => {
            tracing::warn!("operator auth failed");
            Err(GateError::OperatorAuth)
        }
    }
}

/// claims 토큰 발급
pub async fn issue_token(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: std::result::Result<Json<IssueRequest>, JsonRejection>,
) -> Result<Json<DataResponse<IssueResponse>>> {
    require_operator(&state, &headers)?;

    let Json(request) = body.map_err(|e| GateError::BadRequest {
        message: e.body_text(),
    })?;

    let ttl = request.ttl.unwrap_or(state.config.token_ttl);
    if ttl <= 0 {
        return Err(GateError::BadRequest {
            message: "ttl must be a positive number of seconds".to_string(),
        });
    }

    let now = chrono::Utc::now().timestamp();
    let token = state
        .issuer
        .issue_with_headers(request.claims, Some(ttl), request.headers, now)?;

    tracing::info!(ttl, "issued claims token");
    Ok(respond(IssueResponse { token }))
}

/// 공개키 봉투 발급
pub async fn issue_envelope(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<DataResponse<IssueResponse>>> {
    require_operator(&state, &headers)?;

    let gate = state.envelope_gate.as_ref().ok_or(GateError::NotFound)?;
    let token = gate.envelope().seal()?;

    tracing::info!("issued key envelope");
    Ok(respond(IssueResponse { token }))
}
