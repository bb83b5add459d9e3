//! Gate 미들웨어
//!
//! 요청 ID, claims 게이트, 봉투 게이트를 정의합니다.
//! 게이트를 통과하면 `Principal`이 요청 extension에 담깁니다.

use std::sync::Arc;

use axum::extract::{Query, Request, State};
use axum::http::{header, HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use lk_core::auth::{BearerToken, Principal, Rejection};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::GateError;
use crate::state::AppState;

const REQUEST_ID_HEADER: &str = "x-request-id";

tokio::task_local! {
    static REQUEST_ID: String;
}

/// 현재 요청의 ID (요청 범위 밖에서는 `None`)
pub fn current_request_id() -> Option<String> {
    REQUEST_ID.try_with(|id| id.clone()).ok()
}

/// 상위 프록시가 준 ID를 이어받고, 없으면 새로 만듭니다.
pub async fn request_id(req: Request, next: Next) -> Response {
    let id = header_str(req.headers(), REQUEST_ID_HEADER)
        .map(str::trim)
        .filter(|id| !id.is_empty() && id.len() <= 128)
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let mut resp = REQUEST_ID.scope(id.clone(), next.run(req)).await;
    if let Ok(value) = HeaderValue::from_str(&id) {
        resp.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    resp
}

/// claims 게이트 설정 (라우트별 최소 permission)
#[derive(Clone)]
pub struct ClaimsGuard {
    pub state: Arc<AppState>,
    pub required: i64,
}

impl ClaimsGuard {
    pub fn new(state: Arc<AppState>, required: i64) -> Self {
        Self { state, required }
    }
}

#[derive(Debug, Default, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// 요청에서 후보 토큰 추출 (헤더 → 쿼리 → 쿠키)
fn extract_token(req: &Request) -> Option<BearerToken> {
    let headers = req.headers();
    let query = Query::<TokenQuery>::try_from_uri(req.uri())
        .map(|Query(q)| q)
        .unwrap_or_default();

    BearerToken::from_parts(
        header_str(headers, header::AUTHORIZATION.as_str()),
        query.token.as_deref(),
        header_str(headers, header::COOKIE.as_str()),
    )
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn reject(gate: &'static str, token: Option<&BearerToken>, rejection: Rejection) -> GateError {
    tracing::warn!(
        gate,
        state = rejection.state.as_str(),
        code = rejection.error.code(),
        source = token.map(|t| t.source.as_str()),
        "request rejected"
    );
    GateError::Rejected(rejection)
}

/// claims 게이트 미들웨어
pub async fn claims_gate(
    State(guard): State<ClaimsGuard>,
    mut req: Request,
    next: Next,
) -> Result<Response, GateError> {
    let token = extract_token(&req);
    let now = chrono::Utc::now().timestamp();

    let claims = guard
        .state
        .claims_gate
        .admit(token.as_ref(), now, guard.required)
        .map_err(|rejection| reject("claims", token.as_ref(), rejection))?;

    req.extensions_mut().insert(Principal::Claims(claims));
    Ok(next.run(req).await)
}

/// 봉투 게이트 미들웨어
pub async fn envelope_gate(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, GateError> {
    let Some(gate) = state.envelope_gate.as_ref() else {
        return Err(GateError::NotFound);
    };
    let token = extract_token(&req);

    let principal = gate
        .admit(token.as_ref())
        .map_err(|rejection| reject("envelope", token.as_ref(), rejection))?;

    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}
