//! Token 명령어

use anyhow::{anyhow, bail};
use serde_json::{json, Map, Value};

use crate::config::CliConfig;
use lk_core::auth::BearerToken;

/// `k=v` 인자 파싱
///
/// 값이 JSON으로 해석되면 그 값을, 아니면 문자열을 사용합니다.
pub fn parse_pair(input: &str) -> anyhow::Result<(String, Value)> {
    let (key, raw) = input
        .split_once('=')
        .ok_or_else(|| anyhow!("expected key=value, got '{}'", input))?;
    let key = key.trim();
    if key.is_empty() {
        bail!("empty key in '{}'", input);
    }

    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}

fn to_map(pairs: Vec<(String, Value)>) -> Map<String, Value> {
    pairs.into_iter().collect()
}

/// 토큰 발급
pub fn issue(
    config: &CliConfig,
    claims: Vec<(String, Value)>,
    ttl: Option<i64>,
    headers: Vec<(String, Value)>,
    now: i64,
) -> anyhow::Result<String> {
    Ok(config
        .issuer()
        .issue_with_headers(to_map(claims), ttl, to_map(headers), now)?)
}

/// 서명 검증 없이 디코딩
pub fn inspect(config: &CliConfig, token: &str) -> anyhow::Result<Value> {
    let codec = config.codec();
    let decoded = codec.decode(token)?;

    Ok(json!({
        "header": decoded.header.to_map(),
        "claims": decoded.claims.to_map(),
        "signatureValid": codec.verify_signature(token),
    }))
}

/// 게이트 파이프라인 전체 실행
pub fn verify(config: &CliConfig, token: &str, at: i64, permission: i64) -> anyhow::Result<Value> {
    let bearer = BearerToken::from_parts(Some(&format!("Bearer {}", token.trim())), None, None);

    match config.claims_gate().admit(bearer.as_ref(), at, permission) {
        Ok(claims) => Ok(json!({
            "admitted": true,
            "claims": claims.to_map(),
            "remainingTtl": claims.remaining_ttl(at),
        })),
        Err(rejection) => Err(anyhow!(
            "rejected at {} ({}): {}",
            rejection.state.as_str(),
            rejection.error.code(),
            rejection.error.public_message()
        )),
    }
}
