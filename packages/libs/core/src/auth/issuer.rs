//! 토큰 발급
//!
//! `iat`/`nbf`/`exp`는 항상 발급 시점에 계산합니다. `nbf`는 발급 후 60초의
//! 유예 구간을 둡니다.

use rand::RngCore;
use serde_json::{Map, Value};

use super::claims::{is_reserved, Claims, Header};
use super::codec::ClaimsCodec;
use crate::error::{Error, Result};

/// 기본 TTL (초)
pub const DEFAULT_TTL_SECONDS: i64 = 3600;

/// 발급 직후 사용 불가 구간 (초)
pub const NOT_BEFORE_GRACE_SECONDS: i64 = 60;

/// 허용되는 최대 TTL (초, 10년)
pub const MAX_TTL_SECONDS: i64 = 10 * 365 * 24 * 3600;

const JTI_BYTES: usize = 8;

/// 호출자가 지정하지 않았을 때 사용하는 식별 claim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuerDefaults {
    pub issuer: String,
    pub audience: String,
    pub subject: String,
}

impl IssuerDefaults {
    /// `APP_URL`/`APP_NAME` 기반 기본값
    pub fn for_app(app_name: &str, app_url: &str) -> Self {
        Self {
            issuer: app_url.to_string(),
            audience: app_url.to_string(),
            subject: super::claims::expected_subject(app_name),
        }
    }
}

/// 토큰 발급기
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    codec: ClaimsCodec,
    defaults: IssuerDefaults,
}

impl TokenIssuer {
    pub fn new(codec: ClaimsCodec, defaults: IssuerDefaults) -> Self {
        Self { codec, defaults }
    }

    pub fn defaults(&self) -> &IssuerDefaults {
        &self.defaults
    }

    /// 현재 시각 기준 발급 (`ttl`이 없으면 3600초)
    pub fn issue(&self, custom: Map<String, Value>, ttl: Option<i64>) -> Result<String> {
        self.issue_at(custom, ttl, chrono::Utc::now().timestamp())
    }

    /// 지정 시각 기준 발급
    pub fn issue_at(&self, custom: Map<String, Value>, ttl: Option<i64>, now: i64) -> Result<String> {
        self.issue_with_headers(custom, ttl, Map::new(), now)
    }

    /// 추가 헤더 필드와 함께 발급
    pub fn issue_with_headers(
        &self,
        custom: Map<String, Value>,
        ttl: Option<i64>,
        headers: Map<String, Value>,
        now: i64,
    ) -> Result<String> {
        let claims = self.build_claims(custom, ttl, now)?;
        let header = Header::hs256().with_fields(headers);
        self.codec.encode(&header, &claims)
    }

    /// Claims 구성
    ///
    /// TTL은 유예 구간보다 크고 `MAX_TTL_SECONDS` 이하여야 합니다 (`iat <= nbf <= exp`).
    pub fn build_claims(
        &self,
        mut custom: Map<String, Value>,
        ttl: Option<i64>,
        now: i64,
    ) -> Result<Claims> {
        let ttl = ttl.unwrap_or(DEFAULT_TTL_SECONDS);
        let invalid = || Error::InvalidTtl {
            ttl,
            grace: NOT_BEFORE_GRACE_SECONDS,
        };
        if ttl <= NOT_BEFORE_GRACE_SECONDS || ttl > MAX_TTL_SECONDS {
            return Err(invalid());
        }
        let nbf = now.checked_add(NOT_BEFORE_GRACE_SECONDS).ok_or_else(invalid)?;
        let exp = now.checked_add(ttl).ok_or_else(invalid)?;

        let iss = take_string(&mut custom, "iss").unwrap_or_else(|| self.defaults.issuer.clone());
        let aud = take_string(&mut custom, "aud").unwrap_or_else(|| self.defaults.audience.clone());
        let sub = take_string(&mut custom, "sub").unwrap_or_else(|| self.defaults.subject.clone());
        let jti = take_string(&mut custom, "jti").unwrap_or_else(random_jti);
        custom.retain(|name, _| !is_reserved(name));

        Ok(Claims {
            iss: Some(iss),
            aud: Some(aud),
            sub: Some(sub),
            jti: Some(jti),
            iat: Some(now),
            nbf: Some(nbf),
            exp: Some(exp),
            custom,
        })
    }
}

fn take_string(custom: &mut Map<String, Value>, name: &str) -> Option<String> {
    match custom.remove(name) {
        Some(Value::String(value)) if !value.is_empty() => Some(value),
        _ => None,
    }
}

fn random_jti() -> String {
    let mut bytes = [0u8; JTI_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const T0: i64 = 1_700_000_000;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(
            ClaimsCodec::new("secret"),
            IssuerDefaults::for_app("APP", "http://localhost"),
        )
    }

    fn custom(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_standard_claims_are_computed() {
        let claims = issuer()
            .build_claims(custom(json!({"permission": 2})), None, T0)
            .unwrap();

        assert_eq!(claims.iat, Some(T0));
        assert_eq!(claims.nbf, Some(T0 + 60));
        assert_eq!(claims.exp, Some(T0 + 3600));
        assert_eq!(claims.iss.as_deref(), Some("http://localhost"));
        assert_eq!(claims.aud.as_deref(), Some("http://localhost"));
        assert_eq!(
            claims.sub.as_deref(),
            Some("aa16061e7815ca19a57c9db8f84c9601b739f570")
        );
        assert_eq!(claims.jti.as_ref().map(String::len), Some(16));
        assert_eq!(claims.permission(), 2);
    }

    #[test]
    fn test_caller_cannot_override_timestamps() {
        let claims = issuer()
            .build_claims(
                custom(json!({"exp": 1, "nbf": 0, "iat": 0, "permission": 1})),
                Some(600),
                T0,
            )
            .unwrap();

        assert_eq!(claims.exp, Some(T0 + 600));
        assert_eq!(claims.nbf, Some(T0 + 60));
        assert_eq!(claims.iat, Some(T0));
        assert_eq!(claims.custom.len(), 1);
    }

    #[test]
    fn test_caller_identity_claims_are_honoured() {
        let claims = issuer()
            .build_claims(custom(json!({"sub": "svc", "jti": "fixed", "aud": 42})), None, T0)
            .unwrap();

        assert_eq!(claims.sub.as_deref(), Some("svc"));
        assert_eq!(claims.jti.as_deref(), Some("fixed"));
        // 문자열이 아닌 값은 기본값으로 대체
        assert_eq!(claims.aud.as_deref(), Some("http://localhost"));
        assert!(claims.custom.is_empty());
    }

    #[test]
    fn test_jti_is_unique() {
        let issuer = issuer();
        let a = issuer.build_claims(Map::new(), None, T0).unwrap();
        let b = issuer.build_claims(Map::new(), None, T0).unwrap();

        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn test_ttl_must_exceed_grace_window() {
        for ttl in [-5, 0, 60] {
            assert!(matches!(
                issuer().build_claims(Map::new(), Some(ttl), T0),
                Err(Error::InvalidTtl { .. })
            ));
        }
        assert!(issuer().build_claims(Map::new(), Some(61), T0).is_ok());
    }

    #[test]
    fn test_ttl_overflow_is_rejected() {
        for ttl in [MAX_TTL_SECONDS + 1, i64::MAX] {
            assert!(matches!(
                issuer().build_claims(Map::new(), Some(ttl), T0),
                Err(Error::InvalidTtl { .. })
            ));
        }
        // 시계 끝에서도 덧셈이 넘치지 않음
        assert!(matches!(
            issuer().build_claims(Map::new(), Some(3600), i64::MAX - 100),
            Err(Error::InvalidTtl { .. })
        ));

        let claims = issuer()
            .build_claims(Map::new(), Some(MAX_TTL_SECONDS), T0)
            .unwrap();
        assert_eq!(claims.exp, Some(T0 + MAX_TTL_SECONDS));
        assert!(claims.nbf <= claims.exp);
    }

    #[test]
    fn test_issue_round_trip() {
        let codec = ClaimsCodec::new("secret");
        let token = issuer()
            .issue_with_headers(
                custom(json!({"sub": "svc", "permission": 2})),
                Some(3600),
                custom(json!({"kid": "primary", "alg": "none"})),
                T0,
            )
            .unwrap();

        assert!(codec.verify_signature(&token));
        let decoded = codec.decode(&token).unwrap();
        assert!(decoded.header.is_hs256());
        assert_eq!(decoded.header.extra.get("kid"), Some(&json!("primary")));
        assert_eq!(decoded.claims.sub.as_deref(), Some("svc"));
        assert_eq!(decoded.claims.get("permission"), Some(json!(2)));
        assert_eq!(decoded.claims.exp, Some(T0 + 3600));
    }
}
