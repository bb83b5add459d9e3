//! 토큰 Claims
//!
//! 서명된 토큰의 헤더와 페이로드 구조입니다.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha1::{Digest, Sha1};

/// 표준 claim 이름
///
/// 사용자 정의 claim으로 덮어쓸 수 없습니다.
pub const RESERVED_CLAIMS: [&str; 7] = ["iss", "aud", "sub", "jti", "iat", "nbf", "exp"];

/// 서명 알고리즘 (HMAC-SHA256)
pub const ALGORITHM: &str = "HS256";

/// 토큰 헤더
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Header {
    /// 토큰 타입
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,

    /// 서명 알고리즘
    pub alg: String,

    /// 추가 헤더 필드
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Header {
    /// HS256 기본 헤더
    pub fn hs256() -> Self {
        Self {
            typ: Some("JWT".to_string()),
            alg: ALGORITHM.to_string(),
            extra: Map::new(),
        }
    }

    /// 추가 헤더 필드 병합 (`alg`/`typ`는 무시)
    pub fn with_fields(mut self, fields: Map<String, Value>) -> Self {
        for (name, value) in fields {
            if name != "alg" && name != "typ" {
                self.extra.insert(name, value);
            }
        }
        self
    }

    /// HS256 여부
    pub fn is_hs256(&self) -> bool {
        self.alg == ALGORITHM
    }

    /// 전체 헤더를 Map으로 변환
    pub fn to_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

impl Default for Header {
    fn default() -> Self {
        Self::hs256()
    }
}

/// Claims 집합
///
/// 표준 claim은 필드로, 나머지는 `custom`에 담깁니다.
/// `custom`은 정렬된 Map이므로 삽입 순서와 무관하게 비교됩니다.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Claims {
    /// Issuer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Audience
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,

    /// Subject
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Token ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,

    /// 발급 시각 (Unix 초)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// 사용 가능 시작 시각 (Unix 초)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,

    /// 만료 시각 (Unix 초)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    /// 사용자 정의 claim (예: `permission`)
    #[serde(flatten)]
    pub custom: Map<String, Value>,
}

impl Claims {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subject 설정
    pub fn with_subject(mut self, sub: impl Into<String>) -> Self {
        self.sub = Some(sub.into());
        self
    }

    /// 사용자 정의 claim 추가 (표준 이름은 무시)
    pub fn with_custom(mut self, name: impl Into<String>, value: Value) -> Self {
        let name = name.into();
        if !is_reserved(&name) {
            self.custom.insert(name, value);
        }
        self
    }

    /// 이름으로 claim 조회 (표준 + 사용자 정의)
    pub fn get(&self, name: &str) -> Option<Value> {
        match name {
            "iss" => self.iss.clone().map(Value::String),
            "aud" => self.aud.clone().map(Value::String),
            "sub" => self.sub.clone().map(Value::String),
            "jti" => self.jti.clone().map(Value::String),
            "iat" => self.iat.map(Value::from),
            "nbf" => self.nbf.map(Value::from),
            "exp" => self.exp.map(Value::from),
            other => self.custom.get(other).cloned(),
        }
    }

    /// 전체 claim을 Map으로 변환
    pub fn to_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    /// `nbf <= now < exp` 여부
    ///
    /// `exp`가 없으면 유효하지 않습니다. `nbf`가 없으면 하한이 없습니다.
    pub fn is_currently_valid(&self, now: i64) -> bool {
        let Some(exp) = self.exp else {
            return false;
        };
        let not_before = self.nbf.map_or(true, |nbf| now >= nbf);
        not_before && now < exp
    }

    /// Subject 정확 일치 여부
    pub fn matches_subject(&self, expected: &str) -> bool {
        self.sub.as_deref() == Some(expected)
    }

    /// `permission` claim 값 (없거나 숫자가 아니면 0)
    pub fn permission(&self) -> i64 {
        match self.custom.get("permission") {
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f.floor() as i64))
                .unwrap_or(0),
            Some(Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .map(|f| f.floor() as i64)
                .unwrap_or(0),
            _ => 0,
        }
    }

    /// 남은 TTL (초)
    pub fn remaining_ttl(&self, now: i64) -> i64 {
        self.exp.map_or(0, |exp| (exp - now).max(0))
    }
}

/// 표준 claim 이름인지 확인
pub fn is_reserved(name: &str) -> bool {
    RESERVED_CLAIMS.contains(&name)
}

/// 앱 이름에서 기대 subject 생성 (`hex(sha1(app_name))`)
pub fn expected_subject(app_name: &str) -> String {
    hex::encode(Sha1::digest(app_name.as_bytes()))
}
