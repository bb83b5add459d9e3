//! 인증 게이트 파이프라인
//!
//! ```text
//! NoToken → Extracted → Decoded → SignatureVerified → TemporallyValid
//!         → SubjectValid → PermissionChecked → Admitted
//! ```
//!
//! 각 단계는 앞으로만 진행하며, 실패하면 그 즉시 `Rejected`로 끝납니다.
//! 검증 중 발생한 예기치 않은 에러는 거절로 변환됩니다 (fail-closed).

use super::claims::Claims;
use super::codec::ClaimsCodec;
use super::envelope::KeyEnvelope;
use super::token::BearerToken;
use crate::error::{Error, Result};

/// 게이트 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum GateState {
    NoToken,
    Extracted,
    Decoded,
    SignatureVerified,
    TemporallyValid,
    SubjectValid,
    PermissionChecked,
    Admitted,
}

impl GateState {
    pub fn as_str(&self) -> &'static str {
        match self {
            GateState::NoToken => "no_token",
            GateState::Extracted => "extracted",
            GateState::Decoded => "decoded",
            GateState::SignatureVerified => "signature_verified",
            GateState::TemporallyValid => "temporally_valid",
            GateState::SubjectValid => "subject_valid",
            GateState::PermissionChecked => "permission_checked",
            GateState::Admitted => "admitted",
        }
    }
}

/// 거절 결과
///
/// `state`는 실패 직전에 도달한 마지막 상태입니다.
#[derive(Debug)]
pub struct Rejection {
    pub state: GateState,
    pub error: Error,
}

impl Rejection {
    pub fn status_code(&self) -> u16 {
        self.error.status_code()
    }

    pub fn into_error(self) -> Error {
        self.error
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rejected at {}: {}", self.state.as_str(), self.error)
    }
}

impl std::error::Error for Rejection {}

/// 게이트를 통과한 주체
#[derive(Debug, Clone, PartialEq)]
pub enum Principal {
    /// 서명된 claims 토큰
    Claims(Claims),

    /// 서버 키 쌍과 대응하는 공개키 봉투 보유자
    KeyHolder { fingerprint: String },
}

impl Principal {
    pub fn claims(&self) -> Option<&Claims> {
        match self {
            Principal::Claims(claims) => Some(claims),
            Principal::KeyHolder { .. } => None,
        }
    }
}

/// 단계 진행 기록기
struct Pipeline {
    gate: &'static str,
    state: GateState,
}

impl Pipeline {
    fn start(gate: &'static str) -> Self {
        Self {
            gate,
            state: GateState::NoToken,
        }
    }

    /// 단계 결과를 반영해 다음 상태로 진행
    fn advance<T>(&mut self, next: GateState, result: Result<T>) -> std::result::Result<T, Rejection> {
        match result {
            Ok(value) => {
                self.state = next;
                tracing::debug!(gate = self.gate, state = next.as_str(), "gate transition");
                Ok(value)
            }
            Err(error) => {
                let error = error.fail_closed();
                tracing::debug!(
                    gate = self.gate,
                    state = self.state.as_str(),
                    code = error.code(),
                    "gate rejected"
                );
                Err(Rejection {
                    state: self.state,
                    error,
                })
            }
        }
    }

    fn check(&mut self, next: GateState, passed: bool, error: Error) -> std::result::Result<(), Rejection> {
        self.advance(next, if passed { Ok(()) } else { Err(error) })
    }
}

/// HS256 claims 게이트
#[derive(Debug, Clone)]
pub struct ClaimsGate {
    codec: ClaimsCodec,
    expected_subject: String,
}

impl ClaimsGate {
    pub fn new(codec: ClaimsCodec, expected_subject: impl Into<String>) -> Self {
        Self {
            codec,
            expected_subject: expected_subject.into(),
        }
    }

    pub fn expected_subject(&self) -> &str {
        &self.expected_subject
    }

    /// 토큰 검증 후 claims 반환
    pub fn admit(
        &self,
        token: Option<&BearerToken>,
        now: i64,
        required_permission: i64,
    ) -> std::result::Result<Claims, Rejection> {
        let mut pipeline = Pipeline::start("claims");

        let token = pipeline.advance(GateState::Extracted, token.ok_or(Error::MissingToken))?;
        let decoded = pipeline.advance(GateState::Decoded, self.codec.decode(token.as_str()))?;

        pipeline.check(
            GateState::SignatureVerified,
            decoded.header.is_hs256() && self.codec.verify_signature(token.as_str()),
            Error::Signature,
        )?;

        let claims = decoded.claims;
        pipeline.check(
            GateState::TemporallyValid,
            claims.is_currently_valid(now),
            Error::TokenExpired,
        )?;
        pipeline.check(
            GateState::SubjectValid,
            claims.matches_subject(&self.expected_subject),
            Error::SubjectMismatch,
        )?;

        let actual = claims.permission();
        pipeline.check(
            GateState::PermissionChecked,
            actual >= required_permission,
            Error::PermissionDenied {
                required: required_permission,
                actual,
            },
        )?;

        pipeline.advance(GateState::Admitted, Ok(claims))
    }
}

/// 공개키 봉투 게이트
///
/// 봉투에는 시간/권한 정보가 없으므로 해당 단계는 그대로 통과합니다.
#[derive(Debug, Clone)]
pub struct EnvelopeGate {
    envelope: KeyEnvelope,
}

impl EnvelopeGate {
    pub fn new(envelope: KeyEnvelope) -> Self {
        Self { envelope }
    }

    pub fn envelope(&self) -> &KeyEnvelope {
        &self.envelope
    }

    /// 봉투 검증 후 키 지문 반환
    pub fn admit(&self, token: Option<&BearerToken>) -> std::result::Result<Principal, Rejection> {
        let mut pipeline = Pipeline::start("envelope");

        let token = pipeline.advance(GateState::Extracted, token.ok_or(Error::MissingToken))?;
        let candidate = pipeline.advance(GateState::Decoded, self.envelope.open(token.as_str()))?;
        pipeline.advance(GateState::SignatureVerified, Ok(()))?;
        pipeline.advance(GateState::TemporallyValid, Ok(()))?;

        pipeline.check(
            GateState::SubjectValid,
            self.envelope.keys().verify_key_pair(&candidate),
            Error::KeyMismatch,
        )?;
        pipeline.advance(GateState::PermissionChecked, Ok(()))?;

        pipeline.advance(
            GateState::Admitted,
            Ok(Principal::KeyHolder {
                fingerprint: self.envelope.keys().fingerprint(),
            }),
        )
    }
}
