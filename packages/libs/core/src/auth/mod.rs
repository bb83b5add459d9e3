//! 인증 관련 타입 및 로직
//!
//! # 개요
//!
//! Latchkey는 두 종류의 Bearer 토큰을 다룹니다:
//!
//! - **Claims Token**: HS256으로 서명된 claims (`header.payload.signature`)
//! - **Key Envelope**: 서버 공개키를 AES-CBC로 봉인한 base64 문자열
//!
//! # 흐름
//!
//! `TokenIssuer`가 claims 토큰을 발급하고, 요청마다 `BearerToken`으로 추출한 뒤
//! `ClaimsGate`/`EnvelopeGate`가 검증합니다. 서버는 토큰별 상태를 저장하지 않습니다.

mod claims;
mod codec;
mod envelope;
mod gate;
mod issuer;
mod token;

pub use claims::{expected_subject, is_reserved, Claims, Header, ALGORITHM, RESERVED_CLAIMS};
pub use codec::{ClaimsCodec, DecodedToken};
pub use envelope::KeyEnvelope;
pub use gate::{ClaimsGate, EnvelopeGate, GateState, Principal, Rejection};
pub use issuer::{
    IssuerDefaults, TokenIssuer, DEFAULT_TTL_SECONDS, MAX_TTL_SECONDS, NOT_BEFORE_GRACE_SECONDS,
};
pub use token::{cookie_value, BearerToken, TokenSource};
