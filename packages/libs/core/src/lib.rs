//! lk-core: Latchkey 공통 핵심 라이브러리
//!
//! 이 크레이트는 Gate 서비스와 CLI가 공유하는 키/암호/토큰 로직을 제공합니다.
//!
//! # 모듈 구조
//!
//! - `keys`: RSA 개인키 로드, PEM 복구, 키 쌍 검증
//! - `cipher`: AES-CBC 암호화 (패스프레이즈 기반 키 파생)
//! - `auth`: claims 토큰 발급/검증, 공개키 봉투, 인증 게이트
//! - `error`: 공통 에러 타입

pub mod auth;
pub mod cipher;
pub mod error;
pub mod keys;

pub use error::{Error, Result};
