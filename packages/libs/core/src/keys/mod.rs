//! 비대칭 키 자료 (KeyMaterial)
//!
//! RSA 개인키를 로드/정규화하고, 공개키를 파생하며,
//! 서명/검증 왕복으로 키 쌍 대응 여부를 확인합니다.
//!
//! # 모듈 구조
//!
//! - `pem`: PEM 프레이밍 복구 (헤더 제거, 64컬럼 재정렬, 레이블 재부착)
//! - `pair`: 로드된 키 쌍

mod pair;
pub mod pem;

pub use pair::KeyPair;
pub use pem::PemLabel;
