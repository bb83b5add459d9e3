//! CLI 명령어 구현

pub mod cipher;
pub mod envelope;
pub mod key;
pub mod token;
