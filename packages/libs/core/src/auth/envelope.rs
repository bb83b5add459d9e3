//! 공개키 봉투 토큰
//!
//! 서버 공개키(PEM)를 AES-CBC로 암호화한 뒤 base64로 감싼 토큰입니다.
//! Claims를 싣지 않으며, 복호화 결과가 서버 키 쌍과 대응하는지만 확인합니다.

use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};

use crate::cipher::{SymmetricCipher, IV_LEN};
use crate::error::{Error, Result};
use crate::keys::KeyPair;

/// 봉투 토큰 처리기
#[derive(Debug, Clone)]
pub struct KeyEnvelope {
    cipher: SymmetricCipher,
    keys: Arc<KeyPair>,
}

impl KeyEnvelope {
    pub fn new(cipher: SymmetricCipher, keys: Arc<KeyPair>) -> Self {
        Self { cipher, keys }
    }

    pub fn keys(&self) -> &KeyPair {
        &self.keys
    }

    /// 서버 공개키를 봉인한 토큰 발급
    pub fn seal(&self) -> Result<String> {
        self.cipher.encrypt_string(self.keys.public_key_pem())
    }

    /// 봉투를 열어 안에 든 공개키 PEM 반환
    pub fn open(&self, token: &str) -> Result<String> {
        let raw = general_purpose::STANDARD
            .decode(token.trim())
            .map_err(|_| Error::MalformedEnvelope {
                reason: "not base64".to_string(),
            })?;
        if raw.len() < IV_LEN * 2 {
            return Err(Error::MalformedEnvelope {
                reason: "shorter than iv and one block".to_string(),
            });
        }

        let plaintext = self.cipher.open(&raw)?;
        String::from_utf8(plaintext).map_err(|_| Error::Decryption)
    }

    /// 봉투 검증 후 서버 키 지문 반환
    pub fn verify(&self, token: &str) -> Result<String> {
        let candidate = self.open(token)?;
        if self.keys.verify_key_pair(&candidate) {
            Ok(self.keys.fingerprint())
        } else {
            Err(Error::KeyMismatch)
        }
    }
}
