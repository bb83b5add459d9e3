//! RSA 키 쌍
//!
//! 프로세스 시작 시 한 번 로드되고 이후에는 읽기 전용입니다.
//! 키 자료는 디스크에 기록하지 않습니다.

use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs1v15::{SigningKey, VerifyingKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePublicKey, LineEnding};
use rsa::signature::{Signer, Verifier};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};

use super::pem::{self, PemLabel};
use crate::error::{Error, Result};

/// 키 쌍 검증에 사용하는 고정 페이로드
const ROUND_TRIP_PAYLOAD: &[u8] = b"test-data";

/// 개인키 레이블 시도 순서 (감지된 레이블이 항상 먼저)
const PRIVATE_LABELS: [PemLabel; 3] = [
    PemLabel::EncryptedPrivateKey,
    PemLabel::PrivateKey,
    PemLabel::RsaPrivateKey,
];

/// RSA 키 쌍
///
/// 공개키는 개인키로부터 파생되어 캐시되며, 생성 시점에
/// 서명/검증 왕복으로 대응 관계를 확인합니다.
pub struct KeyPair {
    private_key: RsaPrivateKey,
    public_key: RsaPublicKey,
    public_key_pem: String,
}

impl KeyPair {
    /// 개인키 로드
    ///
    /// 입력은 PEM, 헤더가 빠진 base64 본문, 또는 base64로 감싼 PEM일 수 있습니다.
    /// 각 후보 레이블로 PEM을 재구성해 파싱하며, 모두 실패하면 `KeyFormat` 에러입니다.
    pub fn load(input: &str, passphrase: Option<&str>) -> Result<Self> {
        let text = pem::unwrap_base64_pem(input);
        if text.is_empty() {
            return Err(Error::key_format("private key is empty"));
        }

        let detected = pem::detect_label(&text);
        if let Some(label) = detected {
            if !label.is_private() {
                return Err(Error::key_format(format!(
                    "expected a private key, found '{}'",
                    label.as_str()
                )));
            }
        }

        let candidates = detected
            .into_iter()
            .chain(PRIVATE_LABELS.into_iter().filter(|l| Some(*l) != detected));

        for label in candidates {
            let framed = pem::reframe(&text, label);
            if let Some(key) = parse_private_key(&framed, label, passphrase) {
                return Self::from_private_key(key);
            }
        }

        Err(Error::key_format(
            "reconstructed PEM does not parse as an RSA private key",
        ))
    }

    /// 이미 파싱된 개인키로 생성
    pub fn from_private_key(private_key: RsaPrivateKey) -> Result<Self> {
        let public_key = RsaPublicKey::from(&private_key);
        let public_key_pem = public_key
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| Error::key_format(format!("public key export failed: {}", e)))?;

        let pair = Self {
            private_key,
            public_key,
            public_key_pem,
        };

        if !pair.round_trip(&pair.public_key) {
            return Err(Error::key_format(
                "derived public key failed the sign/verify round trip",
            ));
        }

        Ok(pair)
    }

    /// 캐시된 공개키 (SubjectPublicKeyInfo PEM)
    pub fn public_key_pem(&self) -> &str {
        &self.public_key_pem
    }

    /// 개인키로부터 공개키를 다시 파생 (SubjectPublicKeyInfo PEM)
    pub fn derive_public_key(&self) -> Result<String> {
        RsaPublicKey::from(&self.private_key)
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| Error::key_format(format!("public key export failed: {}", e)))
    }

    /// 공개키 SHA-256 지문 (SPKI DER 기준, hex)
    ///
    /// 로그와 응답에서 키 자체 대신 사용합니다.
    pub fn fingerprint(&self) -> String {
        match self.public_key.to_public_key_der() {
            Ok(der) => hex::encode(Sha256::digest(der.as_bytes())),
            Err(_) => String::new(),
        }
    }

    /// 외부에서 받은 공개키가 이 개인키와 대응하는지 확인
    ///
    /// 후보 키는 개인키와 같은 방식으로 PEM을 복구한 뒤, 고정 페이로드를
    /// 개인키로 서명하고 후보 공개키로 검증합니다.
    pub fn verify_key_pair(&self, candidate: &str) -> bool {
        match parse_public_key(candidate) {
            Some(public_key) => self.round_trip(&public_key),
            None => false,
        }
    }

    fn round_trip(&self, public_key: &RsaPublicKey) -> bool {
        let signing_key = SigningKey::<Sha256>::new(self.private_key.clone());
        let signature = match signing_key.try_sign(ROUND_TRIP_PAYLOAD) {
            Ok(signature) => signature,
            Err(_) => return false,
        };

        VerifyingKey::<Sha256>::new(public_key.clone())
            .verify(ROUND_TRIP_PAYLOAD, &signature)
            .is_ok()
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("fingerprint", &self.fingerprint())
            .finish_non_exhaustive()
    }
}

fn parse_private_key(
    framed: &str,
    label: PemLabel,
    passphrase: Option<&str>,
) -> Option<RsaPrivateKey> {
    match label {
        PemLabel::PrivateKey => RsaPrivateKey::from_pkcs8_pem(framed).ok(),
        PemLabel::RsaPrivateKey => RsaPrivateKey::from_pkcs1_pem(framed).ok(),
        PemLabel::EncryptedPrivateKey => {
            let passphrase = passphrase?;
            RsaPrivateKey::from_pkcs8_encrypted_pem(framed, passphrase).ok()
        }
        PemLabel::PublicKey | PemLabel::RsaPublicKey => None,
    }
}

fn parse_public_key(candidate: &str) -> Option<RsaPublicKey> {
    let text = pem::unwrap_base64_pem(candidate);
    match pem::detect_label(&text) {
        Some(PemLabel::RsaPublicKey) => {
            RsaPublicKey::from_pkcs1_pem(&pem::reframe(&text, PemLabel::RsaPublicKey)).ok()
        }
        Some(label) if label.is_private() => None,
        _ => RsaPublicKey::from_public_key_pem(&pem::reframe(&text, PemLabel::PublicKey)).ok(),
    }
}
