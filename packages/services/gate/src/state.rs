//! Gate 앱 상태

use std::sync::Arc;

use anyhow::Context;
use lk_core::auth::{
    expected_subject, ClaimsCodec, ClaimsGate, EnvelopeGate, IssuerDefaults, KeyEnvelope,
    TokenIssuer,
};
use lk_core::cipher::SymmetricCipher;
use lk_core::keys::KeyPair;

use crate::config::Config;

/// 앱 상태
///
/// 시작 시 한 번 구성되며 이후에는 읽기 전용입니다.
pub struct AppState {
    /// 설정
    pub config: Config,

    /// claims 토큰 발급기
    pub issuer: TokenIssuer,

    /// claims 토큰 게이트
    pub claims_gate: ClaimsGate,

    /// 봉투 게이트 (RSA 설정 시에만)
    pub envelope_gate: Option<EnvelopeGate>,
}

impl AppState {
    /// 새 상태 생성
    ///
    /// 키 로드에 실패하면 서버를 시작하지 않습니다.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let codec = ClaimsCodec::new(config.jwt_key.as_bytes());
        let subject = expected_subject(&config.app_name);

        let issuer = TokenIssuer::new(
            codec.clone(),
            IssuerDefaults::for_app(&config.app_name, &config.app_url),
        );
        let claims_gate = ClaimsGate::new(codec, subject);

        let envelope_gate = match &config.rsa_private_key {
            Some(private_key) => Some(load_envelope_gate(config, private_key)?),
            None => None,
        };

        Ok(Self {
            config: config.clone(),
            issuer,
            claims_gate,
            envelope_gate,
        })
    }
}

fn load_envelope_gate(config: &Config, private_key: &str) -> anyhow::Result<EnvelopeGate> {
    let keys = KeyPair::load(private_key, config.rsa_passphrase.as_deref())
        .context("failed to load RSA_PRIVATE_KEY")?;
    let passphrase = config
        .aes_key
        .as_deref()
        .context("AES_KEY is required when RSA_PRIVATE_KEY is set")?;
    let cipher = SymmetricCipher::new(passphrase, &config.aes_cipher).context("invalid AES_CIPHER")?;

    tracing::info!(fingerprint = %keys.fingerprint(), "loaded RSA key pair");
    Ok(EnvelopeGate::new(KeyEnvelope::new(cipher, Arc::new(keys))))
}
