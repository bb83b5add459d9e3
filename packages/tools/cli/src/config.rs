//! CLI 설정
//!
//! Gate와 같은 환경변수를 읽으며, 플래그가 환경변수보다 우선합니다.

use std::sync::Arc;

use anyhow::Context as _;
use clap::Args;
use lk_core::auth::{
    expected_subject, ClaimsCodec, ClaimsGate, IssuerDefaults, KeyEnvelope, TokenIssuer,
};
use lk_core::cipher::SymmetricCipher;
use lk_core::keys::KeyPair;

/// Gate가 운영 환경에서 거부하는 기본 서명 키
pub const INSECURE_DEFAULT_KEY: &str = "nokey";

/// CLI 설정
#[derive(Args, Clone)]
pub struct CliConfig {
    /// HS256 signing key
    #[arg(long, global = true, env = "JWT_KEY", default_value = INSECURE_DEFAULT_KEY, hide_env_values = true)]
    pub jwt_key: String,

    /// Application name (expected subject = sha1 hex)
    #[arg(long, global = true, env = "APP_NAME", default_value = "APP")]
    pub app_name: String,

    /// Application URL (default iss/aud)
    #[arg(long, global = true, env = "APP_URL", default_value = "http://localhost")]
    pub app_url: String,

    /// RSA private key (PEM or base64 PEM)
    #[arg(long, global = true, env = "RSA_PRIVATE_KEY", hide_env_values = true)]
    pub rsa_private_key: Option<String>,

    /// Passphrase for an encrypted PKCS#8 key
    #[arg(long, global = true, env = "RSA_PASSPHRASE", hide_env_values = true)]
    pub rsa_passphrase: Option<String>,

    /// AES passphrase
    #[arg(long, global = true, env = "AES_KEY", hide_env_values = true)]
    pub aes_key: Option<String>,

    /// AES cipher mode
    #[arg(long, global = true, env = "AES_CIPHER", default_value = "aes-256-cbc")]
    pub aes_cipher: String,
}

impl CliConfig {
    pub fn uses_default_key(&self) -> bool {
        self.jwt_key == INSECURE_DEFAULT_KEY
    }

    pub fn codec(&self) -> ClaimsCodec {
        if self.uses_default_key() {
            tracing::warn!(
                "using the default JWT_KEY '{}'; production gates refuse this key",
                INSECURE_DEFAULT_KEY
            );
        }
        ClaimsCodec::new(self.jwt_key.as_bytes())
    }

    pub fn issuer(&self) -> TokenIssuer {
        TokenIssuer::new(
            self.codec(),
            IssuerDefaults::for_app(&self.app_name, &self.app_url),
        )
    }

    pub fn claims_gate(&self) -> ClaimsGate {
        ClaimsGate::new(self.codec(), expected_subject(&self.app_name))
    }

    /// RSA 키 쌍 로드
    pub fn key_pair(&self) -> anyhow::Result<KeyPair> {
        let private_key = self
            .rsa_private_key
            .as_deref()
            .context("RSA private key not configured. Use --rsa-private-key or set RSA_PRIVATE_KEY")?;
        let keys = KeyPair::load(private_key, self.rsa_passphrase.as_deref())?;
        tracing::debug!(fingerprint = %keys.fingerprint(), "loaded RSA key pair");
        Ok(keys)
    }

    /// AES 암호기 (모드 지정 시 설정값 대신 사용)
    pub fn cipher(&self, mode: Option<&str>) -> anyhow::Result<SymmetricCipher> {
        let passphrase = self
            .aes_key
            .as_deref()
            .context("AES key not configured. Use --aes-key or set AES_KEY")?;
        Ok(SymmetricCipher::new(passphrase, mode.unwrap_or(&self.aes_cipher))?)
    }

    pub fn envelope(&self) -> anyhow::Result<KeyEnvelope> {
        Ok(KeyEnvelope::new(self.cipher(None)?, Arc::new(self.key_pair()?)))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn config() -> CliConfig {
        CliConfig {
            jwt_key: "test-key".to_string(),
            app_name: "APP".to_string(),
            app_url: "http://localhost".to_string(),
            rsa_private_key: None,
            rsa_passphrase: None,
            aes_key: Some("aes-secret".to_string()),
            aes_cipher: "aes-256-cbc".to_string(),
        }
    }

    #[test]
    fn test_missing_material_is_reported() {
        let mut config = config();
        config.aes_key = None;

        assert!(config.key_pair().is_err());
        assert!(config.cipher(None).is_err());
        assert!(config.envelope().is_err());
    }

    #[test]
    fn test_default_key_is_flagged() {
        let mut config = config();
        assert!(!config.uses_default_key());

        config.jwt_key = INSECURE_DEFAULT_KEY.to_string();
        assert!(config.uses_default_key());
        // 경고만 남기고 서명은 계속됨
        assert!(config.issuer().issue(Default::default(), None).is_ok());
    }

    #[test]
    fn test_cipher_mode_override() {
        let config = config();

        assert_eq!(config.cipher(None).unwrap().key().as_bytes().len(), 32);
        assert_eq!(config.cipher(Some("aes-128-cbc")).unwrap().key().as_bytes().len(), 16);
        assert!(config.cipher(Some("rc4")).is_err());
    }
}
