//! Gate 설정

use std::env;

use anyhow::{bail, Context};
use lk_core::auth::{MAX_TTL_SECONDS, NOT_BEFORE_GRACE_SECONDS};

/// 운영 환경에서 거부되는 기본 서명 키
pub const INSECURE_DEFAULT_KEY: &str = "nokey";

/// Gate 설정
///
/// 프로세스 시작 시 한 번 생성되어 `AppState`로 주입됩니다.
#[derive(Clone)]
pub struct Config {
    /// 서버 포트
    pub port: u16,

    /// 실행 환경 (`local`, `production`, ...)
    pub app_env: String,

    /// 앱 이름 (기대 subject 파생)
    pub app_name: String,

    /// 앱 URL (기본 iss/aud)
    pub app_url: String,

    /// HS256 서명 키
    pub jwt_key: String,

    /// 기본 토큰 TTL (초)
    pub token_ttl: i64,

    /// 보호 라우트의 최소 permission
    pub permission_threshold: i64,

    /// 발급 엔드포인트용 운영자 토큰 (없으면 비활성화)
    pub operator_token: Option<String>,

    /// RSA 개인키 (base64 PEM 또는 PEM, 없으면 봉투 라우트 비활성화)
    pub rsa_private_key: Option<String>,

    /// 암호화된 PKCS#8 키의 패스프레이즈
    pub rsa_passphrase: Option<String>,

    /// 봉투 암호화 패스프레이즈
    pub aes_key: Option<String>,

    /// 봉투 암호 모드
    pub aes_cipher: String,
}

impl Config {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// 조회 함수로부터 설정 로드
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let config = Self {
            port: var("LK_PORT")
                .unwrap_or_else(|| "3000".to_string())
                .parse()
                .context("LK_PORT must be a port number")?,

            app_env: var("APP_ENV").unwrap_or_else(|| "local".to_string()),

            app_name: var("APP_NAME").unwrap_or_else(|| "APP".to_string()),

            app_url: var("APP_URL").unwrap_or_else(|| "http://localhost".to_string()),

            jwt_key: var("JWT_KEY").unwrap_or_else(|| INSECURE_DEFAULT_KEY.to_string()),

            token_ttl: var("LK_TOKEN_TTL")
                .unwrap_or_else(|| "3600".to_string())
                .parse()
                .context("LK_TOKEN_TTL must be an integer")?,

            permission_threshold: var("LK_PERMISSION_THRESHOLD")
                .unwrap_or_else(|| "2".to_string())
                .parse()
                .context("LK_PERMISSION_THRESHOLD must be an integer")?,

            operator_token: var("LK_OPERATOR_TOKEN"),
            rsa_private_key: var("RSA_PRIVATE_KEY"),
            rsa_passphrase: var("RSA_PASSPHRASE"),
            aes_key: var("AES_KEY"),
            aes_cipher: var("AES_CIPHER").unwrap_or_else(|| "aes-256-cbc".to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.is_production() && self.jwt_key == INSECURE_DEFAULT_KEY {
            bail!("JWT_KEY must be set to a real secret when APP_ENV=production");
        }
        if self.token_ttl <= NOT_BEFORE_GRACE_SECONDS || self.token_ttl > MAX_TTL_SECONDS {
            bail!(
                "LK_TOKEN_TTL must exceed the {}s not-before grace window and be at most {}s",
                NOT_BEFORE_GRACE_SECONDS,
                MAX_TTL_SECONDS
            );
        }
        if self.rsa_private_key.is_some() && self.aes_key.is_none() {
            bail!("AES_KEY is required when RSA_PRIVATE_KEY is set");
        }
        Ok(())
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("app_env", &self.app_env)
            .field("app_name", &self.app_name)
            .field("app_url", &self.app_url)
            .field("token_ttl", &self.token_ttl)
            .field("permission_threshold", &self.permission_threshold)
            .field("operator_issuance", &self.operator_token.is_some())
            .field("envelope", &self.rsa_private_key.is_some())
            .field("aes_cipher", &self.aes_cipher)
            .finish_non_exhaustive()
    }
}
