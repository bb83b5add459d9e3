//! Envelope 명령어

use serde_json::{json, Value};

use crate::config::CliConfig;

/// 서버 공개키 봉투 발급
pub fn seal(config: &CliConfig) -> anyhow::Result<String> {
    Ok(config.envelope()?.seal()?)
}

/// 봉투를 열고 서버 키와 대응하는지 확인
pub fn open(config: &CliConfig, token: &str) -> anyhow::Result<Value> {
    let envelope = config.envelope()?;
    let public_key = envelope.open(token)?;
    let fingerprint = envelope.verify(token)?;

    Ok(json!({
        "publicKey": public_key,
        "fingerprint": fingerprint,
    }))
}
