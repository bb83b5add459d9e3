//! Key 명령어

use std::path::Path;

use anyhow::Context as _;
use serde_json::{json, Value};

use crate::config::CliConfig;

/// 파생된 공개키 (SubjectPublicKeyInfo PEM)
pub fn public(config: &CliConfig) -> anyhow::Result<String> {
    Ok(config.key_pair()?.derive_public_key()?)
}

/// 공개키 파일이 설정된 개인키와 대응하는지 확인
pub fn check(config: &CliConfig, public_key_file: &Path) -> anyhow::Result<Value> {
    let candidate = std::fs::read_to_string(public_key_file)
        .with_context(|| format!("failed to read {}", public_key_file.display()))?;
    check_candidate(config, &candidate)
}

fn check_candidate(config: &CliConfig, candidate: &str) -> anyhow::Result<Value> {
    let keys = config.key_pair()?;
    if keys.verify_key_pair(candidate) {
        Ok(json!({ "matches": true, "fingerprint": keys.fingerprint() }))
    } else {
        anyhow::bail!("public key does not match the configured private key")
    }
}
