//! Cipher 명령어

use anyhow::Context as _;

use crate::config::CliConfig;

/// 문자열 암호화
///
/// `raw`이면 base64 대신 `iv || ciphertext`를 hex로 출력합니다.
pub fn encrypt(config: &CliConfig, text: &str, mode: Option<&str>, raw: bool) -> anyhow::Result<String> {
    let cipher = config.cipher(mode)?;
    if raw {
        let blob = cipher.with_base64(false).encrypt(text.as_bytes())?;
        Ok(hex::encode(blob))
    } else {
        Ok(cipher.encrypt_string(text)?)
    }
}

/// `encrypt`의 역연산
pub fn decrypt(config: &CliConfig, blob: &str, mode: Option<&str>, raw: bool) -> anyhow::Result<String> {
    let cipher = config.cipher(mode)?;
    if raw {
        let bytes = hex::decode(blob.trim()).context("raw blob must be hex")?;
        let plaintext = cipher.with_base64(false).decrypt(&bytes)?;
        String::from_utf8(plaintext).context("plaintext is not UTF-8")
    } else {
        Ok(cipher.decrypt_string(blob)?)
    }
}
