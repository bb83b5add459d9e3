//! PEM 프레이밍 복구
//!
//! 환경변수로 전달된 키는 헤더가 빠져 있거나, 줄바꿈이 사라졌거나,
//! 통째로 base64 인코딩되어 있는 경우가 많습니다. 여기서는 기존 armor를
//! 제거하고 본문을 64컬럼으로 다시 감싼 뒤 올바른 헤더/푸터를 붙입니다.

use base64::{engine::general_purpose, Engine as _};

const PEM_LINE_WIDTH: usize = 64;
const ARMOR: &str = "-----";

/// PEM 레이블
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PemLabel {
    /// PKCS#8 비암호화 개인키
    PrivateKey,

    /// PKCS#1 RSA 개인키
    RsaPrivateKey,

    /// PKCS#8 암호화 개인키 (PBES2)
    EncryptedPrivateKey,

    /// SubjectPublicKeyInfo 공개키
    PublicKey,

    /// PKCS#1 RSA 공개키
    RsaPublicKey,
}

impl PemLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PemLabel::PrivateKey => "PRIVATE KEY",
            PemLabel::RsaPrivateKey => "RSA PRIVATE KEY",
            PemLabel::EncryptedPrivateKey => "ENCRYPTED PRIVATE KEY",
            PemLabel::PublicKey => "PUBLIC KEY",
            PemLabel::RsaPublicKey => "RSA PUBLIC KEY",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim() {
            "PRIVATE KEY" => Some(PemLabel::PrivateKey),
            "RSA PRIVATE KEY" => Some(PemLabel::RsaPrivateKey),
            "ENCRYPTED PRIVATE KEY" => Some(PemLabel::EncryptedPrivateKey),
            "PUBLIC KEY" => Some(PemLabel::PublicKey),
            "RSA PUBLIC KEY" => Some(PemLabel::RsaPublicKey),
            _ => None,
        }
    }

    /// 개인키 레이블인지 여부
    pub fn is_private(&self) -> bool {
        matches!(
            self,
            PemLabel::PrivateKey | PemLabel::RsaPrivateKey | PemLabel::EncryptedPrivateKey
        )
    }
}

/// 입력에서 `-----BEGIN <label>-----` 레이블 추출
pub fn detect_label(input: &str) -> Option<PemLabel> {
    let start = input.find("-----BEGIN ")? + "-----BEGIN ".len();
    let rest = &input[start..];
    let end = rest.find(ARMOR)?;
    PemLabel::from_str(&rest[..end])
}

/// 모든 `-----...-----` 마커와 공백 제거 후 본문만 반환
pub fn strip_armor(input: &str) -> String {
    let mut body = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(open) = rest.find(ARMOR) {
        body.push_str(&rest[..open]);
        let after_open = &rest[open + ARMOR.len()..];
        match after_open.find(ARMOR) {
            Some(close) => rest = &after_open[close + ARMOR.len()..],
            None => {
                rest = "";
                break;
            }
        }
    }
    body.push_str(rest);

    body.chars().filter(|c| !c.is_whitespace()).collect()
}

/// 주어진 레이블로 PEM 재구성
///
/// 기존 헤더/푸터를 제거하고, 본문을 64컬럼으로 줄바꿈한 뒤 헤더/푸터를 다시 붙입니다.
pub fn reframe(input: &str, label: PemLabel) -> String {
    let body: Vec<char> = strip_armor(input).chars().collect();
    let label = label.as_str();

    let mut pem = format!("-----BEGIN {}-----\n", label);
    for line in body.chunks(PEM_LINE_WIDTH) {
        pem.extend(line.iter());
        pem.push('\n');
    }
    pem.push_str(&format!("-----END {}-----\n", label));
    pem
}

/// base64로 한 번 더 감싸진 PEM 풀기
///
/// `RSA_PRIVATE_KEY`처럼 PEM 전체가 base64로 인코딩되어 전달되는 경우를 처리합니다.
/// 풀어낸 결과가 PEM 텍스트가 아니면 입력을 그대로 반환합니다.
pub fn unwrap_base64_pem(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.contains(ARMOR) {
        return trimmed.to_string();
    }

    let compact: String = trimmed.chars().filter(|c| !c.is_whitespace()).collect();
    if let Ok(bytes) = general_purpose::STANDARD.decode(&compact) {
        if let Ok(text) = String::from_utf8(bytes) {
            if text.contains("-----BEGIN ") {
                return text.trim().to_string();
            }
        }
    }

    trimmed.to_string()
}
