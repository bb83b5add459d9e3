//! HS256 토큰 코덱
//!
//! `base64url(header).base64url(claims).base64url(signature)` 형식을 다룹니다.
//! 서명 검증은 HMAC의 상수 시간 비교를 사용합니다.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::de::DeserializeOwned;
use sha2::Sha256;
use zeroize::Zeroizing;

use super::claims::{Claims, Header};
use crate::error::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

/// 디코딩된 토큰 (서명 미검증)
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedToken {
    pub header: Header,
    pub claims: Claims,
}

/// Claims 코덱
///
/// 서명 키는 프로세스 시작 시 한 번 주입됩니다.
#[derive(Clone)]
pub struct ClaimsCodec {
    key: Zeroizing<Vec<u8>>,
}

impl ClaimsCodec {
    pub fn new(signing_key: impl AsRef<[u8]>) -> Self {
        Self {
            key: Zeroizing::new(signing_key.as_ref().to_vec()),
        }
    }

    /// 헤더와 claims를 서명된 토큰 문자열로 인코딩
    pub fn encode(&self, header: &Header, claims: &Claims) -> Result<String> {
        let header = URL_SAFE_NO_PAD.encode(serde_json::to_vec(header)?);
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims)?);
        let signing_input = format!("{}.{}", header, payload);

        let signature = self.mac()?.chain_update(signing_input.as_bytes()).finalize();
        Ok(format!(
            "{}.{}",
            signing_input,
            URL_SAFE_NO_PAD.encode(signature.into_bytes())
        ))
    }

    /// 토큰 구조 디코딩
    ///
    /// 정확히 세 개의 세그먼트여야 하며, 각 세그먼트는 base64url이어야 합니다.
    /// 서명은 검증하지 않습니다.
    pub fn decode(&self, token: &str) -> Result<DecodedToken> {
        let (header, payload, _) = split(token)?;
        Ok(DecodedToken {
            header: decode_json(header, "header")?,
            claims: decode_json(payload, "payload")?,
        })
    }

    /// 서명 재계산 후 상수 시간 비교
    pub fn verify_signature(&self, token: &str) -> bool {
        let Ok((header, payload, signature)) = split(token) else {
            return false;
        };
        let Ok(signature) = URL_SAFE_NO_PAD.decode(signature) else {
            return false;
        };
        let Ok(mac) = self.mac() else {
            return false;
        };

        mac.chain_update(header.as_bytes())
            .chain_update(b".")
            .chain_update(payload.as_bytes())
            .verify_slice(&signature)
            .is_ok()
    }

    fn mac(&self) -> Result<HmacSha256> {
        HmacSha256::new_from_slice(&self.key).map_err(|_| Error::config("invalid HMAC key length"))
    }
}

impl std::fmt::Debug for ClaimsCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaimsCodec").finish_non_exhaustive()
    }
}

fn split(token: &str) -> Result<(&str, &str, &str)> {
    let mut segments = token.trim().split('.');
    match (segments.next(), segments.next(), segments.next(), segments.next()) {
        (Some(header), Some(payload), Some(signature), None)
            if !header.is_empty() && !payload.is_empty() && !signature.is_empty() =>
        {
            if URL_SAFE_NO_PAD.decode(signature).is_err() {
                return Err(Error::malformed("signature segment is not base64url"));
            }
            Ok((header, payload, signature))
        }
        _ => Err(Error::malformed("expected three dot-separated segments")),
    }
}

fn decode_json<T: DeserializeOwned>(segment: &str, name: &str) -> Result<T> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| Error::malformed(format!("{} segment is not base64url", name)))?;
    serde_json::from_slice(&bytes)
        .map_err(|_| Error::malformed(format!("{} segment is not a JSON object", name)))
}
