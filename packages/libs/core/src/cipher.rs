//! AES-CBC 대칭 암호화 (SymmetricCipher)
//!
//! 패스프레이즈를 SHA-256으로 해시해 모드별 키 길이로 자르고,
//! 호출마다 새 IV를 생성합니다. 전송 형식은 `iv || ciphertext`이며
//! 선택적으로 전체를 base64로 감쌉니다.

use std::str::FromStr;

use base64::{engine::general_purpose, Engine as _};
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::RngCore;
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::{Error, Result};

/// AES 블록 크기 = IV 길이
pub const IV_LEN: usize = 16;

/// CBC 모드
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CipherMode {
    Aes128Cbc,
    Aes192Cbc,
    #[default]
    Aes256Cbc,
}

impl CipherMode {
    /// 키 길이 (바이트)
    pub fn key_len(&self) -> usize {
        match self {
            CipherMode::Aes128Cbc => 16,
            CipherMode::Aes192Cbc => 24,
            CipherMode::Aes256Cbc => 32,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CipherMode::Aes128Cbc => "aes-128-cbc",
            CipherMode::Aes192Cbc => "aes-192-cbc",
            CipherMode::Aes256Cbc => "aes-256-cbc",
        }
    }
}

impl FromStr for CipherMode {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "aes-128-cbc" => Ok(CipherMode::Aes128Cbc),
            "aes-192-cbc" => Ok(CipherMode::Aes192Cbc),
            "aes-256-cbc" => Ok(CipherMode::Aes256Cbc),
            other => Err(Error::config(format!("invalid cipher method: {}", other))),
        }
    }
}

impl std::fmt::Display for CipherMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 대칭키
///
/// 같은 패스프레이즈는 항상 같은 키를 만듭니다.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey {
    bytes: Vec<u8>,
}

impl SymmetricKey {
    /// 패스프레이즈에서 모드에 맞는 키 파생
    pub fn derive(passphrase: &str, mode: CipherMode) -> Self {
        Self::from_digest(&hash_passphrase(passphrase), mode)
    }

    fn from_digest(digest: &[u8; 32], mode: CipherMode) -> Self {
        Self {
            bytes: digest[..mode.key_len()].to_vec(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymmetricKey")
            .field("len", &self.bytes.len())
            .finish_non_exhaustive()
    }
}

/// AES-CBC 암호기
///
/// 모드는 생성 시점에 검증되므로, 호출 시점에 설정 에러가 나지 않습니다.
#[derive(Clone)]
pub struct SymmetricCipher {
    digest: Zeroizing<[u8; 32]>,
    key: SymmetricKey,
    mode: CipherMode,
    use_base64: bool,
}

impl SymmetricCipher {
    /// 새 암호기 생성 (`aes-128-cbc` / `aes-192-cbc` / `aes-256-cbc`, base64 사용)
    pub fn new(passphrase: &str, mode: &str) -> Result<Self> {
        Ok(Self::with_mode_of(passphrase, mode.parse()?))
    }

    /// 이미 검증된 모드로 생성
    pub fn with_mode_of(passphrase: &str, mode: CipherMode) -> Self {
        let digest = hash_passphrase(passphrase);
        let key = SymmetricKey::from_digest(&digest, mode);
        Self {
            digest,
            key,
            mode,
            use_base64: true,
        }
    }

    /// 모드 변경 (키 재파생)
    pub fn with_mode(mut self, mode: CipherMode) -> Self {
        self.key = SymmetricKey::from_digest(&self.digest, mode);
        self.mode = mode;
        self
    }

    /// 패스프레이즈 변경 (키 재파생)
    pub fn with_passphrase(self, passphrase: &str) -> Self {
        let use_base64 = self.use_base64;
        Self::with_mode_of(passphrase, self.mode).with_base64(use_base64)
    }

    /// base64 프레이밍 설정
    pub fn with_base64(mut self, use_base64: bool) -> Self {
        self.use_base64 = use_base64;
        self
    }

    pub fn mode(&self) -> CipherMode {
        self.mode
    }

    pub fn key(&self) -> &SymmetricKey {
        &self.key
    }

    pub fn uses_base64(&self) -> bool {
        self.use_base64
    }

    /// 암호화 후 `iv || ciphertext` 반환 (base64 설정 시 인코딩된 바이트)
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let sealed = self.seal(plaintext)?;
        if self.use_base64 {
            Ok(general_purpose::STANDARD.encode(sealed).into_bytes())
        } else {
            Ok(sealed)
        }
    }

    /// `encrypt`의 역연산
    pub fn decrypt(&self, blob: &[u8]) -> Result<Vec<u8>> {
        if self.use_base64 {
            let raw = general_purpose::STANDARD
                .decode(blob)
                .map_err(|_| Error::Decryption)?;
            self.open(&raw)
        } else {
            self.open(blob)
        }
    }

    /// 문자열 암호화 (항상 base64 프레이밍)
    pub fn encrypt_string(&self, plaintext: &str) -> Result<String> {
        Ok(general_purpose::STANDARD.encode(self.seal(plaintext.as_bytes())?))
    }

    /// 문자열 복호화 (항상 base64 프레이밍)
    pub fn decrypt_string(&self, encoded: &str) -> Result<String> {
        let raw = general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|_| Error::Decryption)?;
        String::from_utf8(self.open(&raw)?).map_err(|_| Error::Decryption)
    }

    /// 원시 암호화: 새 IV 생성 후 `iv || ciphertext`
    pub fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let mut iv = [0u8; IV_LEN];
        rand::thread_rng().fill_bytes(&mut iv);

        let key = self.key.as_bytes();
        let ciphertext = match self.mode {
            CipherMode::Aes128Cbc => encrypt_with::<cbc::Encryptor<aes::Aes128>>(key, &iv, plaintext)?,
            CipherMode::Aes192Cbc => encrypt_with::<cbc::Encryptor<aes::Aes192>>(key, &iv, plaintext)?,
            CipherMode::Aes256Cbc => encrypt_with::<cbc::Encryptor<aes::Aes256>>(key, &iv, plaintext)?,
        };

        let mut payload = Vec::with_capacity(IV_LEN + ciphertext.len());
        payload.extend_from_slice(&iv);
        payload.extend_from_slice(&ciphertext);
        Ok(payload)
    }

    /// 원시 복호화: 앞 16바이트를 IV로 분리
    pub fn open(&self, payload: &[u8]) -> Result<Vec<u8>> {
        if payload.len() < IV_LEN * 2 || payload.len() % IV_LEN != 0 {
            return Err(Error::Decryption);
        }

        let (iv, ciphertext) = payload.split_at(IV_LEN);
        let key = self.key.as_bytes();
        match self.mode {
            CipherMode::Aes128Cbc => decrypt_with::<cbc::Decryptor<aes::Aes128>>(key, iv, ciphertext),
            CipherMode::Aes192Cbc => decrypt_with::<cbc::Decryptor<aes::Aes192>>(key, iv, ciphertext),
            CipherMode::Aes256Cbc => decrypt_with::<cbc::Decryptor<aes::Aes256>>(key, iv, ciphertext),
        }
    }
}

impl std::fmt::Debug for SymmetricCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymmetricCipher")
            .field("mode", &self.mode)
            .field("use_base64", &self.use_base64)
            .finish_non_exhaustive()
    }
}

fn hash_passphrase(passphrase: &str) -> Zeroizing<[u8; 32]> {
    let mut digest = Zeroizing::new([0u8; 32]);
    digest.copy_from_slice(&Sha256::digest(passphrase.as_bytes()));
    digest
}

fn encrypt_with<E>(key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>>
where
    E: KeyIvInit + BlockEncryptMut,
{
    let encryptor = E::new_from_slices(key, iv)
        .map_err(|_| Error::config("cipher key/iv length mismatch"))?;
    Ok(encryptor.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

fn decrypt_with<D>(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>>
where
    D: KeyIvInit + BlockDecryptMut,
{
    let decryptor = D::new_from_slices(key, iv).map_err(|_| Error::Decryption)?;
    decryptor
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| Error::Decryption)
}
