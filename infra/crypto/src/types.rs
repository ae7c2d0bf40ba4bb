use crate::error::CryptoError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// AES-256 key length.
pub const KEY_LEN: usize = 32;
/// KDF salt length (256-bit).
pub const SALT_LEN: usize = 32;
/// AES-GCM nonce length (96-bit).
pub const IV_LEN: usize = 12;
/// AES-GCM tag length (128-bit).
pub const TAG_LEN: usize = 16;

pub(crate) fn random_array<const N: usize>() -> Result<[u8; N], CryptoError> {
    let mut out = [0u8; N];
    getrandom::fill(&mut out).map_err(|e| CryptoError::Entropy {
        message: e.to_string().into(),
        context: Some("OS random source unavailable".into()),
    })?;
    Ok(out)
}

fn array_from_hex<const N: usize>(raw: &str, what: &'static str) -> Result<[u8; N], CryptoError> {
    let mut out = [0u8; N];
    hex::decode_to_slice(raw, &mut out).map_err(|e| CryptoError::InvalidInput {
        message: format!("{what} must be {} hex characters: {e}", N * 2).into(),
        context: None,
    })?;
    Ok(out)
}

// --- Key material ---

/// A 256-bit symmetric key that only ever lives in the key holder's memory.
///
/// No `Clone`, `Serialize` or readable `Debug`; the bytes are wiped on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct MasterKey([u8; KEY_LEN]);

impl MasterKey {
    /// Wraps raw key bytes, e.g. a key unwrapped from a platform keystore.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    pub(crate) const fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterKey(<redacted>)")
    }
}

/// Per-user KDF salt. Not secret; generated once at enrollment and stored alongside the
/// account so the same key can be derived again on any device.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Salt([u8; SALT_LEN]);

impl Salt {
    /// # Errors
    /// [`CryptoError::Entropy`] if the OS RNG fails.
    pub fn generate() -> Result<Self, CryptoError> {
        random_array().map(Self)
    }

    #[must_use]
    pub const fn from_bytes(bytes: [u8; SALT_LEN]) -> Self {
        Self(bytes)
    }

    /// # Errors
    /// [`CryptoError::InvalidInput`] unless `raw` is exactly 64 hex characters.
    pub fn from_hex(raw: &str) -> Result<Self, CryptoError> {
        array_from_hex(raw, "salt").map(Self)
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; SALT_LEN] {
        &self.0
    }
}

impl fmt::Debug for Salt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Salt({})", self.to_hex())
    }
}

// --- Record parts ---

/// A 96-bit GCM nonce. A fresh one is drawn from the OS RNG for every encryption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Iv([u8; IV_LEN]);

impl Iv {
    pub(crate) fn generate() -> Result<Self, CryptoError> {
        random_array().map(Self)
    }

    #[must_use]
    pub const fn from_bytes(bytes: [u8; IV_LEN]) -> Self {
        Self(bytes)
    }

    /// # Errors
    /// [`CryptoError::InvalidInput`] unless `raw` is exactly 24 hex characters.
    pub fn from_hex(raw: &str) -> Result<Self, CryptoError> {
        array_from_hex(raw, "iv").map(Self)
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; IV_LEN] {
        &self.0
    }
}

/// A 128-bit GCM authentication tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthTag([u8; TAG_LEN]);

impl AuthTag {
    #[must_use]
    pub const fn from_bytes(bytes: [u8; TAG_LEN]) -> Self {
        Self(bytes)
    }

    /// # Errors
    /// [`CryptoError::InvalidInput`] unless `raw` is exactly 32 hex characters.
    pub fn from_hex(raw: &str) -> Result<Self, CryptoError> {
        array_from_hex(raw, "authTag").map(Self)
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; TAG_LEN] {
        &self.0
    }
}

/// Ciphertext plus the iv and tag it was sealed with. The three travel and are stored together;
/// pairing any of them with another record's parts fails authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedRecord {
    pub ciphertext: Vec<u8>,
    pub iv: Iv,
    pub auth_tag: AuthTag,
}

impl EncryptedRecord {
    /// Single-blob layout: `iv(12) || tag(16) || ciphertext`.
    #[must_use]
    pub fn to_blob(&self) -> Vec<u8> {
        let mut blob = Vec::with_capacity(IV_LEN + TAG_LEN + self.ciphertext.len());
        blob.extend_from_slice(self.iv.as_bytes());
        blob.extend_from_slice(self.auth_tag.as_bytes());
        blob.extend_from_slice(&self.ciphertext);
        blob
    }

    /// # Errors
    /// [`CryptoError::InvalidInput`] if the blob is shorter than an iv plus a tag.
    pub fn from_blob(blob: &[u8]) -> Result<Self, CryptoError> {
        let Some((iv, rest)) = blob.split_first_chunk::<IV_LEN>() else {
            return Err(too_short(blob.len()));
        };
        let Some((tag, ciphertext)) = rest.split_first_chunk::<TAG_LEN>() else {
            return Err(too_short(blob.len()));
        };

        Ok(Self { ciphertext: ciphertext.to_vec(), iv: Iv(*iv), auth_tag: AuthTag(*tag) })
    }

    /// Accepts `ciphertext || tag` as produced by platforms that append the tag automatically
    /// (e.g. WebCrypto), with the iv supplied separately.
    ///
    /// # Errors
    /// [`CryptoError::InvalidInput`] if the input cannot hold a tag.
    pub fn from_appended_tag(iv: Iv, sealed: &[u8]) -> Result<Self, CryptoError> {
        let Some((ciphertext, tag)) = sealed.split_last_chunk::<TAG_LEN>() else {
            return Err(too_short(sealed.len()));
        };
        Ok(Self { ciphertext: ciphertext.to_vec(), iv, auth_tag: AuthTag(*tag) })
    }

    /// Text form used on the wire: base64 ciphertext, hex iv and tag.
    #[must_use]
    pub fn to_wire(&self) -> WireRecord {
        WireRecord {
            ciphertext: STANDARD.encode(&self.ciphertext),
            iv: self.iv.to_hex(),
            auth_tag: self.auth_tag.to_hex(),
        }
    }
}

fn too_short(len: usize) -> CryptoError {
    CryptoError::InvalidInput {
        message: format!("record too short ({len} bytes), need at least {}", IV_LEN + TAG_LEN)
            .into(),
        context: None,
    }
}

/// [`EncryptedRecord`] as text, the shape the HTTP API stores verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireRecord {
    pub ciphertext: String,
    pub iv: String,
    pub auth_tag: String,
}

impl WireRecord {
    /// # Errors
    /// [`CryptoError::InvalidInput`] on bad base64 or hex.
    pub fn decode(&self) -> Result<EncryptedRecord, CryptoError> {
        Ok(EncryptedRecord {
            ciphertext: decode_base64(&self.ciphertext)?,
            iv: Iv::from_hex(&self.iv)?,
            auth_tag: AuthTag::from_hex(&self.auth_tag)?,
        })
    }
}

pub(crate) fn decode_base64(raw: &str) -> Result<Vec<u8>, CryptoError> {
    STANDARD.decode(raw).map_err(|e| CryptoError::InvalidInput {
        message: format!("invalid base64: {e}").into(),
        context: None,
    })
}

pub(crate) fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}
