//! AES-256-GCM over caller-held keys.
//!
//! Keys are per-call arguments and never retained. Every encryption draws a fresh iv from the
//! OS RNG, so no nonce state is shared between calls or processes.

use crate::error::{CryptoError, CryptoErrorExt};
use crate::types::{AuthTag, EncryptedRecord, Iv, MasterKey};
use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce, Tag};
use std::io::{Read, Write};
use zeroize::{Zeroize, Zeroizing};

/// Authenticated encryption of byte payloads for the key holder.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthenticatedCipher;

impl AuthenticatedCipher {
    /// # Errors
    /// [`CryptoError::Entropy`] if no iv can be drawn.
    pub fn encrypt(plaintext: &[u8], key: &MasterKey) -> Result<EncryptedRecord, CryptoError> {
        Self::encrypt_with_aad(plaintext, &[], key)
    }

    /// Like [`AuthenticatedCipher::encrypt`], additionally binding `aad` into the tag.
    ///
    /// # Errors
    /// [`CryptoError::Entropy`] if no iv can be drawn.
    pub fn encrypt_with_aad(
        plaintext: &[u8],
        aad: &[u8],
        key: &MasterKey,
    ) -> Result<EncryptedRecord, CryptoError> {
        seal(key, Iv::generate()?, aad, plaintext)
    }

    /// Verifies the tag and returns the plaintext; nothing is returned on failure.
    ///
    /// # Errors
    /// [`CryptoError::Integrity`] when ciphertext, iv, tag or key do not match.
    pub fn decrypt(
        record: &EncryptedRecord,
        key: &MasterKey,
    ) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
        Self::decrypt_with_aad(record, &[], key)
    }

    /// # Errors
    /// [`CryptoError::Integrity`] when any input, including `aad`, differs from encryption.
    pub fn decrypt_with_aad(
        record: &EncryptedRecord,
        aad: &[u8],
        key: &MasterKey,
    ) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));
        let mut buf = Zeroizing::new(record.ciphertext.clone());

        cipher
            .decrypt_in_place_detached(
                Nonce::from_slice(record.iv.as_bytes()),
                aad,
                buf.as_mut_slice(),
                Tag::from_slice(record.auth_tag.as_bytes()),
            )
            .map_err(|_| CryptoError::integrity())?;

        Ok(buf)
    }

    /// File variant: consumes `reader` to the end and seals it as one record.
    ///
    /// # Errors
    /// [`CryptoError::Io`] on read failure, [`CryptoError::Entropy`] if no iv can be drawn.
    pub fn encrypt_stream<R: Read>(
        mut reader: R,
        key: &MasterKey,
    ) -> Result<EncryptedRecord, CryptoError> {
        let mut plaintext = Zeroizing::new(Vec::new());
        reader.read_to_end(&mut plaintext).context("Reading plaintext stream")?;
        Self::encrypt(&plaintext, key)
    }

    /// Verifies the whole record before writing a single byte to `writer`.
    ///
    /// # Errors
    /// [`CryptoError::Integrity`] on tag mismatch, [`CryptoError::Io`] on write failure.
    pub fn decrypt_stream<W: Write>(
        record: &EncryptedRecord,
        key: &MasterKey,
        mut writer: W,
    ) -> Result<u64, CryptoError> {
        let plaintext = Self::decrypt(record, key)?;
        writer.write_all(&plaintext).context("Writing plaintext stream")?;
        writer.flush().context("Flushing plaintext stream")?;
        Ok(plaintext.len() as u64)
    }
}

fn seal(
    key: &MasterKey,
    iv: Iv,
    aad: &[u8],
    plaintext: &[u8],
) -> Result<EncryptedRecord, CryptoError> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));
    let mut buf = plaintext.to_vec();

    match cipher.encrypt_in_place_detached(Nonce::from_slice(iv.as_bytes()), aad, &mut buf) {
        Ok(tag) => {
            let mut tag_bytes = [0u8; crate::types::TAG_LEN];
            tag_bytes.copy_from_slice(tag.as_slice());
            Ok(EncryptedRecord { ciphertext: buf, iv, auth_tag: AuthTag::from_bytes(tag_bytes) })
        },
        Err(_) => {
            buf.zeroize();
            Err(CryptoError::Internal {
                message: "AES-GCM encryption failed".into(),
                context: Some("plaintext exceeds the GCM length limit".into()),
            })
        },
    }
}
