//! Credential sealing: username, password and notes under a single iv and tag.
//!
//! The fields are concatenated and encrypted once; the AAD records each segment's length and
//! whether notes are present, so segments cannot be swapped, truncated or re-split without the
//! tag failing. One encryption per credential means one iv per credential.

use crate::cipher::AuthenticatedCipher;
use crate::error::CryptoError;
use crate::types::{AuthTag, EncryptedRecord, Iv, MasterKey, decode_base64, encode_base64};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

const AAD_LABEL: &[u8] = b"dfort.credential.v1";

/// Plaintext credential fields, held only by the key holder.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct CredentialSecret {
    pub username: String,
    pub password: String,
    pub notes: Option<String>,
}

impl fmt::Debug for CredentialSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSecret")
            .field("username", &"<redacted>")
            .field("password", &"<redacted>")
            .field("notes", &self.notes.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Sealed fields in the exact shape the credentials API accepts and returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SealedCredential {
    pub encrypted_username: String,
    pub encrypted_password: String,
    pub encrypted_notes: Option<String>,
    pub iv: String,
    pub auth_tag: String,
}

impl CredentialSecret {
    /// # Errors
    /// [`CryptoError::Entropy`] if no iv can be drawn.
    pub fn seal(&self, key: &MasterKey) -> Result<SealedCredential, CryptoError> {
        let notes = self.notes.as_deref();
        let lengths = [self.username.len(), self.password.len(), notes.map_or(0, str::len)];
        let aad = aad(notes.is_some(), lengths)?;

        let mut joined = Vec::with_capacity(lengths.iter().sum());
        joined.extend_from_slice(self.username.as_bytes());
        joined.extend_from_slice(self.password.as_bytes());
        joined.extend_from_slice(notes.unwrap_or_default().as_bytes());

        let record = AuthenticatedCipher::encrypt_with_aad(&joined, &aad, key);
        joined.zeroize();
        let record = record?;

        let (username, rest) = record.ciphertext.split_at(lengths[0]);
        let (password, notes_ct) = rest.split_at(lengths[1]);

        Ok(SealedCredential {
            encrypted_username: encode_base64(username),
            encrypted_password: encode_base64(password),
            encrypted_notes: notes.map(|_| encode_base64(notes_ct)),
            iv: record.iv.to_hex(),
            auth_tag: record.auth_tag.to_hex(),
        })
    }
}

impl SealedCredential {
    /// # Errors
    /// [`CryptoError::InvalidInput`] for malformed encodings or non-UTF-8 plaintext,
    /// [`CryptoError::Integrity`] if any field, the iv, the tag or the key is wrong.
    pub fn open(&self, key: &MasterKey) -> Result<CredentialSecret, CryptoError> {
        let username = decode_base64(&self.encrypted_username)?;
        let password = decode_base64(&self.encrypted_password)?;
        let notes = self.encrypted_notes.as_deref().map(decode_base64).transpose()?;

        let lengths = [username.len(), password.len(), notes.as_ref().map_or(0, Vec::len)];
        let aad = aad(notes.is_some(), lengths)?;

        let mut ciphertext = username;
        ciphertext.extend_from_slice(&password);
        ciphertext.extend_from_slice(notes.as_deref().unwrap_or_default());

        let record = EncryptedRecord {
            ciphertext,
            iv: Iv::from_hex(&self.iv)?,
            auth_tag: AuthTag::from_hex(&self.auth_tag)?,
        };
        let plaintext = AuthenticatedCipher::decrypt_with_aad(&record, &aad, key)?;

        let (username, rest) = plaintext.split_at(lengths[0]);
        let (password, notes_pt) = rest.split_at(lengths[1]);

        Ok(CredentialSecret {
            username: utf8(username)?,
            password: utf8(password)?,
            notes: if notes.is_some() { Some(utf8(notes_pt)?) } else { None },
        })
    }
}

fn aad(has_notes: bool, lengths: [usize; 3]) -> Result<Vec<u8>, CryptoError> {
    let mut aad = Vec::with_capacity(AAD_LABEL.len() + 1 + 3 * 4);
    aad.extend_from_slice(AAD_LABEL);
    aad.push(u8::from(has_notes));
    for len in lengths {
        let len = u32::try_from(len).map_err(|_| CryptoError::InvalidInput {
            message: "credential field exceeds 4 GiB".into(),
            context: None,
        })?;
        aad.extend_from_slice(&len.to_be_bytes());
    }
    Ok(aad)
}

fn utf8(bytes: &[u8]) -> Result<String, CryptoError> {
    String::from_utf8(bytes.to_vec()).map_err(|_| CryptoError::InvalidInput {
        message: "decrypted field is not valid UTF-8".into(),
        context: None,
    })
}
