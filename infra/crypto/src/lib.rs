//! Key-holder cryptography for `DataFort`.
//!
//! Everything in this crate runs on the side that owns the master password. The server never
//! links a code path that decrypts: it stores and returns [`WireRecord`]-shaped text and opaque
//! blobs exactly as submitted.
//!
//! ## Record Format
//!
//! An [`EncryptedRecord`] is the atomic triple `{ ciphertext, iv(96-bit), authTag(128-bit) }`.
//! As a single blob it is laid out as:
//!
//! ```text
//! [IV(12)][TAG(16)][CIPHERTEXT(N)]
//! ```
//!
//! On the HTTP wire the ciphertext is base64 and the iv and tag are lowercase hex.
//!
//! ## Nonce Policy
//!
//! Every encryption draws a fresh random 96-bit iv from the OS RNG. There is no counter and no
//! cached cipher state, so concurrent callers never share nonce state.
//!
//! ## Example
//!
//! ```rust
//! use dfort_crypto::{AuthenticatedCipher, KeyDerivation, Salt};
//!
//! # fn main() -> Result<(), dfort_crypto::CryptoError> {
//! let salt = Salt::generate()?;
//! let key = KeyDerivation::default().derive("master password", &salt)?;
//!
//! let record = AuthenticatedCipher::encrypt(b"card pin 0000", &key)?;
//! let wire = record.to_wire();
//!
//! let restored = AuthenticatedCipher::decrypt(&wire.decode()?, &key)?;
//! assert_eq!(restored.as_slice(), b"card pin 0000");
//! # Ok(())
//! # }
//! ```

mod cipher;
mod error;
mod fields;
mod kdf;
mod types;

pub use cipher::AuthenticatedCipher;
pub use error::{CryptoError, CryptoErrorExt};
pub use fields::{CredentialSecret, SealedCredential};
pub use kdf::{DEFAULT_ITERATIONS, KeyDerivation, MIN_ITERATIONS};
pub use types::{
    AuthTag, EncryptedRecord, IV_LEN, Iv, KEY_LEN, MasterKey, SALT_LEN, Salt, TAG_LEN, WireRecord,
};
pub use zeroize::Zeroizing;
