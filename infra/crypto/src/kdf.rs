use crate::error::CryptoError;
use crate::types::{KEY_LEN, MasterKey, Salt};
use sha2::Sha256;

/// Lowest accepted PBKDF2 iteration count.
pub const MIN_ITERATIONS: u32 = 300_000;
/// Default PBKDF2 iteration count.
pub const DEFAULT_ITERATIONS: u32 = 310_000;

/// PBKDF2-HMAC-SHA-256 key derivation with a fixed, deliberately slow iteration count.
///
/// Pure: the same password, salt and iteration count always yield the same key.
///
/// ```rust
/// use dfort_crypto::{KeyDerivation, Salt};
///
/// # fn main() -> Result<(), dfort_crypto::CryptoError> {
/// let kdf = KeyDerivation::default();
/// let salt = Salt::generate()?;
/// let _key = kdf.derive("correct horse battery staple", &salt)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyDerivation {
    iterations: u32,
}

impl Default for KeyDerivation {
    fn default() -> Self {
        Self { iterations: DEFAULT_ITERATIONS }
    }
}

impl KeyDerivation {
    /// # Errors
    /// [`CryptoError::InvalidInput`] below [`MIN_ITERATIONS`].
    pub fn new(iterations: u32) -> Result<Self, CryptoError> {
        if iterations < MIN_ITERATIONS {
            return Err(CryptoError::InvalidInput {
                message: format!("at least {MIN_ITERATIONS} iterations required, got {iterations}")
                    .into(),
                context: None,
            });
        }
        Ok(Self { iterations })
    }

    #[must_use]
    pub const fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Derives the master key for `password` under `salt`.
    ///
    /// # Errors
    /// [`CryptoError::InvalidInput`] for an empty password.
    pub fn derive(&self, password: &str, salt: &Salt) -> Result<MasterKey, CryptoError> {
        if password.is_empty() {
            return Err(CryptoError::InvalidInput {
                message: "password must not be empty".into(),
                context: None,
            });
        }

        let key = pbkdf2_sha256(password.as_bytes(), salt.as_bytes(), self.iterations);
        Ok(MasterKey::from_bytes(key))
    }

    /// Fresh enrollment salt; equivalent to [`Salt::generate`].
    ///
    /// # Errors
    /// [`CryptoError::Entropy`] if the OS RNG fails.
    pub fn generate_salt() -> Result<Salt, CryptoError> {
        Salt::generate()
    }
}

fn pbkdf2_sha256(password: &[u8], salt: &[u8], rounds: u32) -> [u8; KEY_LEN] {
    let mut out = [0u8; KEY_LEN];
    pbkdf2::pbkdf2_hmac::<Sha256>(password, salt, rounds, &mut out);
    out
}
