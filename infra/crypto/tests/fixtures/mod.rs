use dfort_crypto::{KeyDerivation, MasterKey, Salt};

pub const PASSWORD: &str = "password123!";

/// A fixed salt so derived keys are reproducible across test runs.
#[must_use]
pub fn fixed_salt() -> Salt {
    Salt::from_bytes([0x42; 32])
}

/// Derives a real key through the default PBKDF2 settings.
/// # Panics
/// * If derivation fails.
#[must_use]
pub fn derived_key() -> MasterKey {
    KeyDerivation::default().derive(PASSWORD, &fixed_salt()).expect("key derivation")
}
