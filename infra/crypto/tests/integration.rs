pub mod fixtures;

use dfort_crypto::*;
use fixtures::*;
use std::io::Cursor;

#[test]
fn derivation_is_deterministic_and_input_sensitive() {
    let kdf = KeyDerivation::default();
    let salt = fixed_salt();
    let record = AuthenticatedCipher::encrypt(b"probe", &derived_key()).unwrap();

    let again = kdf.derive(PASSWORD, &salt).unwrap();
    assert_eq!(AuthenticatedCipher::decrypt(&record, &again).unwrap().as_slice(), b"probe");

    let other_password = kdf.derive("password123?", &salt).unwrap();
    assert!(AuthenticatedCipher::decrypt(&record, &other_password).is_err());

    let other_salt = kdf.derive(PASSWORD, &Salt::from_bytes([0x43; 32])).unwrap();
    assert!(AuthenticatedCipher::decrypt(&record, &other_salt).is_err());
}

#[test]
fn wrong_key_is_a_generic_integrity_error() {
    let record = AuthenticatedCipher::encrypt(b"secret", &derived_key()).unwrap();
    let err = AuthenticatedCipher::decrypt(&record, &MasterKey::from_bytes([0; 32])).unwrap_err();

    assert!(matches!(err, CryptoError::Integrity { .. }));
    assert_eq!(err.kind(), "Integrity");
}

#[test]
fn stale_iv_with_new_ciphertext_fails() {
    let key = derived_key();
    let first = AuthenticatedCipher::encrypt(b"version one", &key).unwrap();
    let second = AuthenticatedCipher::encrypt(b"version two", &key).unwrap();

    let mixed = EncryptedRecord { iv: first.iv, ..second };
    assert!(matches!(
        AuthenticatedCipher::decrypt(&mixed, &key),
        Err(CryptoError::Integrity { .. })
    ));
}

#[test]
fn wire_and_blob_forms_open_to_the_same_plaintext() {
    let key = derived_key();
    let record = AuthenticatedCipher::encrypt(b"portable", &key).unwrap();

    let json = serde_json::to_value(record.to_wire()).unwrap();
    assert!(json.get("authTag").is_some());
    let wire: WireRecord = serde_json::from_value(json).unwrap();

    let from_wire = AuthenticatedCipher::decrypt(&wire.decode().unwrap(), &key).unwrap();
    let from_blob =
        AuthenticatedCipher::decrypt(&EncryptedRecord::from_blob(&record.to_blob()).unwrap(), &key)
            .unwrap();
    assert_eq!(from_wire.as_slice(), from_blob.as_slice());
}

#[test]
fn stream_variant_handles_large_files() {
    let key = derived_key();
    let file: Vec<u8> = (0..256 * 1024).map(|i| (i % 251) as u8).collect();

    let record = AuthenticatedCipher::encrypt_stream(Cursor::new(&file), &key).unwrap();
    assert_eq!(record.ciphertext.len(), file.len());

    let mut out = Vec::new();
    let written = AuthenticatedCipher::decrypt_stream(&record, &key, &mut out).unwrap();
    assert_eq!(written, file.len() as u64);
    assert_eq!(out, file);
}

#[test]
fn failed_stream_decryption_writes_nothing() {
    let key = derived_key();
    let mut record = AuthenticatedCipher::encrypt_stream(Cursor::new(b"abc"), &key).unwrap();
    record.ciphertext[0] ^= 1;

    let mut out = Vec::new();
    assert!(AuthenticatedCipher::decrypt_stream(&record, &key, &mut out).is_err());
    assert!(out.is_empty());
}

#[test]
fn credentials_seal_into_the_api_shape() {
    let key = derived_key();
    let secret = CredentialSecret {
        username: "abc".into(),
        password: "def".into(),
        notes: None,
    };

    let sealed = secret.seal(&key).unwrap();
    assert_eq!(sealed.iv.len(), IV_LEN * 2);
    assert_eq!(sealed.auth_tag.len(), TAG_LEN * 2);

    let json = serde_json::to_value(&sealed).unwrap();
    for field in ["encryptedUsername", "encryptedPassword", "iv", "authTag"] {
        assert!(json.get(field).is_some(), "missing {field}");
    }
    assert_eq!(sealed.open(&key).unwrap(), secret);
}
