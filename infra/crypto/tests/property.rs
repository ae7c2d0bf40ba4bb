use dfort_crypto::*;
use proptest::prelude::*;
use std::sync::LazyLock;

// Derivation is deliberately slow; share one key across cases.
static KEY: LazyLock<[u8; KEY_LEN]> = LazyLock::new(|| {
    let mut bytes = [0u8; KEY_LEN];
    for (i, b) in (0u8..).zip(bytes.iter_mut()) {
        *b = i.wrapping_mul(37);
    }
    bytes
});

fn key() -> MasterKey {
    MasterKey::from_bytes(*KEY)
}

proptest! {
    #[test]
    fn roundtrip_arbitrary_bytes(data in proptest::collection::vec(any::<u8>(), 0..4096)) {
        let record = AuthenticatedCipher::encrypt(&data, &key()).unwrap();
        let plain = AuthenticatedCipher::decrypt(&record, &key()).unwrap();
        prop_assert_eq!(plain.as_slice(), data.as_slice());
    }

    #[test]
    fn any_single_bit_flip_is_detected(
        data in proptest::collection::vec(any::<u8>(), 1..512),
        part in 0usize..3,
        index in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let record = AuthenticatedCipher::encrypt(&data, &key()).unwrap();
        let mut blob = record.to_blob();

        // Blob layout is iv || tag || ciphertext.
        let (start, len) = match part {
            0 => (0, IV_LEN),
            1 => (IV_LEN, TAG_LEN),
            _ => (IV_LEN + TAG_LEN, data.len()),
        };
        blob[start + index.index(len)] ^= 1 << bit;

        let tampered = EncryptedRecord::from_blob(&blob).unwrap();
        let result = AuthenticatedCipher::decrypt(&tampered, &key());
        let detected = matches!(result, Err(CryptoError::Integrity { .. }));
        prop_assert!(detected, "tampered record was accepted");
    }

    #[test]
    fn credential_fields_roundtrip(
        username in ".{0,64}",
        password in ".{0,64}",
        notes in proptest::option::of(".{0,256}"),
    ) {
        let secret = CredentialSecret { username, password, notes };
        let sealed = secret.seal(&key()).unwrap();
        prop_assert_eq!(sealed.open(&key()).unwrap(), secret);
    }
}
