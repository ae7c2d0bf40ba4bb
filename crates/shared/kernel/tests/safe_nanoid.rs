use dfort_kernel::{ID_LEN, SAFE_ALPHABET, safe_nanoid};

#[test]
fn generates_expected_length_and_charset() {
    let id = safe_nanoid!();
    assert_eq!(id.len(), ID_LEN);

    for ch in id.chars() {
        assert!(SAFE_ALPHABET.contains(&ch), "unexpected character in nanoid: {ch}");
    }
}

#[test]
fn custom_length() {
    let id = safe_nanoid!(20);
    assert_eq!(id.len(), 20);
}

#[test]
fn default_length_ids_are_distinct() {
    let a = safe_nanoid!();
    let b = safe_nanoid!();
    assert_eq!(a.len(), 16);
    assert_ne!(a, b);
}
