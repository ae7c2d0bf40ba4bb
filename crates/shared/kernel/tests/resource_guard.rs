use dfort_kernel::safe_nanoid;
use dfort_kernel::security::{ResourceGuard, ResourceGuardError};

#[test]
fn minted_ids_pass_and_path_tricks_fail() {
    let id = safe_nanoid!();
    assert!(ResourceGuard::verify_id(&id, "credential").is_ok());

    for hostile in ["", "..", "a/b", "a b", "id%2F", "ID.json"] {
        let err = ResourceGuard::verify_id(hostile, "credential").unwrap_err();
        assert!(matches!(err, ResourceGuardError::Validation { .. }), "accepted {hostile:?}");
    }
}
