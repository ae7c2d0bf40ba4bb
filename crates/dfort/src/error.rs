use dfort_audit::AuditError;
use dfort_identity::IdentityError;
use dfort_vaults::VaultError;

/// Feature initialization failures, tagged by slice.
#[dfort_derive::dfort_error]
pub enum InitError {
    #[error("Identity init failed{}: {source}", format_context(.context))]
    Identity { source: IdentityError, context: Option<std::borrow::Cow<'static, str>> },
    #[error("Audit init failed{}: {source}", format_context(.context))]
    Audit { source: AuditError, context: Option<std::borrow::Cow<'static, str>> },
    #[error("Vaults init failed{}: {source}", format_context(.context))]
    Vaults { source: VaultError, context: Option<std::borrow::Cow<'static, str>> },
}
