pub(crate) mod credentials;
pub(crate) mod documents;
pub(crate) mod vaults;

use crate::boundary::GuardedCall;
use dfort_domain::audit::{AuditAction, ResourceRef};
use dfort_identity::AuthenticatedUser;
use dfort_kernel::server::RequesterContext;

pub(crate) const fn guarded<'a>(
    user: &'a AuthenticatedUser,
    requester: &'a RequesterContext,
    action: AuditAction,
    audited: ResourceRef,
) -> GuardedCall<'a> {
    GuardedCall { user, requester, action, audited }
}
