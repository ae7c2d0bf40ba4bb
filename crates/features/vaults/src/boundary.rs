//! The guarded path every credential and document operation takes.
//!
//! Authentication happens in the [`Authenticated`](dfort_identity::Authenticated) extractor
//! before a handler runs. From there the boundary authorizes the target through the
//! [`OwnershipGuard`], runs the operation and then records exactly one audit entry, whatever the
//! outcome. Payloads pass through untouched; the boundary never holds key material.

use crate::ownership::{OwnershipGuard, ResourceHandle};
use dfort_audit::AuditRecorder;
use dfort_domain::audit::{AuditAction, ResourceKind, ResourceRef};
use dfort_identity::AuthenticatedUser;
use dfort_kernel::server::{ApiError, ApiResult, RequesterContext};
use std::future::Future;
use tracing::debug;

/// One authenticated attempt at an audited operation.
#[derive(Debug)]
pub struct GuardedCall<'a> {
    pub user: &'a AuthenticatedUser,
    pub requester: &'a RequesterContext,
    pub action: AuditAction,
    /// What the audit entry names, e.g. `credential:new` for a create inside a vault.
    pub audited: ResourceRef,
}

/// The resource whose ownership gates the call.
#[derive(Debug, Clone, Copy)]
pub struct Target<'a> {
    pub kind: ResourceKind,
    pub id: &'a str,
}

impl<'a> Target<'a> {
    #[must_use]
    pub const fn vault(id: &'a str) -> Self {
        Self { kind: ResourceKind::Vault, id }
    }

    #[must_use]
    pub const fn credential(id: &'a str) -> Self {
        Self { kind: ResourceKind::Credential, id }
    }

    #[must_use]
    pub const fn document(id: &'a str) -> Self {
        Self { kind: ResourceKind::Document, id }
    }
}

#[derive(Debug, Clone)]
pub struct VaultBoundary {
    ownership: OwnershipGuard,
    recorder: AuditRecorder,
}

impl VaultBoundary {
    #[must_use]
    pub const fn new(ownership: OwnershipGuard, recorder: AuditRecorder) -> Self {
        Self { ownership, recorder }
    }

    #[must_use]
    pub const fn ownership(&self) -> &OwnershipGuard {
        &self.ownership
    }

    /// Authorizes `target`, runs `op` with the resolved handle and audits the attempt.
    ///
    /// `op` only runs when the caller owns the target.
    ///
    /// # Errors
    /// The ownership failure or whatever `op` returned, unchanged.
    pub async fn run<T, F, Fut>(
        &self,
        call: GuardedCall<'_>,
        target: Target<'_>,
        op: F,
    ) -> ApiResult<T>
    where
        F: FnOnce(ResourceHandle) -> Fut,
        Fut: Future<Output = ApiResult<T>>,
    {
        let owned = self.ownership.assert_owns(target.id, target.kind, &call.user.user_id).await;
        let result = match owned {
            Ok(handle) => op(handle).await,
            Err(err) => Err(err.into()),
        };

        self.audit(&call, result.as_ref().err());
        result
    }

    /// Audits an attempt that failed before it had a target, e.g. on an unreadable body.
    #[must_use]
    pub fn refuse(&self, call: GuardedCall<'_>, err: ApiError) -> ApiError {
        self.audit(&call, Some(&err));
        err
    }

    fn audit(&self, call: &GuardedCall<'_>, failure: Option<&ApiError>) {
        if let Some(err) = failure {
            debug!(
                action = %call.action,
                resource = %call.audited,
                kind = err.kind(),
                "Guarded call failed"
            );
        }
        self.recorder.record(&call.user.user_id, call.action, &call.audited, call.requester);
    }
}
