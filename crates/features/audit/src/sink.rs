use crate::AuditError;
use async_trait::async_trait;
use dfort_database::Database;
use dfort_domain::audit::AuditEntry;

/// Append-only destination for audit entries.
#[async_trait]
pub trait AuditSink: Send + Sync + std::fmt::Debug {
    async fn append(&self, entry: AuditEntry) -> Result<(), AuditError>;
}

#[async_trait]
impl AuditSink for Database {
    async fn append(&self, entry: AuditEntry) -> Result<(), AuditError> {
        self.append_audit(entry);
        Ok(())
    }
}
