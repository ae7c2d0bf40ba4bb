use crate::Database;
use dfort_domain::audit::AuditEntry;

impl Database {
    pub fn append_audit(&self, entry: AuditEntry) {
        self.inner.tables.write().audit.push(entry);
    }

    /// One page of a user's audit trail, newest first, plus the user's total entry count.
    #[must_use]
    pub fn audit_page(
        &self,
        user_id: &str,
        offset: usize,
        limit: usize,
    ) -> (Vec<AuditEntry>, usize) {
        let tables = self.inner.tables.read();
        let mine = || tables.audit.iter().rev().filter(|entry| entry.user_id == user_id);

        let total = mine().count();
        let page = mine().skip(offset).take(limit).cloned().collect();
        (page, total)
    }
}
