use crate::{Database, DatabaseError, RemovedVault};
use dfort_domain::records::UserRecord;
use tracing::debug;

impl Database {
    /// Stores a new user.
    ///
    /// # Errors
    /// [`DatabaseError::Conflict`] when the email or id is already taken.
    pub fn insert_user(&self, user: UserRecord) -> Result<(), DatabaseError> {
        let mut tables = self.inner.tables.write();

        if tables.emails.contains_key(&user.email) || tables.users.contains_key(&user.id) {
            return Err(DatabaseError::Conflict {
                message: "email already registered".into(),
                context: Some("users".into()),
            });
        }

        tables.emails.insert(user.email.clone(), user.id.clone());
        tables.users.insert(user.id.clone(), user);
        Ok(())
    }

    #[must_use]
    pub fn find_user(&self, id: &str) -> Option<UserRecord> {
        self.inner.tables.read().users.get(id).cloned()
    }

    #[must_use]
    pub fn find_user_by_email(&self, email: &str) -> Option<UserRecord> {
        let tables = self.inner.tables.read();
        tables.emails.get(email).and_then(|id| tables.users.get(id)).cloned()
    }

    #[must_use]
    pub fn user_exists(&self, id: &str) -> bool {
        self.inner.tables.read().users.contains_key(id)
    }

    /// Removes a user together with every vault it owns.
    ///
    /// Returns the removed vaults so the caller can drop their blob namespaces. Audit entries
    /// are kept.
    pub fn remove_user(&self, id: &str) -> Option<Vec<RemovedVault>> {
        let mut tables = self.inner.tables.write();
        let user = tables.users.remove(id)?;
        tables.emails.remove(&user.email);

        let owned: Vec<String> = tables
            .vaults
            .values()
            .filter(|row| row.record.user_id == user.id)
            .map(|row| row.record.id.clone())
            .collect();

        let removed: Vec<RemovedVault> =
            owned.iter().filter_map(|vault_id| tables.remove_vault_cascade(vault_id)).collect();

        debug!(user_id = %id, vaults = removed.len(), "User removed");
        Some(removed)
    }
}
