use crate::{Database, DatabaseError, RemovedVault, Row, Tables, newest_first};
use dfort_domain::records::{VaultCounts, VaultRecord};

impl Tables {
    pub(crate) fn counts(&self, vault_id: &str) -> VaultCounts {
        VaultCounts {
            credentials: self
                .credentials
                .values()
                .filter(|row| row.record.vault_id == vault_id)
                .count(),
            documents: self
                .documents
                .values()
                .filter(|row| row.record.vault_id == vault_id)
                .count(),
        }
    }

    pub(crate) fn remove_vault_cascade(&mut self, vault_id: &str) -> Option<RemovedVault> {
        let vault = self.vaults.remove(vault_id)?.record;
        self.credentials.retain(|_, row| row.record.vault_id != vault_id);

        let mut blob_keys = Vec::new();
        self.documents.retain(|_, row| {
            if row.record.vault_id == vault_id {
                blob_keys.push(row.record.blob_key.clone());
                false
            } else {
                true
            }
        });

        Some(RemovedVault { vault, blob_keys })
    }
}

impl Database {
    /// Stores a new vault.
    ///
    /// # Errors
    /// [`DatabaseError::NotFound`] when the owner does not exist.
    pub fn insert_vault(&self, vault: VaultRecord) -> Result<(), DatabaseError> {
        let mut tables = self.inner.tables.write();
        if !tables.users.contains_key(&vault.user_id) {
            return Err(DatabaseError::NotFound {
                message: "owner does not exist".into(),
                context: Some("vaults".into()),
            });
        }

        let seq = tables.seq();
        tables.vaults.insert(vault.id.clone(), Row { seq, record: vault });
        Ok(())
    }

    #[must_use]
    pub fn find_vault(&self, id: &str) -> Option<VaultRecord> {
        self.inner.tables.read().vaults.get(id).map(|row| row.record.clone())
    }

    /// Owning user id of a vault.
    #[must_use]
    pub fn vault_owner(&self, id: &str) -> Option<String> {
        self.inner.tables.read().vaults.get(id).map(|row| row.record.user_id.clone())
    }

    #[must_use]
    pub fn vault_counts(&self, id: &str) -> VaultCounts {
        self.inner.tables.read().counts(id)
    }

    /// Vaults owned by `user_id`, newest first, with their child counts.
    #[must_use]
    pub fn vaults_for_user(&self, user_id: &str) -> Vec<(VaultRecord, VaultCounts)> {
        let tables = self.inner.tables.read();
        let vaults = newest_first(
            tables.vaults.values().filter(|row| row.record.user_id == user_id),
            |vault| vault.created_at,
        );

        vaults
            .into_iter()
            .map(|vault| {
                let counts = tables.counts(&vault.id);
                (vault, counts)
            })
            .collect()
    }

    /// Applies `change` to a vault in place and returns the updated record.
    pub fn update_vault<F>(&self, id: &str, change: F) -> Option<VaultRecord>
    where
        F: FnOnce(&mut VaultRecord),
    {
        let mut tables = self.inner.tables.write();
        let row = tables.vaults.get_mut(id)?;
        change(&mut row.record);
        Some(row.record.clone())
    }

    /// Removes a vault with all of its credentials and documents.
    pub fn remove_vault(&self, id: &str) -> Option<RemovedVault> {
        self.inner.tables.write().remove_vault_cascade(id)
    }
}
