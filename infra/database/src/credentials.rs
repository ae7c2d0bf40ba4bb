use crate::{Database, DatabaseError, Row, newest_first};
use dfort_domain::records::CredentialRecord;

impl Database {
    /// Stores a new credential.
    ///
    /// # Errors
    /// [`DatabaseError::NotFound`] when the parent vault is gone.
    pub fn insert_credential(&self, credential: CredentialRecord) -> Result<(), DatabaseError> {
        let mut tables = self.inner.tables.write();
        if !tables.vaults.contains_key(&credential.vault_id) {
            return Err(DatabaseError::NotFound {
                message: "vault does not exist".into(),
                context: Some("credentials".into()),
            });
        }

        let seq = tables.seq();
        tables.credentials.insert(credential.id.clone(), Row { seq, record: credential });
        Ok(())
    }

    #[must_use]
    pub fn find_credential(&self, id: &str) -> Option<CredentialRecord> {
        self.inner.tables.read().credentials.get(id).map(|row| row.record.clone())
    }

    /// Owning `(vault id, user id)` of a credential, following the vault link.
    #[must_use]
    pub fn credential_owner(&self, id: &str) -> Option<(String, String)> {
        let tables = self.inner.tables.read();
        let vault_id = &tables.credentials.get(id)?.record.vault_id;
        let vault = &tables.vaults.get(vault_id)?.record;
        Some((vault.id.clone(), vault.user_id.clone()))
    }

    #[must_use]
    pub fn credentials_in_vault(&self, vault_id: &str) -> Vec<CredentialRecord> {
        let tables = self.inner.tables.read();
        newest_first(
            tables.credentials.values().filter(|row| row.record.vault_id == vault_id),
            |credential| credential.created_at,
        )
    }

    pub fn update_credential<F>(&self, id: &str, change: F) -> Option<CredentialRecord>
    where
        F: FnOnce(&mut CredentialRecord),
    {
        let mut tables = self.inner.tables.write();
        let row = tables.credentials.get_mut(id)?;
        change(&mut row.record);
        Some(row.record.clone())
    }

    pub fn remove_credential(&self, id: &str) -> Option<CredentialRecord> {
        self.inner.tables.write().credentials.remove(id).map(|row| row.record)
    }
}
