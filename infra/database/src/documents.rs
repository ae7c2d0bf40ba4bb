use crate::{Database, DatabaseError, Row, newest_first};
use dfort_domain::records::{DocumentRecord, VaultRecord};

/// A deleted vault and the blob keys its documents pointed at.
#[derive(Debug, Clone)]
pub struct RemovedVault {
    pub vault: VaultRecord,
    pub blob_keys: Vec<String>,
}

impl Database {
    /// Stores metadata for an uploaded document.
    ///
    /// # Errors
    /// [`DatabaseError::NotFound`] when the parent vault is gone.
    pub fn insert_document(&self, document: DocumentRecord) -> Result<(), DatabaseError> {
        let mut tables = self.inner.tables.write();
        if !tables.vaults.contains_key(&document.vault_id) {
            return Err(DatabaseError::NotFound {
                message: "vault does not exist".into(),
                context: Some("documents".into()),
            });
        }

        let seq = tables.seq();
        tables.documents.insert(document.id.clone(), Row { seq, record: document });
        Ok(())
    }

    #[must_use]
    pub fn find_document(&self, id: &str) -> Option<DocumentRecord> {
        self.inner.tables.read().documents.get(id).map(|row| row.record.clone())
    }

    /// Owning `(vault id, user id)` of a document, following the vault link.
    #[must_use]
    pub fn document_owner(&self, id: &str) -> Option<(String, String)> {
        let tables = self.inner.tables.read();
        let vault_id = &tables.documents.get(id)?.record.vault_id;
        let vault = &tables.vaults.get(vault_id)?.record;
        Some((vault.id.clone(), vault.user_id.clone()))
    }

    #[must_use]
    pub fn documents_in_vault(&self, vault_id: &str) -> Vec<DocumentRecord> {
        let tables = self.inner.tables.read();
        newest_first(
            tables.documents.values().filter(|row| row.record.vault_id == vault_id),
            |document| document.created_at,
        )
    }

    pub fn remove_document(&self, id: &str) -> Option<DocumentRecord> {
        self.inner.tables.write().documents.remove(id).map(|row| row.record)
    }
}
