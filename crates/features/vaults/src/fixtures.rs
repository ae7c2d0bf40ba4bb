//! Test data: users `alice` and `bob`, alice's vault `vA7x` holding credential `credA`.

use chrono::Utc;
use dfort_database::Database;
use dfort_domain::records::{CipherFields, CredentialRecord, UserRecord, VaultRecord};

pub(crate) fn seeded() -> Database {
    let database = Database::default();
    let now = Utc::now();
    for user in ["alice", "bob"] {
        database
            .insert_user(UserRecord {
                id: user.into(),
                email: format!("{user}@x.com"),
                password_hash: String::new(),
                kdf_salt: String::new(),
                created_at: now,
            })
            .unwrap();
    }
    database
        .insert_vault(VaultRecord {
            id: "vA7x".into(),
            user_id: "alice".into(),
            name: "Personal".into(),
            description: None,
            icon: None,
            color: None,
            created_at: now,
            updated_at: now,
        })
        .unwrap();
    database
        .insert_credential(CredentialRecord {
            id: "credA".into(),
            vault_id: "vA7x".into(),
            label: "mail".into(),
            url: None,
            cipher: CipherFields {
                encrypted_username: "abc".into(),
                encrypted_password: "def".into(),
                encrypted_notes: None,
                iv: "00".into(),
                auth_tag: "11".into(),
            },
            created_at: now,
            updated_at: now,
        })
        .unwrap();
    database
}
