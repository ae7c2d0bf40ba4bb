use async_trait::async_trait;
use dfort_database::Database;

/// User-existence check the token authority runs on every verification, so a token outlives
/// neither its expiry nor its subject.
#[async_trait]
pub trait IdentityLookup: Send + Sync + std::fmt::Debug {
    async fn user_exists(&self, user_id: &str) -> bool;
}

#[async_trait]
impl IdentityLookup for Database {
    async fn user_exists(&self, user_id: &str) -> bool {
        Self::user_exists(self, user_id)
    }
}
