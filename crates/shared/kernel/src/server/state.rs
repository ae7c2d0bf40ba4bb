use axum::extract::FromRef;
use dfort_database::Database;
use dfort_domain::config::ApiConfig;
use dfort_domain::registry::{FeatureSlice, InitializedSlice};
use dfort_storage::Storage;
use fxhash::FxHashMap;
use std::any::TypeId;
use std::borrow::Cow;
use std::ops::Deref;
use std::sync::Arc;

#[dfort_derive::dfort_error]
pub enum ApiStateError {
    #[error("State validation error{}: {message}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
    #[error("State missing feature slice{}: {message}", format_context(.context))]
    MissingSlice { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

#[derive(Debug)]
pub struct ApiStateInner {
    pub config: ApiConfig,
    pub database: Database,
    pub storage: Storage,
    slices: FxHashMap<TypeId, InitializedSlice>,
}

/// Application state handed to every router. Cloning is a reference-count bump.
#[derive(Debug, Clone)]
pub struct ApiState {
    inner: Arc<ApiStateInner>,
}

impl ApiState {
    #[must_use]
    pub fn builder() -> ApiStateBuilder {
        ApiStateBuilder::default()
    }

    #[must_use]
    pub fn get_slice<T: FeatureSlice>(&self) -> Option<&T> {
        self.inner
            .slices
            .get(&TypeId::of::<T>())
            .and_then(|initialized| initialized.state.as_any().downcast_ref::<T>())
    }

    /// Returns a reference to the slice if it is registered.
    ///
    /// # Errors
    /// Returns an error if the slice is not registered.
    pub fn try_get_slice<T: FeatureSlice>(&self) -> Result<&T, ApiStateError> {
        self.get_slice::<T>().ok_or_else(|| ApiStateError::MissingSlice {
            message: std::any::type_name::<T>().into(),
            context: None,
        })
    }

    /// Registered slice names, for startup diagnostics.
    pub fn slice_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.inner.slices.values().map(InitializedSlice::name)
    }
}

impl Deref for ApiState {
    type Target = ApiStateInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl FromRef<ApiState> for ApiConfig {
    fn from_ref(state: &ApiState) -> Self {
        state.inner.config.clone()
    }
}

impl FromRef<ApiState> for Database {
    fn from_ref(state: &ApiState) -> Self {
        state.inner.database.clone()
    }
}

impl FromRef<ApiState> for Storage {
    fn from_ref(state: &ApiState) -> Self {
        state.inner.storage.clone()
    }
}

#[derive(Debug, Default)]
pub struct ApiStateBuilder {
    config: Option<ApiConfig>,
    database: Option<Database>,
    storage: Option<Storage>,
    slices: FxHashMap<TypeId, InitializedSlice>,
    duplicates: Vec<&'static str>,
}

impl ApiStateBuilder {
    #[must_use]
    pub fn config(mut self, config: ApiConfig) -> Self {
        self.config = Some(config);
        self
    }

    #[must_use]
    pub fn db(mut self, database: Database) -> Self {
        self.database = Some(database);
        self
    }

    #[must_use]
    pub fn storage(mut self, storage: Storage) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Registers one slice. A second slice of the same type makes [`Self::build`] fail.
    #[must_use]
    pub fn register_slice(mut self, slice: InitializedSlice) -> Self {
        let name = slice.name();
        if self.slices.insert(slice.id, slice).is_some() {
            self.duplicates.push(name);
        }
        self
    }

    #[must_use]
    pub fn register_slices<I>(self, slices: I) -> Self
    where
        I: IntoIterator<Item = InitializedSlice>,
    {
        slices.into_iter().fold(self, Self::register_slice)
    }

    /// # Errors
    /// Returns an error if the config, database or storage was not provided, or a slice was
    /// registered twice.
    pub fn build(self) -> Result<ApiState, ApiStateError> {
        if !self.duplicates.is_empty() {
            return Err(ApiStateError::Validation {
                message: "Feature slice registered more than once".into(),
                context: Some(self.duplicates.join(", ").into()),
            });
        }
        let config = self.config.ok_or_else(|| ApiStateError::Validation {
            message: "ApiConfig not provided".into(),
            context: None,
        })?;
        let database = self.database.ok_or_else(|| ApiStateError::Validation {
            message: "Database not provided".into(),
            context: None,
        })?;
        let storage = self.storage.ok_or_else(|| ApiStateError::Validation {
            message: "Storage not provided".into(),
            context: None,
        })?;

        Ok(ApiState {
            inner: Arc::new(ApiStateInner { config, database, storage, slices: self.slices }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Probe(u8);

    impl FeatureSlice for Probe {
        fn name(&self) -> &'static str {
            "probe"
        }

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    async fn builder(dir: &std::path::Path) -> ApiStateBuilder {
        let storage = Storage::builder().root(dir).connect().await.unwrap();
        ApiState::builder().config(ApiConfig::default()).db(Database::default()).storage(storage)
    }

    #[tokio::test]
    async fn slices_are_found_by_type() {
        let dir = tempfile::tempdir().unwrap();
        let state = builder(dir.path())
            .await
            .register_slice(InitializedSlice::new(Probe(7)))
            .build()
            .unwrap();

        assert_eq!(state.try_get_slice::<Probe>().unwrap().0, 7);
        assert_eq!(state.slice_names().collect::<Vec<_>>(), vec!["probe"]);
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = builder(dir.path())
            .await
            .register_slices([InitializedSlice::new(Probe(1)), InitializedSlice::new(Probe(2))])
            .build()
            .unwrap_err();

        assert!(matches!(err, ApiStateError::Validation { .. }));
        assert!(err.to_string().contains("probe"));
    }

    #[tokio::test]
    async fn missing_slice_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let state = builder(dir.path()).await.build().unwrap();
        assert!(matches!(state.try_get_slice::<Probe>(), Err(ApiStateError::MissingSlice { .. })));
    }

    #[test]
    fn storage_is_required() {
        let err = ApiState::builder()
            .config(ApiConfig::default())
            .db(Database::default())
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("Storage not provided"));
    }
}
