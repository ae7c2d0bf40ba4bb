//! Common imports for feature slices.

pub use crate::domain;
pub use crate::safe_nanoid;
pub use crate::security::resource::ResourceGuard;
#[cfg(feature = "server")]
pub use crate::server::{
    ApiError, ApiErrorExt, ApiJson, ApiResult, ApiState, RequesterContext,
};
