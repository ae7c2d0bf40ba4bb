//! HTTP building blocks shared by every feature router.

mod context;
mod error;
mod extract;
mod health;
mod rate_limit;
pub mod router;
mod state;

pub use context::RequesterContext;
pub use error::{ApiError, ApiErrorExt, ApiResult};
pub use extract::ApiJson;
pub use rate_limit::{RateLimiter, enforce_rate_limit};
pub use state::{ApiState, ApiStateBuilder, ApiStateError, ApiStateErrorExt, ApiStateInner};
