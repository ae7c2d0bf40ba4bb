//! Request-independent security helpers.

pub mod resource;

pub use resource::{ResourceGuard, ResourceGuardError};
