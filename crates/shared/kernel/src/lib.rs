//! Kernel utilities shared across `DataFort` slices.
//! Keep this crate lightweight: ids, config loading, resource-id checks and, behind the `server`
//! feature, the pieces every HTTP slice needs (state, errors, extractors, rate limiting).
//!
//! ## ID generation
//! Use `safe_nanoid!` for URL-safe, unambiguous IDs:
//! ```rust
//! # use dfort_kernel::safe_nanoid;
//! let id = safe_nanoid!();
//! assert_eq!(id.len(), dfort_kernel::ID_LEN);
//! ```
//!
//! ## Config loading
//! ```rust,no_run
//! use dfort_kernel::config::load_config;
//! use dfort_kernel::domain::config::ApiConfig;
//!
//! let cfg: ApiConfig = load_config(Some("config")).unwrap_or_default();
//! ```
pub mod config;
pub mod prelude;
pub mod security;
#[cfg(feature = "server")]
pub mod server;

/// Length of every id minted by the API.
pub const ID_LEN: usize = 16;

// Alphabet excludes visually ambiguous characters (I, O, l, 0, 1).
pub const SAFE_ALPHABET: &[char; 55] = &[
    '2', '3', '4', '5', '6', '7', '8', '9', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'J', 'K', 'L',
    'M', 'N', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', 'a', 'b', 'c', 'd', 'e', 'f',
    'g', 'h', 'j', 'k', 'm', 'n', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];

pub use dfort_domain as domain;
pub use nanoid::nanoid;

/// Generates an unambiguous `NanoID` (no visually confusing characters).
#[macro_export]
macro_rules! safe_nanoid {
    () => {
        $crate::nanoid!(($crate::ID_LEN), $crate::SAFE_ALPHABET)
    };
    ($size:expr) => {
        $crate::nanoid!(($size), $crate::SAFE_ALPHABET)
    };
}
