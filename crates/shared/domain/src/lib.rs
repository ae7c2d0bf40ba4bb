//! # Domain Models
//!
//! Pure data shared by every `DataFort` crate: configuration, persisted records, audit
//! vocabulary and the feature slice registry. Keep it lean: no I/O, networking, or heavy
//! logic, only data and simple helpers.
//!
//! Nothing in here ever holds plaintext secrets. Credential and document records carry the
//! client's ciphertext exactly as submitted.

pub mod audit;
pub mod config;
pub mod constants;
pub mod records;
pub mod registry;
