#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros shared by the `DataFort` crates.
//! They remove the boilerplate around error enums, HTTP DTOs, `OpenAPI` handlers and
//! feature slices so every slice is wired the same way.
//!
//! The examples below are `ignore`d because a proc-macro crate cannot use its own
//! macros in doctests; the consuming crates exercise them in their tests.

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, ItemFn, ItemStruct, parse_macro_input};

/// Attribute macro to define a standard API data model.
///
/// # Injected Behaviors
///
/// * **Derives**: Adds `Debug`, `Serialize` and `Deserialize` if missing.
/// * **`OpenAPI`**: Adds `utoipa::ToSchema` unless it is already derived.
/// * **Serde Policy**:
///     * `rename_all = "camelCase"` by default (can be overridden).
///     * `deny_unknown_fields` by default (can be disabled).
///
/// # Example
///
/// ```rust,ignore
/// use dfort_derive::api_model;
///
/// #[api_model(deny_unknown_fields = false)]
/// pub struct VaultView {
///     pub id: String,
///     pub credential_count: usize,
/// }
/// ```
#[proc_macro_attribute]
pub fn api_model(attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemStruct);
    macros::api::expand_api_model(attr.into(), input).into()
}

/// Attribute macro bridging Axum handlers with `OpenAPI` documentation.
///
/// Accepts the regular `utoipa::path` arguments (`get`, `post`, `path = "..."`,
/// `responses(...)`, `tag = "..."`, `security(...)`) and forwards them verbatim.
///
/// # Example
///
/// ```rust,ignore
/// use dfort_derive::api_handler;
///
/// #[api_handler(
///     get,
///     path = "/health",
///     responses((status = OK, body = HealthResponse)),
///     tag = "System"
/// )]
/// pub async fn health_handler() -> Json<HealthResponse> {
///     // ...
/// }
/// ```
#[proc_macro_attribute]
pub fn api_handler(args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);
    macros::api::expand_api_handler(args.into(), input).into()
}

/// Attribute macro for crate-level error enums.
///
/// # Features
///
/// * **Automatic Derives**: Injects `#[derive(Debug, thiserror::Error)]`.
/// * **Context Support**: Generates a companion `...Ext` trait that adds `.context()`
///   to any `Result` that can be converted into this error type.
/// * **Standard Conversions**: Implements `From<T>` for variants with a `source` field.
/// * **Internal Fallback**: `From<&'static str>` and `From<String>` when an `Internal`
///   variant is present.
/// * **Kind Tag**: A `kind()` method returning the variant name, used as a structured
///   logging field.
///
/// # Requirements
///
/// 1. The macro must be applied to an **enum** with named-field variants.
/// 2. Context fields must be `context: Option<Cow<'static, str>>`.
/// 3. Variants with a `source` field must also carry a `context` field.
///
/// # Example
///
/// ```rust,ignore
/// use dfort_derive::dfort_error;
/// use std::borrow::Cow;
///
/// #[dfort_error]
/// pub enum StorageError {
///     #[error("I/O error{}: {source}", format_context(.context))]
///     Io { source: std::io::Error, context: Option<Cow<'static, str>> },
///
///     #[error("Internal fault{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
///
/// fn load() -> Result<Vec<u8>, StorageError> {
///     std::fs::read("blob").context("Reading blob")
/// }
/// ```
#[proc_macro_attribute]
pub fn dfort_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand_derive(input).into()
}

/// Attribute macro to define a feature slice handle.
///
/// 1. Generates a thread-safe `Arc` wrapper around `<Name>Inner`.
/// 2. Implements `Deref` for transparent access to the inner state.
/// 3. Implements `FeatureSlice` so the kernel can register it.
///
/// # Example
/// ```rust,ignore
/// #[dfort_derive::feature_slice]
/// pub struct AuditSlice {
///     pub recorder: AuditRecorder,
/// }
///
/// let slice = AuditSlice::new(AuditSliceInner { recorder });
/// ```
#[proc_macro_attribute]
pub fn feature_slice(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(item as ItemStruct);
    macros::slice::expand_slice(input).into()
}
