use fxhash::FxHashSet;
use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::parse::Parser;
use syn::{Attribute, ItemFn, ItemStruct, LitBool, LitStr};

#[derive(Default)]
struct ModelArgs {
    rename_all: Option<LitStr>,
    deny_unknown_fields: Option<LitBool>,
}

/// Serde settings the struct already declares itself.
#[derive(Default)]
struct ExistingSerde {
    rename_all: Option<LitStr>,
    deny_unknown_fields: bool,
}

/// Expands `#[api_model]`: DTO derives, `ToSchema`, camelCase and strict fields.
pub fn expand_api_model(args: TokenStream, input: ItemStruct) -> TokenStream {
    let args = match parse_model_args(args) {
        Ok(args) => args,
        Err(err) => return err.to_compile_error(),
    };
    let existing = match existing_serde(&input.attrs) {
        Ok(existing) => existing,
        Err(err) => return err.to_compile_error(),
    };
    let derived = derived_traits(&input.attrs);

    let mut derives = Vec::new();
    for (name, path) in [
        ("Debug", quote! { Debug }),
        ("Serialize", quote! { ::serde::Serialize }),
        ("Deserialize", quote! { ::serde::Deserialize }),
        ("ToSchema", quote! { ::utoipa::ToSchema }),
    ] {
        if !derived.contains(name) {
            derives.push(path);
        }
    }
    let derive_attr = if derives.is_empty() {
        TokenStream::new()
    } else {
        quote! { #[derive(#(#derives),*)] }
    };

    let rename = args.rename_all.unwrap_or_else(|| LitStr::new("camelCase", Span::call_site()));
    let rename_attr = match &existing.rename_all {
        Some(current) if current.value() != rename.value() => {
            return syn::Error::new_spanned(
                current,
                "Conflicting serde rename_all; drop it or pass the same value to api_model",
            )
            .to_compile_error();
        },
        Some(_) => TokenStream::new(),
        None => quote! { #[serde(rename_all = #rename)] },
    };

    let deny = args.deny_unknown_fields.as_ref().is_none_or(LitBool::value);
    let deny_attr = match (existing.deny_unknown_fields, deny) {
        (true, false) => {
            return syn::Error::new_spanned(
                &input.ident,
                "deny_unknown_fields is already set via serde; remove it before disabling",
            )
            .to_compile_error();
        },
        (false, true) => quote! { #[serde(deny_unknown_fields)] },
        _ => TokenStream::new(),
    };

    quote! {
        #derive_attr
        #rename_attr
        #deny_attr
        #input
    }
}

/// Expands `#[api_handler]` into a `utoipa::path` annotated handler.
pub fn expand_api_handler(args: TokenStream, input: ItemFn) -> TokenStream {
    let ItemFn { attrs, vis, sig, block } = input;

    quote! {
        #(#attrs)*
        #[allow(clippy::unused_async)]
        #[::utoipa::path(#args)]
        #vis #sig #block
    }
}

fn parse_model_args(args: TokenStream) -> syn::Result<ModelArgs> {
    let mut parsed = ModelArgs::default();

    let parser = syn::meta::parser(|meta| {
        if meta.path.is_ident("rename_all") {
            if parsed.rename_all.is_some() {
                return Err(meta.error("Duplicate argument"));
            }
            parsed.rename_all = Some(meta.value()?.parse()?);
            Ok(())
        } else if meta.path.is_ident("deny_unknown_fields") {
            if parsed.deny_unknown_fields.is_some() {
                return Err(meta.error("Duplicate argument"));
            }
            parsed.deny_unknown_fields = Some(meta.value()?.parse()?);
            Ok(())
        } else {
            Err(meta.error("Unsupported argument; expected rename_all or deny_unknown_fields"))
        }
    });

    parser.parse2(args)?;
    Ok(parsed)
}

fn existing_serde(attrs: &[Attribute]) -> syn::Result<ExistingSerde> {
    let mut existing = ExistingSerde::default();

    for attr in attrs.iter().filter(|a| a.path().is_ident("serde")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename_all") {
                existing.rename_all = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("deny_unknown_fields") {
                existing.deny_unknown_fields = true;
            } else if meta.input.peek(syn::Token![=]) {
                let _: syn::Expr = meta.value()?.parse()?;
            }
            Ok(())
        })?;
    }

    Ok(existing)
}

fn derived_traits(attrs: &[Attribute]) -> FxHashSet<String> {
    let mut traits = FxHashSet::default();

    for attr in attrs.iter().filter(|a| a.path().is_ident("derive")) {
        let _ = attr.parse_nested_meta(|meta| {
            if let Some(last) = meta.path.segments.last() {
                traits.insert(last.ident.to_string());
            }
            Ok(())
        });
    }

    traits
}
