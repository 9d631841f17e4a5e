//! Procedural macros for the docmap project.
//!
//! Provides `#[derive(Fields)]`, which records a model's declared field
//! names at compile time so the runtime can tell declared fields apart from
//! dynamic extras.

#[allow(unused_extern_crates)]
extern crate self as docmap_macros;

use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields as SynFields, LitStr, parse_macro_input};

/// Derives `docmap_core::fields::Fields` for a named-field struct.
///
/// Field names honor `#[serde(rename = "...")]`, so the declared names
/// always match the keys the model serializes to.
///
/// ```ignore
/// #[derive(Debug, Clone, Default, Serialize, Deserialize, Fields)]
/// pub struct Person {
///     pub name: Option<String>,
///     #[serde(rename = "email_address")]
///     pub email: Option<String>,
/// }
/// ```
#[proc_macro_derive(Fields)]
pub fn derive_fields(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            SynFields::Named(named) => &named.named,
            _ => {
                return syn::Error::new_spanned(
                    &input.ident,
                    "Fields can only be derived for structs with named fields",
                )
                .to_compile_error()
                .into();
            }
        },
        _ => {
            return syn::Error::new_spanned(&input.ident, "Fields can only be derived for structs")
                .to_compile_error()
                .into();
        }
    };

    let mut names = Vec::with_capacity(fields.len());
    for field in fields {
        match serialized_name(field) {
            Ok(Some(renamed)) => names.push(renamed),
            Ok(None) => match &field.ident {
                Some(ident) => names.push(ident.to_string()),
                None => continue,
            },
            Err(error) => return error.to_compile_error().into(),
        }
    }

    let ident = &input.ident;
    let model_name = ident.to_string();
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    quote! {
        impl #impl_generics ::docmap_core::fields::Fields for #ident #ty_generics #where_clause {
            fn model_name() -> &'static str {
                #model_name
            }

            fn field_names() -> &'static [&'static str] {
                &[#(#names),*]
            }
        }
    }
    .into()
}

/// The `#[serde(rename = "...")]` value for a field, if any.
fn serialized_name(field: &syn::Field) -> syn::Result<Option<String>> {
    let mut renamed = None;

    for attr in &field.attrs {
        if !attr.path().is_ident("serde") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                let value: LitStr = meta.value()?.parse()?;
                renamed = Some(value.value());
            } else if let Ok(value) = meta.value() {
                // Other serde keys (default, skip_serializing_if, ...) are
                // none of our business; consume their values and move on.
                let _: syn::Expr = value.parse()?;
            }

            Ok(())
        })?;
    }

    Ok(renamed)
}
