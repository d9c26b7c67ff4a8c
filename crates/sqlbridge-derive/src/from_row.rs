//! FromRow derive macro implementation

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Result};

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "FromRow can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "FromRow can only be derived for structs",
            ));
        }
    };

    let field_extracts = fields
        .iter()
        .map(|field| {
            let Some(field_name) = field.ident.as_ref() else {
                return Err(syn::Error::new_spanned(field, "expected a named field"));
            };
            let column_name = column_name(field)?.unwrap_or_else(|| field_name.to_string());
            Ok(quote! {
                #field_name: row.try_get(#column_name)?
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(quote! {
        impl #impl_generics ::sqlbridge::FromRow for #name #ty_generics #where_clause {
            fn from_row(row: &::sqlbridge::Row) -> ::sqlbridge::DbResult<Self> {
                Ok(Self {
                    #(#field_extracts),*
                })
            }
        }
    })
}

/// The `#[sqlbridge(column = "...")]` override, if any.
fn column_name(field: &syn::Field) -> Result<Option<String>> {
    let mut column = None;
    for attr in &field.attrs {
        if !attr.path().is_ident("sqlbridge") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("column") {
                let lit: syn::LitStr = meta.value()?.parse()?;
                column = Some(lit.value());
                Ok(())
            } else {
                Err(meta.error("unsupported sqlbridge attribute; expected `column = \"...\"`"))
            }
        })?;
    }
    Ok(column)
}
