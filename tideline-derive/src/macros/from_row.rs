//! Derive macro for `FromRow` trait
//!
//! This macro generates the `FromRow` implementation for converting
//! `may_postgres::Row` into a record struct. Column names are resolved at runtime
//! through `tideline::record::tag::resolve_column_name`, the same function the
//! record descriptor uses.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

use crate::attributes::{struct_fields, FieldAttributes, FieldRole};

/// Generate FromRow implementation for a record struct
pub fn derive_from_row(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(expanded) => expanded.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let fields = struct_fields(input, "FromRow")?;

    let from_row_fields: Vec<TokenStream2> = fields
        .iter()
        .map(|field| {
            let field_name = field.ident;
            let get_expr = field_expr(field);
            quote! {
                #field_name: #get_expr,
            }
        })
        .collect();

    Ok(quote! {
        impl ::tideline::FromRow for #struct_name {
            fn from_row_prefixed(
                row: &::tideline::__private::may_postgres::Row,
                prefix: &str,
            ) -> ::std::result::Result<Self, ::tideline::ExecError> {
                ::std::result::Result::Ok(Self {
                    #(#from_row_fields)*
                })
            }
        }
    })
}

fn field_expr(field: &FieldAttributes<'_>) -> TokenStream2 {
    let field_type = &field.field.ty;

    if !field.visible || (field.role == FieldRole::Column && field.has_directive("skip_select")) {
        return quote! { ::std::default::Default::default() };
    }

    let ident_str = field.ident.to_string();
    let db_tag = &field.db_tag;
    let column_name = quote! {
        ::tideline::record::tag::resolve_column_name(#ident_str, #db_tag)
    };

    match field.role {
        FieldRole::Embed => quote! {
            <#field_type as ::tideline::FromRow>::from_row_prefixed(row, prefix)?
        },
        FieldRole::Nested => quote! {
            {
                let table = #column_name;
                <#field_type as ::tideline::FromRow>::from_row_prefixed(row, &format!("{prefix}{table}."))?
            }
        },
        FieldRole::Column => {
            // Postgres has no unsigned integers; read the next wider signed type.
            let get = match signed_equivalent(field_type) {
                Some(signed_type) => quote! {
                    {
                        let val: #signed_type = row.try_get(name.as_str())?;
                        ::tideline::row::narrow::<#field_type, #signed_type>(val, &name)?
                    }
                },
                None => quote! {
                    row.try_get::<_, #field_type>(name.as_str())?
                },
            };
            quote! {
                {
                    let name = format!("{}{}", prefix, #column_name);
                    #get
                }
            }
        }
    }
}

fn signed_equivalent(field_type: &syn::Type) -> Option<TokenStream2> {
    let syn::Type::Path(syn::TypePath { qself: None, path }) = field_type else {
        return None;
    };
    let segment = path.segments.last()?;
    if path.segments.len() != 1 {
        return None;
    }
    match segment.ident.to_string().as_str() {
        "u8" => Some(quote! { i16 }),
        "u16" => Some(quote! { i32 }),
        "u32" | "u64" => Some(quote! { i64 }),
        _ => None,
    }
}
