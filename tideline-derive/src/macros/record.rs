//! Derive macro for `Record`
//!
//! Emits the static descriptor list, the `columns()` accessor aligned with it, and
//! the `ColumnType` / `Encode` impls that let a record be nested or encoded.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

use crate::attributes::{struct_fields, FieldRole};

pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(expanded) => expanded.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let record_name = struct_name.to_string();
    let fields = struct_fields(input, "Record")?;

    let mut descriptor_pushes = Vec::new();
    let mut column_pushes = Vec::new();

    for field in fields.iter().filter(|field| field.visible) {
        let ident = field.ident;
        let field_type = &field.field.ty;

        match field.role {
            FieldRole::Embed => {
                descriptor_pushes.push(quote! {
                    fields.extend(<#field_type as ::tideline::record::Record>::fields().iter().cloned());
                });
                column_pushes.push(quote! {
                    columns.extend(::tideline::record::Record::columns(&self.#ident));
                });
            }
            FieldRole::Column | FieldRole::Nested => {
                let ident_str = ident.to_string();
                let directive_tag = &field.directive_tag;
                let db_tag = &field.db_tag;
                descriptor_pushes.push(quote! {
                    fields.push(::tideline::record::FieldDescriptor::new::<#field_type>(
                        #ident_str,
                        #directive_tag,
                        #db_tag,
                    ));
                });
                column_pushes.push(quote! {
                    columns.push(&self.#ident);
                });
            }
        }
    }

    let expanded = quote! {
        impl ::tideline::record::Record for #struct_name {
            fn record_name() -> &'static str {
                #record_name
            }

            fn fields() -> &'static [::tideline::record::FieldDescriptor] {
                static FIELDS: ::tideline::__private::Lazy<::std::vec::Vec<::tideline::record::FieldDescriptor>> =
                    ::tideline::__private::Lazy::new(|| {
                        let mut fields = ::std::vec::Vec::new();
                        #(#descriptor_pushes)*
                        fields
                    });
                FIELDS.as_slice()
            }

            fn columns(&self) -> ::std::vec::Vec<&dyn ::tideline::record::ColumnType> {
                let mut columns: ::std::vec::Vec<&dyn ::tideline::record::ColumnType> = ::std::vec::Vec::new();
                #(#column_pushes)*
                columns
            }
        }

        impl ::tideline::record::ColumnType for #struct_name {
            fn is_zero(&self) -> bool {
                ::tideline::record::Record::columns(self)
                    .into_iter()
                    .all(|column| ::tideline::record::ColumnType::is_zero(column))
            }

            fn to_value(&self) -> ::tideline::__private::sea_query::Value {
                ::tideline::record::ColumnType::to_json(self).into()
            }

            fn to_json(&self) -> ::tideline::__private::serde_json::Value {
                let fields = <Self as ::tideline::record::Record>::fields();
                let columns = ::tideline::record::Record::columns(self);
                ::tideline::__private::serde_json::Value::Object(
                    fields
                        .iter()
                        .zip(columns)
                        .map(|(field, column)| (field.column_name.clone(), ::tideline::record::ColumnType::to_json(column)))
                        .collect(),
                )
            }

            fn null_value() -> ::tideline::__private::sea_query::Value {
                ::std::option::Option::<::tideline::__private::serde_json::Value>::None.into()
            }

            fn record_fields() -> ::std::option::Option<&'static [::tideline::record::FieldDescriptor]> {
                ::std::option::Option::Some(<Self as ::tideline::record::Record>::fields())
            }
        }

        impl ::tideline::mapping::Encode for #struct_name {
            fn encode(
                &self,
                skip: ::tideline::record::SkipKind,
                apply_zero_skip: bool,
            ) -> ::std::result::Result<::tideline::mapping::EncodedValues, ::tideline::TidelineError> {
                ::tideline::mapping::encode_record(self, skip, apply_zero_skip)
            }
        }
    };

    Ok(expanded)
}
