//! Procedural macros for Tideline
//!
//! This crate provides the `Record` and `FromRow` derives. Both read the same field
//! attributes:
//!
//! - `#[tideline(skip_select, skip_insert, skip_update, skip_delete, skip_compare, now, now_utc)]`
//! - `#[db = "column_name,omitempty,omitnil"]`
//! - `#[record(embed)]` flattens an embedded record's fields into the outer one
//! - `#[record(nested)]` marks a joined sub-record, scanned from `"<table>.<column>"`

mod attributes;
mod macros;

use proc_macro::TokenStream;

/// Derive macro for `Record` - generates the field descriptor and value accessors
///
/// This macro generates:
/// - `Record` implementation (static descriptor list, `columns()` accessor)
/// - `ColumnType` implementation, so the struct can be nested in another record
/// - `Encode` implementation, so instances can be passed to the statement builders
///
/// Only structs with named fields and no generic parameters are supported. Private
/// fields are invisible to the descriptor.
#[proc_macro_derive(Record, attributes(tideline, db, record))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    macros::derive_record(input)
}

/// Derive macro for `FromRow` - generates FromRow trait implementation
///
/// Columns are read by the same resolved names the `Record` derive uses. Private and
/// `skip_select` fields are not selected and take their `Default` value.
#[proc_macro_derive(FromRow, attributes(tideline, db, record))]
pub fn derive_from_row(input: TokenStream) -> TokenStream {
    macros::derive_from_row(input)
}
