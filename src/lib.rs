//! # Tideline
//!
//! Struct-driven SQL statement building and pagination over `sea-query` and
//! `may_postgres`.
//!
//! A struct deriving [`Record`] describes a table row: which fields map to which
//! columns, which statements skip them, and how zero or absent values are treated.
//! From that descriptor Tideline builds SELECT column lists, INSERT/UPDATE value
//! maps, aliased join selections, and offset or keyset paginators.
//!
//! ```
//! use tideline::{InsertBuilder, Record, SelectBuilder};
//!
//! #[derive(Record, Default)]
//! struct Invoice {
//!     #[tideline(skip_insert)]
//!     pub id: i64,
//!     #[db = "customer_ref"]
//!     pub customer: String,
//!     pub total_cents: i64,
//! }
//!
//! let (select, _) = SelectBuilder::<Invoice>::new("invoices").build()?;
//! assert!(select.starts_with(
//!     r#"SELECT "invoices"."id", "invoices"."customer_ref", "invoices"."total_cents" FROM "invoices""#
//! ));
//!
//! let invoice = Invoice { id: 0, customer: "c-17".into(), total_cents: 4200 };
//! let (insert, _) = InsertBuilder::one("invoices", &invoice)?.build()?;
//! assert_eq!(insert, r#"INSERT INTO "invoices" ("customer_ref", "total_cents") VALUES ($1, $2)"#);
//! # Ok::<(), tideline::TidelineError>(())
//! ```

extern crate self as tideline;

pub mod config;
pub mod dialect;
pub mod error;
pub mod executor;
pub mod mapping;
pub mod pagination;
pub mod query;
pub mod record;
pub mod row;
pub mod session;
#[cfg(feature = "tracing")]
pub mod tracing_helpers;

pub use config::TidelineConfig;
pub use dialect::Dialect;
pub use error::TidelineError;
pub use executor::{check_database_url, ExecError, Executor, MayPostgresExecutor};
pub use mapping::{
    encode_record, encode_values, flatten_selection, map_columns, map_fields, AliasedColumn, ColumnEntry,
    ColumnSource, Encode, EncodedValues, SqlValue,
};
pub use pagination::{FetchedPage, PageCursor, PageRequest, PaginationOptions, Paginator, PaginatorState};
pub use query::{column, paginate_query_by_keyset, DeleteBuilder, InsertBuilder, JoinOp, SelectBuilder, UpdateBuilder};
pub use record::{ColumnType, Custom, CustomColumn, FieldDescriptor, FieldDirective, Record, SkipKind};
pub use row::FromRow;
pub use session::Session;

// Derive macros share their traits' names.
pub use tideline_derive::{FromRow, Record};

#[doc(hidden)]
pub mod __private {
    pub use may_postgres;
    pub use once_cell::sync::Lazy;
    pub use sea_query;
    pub use serde_json;
}
