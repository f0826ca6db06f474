//! Statement building and execution.
//!
//! - **Select**: [`SelectBuilder`], columns from the record's descriptor, joins with
//!   flattened selections
//! - **Insert / Update / Delete**: builders over encoded value maps
//! - **Execution**: `all`, `one`, `find_one`, `execute`, `fetch_*`, pagination
//! - **Value Conversion**: SeaQuery `Value` to `ToSql` parameter conversion
//! - **Error Handling**: "no rows" detection
//!
//! # Examples
//!
//! ```no_run
//! use sea_query::ExprTrait;
//! use tideline::{column, Executor, FromRow, Record, SelectBuilder};
//!
//! #[derive(Record, FromRow, Default)]
//! struct User {
//!     pub id: i64,
//!     pub active: bool,
//! }
//!
//! # let executor: &dyn Executor = todo!();
//! let active_users = SelectBuilder::<User>::new("users")
//!     .filter(column("users", "active").eq(true))
//!     .all(executor)?;
//! # Ok::<(), tideline::TidelineError>(())
//! ```

pub mod delete;
pub mod error_handling;
pub mod execution;
pub mod insert;
pub mod select;
pub mod update;
pub mod value_conversion;

pub use delete::DeleteBuilder;
pub use execution::paginate_query_by_keyset;
pub use insert::InsertBuilder;
pub use select::SelectBuilder;
pub use update::UpdateBuilder;

use sea_query::{Alias, Expr};

/// A join: the table to join and the ON condition.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinOp {
    pub table: String,
    pub on: Expr,
}

impl JoinOp {
    pub fn new(table: impl Into<String>, on: Expr) -> Self {
        Self {
            table: table.into(),
            on,
        }
    }
}

/// Qualified column expression `"table"."column"`.
pub fn column(table: &str, column: &str) -> Expr {
    Expr::col((Alias::new(table.to_string()), Alias::new(column.to_string())))
}
