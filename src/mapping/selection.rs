//! Join selection flattening.
//!
//! A selection record groups other records, one per joined table:
//!
//! ```
//! use tideline::{flatten_selection, Record};
//!
//! #[derive(Record, Default)]
//! struct User {
//!     pub id: i64,
//!     pub name: String,
//! }
//!
//! #[derive(Record, Default)]
//! struct Order {
//!     pub id: i64,
//!     pub user_id: i64,
//! }
//!
//! #[derive(Record, Default)]
//! struct OrderWithUser {
//!     #[record(nested)]
//!     #[db = "orders"]
//!     pub order: Order,
//!     #[record(nested)]
//!     #[db = "users"]
//!     pub user: User,
//! }
//!
//! let aliases: Vec<_> = flatten_selection::<OrderWithUser>()
//!     .into_iter()
//!     .map(|column| column.alias)
//!     .collect();
//! assert_eq!(aliases, vec!["orders.id", "orders.user_id", "users.id", "users.name"]);
//! ```
//!
//! Each record-typed field becomes a table qualifier (its resolved column name) and
//! each of its selectable columns is aliased `"<table>.<column>"`, the layout the
//! `FromRow` derive reads nested records back from.

use sea_query::{Alias, Expr, SelectStatement};

use super::columns::{map_fields, ColumnSource};
use crate::record::{Record, SkipKind};

/// A column of a joined table, aliased for the combined result set.
#[derive(Debug, Clone, PartialEq)]
pub struct AliasedColumn {
    pub table: String,
    pub column: String,
    pub alias: String,
    pub expr: Expr,
}

impl AliasedColumn {
    pub fn select_into(&self, stmt: &mut SelectStatement) {
        stmt.expr_as(self.expr.clone(), Alias::new(self.alias.clone()));
    }
}

/// Flatten the record-typed fields of `J` into aliased columns.
///
/// Fields that are not records are ignored; sub-records are not recursed into.
pub fn flatten_selection<J: Record>() -> Vec<AliasedColumn> {
    let mut selection = Vec::new();

    for field in J::fields() {
        let Some(sub_fields) = field.nested_fields() else {
            continue;
        };
        let table = field.column_name.as_str();

        for entry in map_fields(table, sub_fields, SkipKind::Select) {
            let default_alias = format!("{table}.{}", entry.name);
            let (expr, alias) = match &entry.source {
                ColumnSource::Expr { expr, alias: Some(alias) } => (expr.clone(), alias.clone()),
                source => (source.to_expr(), default_alias),
            };
            selection.push(AliasedColumn {
                table: table.to_string(),
                column: entry.name,
                alias,
                expr,
            });
        }
    }

    selection
}
