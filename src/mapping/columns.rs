//! Column mapping.
//!
//! Produces the ordered list of columns a record contributes to a SELECT, each with
//! the expression that reads it.

use sea_query::{Alias, Expr, SelectStatement};

use crate::error::TidelineError;
use crate::record::{ColumnType, FieldDescriptor, SkipKind};

/// How a column is read.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnSource {
    /// Plain `table.column` reference.
    Column { table: String, column: String },
    /// Backend expression from a custom column, optionally carrying its own alias.
    Expr { expr: Expr, alias: Option<String> },
}

impl ColumnSource {
    /// The source as a standalone expression.
    pub fn to_expr(&self) -> Expr {
        match self {
            ColumnSource::Column { table, column } if table.is_empty() => {
                Expr::col(Alias::new(column.clone()))
            }
            ColumnSource::Column { table, column } => {
                Expr::col((Alias::new(table.clone()), Alias::new(column.clone())))
            }
            ColumnSource::Expr { expr, .. } => expr.clone(),
        }
    }
}

/// One selected column: its logical name and where it is read from.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnEntry {
    pub name: String,
    pub source: ColumnSource,
}

impl ColumnEntry {
    /// Add this column to `stmt`, keeping a custom expression's alias if it has one.
    pub fn select_into(&self, stmt: &mut SelectStatement) {
        match &self.source {
            ColumnSource::Column { table, column } if table.is_empty() => {
                stmt.column(Alias::new(column.clone()));
            }
            ColumnSource::Column { table, column } => {
                stmt.column((Alias::new(table.clone()), Alias::new(column.clone())));
            }
            ColumnSource::Expr { expr, alias: Some(alias) } => {
                stmt.expr_as(expr.clone(), Alias::new(alias.clone()));
            }
            ColumnSource::Expr { expr, alias: None } => {
                stmt.expr(expr.clone());
            }
        }
    }
}

/// Map descriptor-level fields to columns read from `table`.
///
/// Fields skipped for `skip` are left out; declaration order is kept and duplicates
/// are not collapsed.
pub fn map_fields(table: &str, fields: &[FieldDescriptor], skip: SkipKind) -> Vec<ColumnEntry> {
    fields
        .iter()
        .filter(|field| !field.skips(skip))
        .map(|field| ColumnEntry {
            name: field.column_name.clone(),
            source: field.read_source(table),
        })
        .collect()
}

/// Map the record type `T` to columns read from `table`.
///
/// `T` may be a record or an `Option`/`Box` around one.
///
/// # Errors
///
/// Returns [`TidelineError::TypeMismatch`] if `T` is not a record.
pub fn map_columns<T: ColumnType>(table: &str, skip: SkipKind) -> Result<Vec<ColumnEntry>, TidelineError> {
    let fields = T::record_fields().ok_or_else(|| TidelineError::TypeMismatch {
        expected: "record",
        found: std::any::type_name::<T>().to_string(),
    })?;
    Ok(map_fields(table, fields, skip))
}

/// Add every entry to the statement's select list.
pub fn select_columns(stmt: &mut SelectStatement, columns: &[ColumnEntry]) {
    for column in columns {
        column.select_into(stmt);
    }
}
