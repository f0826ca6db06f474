//! Custom column types.
//!
//! A type implementing [`CustomColumn`] controls how its column is selected and how
//! its value is written. Wrapping a field in [`Custom<T>`] hands those hooks to the
//! column mapper and the value encoder.
//!
//! ```
//! use sea_query::{Alias, Expr, Func, Value};
//! use tideline::mapping::columns::ColumnSource;
//! use tideline::record::{ColumnType, CustomColumn};
//!
//! #[derive(Debug, Clone, Default, PartialEq)]
//! struct Email(String);
//!
//! impl ColumnType for Email {
//!     fn is_zero(&self) -> bool { self.0.is_empty() }
//!     fn to_value(&self) -> Value { self.0.clone().into() }
//!     fn to_json(&self) -> serde_json::Value { self.0.clone().into() }
//!     fn null_value() -> Value { Option::<String>::None.into() }
//! }
//!
//! impl CustomColumn for Email {
//!     fn build_read_expression(table: &str, column: &str) -> ColumnSource {
//!         ColumnSource::Expr {
//!             expr: Func::lower(Expr::col((Alias::new(table.to_string()), Alias::new(column.to_string())))).into(),
//!             alias: Some(column.to_string()),
//!         }
//!     }
//!
//!     fn build_write_expression(&self, value: Value) -> Expr {
//!         Func::lower(Expr::val(value)).into()
//!     }
//! }
//! ```

use std::ops::{Deref, DerefMut};

use sea_query::{Expr, Value};

use super::{ColumnType, FieldDescriptor};
use crate::mapping::columns::ColumnSource;

/// Read and write hooks for a column type.
pub trait CustomColumn: ColumnType {
    /// Expression selecting the column from `table`.
    fn build_read_expression(table: &str, column: &str) -> ColumnSource;

    /// Expression written in place of the bound `value`. `value` is normally
    /// `self.to_value()`, or the current time for `now`/`now_utc` fields.
    fn build_write_expression(&self, value: Value) -> Expr;
}

/// Field wrapper exposing a [`CustomColumn`] to the mapper and the encoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Custom<T>(pub T);

impl<T> Custom<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Custom<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> DerefMut for Custom<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

impl<T> From<T> for Custom<T> {
    fn from(value: T) -> Self {
        Custom(value)
    }
}

impl<T: CustomColumn> ColumnType for Custom<T> {
    fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    fn to_value(&self) -> Value {
        self.0.to_value()
    }

    fn to_json(&self) -> serde_json::Value {
        self.0.to_json()
    }

    fn null_value() -> Value {
        T::null_value()
    }

    fn read_expression(table: &str, column: &str) -> Option<ColumnSource> {
        Some(T::build_read_expression(table, column))
    }

    fn write_expression(&self, value: Value) -> Option<Expr> {
        Some(self.0.build_write_expression(value))
    }

    fn record_fields() -> Option<&'static [FieldDescriptor]> {
        None
    }
}

impl<'a, T: may_postgres::types::FromSql<'a>> may_postgres::types::FromSql<'a> for Custom<T> {
    fn from_sql(
        ty: &may_postgres::types::Type,
        raw: &'a [u8],
    ) -> Result<Self, Box<dyn std::error::Error + Sync + Send>> {
        T::from_sql(ty, raw).map(Custom)
    }

    fn from_sql_null(
        ty: &may_postgres::types::Type,
    ) -> Result<Self, Box<dyn std::error::Error + Sync + Send>> {
        T::from_sql_null(ty).map(Custom)
    }

    fn accepts(ty: &may_postgres::types::Type) -> bool {
        T::accepts(ty)
    }
}
