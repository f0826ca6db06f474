//! SELECT builder.
//!
//! [`SelectBuilder`] selects the columns of a record type from a table. Building
//! methods live here; execution methods (`all`, `one`, `find_one`, `paginate`) are
//! in the execution module.

use std::marker::PhantomData;

use sea_query::{Alias, Asterisk, Expr, ExprTrait, IntoColumnRef, Order, SelectStatement, Value, Values};

use super::JoinOp;
use crate::dialect::Dialect;
use crate::error::TidelineError;
use crate::mapping::columns::{map_fields, select_columns};
use crate::mapping::selection::{flatten_selection, AliasedColumn};
use crate::record::{Record, SkipKind};

#[derive(Debug, Clone)]
enum Selection {
    Record,
    Star,
    Joined(Vec<AliasedColumn>),
}

/// Query builder for selecting records of type `T` from a table.
///
/// # Example
///
/// ```
/// use sea_query::{Alias, ExprTrait, Order};
/// use tideline::{column, Record, SelectBuilder};
///
/// #[derive(Record, Default)]
/// struct User {
///     pub id: i64,
///     pub name: String,
/// }
///
/// let (sql, values) = SelectBuilder::<User>::new("users")
///     .filter(column("users", "name").like("J%"))
///     .order_by((Alias::new("users"), Alias::new("id")), Order::Desc)
///     .limit(10)
///     .build()
///     .unwrap();
/// assert!(sql.starts_with(r#"SELECT "users"."id", "users"."name" FROM "users" WHERE "users"."name" LIKE $1"#));
/// assert!(sql.contains(r#"ORDER BY "users"."id" DESC"#));
/// assert_eq!(values.0[0], "J%".into());
/// ```
#[derive(Debug, Clone)]
pub struct SelectBuilder<T> {
    table: String,
    pub(crate) query: SelectStatement,
    selection: Selection,
    pub(crate) dialect: Dialect,
    pending_error: Option<String>,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> SelectBuilder<T> {
    pub fn new(table: impl Into<String>) -> Self {
        let table = table.into();
        let mut query = SelectStatement::default();
        query.from(Alias::new(table.clone()));
        Self {
            table,
            query,
            selection: Selection::Record,
            dialect: Dialect::default(),
            pending_error: None,
            _record: PhantomData,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Add a filter condition, ANDed with earlier ones.
    pub fn filter<F>(mut self, condition: F) -> Self
    where
        F: sea_query::IntoCondition,
    {
        self.query.cond_where(condition.into_condition());
        self
    }

    pub fn order_by<C: IntoColumnRef>(mut self, column: C, order: Order) -> Self {
        self.query.order_by(column, order);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.query.limit(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.query.offset(offset);
        self
    }

    /// Rows strictly after `values` in `columns` order, ascending.
    ///
    /// Each column is compared on its own (`a > $1 AND b > $2`). Columns are
    /// qualified with the builder's table.
    pub fn keyset<S: AsRef<str>>(mut self, columns: &[S], values: Vec<Value>) -> Self {
        if columns.len() != values.len() {
            self.pending_error = Some(format!(
                "keyset has {} columns but {} values",
                columns.len(),
                values.len()
            ));
            return self;
        }
        for (column, value) in columns.iter().zip(values) {
            let column = (Alias::new(self.table.clone()), Alias::new(column.as_ref().to_string()));
            self.query.and_where(Expr::col(column.clone()).gt(value));
            self.query.order_by(column, Order::Asc);
        }
        self
    }

    /// Select `*` instead of the record's columns.
    pub fn star(mut self) -> Self {
        self.selection = Selection::Star;
        self
    }

    /// Inner-join `joins` and select the flattened columns of `J`.
    pub fn inner_join_selection<J: Record>(mut self, joins: &[JoinOp]) -> Self {
        for join in joins {
            self.query.inner_join(Alias::new(join.table.clone()), join.on.clone());
        }
        self.selection = Selection::Joined(flatten_selection::<J>());
        self
    }

    /// Left-join `joins` and select the flattened columns of `J`.
    pub fn left_join_selection<J: Record>(mut self, joins: &[JoinOp]) -> Self {
        for join in joins {
            self.query.left_join(Alias::new(join.table.clone()), join.on.clone());
        }
        self.selection = Selection::Joined(flatten_selection::<J>());
        self
    }

    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// The statement with its select list filled in.
    ///
    /// # Errors
    ///
    /// Returns [`TidelineError::Build`] if an option was given inconsistent input.
    pub fn statement(&self) -> Result<SelectStatement, TidelineError> {
        if let Some(message) = &self.pending_error {
            return Err(TidelineError::Build(message.clone()));
        }

        let mut stmt = self.query.clone();
        match &self.selection {
            Selection::Record => {
                select_columns(&mut stmt, &map_fields(&self.table, T::fields(), SkipKind::Select));
            }
            Selection::Star => {
                stmt.column(Asterisk);
            }
            Selection::Joined(columns) => {
                for column in columns {
                    column.select_into(&mut stmt);
                }
            }
        }
        Ok(stmt)
    }

    /// Compile to SQL text and bound values for the builder's dialect.
    pub fn build(&self) -> Result<(String, Values), TidelineError> {
        let (sql, values) = self.dialect.build_select(&self.statement()?);
        log::debug!("compiled select ({} params): {sql}", values.0.len());
        Ok((sql, values))
    }
}
