//! INSERT builder.

use sea_query::{Alias, InsertStatement, Query, Values};

use crate::dialect::Dialect;
use crate::error::TidelineError;
use crate::mapping::values::{encode_values, Encode, EncodedValues, SqlValue};
use crate::record::SkipKind;

#[derive(Debug, Clone)]
enum Returning {
    Nothing,
    All,
    Columns(Vec<String>),
}

/// Inserts one or more encoded rows into a table.
///
/// Rows are encoded with `skip_insert` and without zero-skip, so zero values are
/// written. Every row must produce the same column set.
///
/// ```
/// use tideline::{InsertBuilder, Record};
///
/// #[derive(Record, Default)]
/// struct Event {
///     #[tideline(skip_insert)]
///     pub id: i64,
///     pub kind: String,
///     pub weight: i32,
/// }
///
/// let (sql, values) = InsertBuilder::new("events")
///     .row(&Event { id: 0, kind: "click".into(), weight: 0 })?
///     .returning_all()
///     .build()?;
/// assert_eq!(sql, r#"INSERT INTO "events" ("kind", "weight") VALUES ($1, $2) RETURNING *"#);
/// assert_eq!(values.0.len(), 2);
/// # Ok::<(), tideline::TidelineError>(())
/// ```
#[derive(Debug, Clone)]
pub struct InsertBuilder {
    table: String,
    rows: Vec<EncodedValues>,
    returning: Returning,
    pub(crate) dialect: Dialect,
}

impl InsertBuilder {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            rows: Vec::new(),
            returning: Returning::Nothing,
            dialect: Dialect::default(),
        }
    }

    /// Builder for a single row.
    pub fn one<E: Encode + ?Sized>(table: impl Into<String>, value: &E) -> Result<Self, TidelineError> {
        Self::new(table).row(value)
    }

    /// Builder for several rows.
    pub fn many<'a, E, I>(table: impl Into<String>, values: I) -> Result<Self, TidelineError>
    where
        E: Encode + 'a,
        I: IntoIterator<Item = &'a E>,
    {
        values.into_iter().try_fold(Self::new(table), |builder, value| builder.row(value))
    }

    /// Encode and append a row.
    ///
    /// # Errors
    ///
    /// Returns [`TidelineError::TypeMismatch`] if `value` is not a record or mapping.
    pub fn row<E: Encode + ?Sized>(mut self, value: &E) -> Result<Self, TidelineError> {
        self.rows.push(encode_values(value, SkipKind::Insert, false)?);
        Ok(self)
    }

    pub fn returning_all(mut self) -> Self {
        self.returning = Returning::All;
        self
    }

    pub fn returning<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.returning = Returning::Columns(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub(crate) fn table(&self) -> &str {
        &self.table
    }

    /// Assemble the statement.
    ///
    /// # Errors
    ///
    /// Returns [`TidelineError::Build`] when there are no rows or rows disagree on
    /// their columns.
    pub fn statement(&self) -> Result<InsertStatement, TidelineError> {
        let Some(first) = self.rows.first() else {
            return Err(TidelineError::Build(format!("no rows to insert into {}", self.table)));
        };

        let columns: Vec<&String> = first.keys().collect();
        let mut stmt = Query::insert();
        stmt.into_table(Alias::new(self.table.clone()));

        if columns.is_empty() {
            stmt.or_default_values();
        } else {
            stmt.columns(columns.iter().map(|column| Alias::new((*column).clone())));
            for (index, row) in self.rows.iter().enumerate() {
                if !row.keys().eq(columns.iter().copied()) {
                    return Err(TidelineError::Build(format!(
                        "row {index} inserts columns {:?}, expected {:?}",
                        row.keys().collect::<Vec<_>>(),
                        columns
                    )));
                }
                let exprs = row.values().cloned().map(SqlValue::into_expr);
                stmt.values(exprs)
                    .map_err(|e| TidelineError::Build(format!("invalid row {index}: {e}")))?;
            }
        }

        match &self.returning {
            Returning::Nothing => {}
            Returning::All => {
                stmt.returning_all();
            }
            Returning::Columns(columns) => {
                stmt.returning(
                    Query::returning().columns(columns.iter().map(|column| Alias::new(column.clone()))),
                );
            }
        }

        Ok(stmt)
    }

    pub fn build(&self) -> Result<(String, Values), TidelineError> {
        let (sql, values) = self.dialect.build_insert(&self.statement()?);
        log::debug!("compiled insert ({} params): {sql}", values.0.len());
        Ok((sql, values))
    }
}
