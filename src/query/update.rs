//! UPDATE builder.

use sea_query::{Alias, Query, UpdateStatement, Values};

use crate::dialect::Dialect;
use crate::error::TidelineError;
use crate::mapping::values::{encode_values, Encode, EncodedValues};
use crate::record::SkipKind;

/// Updates rows of a table from an encoded payload.
///
/// The payload is encoded with `skip_update` and zero-skip on: fields holding their
/// zero value are left untouched unless marked `skip_compare`.
///
/// ```
/// use sea_query::ExprTrait;
/// use tideline::{column, Record, TidelineError, UpdateBuilder};
///
/// #[derive(Record, Default)]
/// struct Profile {
///     #[tideline(skip_update)]
///     pub id: i64,
///     pub nickname: String,
///     pub score: i32,
/// }
///
/// let patch = Profile { id: 1, nickname: "neo".into(), score: 0 };
/// let (sql, _) = UpdateBuilder::new("profiles", &patch)?
///     .filter(column("profiles", "id").eq(1))
///     .build()?;
/// assert_eq!(sql, r#"UPDATE "profiles" SET "nickname" = $1 WHERE "profiles"."id" = $2"#);
///
/// let err = UpdateBuilder::new("profiles", &Profile::default()).unwrap_err();
/// assert!(matches!(err, TidelineError::EmptyUpdatePayload { .. }));
/// # Ok::<(), TidelineError>(())
/// ```
#[derive(Debug, Clone)]
pub struct UpdateBuilder {
    table: String,
    values: EncodedValues,
    pub(crate) query: UpdateStatement,
    returning_all: bool,
    pub(crate) dialect: Dialect,
}

impl UpdateBuilder {
    /// # Errors
    ///
    /// Returns [`TidelineError::EmptyUpdatePayload`] if the payload encodes to no
    /// columns, or [`TidelineError::TypeMismatch`] if it is not a record or mapping.
    pub fn new<E: Encode + ?Sized>(table: impl Into<String>, value: &E) -> Result<Self, TidelineError> {
        let table = table.into();
        let values = encode_values(value, SkipKind::Update, true)?;
        if values.is_empty() {
            return Err(TidelineError::EmptyUpdatePayload { table });
        }

        let mut query = Query::update();
        query.table(Alias::new(table.clone()));
        Ok(Self {
            table,
            values,
            query,
            returning_all: false,
            dialect: Dialect::default(),
        })
    }

    /// Add a filter condition, ANDed with earlier ones.
    pub fn filter<F>(mut self, condition: F) -> Self
    where
        F: sea_query::IntoCondition,
    {
        self.query.cond_where(condition.into_condition());
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.query.limit(limit);
        self
    }

    /// Merge more values into the payload; later values win per column.
    ///
    /// # Errors
    ///
    /// Returns [`TidelineError::TypeMismatch`] if `value` is not a record or mapping.
    pub fn set<E: Encode + ?Sized>(mut self, value: &E) -> Result<Self, TidelineError> {
        self.values.extend(encode_values(value, SkipKind::Update, true)?);
        Ok(self)
    }

    pub fn returning_all(mut self) -> Self {
        self.returning_all = true;
        self
    }

    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub(crate) fn table(&self) -> &str {
        &self.table
    }

    /// The encoded payload, in column-name order.
    pub fn values(&self) -> &EncodedValues {
        &self.values
    }

    pub fn statement(&self) -> UpdateStatement {
        let mut stmt = self.query.clone();
        for (column, value) in &self.values {
            stmt.value(Alias::new(column.clone()), value.clone().into_expr());
        }
        if self.returning_all {
            stmt.returning_all();
        }
        stmt
    }

    pub fn build(&self) -> Result<(String, Values), TidelineError> {
        let (sql, values) = self.dialect.build_update(&self.statement());
        log::debug!("compiled update ({} params): {sql}", values.0.len());
        Ok((sql, values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::column;
    use sea_query::{ExprTrait, Value};
    use std::collections::HashMap;

    fn payload(pairs: &[(&str, i32)]) -> HashMap<String, Value> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), Value::from(*value)))
            .collect()
    }

    #[test]
    fn test_update_with_filter() {
        let (sql, values) = UpdateBuilder::new("t", &payload(&[("b", 2), ("a", 1)]))
            .unwrap()
            .filter(column("t", "id").eq(9))
            .build()
            .unwrap();
        assert_eq!(sql, r#"UPDATE "t" SET "a" = $1, "b" = $2 WHERE "t"."id" = $3"#);
        assert_eq!(values.0.len(), 3);
    }

    #[test]
    fn test_empty_payload_fails() {
        let err = UpdateBuilder::new("t", &payload(&[])).unwrap_err();
        assert!(matches!(err, TidelineError::EmptyUpdatePayload { ref table } if table == "t"));
    }

    #[test]
    fn test_set_merges_payloads() {
        let builder = UpdateBuilder::new("t", &payload(&[("a", 1)]))
            .unwrap()
            .set(&payload(&[("a", 5), ("c", 3)]))
            .unwrap();
        assert_eq!(builder.values().len(), 2);
        assert_eq!(builder.values()["a"].as_value(), Some(&Value::Int(Some(5))));
    }

    #[test]
    fn test_returning_all() {
        let (sql, _) = UpdateBuilder::new("t", &payload(&[("a", 1)]))
            .unwrap()
            .returning_all()
            .build()
            .unwrap();
        assert!(sql.ends_with("RETURNING *"), "{sql}");
    }
}
