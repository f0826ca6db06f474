//! DELETE builder.

use sea_query::{Alias, DeleteStatement, Query, Values};

use crate::dialect::Dialect;
use crate::error::TidelineError;

/// Deletes rows of a table.
#[derive(Debug, Clone)]
pub struct DeleteBuilder {
    table: String,
    pub(crate) query: DeleteStatement,
    pub(crate) dialect: Dialect,
}

impl DeleteBuilder {
    pub fn new(table: impl Into<String>) -> Self {
        let table = table.into();
        let mut query = Query::delete();
        query.from_table(Alias::new(table.clone()));
        Self {
            table,
            query,
            dialect: Dialect::default(),
        }
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

    pub fn returning_all(mut self) -> Self {
        self.query.returning_all();
        self
    }

    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub(crate) fn table(&self) -> &str {
        &self.table
    }

    pub fn statement(&self) -> DeleteStatement {
        self.query.clone()
    }

    pub fn build(&self) -> Result<(String, Values), TidelineError> {
        let (sql, values) = self.dialect.build_delete(&self.query);
        log::debug!("compiled delete ({} params): {sql}", values.0.len());
        Ok((sql, values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::column;
    use sea_query::ExprTrait;

    #[test]
    fn test_delete_with_filter() {
        let (sql, values) = DeleteBuilder::new("sessions")
            .filter(column("sessions", "expired").eq(true))
            .build()
            .unwrap();
        assert_eq!(sql, r#"DELETE FROM "sessions" WHERE "sessions"."expired" = $1"#);
        assert_eq!(values.0.len(), 1);
    }

    #[test]
    fn test_delete_returning() {
        let (sql, _) = DeleteBuilder::new("sessions").returning_all().build().unwrap();
        assert_eq!(sql, r#"DELETE FROM "sessions" RETURNING *"#);
    }
}
