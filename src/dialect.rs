//! SQL dialects statements can be compiled for.

use sea_query::{
    DeleteStatement, InsertStatement, MysqlQueryBuilder, PostgresQueryBuilder, SelectStatement,
    SqliteQueryBuilder, UpdateStatement, Values,
};
use serde::Deserialize;

/// Target dialect, bound into each builder. Postgres unless configured otherwise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    #[serde(alias = "postgresql")]
    Postgres,
    Mysql,
    Sqlite,
}

macro_rules! dialect_build {
    ($name:ident, $stmt:ty) => {
        pub fn $name(self, stmt: &$stmt) -> (String, Values) {
            match self {
                Dialect::Postgres => stmt.build(PostgresQueryBuilder),
                Dialect::Mysql => stmt.build(MysqlQueryBuilder),
                Dialect::Sqlite => stmt.build(SqliteQueryBuilder),
            }
        }
    };
}

impl Dialect {
    dialect_build!(build_select, SelectStatement);
    dialect_build!(build_insert, InsertStatement);
    dialect_build!(build_update, UpdateStatement);
    dialect_build!(build_delete, DeleteStatement);
}
