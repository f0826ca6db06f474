//! Row scanning.

use std::fmt::Display;

use may_postgres::Row;

use crate::executor::ExecError;

/// Trait for types that can be created from a database row
///
/// Derived with `#[derive(FromRow)]`. Columns are looked up by the field's resolved
/// column name; nested records marked `#[record(nested)]` read their columns from
/// `"<table>.<column>"` aliases, the layout produced by join selections.
///
/// Driver errors convert into [`ExecError`] with `?`.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> Result<Self, ExecError> {
        Self::from_row_prefixed(row, "")
    }

    /// Scan with every column name prefixed by `prefix`.
    fn from_row_prefixed(row: &Row, prefix: &str) -> Result<Self, ExecError>;
}

/// Narrow a signed column value into an unsigned field.
///
/// PostgreSQL has no unsigned integers, so unsigned fields are read as the next
/// wider signed type. Negative or oversized values fail instead of wrapping.
#[doc(hidden)]
pub fn narrow<T, S>(value: S, column: &str) -> Result<T, ExecError>
where
    T: TryFrom<S>,
    S: Copy + Display,
{
    T::try_from(value).map_err(|_| {
        ExecError::Scan(format!(
            "column {column}: {value} is out of range for {}",
            std::any::type_name::<T>()
        ))
    })
}

/// Scan every row, failing on the first row that does not fit.
pub(crate) fn scan_rows<T: FromRow>(rows: &[Row]) -> Result<Vec<T>, ExecError> {
    rows.iter().map(scan_row).collect()
}

pub(crate) fn scan_row<T: FromRow>(row: &Row) -> Result<T, ExecError> {
    T::from_row(row).map_err(|e| match e {
        ExecError::Postgres(e) => ExecError::Scan(format!("Failed to parse row: {e}")),
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_narrow_keeps_values_in_range() {
        assert_eq!(narrow::<u8, i16>(255, "level").unwrap(), 255);
        assert_eq!(narrow::<u32, i64>(0, "karma").unwrap(), 0);
        assert_eq!(narrow::<u64, i64>(i64::MAX, "total").unwrap(), i64::MAX as u64);
    }

    #[test]
    fn test_narrow_rejects_negative_and_oversized_values() {
        let err = narrow::<u32, i64>(-1, "karma").unwrap_err();
        assert!(matches!(err, ExecError::Scan(_)));
        assert_eq!(err.to_string(), "Scan error: column karma: -1 is out of range for u32");

        assert!(narrow::<u16, i32>(70_000, "port").is_err());
        assert!(narrow::<u8, i16>(-128, "level").is_err());
    }
}
