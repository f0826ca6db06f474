//! Error classification.
//!
//! Distinguishes "no rows found" from other failures so single-row lookups can
//! report absence as `Ok(None)`.

use crate::error::TidelineError;
use crate::executor::ExecError;

fn mentions_no_rows(message: &str) -> bool {
    let message = message.to_lowercase();
    // Only match specific "no rows" patterns, not the broad "not found"
    message.contains("no rows")
        || message.contains("no row")
        || message.contains("row not found")
        || message.contains("expected one row")
}

/// Check if an error represents a "no rows found" condition.
///
/// Table, column or function "not found" errors are not matched.
pub fn is_no_rows_error(error: &ExecError) -> bool {
    match error {
        ExecError::Postgres(pg_error) => mentions_no_rows(&pg_error.to_string()),
        ExecError::Query(msg) | ExecError::Other(msg) => mentions_no_rows(msg),
        ExecError::Scan(_) | ExecError::Connect(_) => false,
    }
}

/// Map a "no rows" failure to `Ok(None)` and wrap anything else with `context`.
pub(crate) fn absent_if_no_rows<T>(
    result: Result<T, ExecError>,
    context: &str,
) -> Result<Option<T>, TidelineError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if is_no_rows_error(&e) => {
            log::debug!("{context}: no rows");
            Ok(None)
        }
        Err(e) => Err(TidelineError::execution(context, e)),
    }
}
