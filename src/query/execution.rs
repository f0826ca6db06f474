//! Query execution methods.
//!
//! Every method compiles its statement with the builder's dialect, converts the
//! bound values with [`with_converted_params`] and hands them to an [`Executor`].
//! Failures come back as [`TidelineError::Execution`] carrying a short context;
//! lookups that may legitimately find nothing return `Ok(None)` instead.

use may_postgres::Row;
use sea_query::{SelectStatement, Values};

use super::error_handling::absent_if_no_rows;
use super::value_conversion::with_converted_params;
use super::{DeleteBuilder, InsertBuilder, SelectBuilder, UpdateBuilder};
use crate::dialect::Dialect;
use crate::error::TidelineError;
use crate::executor::{ExecError, Executor};
use crate::pagination::{FetchedPage, PageRequest, PaginationOptions, Paginator};
use crate::record::Record;
use crate::row::{scan_row, scan_rows, FromRow};

fn query_all<E: Executor + ?Sized>(executor: &E, sql: &str, values: &Values) -> Result<Vec<Row>, ExecError> {
    with_converted_params(values, |params| executor.query_all(sql, params))
}

fn fetch_all<T: FromRow, E: Executor + ?Sized>(
    executor: &E,
    sql: &str,
    values: &Values,
    context: &str,
) -> Result<Vec<T>, TidelineError> {
    query_all(executor, sql, values)
        .and_then(|rows| scan_rows(&rows))
        .map_err(|e| TidelineError::execution(context, e))
}

fn fetch_first<T: FromRow, E: Executor + ?Sized>(
    executor: &E,
    sql: &str,
    values: &Values,
    context: &str,
) -> Result<Option<T>, TidelineError> {
    let result = query_all(executor, sql, values).and_then(|rows| rows.first().map(scan_row).transpose());
    absent_if_no_rows(result, context).map(Option::flatten)
}

fn execute<E: Executor + ?Sized>(
    executor: &E,
    sql: &str,
    values: &Values,
    context: &str,
) -> Result<u64, TidelineError> {
    with_converted_params(values, |params| executor.execute(sql, params))
        .map_err(|e| TidelineError::execution(context, e))
}

fn select_page<T: FromRow, E: Executor + ?Sized>(
    executor: &E,
    dialect: Dialect,
    base: &SelectStatement,
    table: Option<&str>,
    request: &PageRequest,
) -> Result<FetchedPage<T>, TidelineError> {
    let mut stmt = base.clone();
    request.apply_to(&mut stmt, table);
    let (sql, values) = dialect.build_select(&stmt);
    log::debug!("compiled page select ({} params): {sql}", values.0.len());
    fetch_all(executor, &sql, &values, "fetching page").map(FetchedPage::new)
}

impl<T: Record + FromRow> SelectBuilder<T> {
    /// Execute the query and return all results
    ///
    /// ```no_run
    /// use tideline::{Executor, FromRow, Record, SelectBuilder};
    ///
    /// #[derive(Record, FromRow, Default)]
    /// struct User {
    ///     pub id: i64,
    /// }
    ///
    /// # let executor: &dyn Executor = todo!();
    /// let users: Vec<User> = SelectBuilder::new("users").limit(20).all(executor)?;
    /// # Ok::<(), tideline::TidelineError>(())
    /// ```
    pub fn all<E: Executor + ?Sized>(&self, executor: &E) -> Result<Vec<T>, TidelineError> {
        let (sql, values) = self.build()?;
        fetch_all(executor, &sql, &values, &format!("selecting from {}", self.table()))
    }

    /// The statement limited to a single row.
    fn build_single(&self) -> Result<(String, Values), TidelineError> {
        let mut stmt = self.statement()?;
        stmt.limit(1);
        let (sql, values) = self.dialect.build_select(&stmt);
        log::debug!("compiled single-row select ({} params): {sql}", values.0.len());
        Ok((sql, values))
    }

    /// Execute the query limited to one row and return it
    ///
    /// Returns an error if no row matches.
    pub fn one<E: Executor + ?Sized>(&self, executor: &E) -> Result<T, TidelineError> {
        let (sql, values) = self.build_single()?;
        with_converted_params(&values, |params| {
            let row = executor.query_one(&sql, params)?;
            scan_row(&row)
        })
        .map_err(|e| TidelineError::execution(format!("selecting one from {}", self.table()), e))
    }

    /// Execute the query and return the first result, or `None` if there is none.
    pub fn find_one<E: Executor + ?Sized>(&self, executor: &E) -> Result<Option<T>, TidelineError> {
        let (sql, values) = self.build_single()?;
        fetch_first(executor, &sql, &values, &format!("finding one in {}", self.table()))
    }

    /// Paginate this query.
    ///
    /// Keyset pagination over `options.key_set` when it is present and non-empty,
    /// offset pagination otherwise. Any ORDER BY, LIMIT or OFFSET already set is
    /// replaced page by page.
    ///
    /// ```no_run
    /// use tideline::{Executor, FromRow, PaginationOptions, Record, SelectBuilder};
    ///
    /// #[derive(Record, FromRow, Default)]
    /// struct User {
    ///     pub id: i64,
    /// }
    ///
    /// # let executor: &dyn Executor = todo!();
    /// let options = PaginationOptions::default().page_size(100).key_set(["id"]);
    /// let mut pages = SelectBuilder::<User>::new("users").paginate(executor, &options)?;
    /// while pages.has_more_pages() {
    ///     for user in pages.next_page()? {
    ///         println!("{}", user.id);
    ///     }
    /// }
    /// # Ok::<(), tideline::TidelineError>(())
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`TidelineError::UnresolvedColumn`] if a key column names no field of
    /// `T`, or a build error from the underlying statement.
    pub fn paginate<'e, E>(
        &self,
        executor: &'e E,
        options: &PaginationOptions,
    ) -> Result<
        Paginator<T, impl FnMut(PageRequest) -> Result<FetchedPage<T>, TidelineError> + 'e>,
        TidelineError,
    >
    where
        E: Executor + ?Sized,
        T: 'e,
    {
        let base = self.statement()?;
        let table = self.table().to_string();
        let dialect = self.dialect;

        let fetch = move |request: PageRequest| {
            select_page(executor, dialect, &base, Some(table.as_str()), &request)
        };

        let keys: Option<Vec<&str>> = options
            .key_set
            .as_ref()
            .map(|keys| keys.iter().map(String::as_str).collect());
        Paginator::new(options.page_size, keys.as_deref(), fetch)
    }
}

/// Keyset pagination over an arbitrary prebuilt SELECT.
///
/// `keys` name fields of `T` and are used unqualified. Every page clones `statement`
/// and replaces its ORDER BY, LIMIT and OFFSET.
///
/// # Errors
///
/// Returns [`TidelineError::MissingKeySet`] when `keys` is empty and
/// [`TidelineError::UnresolvedColumn`] when a key names no field of `T`.
pub fn paginate_query_by_keyset<'e, T, E>(
    executor: &'e E,
    statement: SelectStatement,
    page_size: u64,
    keys: &[&str],
    dialect: Dialect,
) -> Result<Paginator<T, impl FnMut(PageRequest) -> Result<FetchedPage<T>, TidelineError> + 'e>, TidelineError>
where
    T: Record + FromRow + 'e,
    E: Executor + ?Sized,
{
    let fetch = move |request: PageRequest| select_page(executor, dialect, &statement, None, &request);
    Paginator::keyset(page_size, keys, fetch)
}

impl InsertBuilder {
    /// Execute the insert and return the number of rows affected
    pub fn execute<E: Executor + ?Sized>(&self, executor: &E) -> Result<u64, TidelineError> {
        let (sql, values) = self.build()?;
        execute(executor, &sql, &values, &format!("inserting into {}", self.table()))
    }

    /// Execute the insert and scan the first returned row.
    ///
    /// Returns `Ok(None)` when nothing comes back, e.g. an insert that hit
    /// `ON CONFLICT DO NOTHING`.
    pub fn fetch_one<T: FromRow, E: Executor + ?Sized>(&self, executor: &E) -> Result<Option<T>, TidelineError> {
        let (sql, values) = self.build()?;
        fetch_first(executor, &sql, &values, &format!("inserting into {}", self.table()))
    }

    /// Execute the insert and scan every returned row.
    pub fn fetch_all<T: FromRow, E: Executor + ?Sized>(&self, executor: &E) -> Result<Vec<T>, TidelineError> {
        let (sql, values) = self.build()?;
        fetch_all(executor, &sql, &values, &format!("inserting into {}", self.table()))
    }
}

impl UpdateBuilder {
    /// Execute the update and return the number of rows affected
    pub fn execute<E: Executor + ?Sized>(&self, executor: &E) -> Result<u64, TidelineError> {
        let (sql, values) = self.build()?;
        execute(executor, &sql, &values, &format!("updating {}", self.table()))
    }

    /// Execute the update and scan every returned row.
    pub fn fetch_all<T: FromRow, E: Executor + ?Sized>(&self, executor: &E) -> Result<Vec<T>, TidelineError> {
        let (sql, values) = self.build()?;
        fetch_all(executor, &sql, &values, &format!("updating {}", self.table()))
    }
}

impl DeleteBuilder {
    /// Execute the delete and return the number of rows affected
    pub fn execute<E: Executor + ?Sized>(&self, executor: &E) -> Result<u64, TidelineError> {
        let (sql, values) = self.build()?;
        execute(executor, &sql, &values, &format!("deleting from {}", self.table()))
    }

    /// Execute the delete and scan every returned row.
    pub fn fetch_all<T: FromRow, E: Executor + ?Sized>(&self, executor: &E) -> Result<Vec<T>, TidelineError> {
        let (sql, values) = self.build()?;
        fetch_all(executor, &sql, &values, &format!("deleting from {}", self.table()))
    }
}
