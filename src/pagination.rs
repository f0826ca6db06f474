//! Offset and keyset pagination.
//!
//! A [`Paginator`] owns a fetch operation and drives it one page at a time. In offset
//! mode each request carries `LIMIT page_size OFFSET n`; in keyset mode the first
//! request is only ordered by the key columns and every later request filters on
//! `key > last seen key`. Pagination ends when a page comes back short (or empty),
//! or when the fetch operation asks to stop.
//!
//! ```
//! use tideline::pagination::{FetchedPage, Paginator, PaginatorState};
//!
//! let data: Vec<i64> = (1..=25).collect();
//! let mut paginator = Paginator::offset(10, |request| {
//!     let offset = request.offset().unwrap_or(0) as usize;
//!     let page = data.iter().skip(offset).take(request.page_size as usize).copied().collect();
//!     Ok(FetchedPage::new(page))
//! });
//!
//! let mut seen = Vec::new();
//! while paginator.has_more_pages() {
//!     seen.extend(paginator.next_page()?);
//! }
//! assert_eq!(seen, data);
//! assert_eq!(paginator.state(), PaginatorState::Exhausted);
//! # Ok::<(), tideline::TidelineError>(())
//! ```

use sea_query::{Alias, ColumnRef, Expr, ExprTrait, IntoColumnRef, Order, SelectStatement, Value};

use crate::config::{default_page_size, TidelineConfig};
use crate::error::TidelineError;
use crate::record::{Record, SkipKind};

#[cfg(feature = "tracing")]
use crate::tracing_helpers;

/// Position of the page being requested.
#[derive(Debug, Clone, PartialEq)]
pub enum PageCursor {
    /// Offset mode.
    Offset(u64),
    /// Keyset mode, first page.
    KeysetStart { columns: Vec<String> },
    /// Keyset mode, page after the row holding `values`.
    KeysetAfter { columns: Vec<String>, values: Vec<Value> },
}

/// What the fetch operation is asked to return.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    pub page_size: u64,
    pub cursor: PageCursor,
}

impl PageRequest {
    /// Offset of the requested page, in offset mode.
    pub fn offset(&self) -> Option<u64> {
        match self.cursor {
            PageCursor::Offset(offset) => Some(offset),
            _ => None,
        }
    }

    /// Last seen key values, in keyset mode after the first page.
    pub fn after(&self) -> Option<&[Value]> {
        match &self.cursor {
            PageCursor::KeysetAfter { values, .. } => Some(values),
            _ => None,
        }
    }

    /// Rewrite `stmt` to fetch this page.
    ///
    /// Keyset requests replace any existing ORDER BY and OFFSET. `table` qualifies
    /// the key columns when given.
    pub fn apply_to(&self, stmt: &mut SelectStatement, table: Option<&str>) {
        match &self.cursor {
            PageCursor::Offset(offset) => {
                stmt.offset(*offset);
            }
            PageCursor::KeysetStart { columns } => {
                order_by_keys(stmt, table, columns);
            }
            PageCursor::KeysetAfter { columns, values } => {
                for (column, value) in columns.iter().zip(values) {
                    stmt.and_where(Expr::col(column_ref(table, column)).gt(value.clone()));
                }
                order_by_keys(stmt, table, columns);
            }
        }
        stmt.limit(self.page_size);
    }
}

fn order_by_keys(stmt: &mut SelectStatement, table: Option<&str>, columns: &[String]) {
    stmt.reset_offset();
    stmt.clear_order_by();
    for column in columns {
        stmt.order_by(column_ref(table, column), Order::Asc);
    }
}

fn column_ref(table: Option<&str>, column: &str) -> ColumnRef {
    match table {
        Some(table) => (Alias::new(table.to_string()), Alias::new(column.to_string())).into_column_ref(),
        None => Alias::new(column.to_string()).into_column_ref(),
    }
}

/// One page returned by a fetch operation.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedPage<T> {
    pub records: Vec<T>,
    /// Ask the paginator not to fetch again.
    pub stop: bool,
}

impl<T> FetchedPage<T> {
    pub fn new(records: Vec<T>) -> Self {
        Self { records, stop: false }
    }

    /// A page after which pagination stops regardless of its size.
    pub fn stopping(records: Vec<T>) -> Self {
        Self { records, stop: true }
    }
}

/// Where a paginator is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginatorState {
    Active,
    /// A short or empty page was returned.
    Exhausted,
    /// The fetch operation asked to stop.
    Stopped,
}

struct KeySet<T> {
    columns: Vec<String>,
    indices: Vec<usize>,
    extract: fn(&T, &[usize]) -> Vec<Value>,
}

fn extract_keys<T: Record>(record: &T, indices: &[usize]) -> Vec<Value> {
    let columns = record.columns();
    indices
        .iter()
        .filter_map(|&index| columns.get(index).map(|column| column.to_value()))
        .collect()
}

fn resolve_keys<T: Record>(keys: &[&str]) -> Result<KeySet<T>, TidelineError> {
    if keys.is_empty() {
        return Err(TidelineError::MissingKeySet);
    }

    let fields = T::fields();
    let mut columns = Vec::with_capacity(keys.len());
    let mut indices = Vec::with_capacity(keys.len());
    for key in keys {
        // A key that is never selected scans back as its default and the cursor never moves
        let index = fields
            .iter()
            .position(|field| field.matches(key) && !field.skips(SkipKind::Select))
            .ok_or_else(|| TidelineError::UnresolvedColumn {
                column: (*key).to_string(),
                record: T::record_name().to_string(),
            })?;
        columns.push(fields[index].column_name.clone());
        indices.push(index);
    }

    Ok(KeySet {
        columns,
        indices,
        extract: extract_keys::<T>,
    })
}

/// Page-at-a-time iterator over a fetch operation.
pub struct Paginator<T, F> {
    page_size: u64,
    keys: Option<KeySet<T>>,
    has_next: bool,
    stop_requested: bool,
    offset: u64,
    cursor: Option<Vec<Value>>,
    fetch: F,
}

impl<T, F> Paginator<T, F>
where
    F: FnMut(PageRequest) -> Result<FetchedPage<T>, TidelineError>,
{
    /// Offset pagination when `keys` is `None` or empty, keyset pagination otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`TidelineError::UnresolvedColumn`] if a key names no field of `T`.
    pub fn new(page_size: u64, keys: Option<&[&str]>, fetch: F) -> Result<Self, TidelineError>
    where
        T: Record,
    {
        match keys {
            Some(keys) if !keys.is_empty() => Self::keyset(page_size, keys, fetch),
            _ => Ok(Self::offset(page_size, fetch)),
        }
    }

    pub fn offset(page_size: u64, fetch: F) -> Self {
        Self {
            page_size,
            keys: None,
            has_next: true,
            stop_requested: false,
            offset: 0,
            cursor: None,
            fetch,
        }
    }

    /// Keyset pagination ordered by `keys`, given as field identifiers or column names.
    ///
    /// # Errors
    ///
    /// Returns [`TidelineError::MissingKeySet`] for an empty key list and
    /// [`TidelineError::UnresolvedColumn`] if a key names no field of `T` or names a
    /// `skip_select` field.
    pub fn keyset(page_size: u64, keys: &[&str], fetch: F) -> Result<Self, TidelineError>
    where
        T: Record,
    {
        let keys = resolve_keys::<T>(keys)?;
        Ok(Self {
            keys: Some(keys),
            ..Self::offset(page_size, fetch)
        })
    }

    pub fn has_more_pages(&self) -> bool {
        self.has_next && !self.stop_requested
    }

    pub fn state(&self) -> PaginatorState {
        if self.stop_requested {
            PaginatorState::Stopped
        } else if !self.has_next {
            PaginatorState::Exhausted
        } else {
            PaginatorState::Active
        }
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    pub fn current_offset(&self) -> u64 {
        self.offset
    }

    pub fn cursor(&self) -> Option<&[Value]> {
        self.cursor.as_deref()
    }

    /// Resolved key column names, in keyset mode.
    pub fn key_columns(&self) -> Option<&[String]> {
        self.keys.as_ref().map(|keys| keys.columns.as_slice())
    }

    fn request(&self) -> PageRequest {
        let cursor = match (&self.keys, &self.cursor) {
            (None, _) => PageCursor::Offset(self.offset),
            (Some(keys), None) => PageCursor::KeysetStart {
                columns: keys.columns.clone(),
            },
            (Some(keys), Some(values)) => PageCursor::KeysetAfter {
                columns: keys.columns.clone(),
                values: values.clone(),
            },
        };
        PageRequest {
            page_size: self.page_size,
            cursor,
        }
    }

    /// Fetch the next page.
    ///
    /// Returns an empty page without fetching once pagination has ended. A failed
    /// fetch leaves the paginator exactly as it was.
    pub fn next_page(&mut self) -> Result<Vec<T>, TidelineError> {
        if !self.has_more_pages() {
            return Ok(Vec::new());
        }

        let request = self.request();
        let mode = if self.keys.is_some() { "keyset" } else { "offset" };
        log::debug!("fetching {mode} page: {:?}", request.cursor);

        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::fetch_page_span(self.page_size, mode).entered();

        let page = (self.fetch)(request)?;

        if page.stop {
            log::debug!("fetch requested stop after {} records", page.records.len());
            self.stop_requested = true;
            return Ok(page.records);
        }

        let fetched = page.records.len() as u64;
        if fetched == 0 || fetched < self.page_size {
            log::debug!("short page ({fetched} of {}), pagination exhausted", self.page_size);
            self.has_next = false;
            return Ok(page.records);
        }

        match (&self.keys, page.records.last()) {
            (Some(keys), Some(last)) => {
                self.cursor = Some((keys.extract)(last, &keys.indices));
            }
            _ => self.offset += self.page_size,
        }

        Ok(page.records)
    }
}

/// Options for paginating a record-mapped select.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationOptions {
    pub page_size: u64,
    /// Key columns; keyset pagination when present and non-empty.
    pub key_set: Option<Vec<String>>,
}

impl Default for PaginationOptions {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            key_set: None,
        }
    }
}

impl PaginationOptions {
    pub fn from_config(config: &TidelineConfig) -> Self {
        Self {
            page_size: config.query.default_page_size,
            key_set: None,
        }
    }

    pub fn page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn key_set<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.key_set = Some(columns.into_iter().map(Into::into).collect());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_query::{PostgresQueryBuilder, Query};

    fn offset_fetch(data: &[i64]) -> impl FnMut(PageRequest) -> Result<FetchedPage<i64>, TidelineError> + '_ {
        move |request| {
            let offset = request.offset().unwrap_or(0) as usize;
            Ok(FetchedPage::new(
                data.iter().skip(offset).take(request.page_size as usize).copied().collect(),
            ))
        }
    }

    #[test]
    fn test_offset_advances_by_page_size() {
        let data: Vec<i64> = (0..7).collect();
        let mut paginator = Paginator::offset(3, offset_fetch(&data));

        assert_eq!(paginator.next_page().unwrap(), vec![0, 1, 2]);
        assert_eq!(paginator.current_offset(), 3);
        assert_eq!(paginator.next_page().unwrap(), vec![3, 4, 5]);
        assert_eq!(paginator.current_offset(), 6);
        assert_eq!(paginator.next_page().unwrap(), vec![6]);
        assert_eq!(paginator.state(), PaginatorState::Exhausted);
        assert!(!paginator.has_more_pages());
    }

    #[test]
    fn test_exact_multiple_ends_with_empty_page() {
        let data: Vec<i64> = (0..4).collect();
        let mut paginator = Paginator::offset(2, offset_fetch(&data));

        let mut pages = Vec::new();
        while paginator.has_more_pages() {
            pages.push(paginator.next_page().unwrap());
        }
        assert_eq!(pages, vec![vec![0, 1], vec![2, 3], vec![]]);
    }

    #[test]
    fn test_stop_ends_after_one_page() {
        let mut calls = 0;
        let mut paginator = Paginator::offset(2, |_request: PageRequest| {
            calls += 1;
            Ok(FetchedPage::stopping(vec![1i64, 2]))
        });

        assert_eq!(paginator.next_page().unwrap(), vec![1, 2]);
        assert_eq!(paginator.state(), PaginatorState::Stopped);
        assert_eq!(paginator.current_offset(), 0);
        assert!(paginator.next_page().unwrap().is_empty());
        drop(paginator);
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_fetch_error_leaves_state_untouched() {
        let mut fail = true;
        let mut paginator = Paginator::offset(2, |request: PageRequest| {
            if fail {
                fail = false;
                return Err(TidelineError::Build("transient".into()));
            }
            Ok(FetchedPage::new(vec![request.offset().unwrap_or(99) as i64; 2]))
        });

        assert!(paginator.next_page().is_err());
        assert_eq!(paginator.state(), PaginatorState::Active);
        assert_eq!(paginator.current_offset(), 0);
        assert_eq!(paginator.next_page().unwrap(), vec![0, 0]);
    }

    #[test]
    fn test_offset_request_renders_limit_offset() {
        let request = PageRequest {
            page_size: 5,
            cursor: PageCursor::Offset(10),
        };
        let mut stmt = Query::select();
        stmt.column(Alias::new("id")).from(Alias::new("t"));
        request.apply_to(&mut stmt, None);
        let sql = stmt.to_string(PostgresQueryBuilder);
        assert!(sql.ends_with("LIMIT 5 OFFSET 10"), "{sql}");
    }

    #[test]
    fn test_keyset_request_replaces_order_and_offset() {
        let request = PageRequest {
            page_size: 2,
            cursor: PageCursor::KeysetAfter {
                columns: vec!["a".into(), "b".into()],
                values: vec![Value::from(3i64), Value::from("x".to_string())],
            },
        };
        let mut stmt = Query::select();
        stmt.column(Alias::new("a"))
            .from(Alias::new("t"))
            .order_by(Alias::new("z"), Order::Desc)
            .offset(40);
        request.apply_to(&mut stmt, Some("t"));
        let sql = stmt.to_string(PostgresQueryBuilder);

        assert!(sql.contains(r#""t"."a" > 3"#), "{sql}");
        assert!(sql.contains(r#""t"."b" > 'x'"#), "{sql}");
        assert!(sql.contains(r#"ORDER BY "t"."a" ASC, "t"."b" ASC"#), "{sql}");
        assert!(!sql.contains("DESC"), "{sql}");
        assert!(!sql.contains("OFFSET"), "{sql}");
        assert!(sql.contains("LIMIT 2"), "{sql}");
    }

    #[test]
    fn test_keyset_start_is_unfiltered() {
        let request = PageRequest {
            page_size: 3,
            cursor: PageCursor::KeysetStart {
                columns: vec!["id".into()],
            },
        };
        let mut stmt = Query::select();
        stmt.column(Alias::new("id")).from(Alias::new("t"));
        request.apply_to(&mut stmt, None);
        let sql = stmt.to_string(PostgresQueryBuilder);
        assert!(!sql.contains("WHERE"), "{sql}");
        assert!(sql.contains(r#"ORDER BY "id" ASC LIMIT 3"#), "{sql}");
    }

    #[test]
    fn test_pagination_options() {
        let options = PaginationOptions::default();
        assert_eq!(options.page_size, 10);
        assert_eq!(options.key_set, None);

        let options = PaginationOptions::default().page_size(3).key_set(["id"]);
        assert_eq!(options.page_size, 3);
        assert_eq!(options.key_set, Some(vec!["id".to_string()]));
    }
}
