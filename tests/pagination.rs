//! Paginator behaviour over in-memory data sets.

use sea_query::Value;
use tideline::{FetchedPage, PageCursor, PageRequest, Paginator, PaginatorState, Record, TidelineError};

#[derive(Record, Debug, Clone, Default, PartialEq)]
pub struct Reading {
    #[db = "reading_id"]
    pub id: i64,
    pub sensor: String,
}

fn readings(n: i64) -> Vec<Reading> {
    // Stored out of key order so ordering has to come from the request
    let mut rows: Vec<Reading> = (1..=n)
        .map(|id| Reading {
            id,
            sensor: format!("s{}", id % 3),
        })
        .collect();
    rows.reverse();
    rows
}

/// Serve a page the way a database would for each request shape.
fn serve(rows: &[Reading], request: &PageRequest) -> Vec<Reading> {
    let take = request.page_size as usize;
    match &request.cursor {
        PageCursor::Offset(offset) => {
            let mut sorted = rows.to_vec();
            sorted.sort_by_key(|row| row.id);
            sorted.into_iter().skip(*offset as usize).take(take).collect()
        }
        PageCursor::KeysetStart { columns } => {
            assert_eq!(columns, &["reading_id".to_string()]);
            let mut sorted = rows.to_vec();
            sorted.sort_by_key(|row| row.id);
            sorted.into_iter().take(take).collect()
        }
        PageCursor::KeysetAfter { values, .. } => {
            let Value::BigInt(Some(after)) = values[0] else {
                panic!("unexpected cursor {values:?}");
            };
            let mut sorted: Vec<Reading> = rows.iter().filter(|row| row.id > after).cloned().collect();
            sorted.sort_by_key(|row| row.id);
            sorted.into_iter().take(take).collect()
        }
    }
}

fn drain<F>(paginator: &mut Paginator<Reading, F>) -> Vec<Vec<Reading>>
where
    F: FnMut(PageRequest) -> Result<FetchedPage<Reading>, TidelineError>,
{
    let mut pages = Vec::new();
    while paginator.has_more_pages() {
        pages.push(paginator.next_page().unwrap());
    }
    pages
}

#[test]
fn keyset_pages_cover_every_row_in_key_order() {
    for (n, page_size) in [(25, 10), (30, 10), (3, 5), (0, 4)] {
        let rows = readings(n);
        let mut paginator =
            Paginator::keyset(page_size, &["id"], |request| Ok(FetchedPage::new(serve(&rows, &request)))).unwrap();
        let pages = drain(&mut paginator);

        let non_empty = pages.iter().filter(|page| !page.is_empty()).count() as i64;
        assert_eq!(non_empty, (n + page_size as i64 - 1) / page_size as i64, "n={n} p={page_size}");

        let ids: Vec<i64> = pages.iter().flatten().map(|row| row.id).collect();
        assert_eq!(ids, (1..=n).collect::<Vec<_>>());
        assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(paginator.state(), PaginatorState::Exhausted);
    }
}

#[test]
fn offset_pages_match_keyset_pages() {
    let rows = readings(23);
    let mut keyset =
        Paginator::keyset(5, &["reading_id"], |request| Ok(FetchedPage::new(serve(&rows, &request)))).unwrap();
    let mut offset = Paginator::offset(5, |request| Ok(FetchedPage::new(serve(&rows, &request))));

    let by_key: Vec<Reading> = drain(&mut keyset).into_iter().flatten().collect();
    let by_offset: Vec<Reading> = drain(&mut offset).into_iter().flatten().collect();
    assert_eq!(by_key, by_offset);
    assert_eq!(offset.current_offset(), 20);
}

#[test]
fn cursor_holds_last_key_of_full_page() {
    let rows = readings(12);
    let mut paginator =
        Paginator::keyset(5, &["id"], |request| Ok(FetchedPage::new(serve(&rows, &request)))).unwrap();
    assert_eq!(paginator.key_columns(), Some(&["reading_id".to_string()][..]));

    paginator.next_page().unwrap();
    assert_eq!(paginator.cursor(), Some(&[Value::BigInt(Some(5))][..]));
    paginator.next_page().unwrap();
    assert_eq!(paginator.cursor(), Some(&[Value::BigInt(Some(10))][..]));
    assert_eq!(paginator.next_page().unwrap().len(), 2);
    assert!(!paginator.has_more_pages());
}

#[test]
fn stop_request_ends_after_first_page() {
    let rows = readings(50);
    let mut calls = 0;
    let mut paginator = Paginator::keyset(10, &["id"], |request| {
        calls += 1;
        Ok(FetchedPage::stopping(serve(&rows, &request)))
    })
    .unwrap();

    assert_eq!(paginator.next_page().unwrap().len(), 10);
    assert!(!paginator.has_more_pages());
    assert_eq!(paginator.state(), PaginatorState::Stopped);
    assert!(paginator.cursor().is_none());
    assert!(paginator.next_page().unwrap().is_empty());
    drop(paginator);
    assert_eq!(calls, 1);
}

#[test]
fn fetch_error_leaves_state_untouched() {
    let rows = readings(30);
    let mut fail_next = false;
    let mut paginator = Paginator::keyset(10, &["id"], |request| {
        if fail_next {
            return Err(TidelineError::Build("connection reset".to_string()));
        }
        fail_next = true;
        Ok(FetchedPage::new(serve(&rows, &request)))
    })
    .unwrap();

    paginator.next_page().unwrap();
    let cursor = paginator.cursor().map(<[Value]>::to_vec);

    assert!(paginator.next_page().is_err());
    assert_eq!(paginator.state(), PaginatorState::Active);
    assert!(paginator.has_more_pages());
    assert_eq!(paginator.cursor().map(<[Value]>::to_vec), cursor);
}

#[test]
fn unknown_key_column_is_rejected() {
    let result = Paginator::<Reading, _>::keyset(10, &["id", "missing"], |_| Ok(FetchedPage::new(Vec::new())));
    match result {
        Err(TidelineError::UnresolvedColumn { column, record }) => {
            assert_eq!(column, "missing");
            assert_eq!(record, "Reading");
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected an error"),
    }
}

#[test]
fn unselected_key_column_is_rejected() {
    #[derive(Record, Debug, Default)]
    pub struct Account {
        pub id: i64,
        #[tideline(skip_select)]
        pub password_hash: String,
    }

    let result = Paginator::<Account, _>::keyset(2, &["id", "password_hash"], |_| Ok(FetchedPage::new(Vec::new())));
    match result {
        Err(TidelineError::UnresolvedColumn { column, record }) => {
            assert_eq!(column, "password_hash");
            assert_eq!(record, "Account");
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected an error"),
    }

    let paginator = Paginator::<Account, _>::keyset(2, &["id"], |_| Ok(FetchedPage::new(Vec::new()))).unwrap();
    assert_eq!(paginator.key_columns(), Some(&["id".to_string()][..]));
}

#[test]
fn new_selects_mode_from_keys() {
    let fetch = |_: PageRequest| Ok(FetchedPage::<Reading>::new(Vec::new()));
    let offset = Paginator::new(10, None, fetch).unwrap();
    assert!(offset.key_columns().is_none());

    let empty: &[&str] = &[];
    let offset = Paginator::new(10, Some(empty), fetch).unwrap();
    assert!(offset.key_columns().is_none());

    let keyset = Paginator::new(10, Some(&["sensor"][..]), fetch).unwrap();
    assert_eq!(keyset.key_columns(), Some(&["sensor".to_string()][..]));
}
