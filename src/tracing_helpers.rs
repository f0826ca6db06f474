//! `tracing` spans around statement execution and page fetches.
//!
//! Compiled only with the `tracing` feature. Spans carry the statement text (or the
//! page position) so subscribers can correlate database time with callers.

use tracing::Span;

/// Span covering one statement round trip.
pub fn execute_query_span(query: &str) -> Span {
    tracing::debug_span!("tideline.query", db.system = "postgresql", db.statement = query)
}

/// Span covering one paginator fetch.
pub fn fetch_page_span(page_size: u64, mode: &'static str) -> Span {
    tracing::debug_span!("tideline.page", page_size, mode)
}
