//! Configured entry point.
//!
//! A [`Session`] pairs an executor with a [`TidelineConfig`]. Builders it hands out
//! already carry the configured dialect, and its paginators start from the
//! configured page size.
//!
//! ```no_run
//! use tideline::{FromRow, Record, Session};
//!
//! #[derive(Record, FromRow, Default)]
//! struct Ticket {
//!     pub id: i64,
//!     pub title: String,
//! }
//!
//! let session = Session::from_env()?;
//! let mut pages = session.paginate(&session.select::<Ticket>("tickets"), &["id"])?;
//! while pages.has_more_pages() {
//!     for ticket in pages.next_page()? {
//!         println!("{} {}", ticket.id, ticket.title);
//!     }
//! }
//! # Ok::<(), tideline::TidelineError>(())
//! ```

use crate::config::TidelineConfig;
use crate::dialect::Dialect;
use crate::error::TidelineError;
use crate::executor::{Executor, MayPostgresExecutor};
use crate::mapping::Encode;
use crate::pagination::{FetchedPage, PageRequest, PaginationOptions, Paginator};
use crate::query::{DeleteBuilder, InsertBuilder, SelectBuilder, UpdateBuilder};
use crate::record::Record;
use crate::row::FromRow;

pub struct Session<E> {
    executor: E,
    config: TidelineConfig,
}

impl Session<MayPostgresExecutor> {
    /// Connect to `config.database.url`.
    pub fn connect(config: TidelineConfig) -> Result<Self, TidelineError> {
        let executor = MayPostgresExecutor::from_config(&config)
            .map_err(|e| TidelineError::execution("connecting to database", e))?;
        Ok(Self::new(executor, config))
    }

    /// Load [`TidelineConfig`] from `config/config.toml` and the environment, then connect.
    pub fn from_env() -> Result<Self, TidelineError> {
        Self::connect(TidelineConfig::load().map_err(TidelineError::Config)?)
    }
}

impl<E: Executor> Session<E> {
    pub fn new(executor: E, config: TidelineConfig) -> Self {
        log::debug!(
            "session ready: dialect {:?}, page size {}",
            config.query.dialect,
            config.query.default_page_size
        );
        Self { executor, config }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn config(&self) -> &TidelineConfig {
        &self.config
    }

    pub fn dialect(&self) -> Dialect {
        self.config.query.dialect
    }

    pub fn select<T: Record>(&self, table: impl Into<String>) -> SelectBuilder<T> {
        SelectBuilder::new(table).dialect(self.dialect())
    }

    pub fn insert<V: Encode + ?Sized>(&self, table: impl Into<String>, value: &V) -> Result<InsertBuilder, TidelineError> {
        Ok(InsertBuilder::one(table, value)?.dialect(self.dialect()))
    }

    pub fn update<V: Encode + ?Sized>(&self, table: impl Into<String>, value: &V) -> Result<UpdateBuilder, TidelineError> {
        Ok(UpdateBuilder::new(table, value)?.dialect(self.dialect()))
    }

    pub fn delete(&self, table: impl Into<String>) -> DeleteBuilder {
        DeleteBuilder::new(table).dialect(self.dialect())
    }

    /// Options with the configured page size and no key set.
    pub fn pagination_options(&self) -> PaginationOptions {
        PaginationOptions::from_config(&self.config)
    }

    /// Paginate `query` at the configured page size, by keyset when `key_set` is
    /// non-empty and by offset otherwise.
    pub fn paginate<'s, T>(
        &'s self,
        query: &SelectBuilder<T>,
        key_set: &[&str],
    ) -> Result<
        Paginator<T, impl FnMut(PageRequest) -> Result<FetchedPage<T>, TidelineError> + 's>,
        TidelineError,
    >
    where
        T: Record + FromRow + 's,
    {
        let mut options = self.pagination_options();
        if !key_set.is_empty() {
            options = options.key_set(key_set.iter().copied());
        }
        query.paginate(&self.executor, &options)
    }
}
