//! # Query State Container
//!
//! [`QueryStore`] owns the filters, pagination cursor, loading flag and last
//! page of one list view. Instances are constructed explicitly per view or
//! session; there is no global store.
//!
//! Every fetch is numbered. A completion only touches state when its number
//! is newer than the last applied one, so a slow response can never
//! overwrite a fresher page. Superseded callers still receive their own
//! result or error.
//!
//! A successful fetch replaces the items and the total only. The cursor stays
//! under the caller's control unless the store was built with
//! [`QueryStore::with_server_pagination`].

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::api_client::ApiError;
use crate::query::{
    keys, reconcile, PaginatedResult, ParamValue, QueryNormalizer, QueryParameterSet, QueryResult,
    RawParams, SortOrder,
};
use crate::CoreError;

pub const DEFAULT_STORE_PAGE_SIZE: u32 = 20;

/// Something that can serve one page of a list query.
pub trait PageSource<T>: Send + Sync {
    fn fetch<'a>(
        &'a self,
        params: QueryParameterSet,
    ) -> Pin<Box<dyn Future<Output = Result<QueryResult<T>, ApiError>> + Send + 'a>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
}

impl Pagination {
    pub const fn new(page_size: u32) -> Self {
        Self {
            page: 1,
            page_size,
            total: 0,
        }
    }
}

/// Point-in-time copy of a store's state.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState<T> {
    pub filters: RawParams,
    pub pagination: Pagination,
    pub items: Vec<T>,
    pub loading: bool,
}

struct Inner<T> {
    filters: RawParams,
    pagination: Pagination,
    items: Vec<T>,
    issued: u64,
    applied: u64,
}

pub struct QueryStore<T> {
    normalizer: QueryNormalizer,
    source: Arc<dyn PageSource<T>>,
    inner: Mutex<Inner<T>>,
    in_flight: AtomicUsize,
    server_pagination: bool,
}

impl<T> QueryStore<T>
where
    T: Clone + Send + 'static,
{
    pub fn new(normalizer: QueryNormalizer, source: Arc<dyn PageSource<T>>, page_size: u32) -> Self {
        Self {
            normalizer,
            source,
            inner: Mutex::new(Inner {
                filters: RawParams::new(),
                pagination: Pagination::new(page_size.max(1)),
                items: Vec::new(),
                issued: 0,
                applied: 0,
            }),
            in_flight: AtomicUsize::new(0),
            server_pagination: false,
        }
    }

    /// Adopts the page and page size echoed by the server after each fetch.
    pub fn with_server_pagination(mut self) -> Self {
        self.server_pagination = true;
        self
    }

    /// Seeds the initial filters without touching pagination.
    pub fn with_filters(self, filters: RawParams) -> Self {
        self.lock().filters = filters;
        self
    }

    /// Shallow-merges into the current filters and returns to page 1.
    pub fn set_filters(&self, partial: RawParams) {
        let mut inner = self.lock();
        inner.filters.merge(partial);
        inner.pagination.page = 1;
    }

    /// Sets page and page size together. Does not fetch.
    pub fn set_pagination(&self, page: u32, page_size: u32) {
        let mut inner = self.lock();
        inner.pagination.page = page.max(1);
        inner.pagination.page_size = page_size.max(1);
    }

    /// Stores the sort field and direction as filters and returns to page 1.
    pub fn set_sort(&self, sort_by: Option<&str>, order: SortOrder) {
        self.set_filters(
            RawParams::new()
                .with(keys::SORT_BY, sort_by.map(str::to_owned))
                .with(keys::ORDER, order.as_str()),
        );
    }

    pub fn snapshot(&self) -> QueryState<T> {
        let inner = self.lock();
        QueryState {
            filters: inner.filters.clone(),
            pagination: inner.pagination,
            items: inner.items.clone(),
            loading: self.is_loading(),
        }
    }

    pub fn filters(&self) -> RawParams {
        self.lock().filters.clone()
    }

    pub fn pagination(&self) -> Pagination {
        self.lock().pagination
    }

    pub fn items(&self) -> Vec<T> {
        self.lock().items.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Fetches the current page.
    ///
    /// Stored filters, then `overrides`, then the pagination cursor are merged
    /// in that order. On failure the view is reset to an empty page and the
    /// error is returned unchanged.
    pub async fn fetch(&self, overrides: Option<RawParams>) -> Result<PaginatedResult<T>, CoreError> {
        let _in_flight = InFlightGuard::enter(&self.in_flight);
        let (seq, raw) = self.begin(overrides);

        let outcome = self.run(&raw).await;

        let mut inner = self.lock();
        if seq <= inner.applied {
            debug!(seq, applied = inner.applied, "discarding superseded fetch result");
            return outcome;
        }
        inner.applied = seq;

        match &outcome {
            Ok(page) => {
                inner.items = page.items.clone();
                inner.pagination.total = page.total;
                if self.server_pagination {
                    inner.pagination.page = page.page.max(1);
                    inner.pagination.page_size = page.page_size.max(1);
                }
            }
            Err(error) => {
                warn!(seq, error = %error, "fetch failed; resetting view to empty page");
                inner.items.clear();
                inner.pagination.total = 0;
            }
        }

        outcome
    }

    fn begin(&self, overrides: Option<RawParams>) -> (u64, RawParams) {
        let mut inner = self.lock();
        inner.issued += 1;

        let mut raw = inner.filters.clone();
        if let Some(overrides) = overrides {
            raw.merge(overrides);
        }
        raw.set(keys::PAGE, inner.pagination.page);
        raw.set(keys::PAGE_SIZE, inner.pagination.page_size);

        (inner.issued, raw)
    }

    async fn run(&self, raw: &RawParams) -> Result<PaginatedResult<T>, CoreError> {
        let params = self.normalizer.normalize(raw)?;
        let limit = params.get(keys::LIMIT).and_then(ParamValue::as_u32);
        let result = self.source.fetch(params).await?;
        Ok(reconcile(result, limit))
    }

    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Counts a fetch as in flight until dropped, including on cancellation.
struct InFlightGuard<'a>(&'a AtomicUsize);

impl<'a> InFlightGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}
