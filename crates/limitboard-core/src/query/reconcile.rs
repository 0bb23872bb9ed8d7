use serde::{Deserialize, Serialize};
use tracing::debug;

/// Page size assumed when neither the caller nor the server supplies one.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Response body of a shape-switching list endpoint.
///
/// Single-date queries return a bare array; range queries return a
/// paginated envelope. Decoding picks the variant from the JSON shape.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum QueryResult<T> {
    SingleDate(Vec<T>),
    Range(PageEnvelope<T>),
}

/// Paginated envelope as sent by the server; every field may be missing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PageEnvelope<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub page_size: Option<u32>,
    #[serde(default)]
    pub total_pages: Option<u32>,
}

impl<T> PageEnvelope<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            total: None,
            page: None,
            page_size: None,
            total_pages: None,
        }
    }
}

/// Canonical page handed to view state.
///
/// Invariants: `total_pages == ceil(total / page_size)`,
/// `items.len() <= page_size`, `page >= 1`, `page_size >= 1`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

impl<T> PaginatedResult<T> {
    pub fn new(items: Vec<T>, total: u64, page: u32, page_size: u32) -> Self {
        let page = page.max(1);
        let page_size = page_size.max(1).max(clamp_len(items.len()));
        Self {
            total_pages: total_pages(total, page_size),
            items,
            total,
            page,
            page_size,
        }
    }

    pub fn empty(page_size: u32) -> Self {
        Self::new(Vec::new(), 0, 1, page_size)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Collapses either response shape into a [`PaginatedResult`].
///
/// `requested_limit` is the single-date row cap the caller sent, used as the
/// page size of a bare list.
pub fn reconcile<T>(result: QueryResult<T>, requested_limit: Option<u32>) -> PaginatedResult<T> {
    let page = match result {
        QueryResult::SingleDate(items) => {
            let total = items.len() as u64;
            let page_size = requested_limit
                .filter(|limit| *limit > 0)
                .unwrap_or(DEFAULT_PAGE_SIZE);
            PaginatedResult::new(items, total, 1, page_size)
        }
        QueryResult::Range(envelope) => {
            let page = envelope.page.filter(|page| *page >= 1).unwrap_or(1);
            let page_size = envelope
                .page_size
                .filter(|size| *size > 0)
                .unwrap_or(DEFAULT_PAGE_SIZE);
            PaginatedResult::new(
                envelope.items,
                envelope.total.unwrap_or(0),
                page,
                page_size,
            )
        }
    };

    debug!(
        items = page.items.len(),
        total = page.total,
        page = page.page,
        page_size = page.page_size,
        "reconciled result page"
    );
    page
}

fn clamp_len(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

fn total_pages(total: u64, page_size: u32) -> u32 {
    let pages = total.div_ceil(u64::from(page_size));
    u32::try_from(pages).unwrap_or(u32::MAX)
}
