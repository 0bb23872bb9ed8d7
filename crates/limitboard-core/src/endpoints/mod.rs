//! # Endpoint Clients
//!
//! Thin typed wrappers over [`ApiClient`], one per backend resource.
//!
//! | Client | Resource |
//! |--------|----------|
//! | [`FundFlowApi`] | `/stock-fund-flow` lists, history and filters |
//! | [`ZtPoolApi`] | `/zt-pool/`, `/zt-pool-down/` |
//! | [`LhbApi`] | `/lhb/`, `/lhb/institution` |
//! | [`InstitutionTradingApi`] | `/lhb/institution-trading-statistics` |
//! | [`TraderApi`] | `/lhb/traders` |
//! | [`MarketApi`] | `/index/`, `/sector/` |
//! | [`StockConceptApi`] | `/stock-concept/` |
//! | [`TaskApi`] | `/tasks/` |
//! | [`TradingCalendarApi`] | `/trading-calendar` |

mod fund_flow;
mod institution_trading;
mod lhb;
mod market;
mod stock_concept;
mod tasks;
mod traders;
mod trading_calendar;
mod zt_pool;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::api_client::{ApiClient, ApiError};
use crate::query::{
    keys, reconcile, PaginatedResult, ParamValue, QueryNormalizer, QueryParameterSet, QueryResult,
    RawParams,
};
use crate::store::{PageSource, QueryStore};
use crate::CoreError;

pub use fund_flow::FundFlowApi;
pub use institution_trading::InstitutionTradingApi;
pub use lhb::LhbApi;
pub use market::MarketApi;
pub use stock_concept::StockConceptApi;
pub use tasks::TaskApi;
pub use traders::TraderApi;
pub use trading_calendar::TradingCalendarApi;
pub use zt_pool::{PoolDirection, ZtPoolApi};

/// [`PageSource`] issuing GET requests against one list path.
#[derive(Clone)]
pub struct EndpointSource {
    client: ApiClient,
    path: &'static str,
}

impl EndpointSource {
    pub fn new(client: ApiClient, path: &'static str) -> Self {
        Self { client, path }
    }

    pub const fn path(&self) -> &'static str {
        self.path
    }
}

impl<T> PageSource<T> for EndpointSource
where
    T: DeserializeOwned + Send + 'static,
{
    fn fetch<'a>(
        &'a self,
        params: QueryParameterSet,
    ) -> Pin<Box<dyn Future<Output = Result<QueryResult<T>, ApiError>> + Send + 'a>> {
        Box::pin(async move { self.client.get(self.path, &params).await })
    }
}

/// Normalizes, sends and reconciles one list query.
async fn fetch_page<T>(
    client: &ApiClient,
    path: &str,
    normalizer: &QueryNormalizer,
    raw: &RawParams,
) -> Result<PaginatedResult<T>, CoreError>
where
    T: DeserializeOwned,
{
    let params = normalizer.normalize(raw)?;
    let limit = params.get(keys::LIMIT).and_then(ParamValue::as_u32);
    let result: QueryResult<T> = client.get(path, &params).await?;
    Ok(reconcile(result, limit))
}

fn store_for<T>(
    client: &ApiClient,
    path: &'static str,
    normalizer: QueryNormalizer,
    page_size: u32,
) -> QueryStore<T>
where
    T: DeserializeOwned + Clone + Send + 'static,
{
    let source: Arc<dyn PageSource<T>> = Arc::new(EndpointSource::new(client.clone(), path));
    QueryStore::new(normalizer, source, page_size)
}

/// Escapes a caller-supplied path segment such as a stock code.
fn segment(value: &str) -> String {
    urlencoding::encode(value.trim()).into_owned()
}
