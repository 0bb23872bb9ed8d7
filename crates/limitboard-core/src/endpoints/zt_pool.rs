use super::{fetch_page, store_for};
use crate::api_client::ApiClient;
use crate::query::{
    keys, DatePolicy, PaginatedResult, ParamValue, QueryNormalizer, QueryParameterSet, RawParams,
    RawValue,
};
use crate::store::{QueryStore, DEFAULT_STORE_PAGE_SIZE};
use crate::{CoreError, SortOrder, TradeDate, ZtPoolAnalysis, ZtPoolItem, ZtPoolUpdate};

const ANALYSIS_PATH: &str = "/zt-pool/analysis";
const CONCEPTS_PATH: &str = "/zt-pool/concepts";

/// Limit-up or limit-down pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolDirection {
    LimitUp,
    LimitDown,
}

impl PoolDirection {
    pub const fn path(self) -> &'static str {
        match self {
            Self::LimitUp => "/zt-pool/",
            Self::LimitDown => "/zt-pool-down/",
        }
    }

    /// Both pools query by range only. Limit-down falls back to the date
    /// current when each query is built.
    pub fn normalizer(self) -> QueryNormalizer {
        match self {
            Self::LimitUp => QueryNormalizer::new(DatePolicy::RequireRange),
            Self::LimitDown => QueryNormalizer::new(DatePolicy::RangeOrToday),
        }
    }

    pub const fn default_order(self) -> SortOrder {
        match self {
            Self::LimitUp => SortOrder::Desc,
            Self::LimitDown => SortOrder::Asc,
        }
    }
}

#[derive(Clone)]
pub struct ZtPoolApi {
    client: ApiClient,
}

impl ZtPoolApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(
        &self,
        direction: PoolDirection,
        raw: &RawParams,
    ) -> Result<PaginatedResult<ZtPoolItem>, CoreError> {
        let raw = with_default_order(raw.clone(), direction);
        fetch_page(&self.client, direction.path(), &direction.normalizer(), &raw).await
    }

    pub async fn limit_up(&self, raw: &RawParams) -> Result<PaginatedResult<ZtPoolItem>, CoreError> {
        self.list(PoolDirection::LimitUp, raw).await
    }

    pub async fn limit_down(
        &self,
        raw: &RawParams,
    ) -> Result<PaginatedResult<ZtPoolItem>, CoreError> {
        self.list(PoolDirection::LimitDown, raw).await
    }

    pub async fn analysis(&self, date: TradeDate) -> Result<ZtPoolAnalysis, CoreError> {
        Ok(self.client.get(ANALYSIS_PATH, &date_param(Some(date))).await?)
    }

    /// Concept names seen in the pool, optionally for one date.
    pub async fn concepts(&self, date: Option<TradeDate>) -> Result<Vec<String>, CoreError> {
        Ok(self.client.get(CONCEPTS_PATH, &date_param(date)).await?)
    }

    /// Corrects the concept or limit-up reason of one pool row.
    pub async fn update_item(&self, id: i64, update: &ZtPoolUpdate) -> Result<ZtPoolItem, CoreError> {
        let path = format!("{}{id}", PoolDirection::LimitUp.path());
        Ok(self.client.patch(&path, update).await?)
    }

    pub fn store(&self, direction: PoolDirection) -> QueryStore<ZtPoolItem> {
        store_for(
            &self.client,
            direction.path(),
            direction.normalizer(),
            DEFAULT_STORE_PAGE_SIZE,
        )
        .with_filters(RawParams::new().with(keys::ORDER, direction.default_order().as_str()))
    }
}

fn with_default_order(mut raw: RawParams, direction: PoolDirection) -> RawParams {
    let valid = matches!(
        raw.get(keys::ORDER),
        Some(RawValue::Text(order)) if SortOrder::parse(order.trim()).is_some()
    );
    if !valid {
        raw.set(keys::ORDER, direction.default_order().as_str());
    }
    raw
}

fn date_param(date: Option<TradeDate>) -> QueryParameterSet {
    date.map(|date| (keys::DATE, ParamValue::Text(date.format())))
        .into_iter()
        .collect()
}
