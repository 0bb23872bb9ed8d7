use super::{fetch_page, store_for};
use crate::api_client::ApiClient;
use crate::query::{DatePolicy, PaginatedResult, QueryNormalizer, RawParams};
use crate::store::{QueryStore, DEFAULT_STORE_PAGE_SIZE};
use crate::{CoreError, InstitutionTradingAggregate, InstitutionTradingStat};

const DAILY_PATH: &str = "/lhb/institution-trading-statistics";
const AGGREGATED_PATH: &str = "/lhb/institution-trading-statistics/aggregated";

const DAILY_KEYS: [&str; 6] = ["stock_code", "stock_name", "page", "page_size", "sort_by", "order"];

const AGGREGATED_KEYS: [&str; 14] = [
    "stock_code",
    "stock_name",
    "min_appear_count",
    "max_appear_count",
    "min_total_net_buy_amount",
    "max_total_net_buy_amount",
    "min_total_buy_amount",
    "max_total_buy_amount",
    "min_total_sell_amount",
    "max_total_sell_amount",
    "page",
    "page_size",
    "sort_by",
    "order",
];

/// Institution trading statistics from the disclosure board, per session or
/// summed per stock over a range.
#[derive(Clone)]
pub struct InstitutionTradingApi {
    client: ApiClient,
}

impl InstitutionTradingApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// A single date and a range are never sent together.
    pub fn daily_normalizer() -> QueryNormalizer {
        QueryNormalizer::default().with_allowed_keys(DAILY_KEYS)
    }

    /// Both range bounds are required; a lone `date` becomes a one-day range.
    pub fn aggregated_normalizer() -> QueryNormalizer {
        QueryNormalizer::new(DatePolicy::RequireRange).with_allowed_keys(AGGREGATED_KEYS)
    }

    pub async fn daily(
        &self,
        raw: &RawParams,
    ) -> Result<PaginatedResult<InstitutionTradingStat>, CoreError> {
        fetch_page(&self.client, DAILY_PATH, &Self::daily_normalizer(), raw).await
    }

    pub async fn aggregated(
        &self,
        raw: &RawParams,
    ) -> Result<PaginatedResult<InstitutionTradingAggregate>, CoreError> {
        fetch_page(
            &self.client,
            AGGREGATED_PATH,
            &Self::aggregated_normalizer(),
            raw,
        )
        .await
    }

    pub fn daily_store(&self) -> QueryStore<InstitutionTradingStat> {
        store_for(
            &self.client,
            DAILY_PATH,
            Self::daily_normalizer(),
            DEFAULT_STORE_PAGE_SIZE,
        )
    }

    pub fn aggregated_store(&self) -> QueryStore<InstitutionTradingAggregate> {
        store_for(
            &self.client,
            AGGREGATED_PATH,
            Self::aggregated_normalizer(),
            DEFAULT_STORE_PAGE_SIZE,
        )
    }
}
