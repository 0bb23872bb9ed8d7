use tracing::debug;

use super::{fetch_page, segment, store_for};
use crate::api_client::ApiClient;
use crate::query::{
    keys, reconcile, DatePolicy, FilterRequest, FilterResultItem, PaginatedResult, ParamValue,
    QueryNormalizer, QueryParameterSet, QueryResult, RawParams,
};
use crate::store::QueryStore;
use crate::{
    ConceptFundFlowItem, CoreError, FundFlowItem, IndustryFundFlowItem, SortOrder, TradeDate,
};

const LIST_PATH: &str = "/stock-fund-flow";
const CONCEPT_PATH: &str = "/stock-fund-flow/concept";
const INDUSTRY_PATH: &str = "/stock-fund-flow/industry";

const LIST_PAGE_SIZE: u32 = 50;
const DEFAULT_SORT_FIELD: &str = "main_net_inflow";

/// Parameters the concept endpoint accepts besides the date selectors.
const CONCEPT_KEYS: [&str; 5] = [
    "concept",
    keys::PAGE,
    keys::PAGE_SIZE,
    keys::SORT_BY,
    keys::ORDER,
];

#[derive(Clone)]
pub struct FundFlowApi {
    client: ApiClient,
}

impl FundFlowApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn list_normalizer() -> QueryNormalizer {
        QueryNormalizer::new(DatePolicy::RequireAny)
    }

    /// Concept queries switch response shape on the date selectors, so only
    /// whitelisted keys are forwarded.
    pub fn concept_normalizer() -> QueryNormalizer {
        QueryNormalizer::default().with_allowed_keys(CONCEPT_KEYS)
    }

    /// Per-stock fund flow. A date or range is required.
    pub async fn list(&self, raw: &RawParams) -> Result<PaginatedResult<FundFlowItem>, CoreError> {
        fetch_page(&self.client, LIST_PATH, &Self::list_normalizer(), raw).await
    }

    pub async fn history(
        &self,
        stock_code: &str,
        start: TradeDate,
        end: TradeDate,
    ) -> Result<Vec<FundFlowItem>, CoreError> {
        let path = format!("{LIST_PATH}/{}/history", segment(stock_code));
        let params: QueryParameterSet = [
            (keys::START_DATE, ParamValue::Text(start.format())),
            (keys::END_DATE, ParamValue::Text(end.format())),
        ]
        .into_iter()
        .collect();
        Ok(self.client.get(&path, &params).await?)
    }

    /// Concept fund flow: a bare list for a single date, a page for a range.
    pub async fn concept(
        &self,
        raw: &RawParams,
    ) -> Result<PaginatedResult<ConceptFundFlowItem>, CoreError> {
        fetch_page(&self.client, CONCEPT_PATH, &Self::concept_normalizer(), raw).await
    }

    pub async fn industry(
        &self,
        date: TradeDate,
        limit: u32,
    ) -> Result<Vec<IndustryFundFlowItem>, CoreError> {
        let params: QueryParameterSet = [
            (keys::DATE, ParamValue::Text(date.format())),
            (keys::LIMIT, ParamValue::Int(i64::from(limit))),
        ]
        .into_iter()
        .collect();
        Ok(self.client.get(INDUSTRY_PATH, &params).await?)
    }

    /// Submits a multi-condition filter and checks every result against it.
    pub async fn filter(
        &self,
        request: &FilterRequest,
    ) -> Result<PaginatedResult<FilterResultItem>, CoreError> {
        let target = request.target();
        debug!(
            path = target.path(),
            conditions = request.conditions().len(),
            "submitting filter"
        );

        let result: QueryResult<FilterResultItem> = self.client.post(target.path(), request).await?;
        let page = reconcile(result, Some(request.page_size()));

        let condition_count = request.conditions().len();
        for item in &page.items {
            item.check_matches(condition_count)?;
        }

        Ok(page)
    }

    /// Store for the stock list, sorted by main net inflow descending.
    pub fn list_store(&self) -> QueryStore<FundFlowItem> {
        store_for(&self.client, LIST_PATH, Self::list_normalizer(), LIST_PAGE_SIZE).with_filters(
            RawParams::new()
                .with(keys::SORT_BY, DEFAULT_SORT_FIELD)
                .with(keys::ORDER, SortOrder::Desc.as_str()),
        )
    }

    /// The concept view follows the page and page size the server echoes.
    pub fn concept_store(&self) -> QueryStore<ConceptFundFlowItem> {
        store_for(
            &self.client,
            CONCEPT_PATH,
            Self::concept_normalizer(),
            LIST_PAGE_SIZE,
        )
        .with_server_pagination()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoints::testing::{api_client, ScriptedHttpClient};
    use crate::query::{ConditionDraft, DateRange, FilterTarget, NumericRange};
    use crate::{HttpMethod, ValidationError};

    const CONCEPT_ROW: &str = r#"{"concept": "算力", "net_amount": 120000000.0}"#;

    fn date(value: &str) -> TradeDate {
        TradeDate::parse(value).expect("valid date")
    }

    #[tokio::test]
    async fn concept_single_date_returns_bare_list_page() {
        let body = format!("[{CONCEPT_ROW}, {CONCEPT_ROW}]");
        let http = ScriptedHttpClient::with_json(&[body.as_str()]);
        let api = FundFlowApi::new(api_client(http.clone()));

        let page = api
            .concept(
                &RawParams::new()
                    .with("date", "2024-05-10")
                    .with("limit", 30)
                    .with("stock_code", "600000"),
            )
            .await
            .expect("succeeds");

        assert_eq!(page.total, 2);
        assert_eq!(page.page_size, 30);
        assert_eq!(
            http.recorded_requests()[0].url,
            "https://board.example/api/v1/stock-fund-flow/concept?date=2024-05-10&limit=30"
        );
    }

    #[tokio::test]
    async fn concept_range_returns_envelope_page() {
        let body = format!(r#"{{"items": [{CONCEPT_ROW}], "total": 61, "page": 2, "page_size": 30}}"#);
        let http = ScriptedHttpClient::with_json(&[body.as_str()]);
        let api = FundFlowApi::new(api_client(http.clone()));

        let page = api
            .concept(
                &RawParams::new()
                    .with("start_date", "2024-05-01")
                    .with("end_date", "2024-05-10")
                    .with("date", "2024-05-10")
                    .with("page", 2),
            )
            .await
            .expect("succeeds");

        assert_eq!(page.total, 61);
        assert_eq!(page.page, 2);
        assert_eq!(page.total_pages, 3);
        let url = &http.recorded_requests()[0].url;
        assert!(!url.split(['?', '&']).any(|pair| pair.starts_with("date=")));
        assert!(url.contains("start_date=2024-05-01"));
    }

    #[tokio::test]
    async fn stock_list_requires_a_date_before_sending() {
        let http = ScriptedHttpClient::with_json(&[]);
        let api = FundFlowApi::new(api_client(http.clone()));

        let error = api.list(&RawParams::new()).await.expect_err("must fail");

        assert!(matches!(
            error,
            CoreError::Validation(ValidationError::MissingRequiredDate)
        ));
        assert!(http.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn filter_posts_request_and_validates_matches() {
        let body = r#"{
            "items": [{
                "concept_code": "BK0001",
                "concept": "算力",
                "matched_conditions": [
                    {"condition_index": 0, "matched_count": 1, "matched_records": []},
                    {"condition_index": 1, "matched_count": 2, "matched_records": []}
                ]
            }],
            "total": 1, "page": 1, "page_size": 20
        }"#;
        let http = ScriptedHttpClient::with_json(&[body]);
        let api = FundFlowApi::new(api_client(http.clone()));
        let request = FilterRequest::builder(FilterTarget::Concepts)
            .condition(
                ConditionDraft::new(DateRange::between(date("2024-05-01"), date("2024-05-05")))
                    .with_metric("net_amount", NumericRange::at_least(0.0)),
            )
            .condition(ConditionDraft::new(DateRange::between(
                date("2024-04-01"),
                date("2024-04-30"),
            )))
            .build()
            .expect("valid");

        let page = api.filter(&request).await.expect("succeeds");

        assert_eq!(page.items[0].entity.name, "算力");
        let sent = &http.recorded_requests()[0];
        assert_eq!(sent.method, HttpMethod::Post);
        assert!(sent.url.ends_with("/stock-fund-flow/concept/filter"));
    }

    #[tokio::test]
    async fn filter_rejects_results_referencing_unknown_conditions() {
        let body = r#"[{"stock_code": "600000", "stock_name": "浦发银行",
            "matched_conditions": [{"condition_index": 3}]}]"#;
        let http = ScriptedHttpClient::with_json(&[body]);
        let api = FundFlowApi::new(api_client(http));
        let request = FilterRequest::builder(FilterTarget::Stocks)
            .condition(ConditionDraft::new(DateRange::new(Some(date("2024-05-01")), None)))
            .build()
            .expect("valid");

        let error = api.filter(&request).await.expect_err("must fail");

        assert!(matches!(
            error,
            CoreError::Validation(ValidationError::MatchedConditionIndex { index: 3, count: 1 })
        ));
    }

    #[tokio::test]
    async fn concept_store_follows_echoed_page_size() {
        let http = ScriptedHttpClient::with_json(&[
            r#"{"items": [], "total": 75, "page": 2, "page_size": 25}"#,
        ]);
        let store = FundFlowApi::new(api_client(http)).concept_store();
        store.set_pagination(2, 30);

        store.fetch(None).await.expect("succeeds");

        let pagination = store.pagination();
        assert_eq!((pagination.page, pagination.page_size), (2, 25));
        assert_eq!(pagination.total, 75);
    }

    #[tokio::test]
    async fn list_store_sends_default_sort() {
        let http = ScriptedHttpClient::with_json(&[r#"{"items": [], "total": 0}"#]);
        let api = FundFlowApi::new(api_client(http.clone()));
        let store = api.list_store();
        store.set_filters(RawParams::new().with("date", "2024-05-10"));

        store.fetch(None).await.expect("succeeds");

        let url = &http.recorded_requests()[0].url;
        assert!(url.contains("sort_by=main_net_inflow"));
        assert!(url.contains("order=desc"));
        assert!(url.contains("page_size=50"));
    }
}
