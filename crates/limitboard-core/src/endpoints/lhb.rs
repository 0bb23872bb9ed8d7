use super::{fetch_page, store_for};
use crate::api_client::ApiClient;
use crate::query::{PaginatedResult, QueryNormalizer, RawParams};
use crate::store::{QueryStore, DEFAULT_STORE_PAGE_SIZE};
use crate::{CoreError, InstitutionActivity, LhbItem};

const LIST_PATH: &str = "/lhb/";
const INSTITUTION_PATH: &str = "/lhb/institution";

const INSTITUTION_KEYS: [&str; 7] = [
    "stock_code",
    "stock_name",
    "flag",
    "page",
    "page_size",
    "sort_by",
    "order",
];

/// Dragon-tiger board disclosures.
#[derive(Clone)]
pub struct LhbApi {
    client: ApiClient,
}

impl LhbApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, raw: &RawParams) -> Result<PaginatedResult<LhbItem>, CoreError> {
        fetch_page(&self.client, LIST_PATH, &QueryNormalizer::default(), raw).await
    }

    pub fn store(&self) -> QueryStore<LhbItem> {
        store_for(
            &self.client,
            LIST_PATH,
            QueryNormalizer::default(),
            DEFAULT_STORE_PAGE_SIZE,
        )
    }

    /// Seat-level institution trades. Without a date the server returns its
    /// latest synchronized session.
    pub fn institution_normalizer() -> QueryNormalizer {
        QueryNormalizer::default().with_allowed_keys(INSTITUTION_KEYS)
    }

    pub async fn institution_activity(
        &self,
        raw: &RawParams,
    ) -> Result<PaginatedResult<InstitutionActivity>, CoreError> {
        fetch_page(
            &self.client,
            INSTITUTION_PATH,
            &Self::institution_normalizer(),
            raw,
        )
        .await
    }

    pub fn institution_store(&self) -> QueryStore<InstitutionActivity> {
        store_for(
            &self.client,
            INSTITUTION_PATH,
            Self::institution_normalizer(),
            DEFAULT_STORE_PAGE_SIZE,
        )
    }
}
