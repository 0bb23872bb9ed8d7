use super::{fetch_page, store_for};
use crate::api_client::ApiClient;
use crate::query::{PaginatedResult, QueryNormalizer, RawParams};
use crate::store::QueryStore;
use crate::{CoreError, StockConcept};

const BASE_PATH: &str = "/stock-concept";
const LIST_PATH: &str = "/stock-concept/";
const CATALOG_PAGE_SIZE: u32 = 100;

const LIST_KEYS: [&str; 6] = ["name", "code", "level", "parent_id", "page", "page_size"];

/// Concept board catalog.
#[derive(Clone)]
pub struct StockConceptApi {
    client: ApiClient,
}

impl StockConceptApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// `name` matches fuzzily, `code` exactly.
    pub fn list_normalizer() -> QueryNormalizer {
        QueryNormalizer::default().with_allowed_keys(LIST_KEYS)
    }

    pub async fn list(&self, raw: &RawParams) -> Result<PaginatedResult<StockConcept>, CoreError> {
        fetch_page(&self.client, LIST_PATH, &Self::list_normalizer(), raw).await
    }

    pub async fn get(&self, id: i64) -> Result<StockConcept, CoreError> {
        let path = format!("{BASE_PATH}/{id}");
        Ok(self.client.get(&path, &Default::default()).await?)
    }

    pub fn store(&self) -> QueryStore<StockConcept> {
        store_for(
            &self.client,
            LIST_PATH,
            Self::list_normalizer(),
            CATALOG_PAGE_SIZE,
        )
    }
}
