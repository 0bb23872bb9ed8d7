use super::{fetch_page, store_for};
use crate::api_client::ApiClient;
use crate::query::{PaginatedResult, QueryNormalizer, RawParams};
use crate::store::{QueryStore, DEFAULT_STORE_PAGE_SIZE};
use crate::{CoreError, NewTradingCalendarEntry, TradingCalendarEntry, TradingCalendarUpdate};

const BASE_PATH: &str = "/trading-calendar";

#[derive(Clone)]
pub struct TradingCalendarApi {
    client: ApiClient,
}

impl TradingCalendarApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(
        &self,
        raw: &RawParams,
    ) -> Result<PaginatedResult<TradingCalendarEntry>, CoreError> {
        fetch_page(&self.client, BASE_PATH, &QueryNormalizer::default(), raw).await
    }

    pub async fn get(&self, id: i64) -> Result<TradingCalendarEntry, CoreError> {
        Ok(self
            .client
            .get(&entry_path(id), &Default::default())
            .await?)
    }

    pub async fn create(
        &self,
        entry: &NewTradingCalendarEntry,
    ) -> Result<TradingCalendarEntry, CoreError> {
        Ok(self.client.post(BASE_PATH, entry).await?)
    }

    /// Fields left as `None` are not sent and stay unchanged server-side.
    pub async fn update(
        &self,
        id: i64,
        update: &TradingCalendarUpdate,
    ) -> Result<TradingCalendarEntry, CoreError> {
        Ok(self.client.put(&entry_path(id), update).await?)
    }

    pub async fn delete(&self, id: i64) -> Result<(), CoreError> {
        Ok(self.client.delete(&entry_path(id)).await?)
    }

    pub fn store(&self) -> QueryStore<TradingCalendarEntry> {
        store_for(
            &self.client,
            BASE_PATH,
            QueryNormalizer::default(),
            DEFAULT_STORE_PAGE_SIZE,
        )
    }
}

fn entry_path(id: i64) -> String {
    format!("{BASE_PATH}/{id}")
}
