use crate::api_client::ApiClient;
use crate::query::{QueryNormalizer, RawParams};
use crate::{CoreError, IndexSnapshot, SectorItem};

const INDEX_PATH: &str = "/index/";
const SECTOR_PATH: &str = "/sector/";

/// Index and sector snapshots. Both endpoints answer with bare lists.
#[derive(Clone)]
pub struct MarketApi {
    client: ApiClient,
}

impl MarketApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn indices(&self, raw: &RawParams) -> Result<Vec<IndexSnapshot>, CoreError> {
        let params = QueryNormalizer::default().normalize(raw)?;
        Ok(self.client.get(INDEX_PATH, &params).await?)
    }

    pub async fn sectors(&self, raw: &RawParams) -> Result<Vec<SectorItem>, CoreError> {
        let params = QueryNormalizer::default().normalize(raw)?;
        Ok(self.client.get(SECTOR_PATH, &params).await?)
    }
}
