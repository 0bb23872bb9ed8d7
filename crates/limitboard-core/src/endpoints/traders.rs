use super::store_for;
use crate::api_client::ApiClient;
use crate::query::QueryNormalizer;
use crate::store::{QueryStore, DEFAULT_STORE_PAGE_SIZE};
use crate::{CoreError, Trader};

const LIST_PATH: &str = "/lhb/traders";

/// Hot-money trader directory used to label disclosure seats.
#[derive(Clone)]
pub struct TraderApi {
    client: ApiClient,
}

impl TraderApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<Trader>, CoreError> {
        Ok(self.client.get(LIST_PATH, &Default::default()).await?)
    }

    /// The directory is one unpaged array, so the store shows it as a
    /// single page.
    pub fn store(&self) -> QueryStore<Trader> {
        store_for(
            &self.client,
            LIST_PATH,
            QueryNormalizer::default().with_allowed_keys(std::iter::empty::<&str>()),
            DEFAULT_STORE_PAGE_SIZE,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoints::testing::{api_client, ScriptedHttpClient};

    const TRADERS: &str = r#"[{
        "id": 1, "name": "章盟主", "aka": "章建平",
        "branches": [
            {"id": 10, "trader_id": 1, "institution_name": "国泰君安上海江苏路", "institution_code": "80033"},
            {"id": 11, "trader_id": 1, "institution_name": "中信证券杭州延安路"}
        ]
    }, {"id": 2, "name": "炒股养家", "branches": []}]"#;

    #[tokio::test]
    async fn list_decodes_branches() {
        let http = ScriptedHttpClient::with_json(&[TRADERS]);
        let api = TraderApi::new(api_client(http.clone()));

        let traders = api.list().await.expect("succeeds");

        assert_eq!(traders.len(), 2);
        assert_eq!(traders[0].branches[1].institution_code, None);
        assert_eq!(traders[1].aka, None);
        assert_eq!(
            http.recorded_requests()[0].url,
            "https://board.example/api/v1/lhb/traders"
        );
    }

    #[tokio::test]
    async fn store_shows_directory_as_one_page() {
        let http = ScriptedHttpClient::with_json(&[TRADERS]);
        let store = TraderApi::new(api_client(http.clone())).store();

        let page = store.fetch(None).await.expect("succeeds");

        assert_eq!(page.total, 2);
        assert_eq!(page.total_pages, 1);
        assert_eq!(store.items().len(), 2);
        assert_eq!(
            http.recorded_requests()[0].url,
            "https://board.example/api/v1/lhb/traders"
        );
    }
}
