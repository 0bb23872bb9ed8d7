use std::collections::BTreeMap;

use tracing::info;

use super::{fetch_page, store_for};
use crate::api_client::ApiClient;
use crate::query::{PaginatedResult, QueryNormalizer, RawParams};
use crate::store::{QueryStore, DEFAULT_STORE_PAGE_SIZE};
use crate::{
    CoreError, TaskCatalog, TaskExecution, TaskRunRequest, TaskRunResponse, TaskStatusEntry,
};

const EXECUTIONS_PATH: &str = "/tasks/executions";
const STATUS_PATH: &str = "/tasks/status";
const RUN_PATH: &str = "/tasks/run";
const TASK_TYPES_PATH: &str = "/tasks/task-types";

const EXECUTION_KEYS: [&str; 5] = ["page", "page_size", "task_type", "status", "task_name"];

/// Backend data synchronization jobs: history, status and manual runs.
#[derive(Clone)]
pub struct TaskApi {
    client: ApiClient,
}

impl TaskApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Forwards the log's own filters and paging; stock filters are dropped.
    pub fn executions_normalizer() -> QueryNormalizer {
        QueryNormalizer::default().with_allowed_keys(EXECUTION_KEYS)
    }

    pub async fn executions(
        &self,
        raw: &RawParams,
    ) -> Result<PaginatedResult<TaskExecution>, CoreError> {
        fetch_page(
            &self.client,
            EXECUTIONS_PATH,
            &Self::executions_normalizer(),
            raw,
        )
        .await
    }

    pub async fn execution(&self, id: i64) -> Result<TaskExecution, CoreError> {
        let path = format!("{EXECUTIONS_PATH}/{id}");
        Ok(self.client.get(&path, &Default::default()).await?)
    }

    /// Latest state per task type, keyed by type.
    pub async fn status(&self) -> Result<BTreeMap<String, TaskStatusEntry>, CoreError> {
        Ok(self.client.get(STATUS_PATH, &Default::default()).await?)
    }

    /// Queues a run; the backend executes it in the background.
    pub async fn run(&self, request: &TaskRunRequest) -> Result<TaskRunResponse, CoreError> {
        let response: TaskRunResponse = self.client.post(RUN_PATH, request).await?;
        info!(
            execution_id = response.execution_id,
            task_types = ?response.task_types,
            "task run submitted"
        );
        Ok(response)
    }

    pub async fn task_types(&self) -> Result<TaskCatalog, CoreError> {
        Ok(self.client.get(TASK_TYPES_PATH, &Default::default()).await?)
    }

    pub fn executions_store(&self) -> QueryStore<TaskExecution> {
        store_for(
            &self.client,
            EXECUTIONS_PATH,
            Self::executions_normalizer(),
            DEFAULT_STORE_PAGE_SIZE,
        )
    }
}
