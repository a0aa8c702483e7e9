use serde_json::Value;
use serde_json::json;
use taskboard_backend_client as backend;
use tracing::debug;
use tracing::info;

use crate::api::NewTask;
use crate::api::Result;
use crate::api::Task;
use crate::api::TaskBackend;
use crate::api::TaskError;
use crate::api::TaskId;
use crate::api::TaskUpdate;
use crate::wire::WireFormat;

pub const TASKS_ENDPOINT: &str = "/todo/todos/";

/// Ids become a single path segment and must not be able to leave it.
fn checked_id(id: &TaskId) -> Result<&TaskId> {
    let raw = id.0.as_str();
    if raw.is_empty() || raw == "." || raw == ".." || raw.contains(['/', '\\', '?', '#', '%']) {
        return Err(TaskError::InvalidId(id.clone()));
    }
    Ok(id)
}

fn task_endpoint(id: &TaskId) -> Result<String> {
    let id = checked_id(id)?;
    Ok(format!("{TASKS_ENDPOINT}{id}/"))
}

fn mark_completed_endpoint(id: &TaskId) -> Result<String> {
    let id = checked_id(id)?;
    Ok(format!("{TASKS_ENDPOINT}{id}/mark_as_completed/"))
}

/// Task resource over the authenticated REST client.
#[derive(Clone, Debug)]
pub struct HttpTaskClient {
    backend: backend::Client,
    wire: WireFormat,
}

impl HttpTaskClient {
    pub fn new(backend: backend::Client) -> Self {
        Self {
            backend,
            wire: WireFormat::default(),
        }
    }

    pub fn with_wire_format(mut self, wire: WireFormat) -> Self {
        self.wire = wire;
        self
    }

    pub fn backend(&self) -> &backend::Client {
        &self.backend
    }

    fn expect_task(&self, endpoint: &str, body: Option<Value>) -> Result<Task> {
        let body = body.ok_or_else(|| TaskError::EmptyResponse(endpoint.to_string()))?;
        self.wire.decode_task(&body)
    }
}

#[async_trait::async_trait]
impl TaskBackend for HttpTaskClient {
    async fn list_tasks(&self) -> Result<Vec<Task>> {
        let body: Option<Value> = self.backend.get(TASKS_ENDPOINT).await?;
        let tasks = match body {
            Some(body) => self.wire.decode_list(&body)?,
            None => Vec::new(),
        };
        debug!(wire = %self.wire, count = tasks.len(), "listed tasks");
        Ok(tasks)
    }

    async fn create_task(&self, task: NewTask) -> Result<Task> {
        let payload = self.wire.encode_new(&task);
        let body = self.backend.post(TASKS_ENDPOINT, &payload).await?;
        let created = self.expect_task(TASKS_ENDPOINT, body)?;
        info!(id = %created.id, "created task");
        Ok(created)
    }

    async fn update_task(&self, id: &TaskId, update: TaskUpdate) -> Result<Task> {
        let endpoint = task_endpoint(id)?;
        let payload = self.wire.encode_update(&update);
        let body = self.backend.patch(&endpoint, &payload).await?;
        let updated = self.expect_task(&endpoint, body)?;
        info!(%id, "updated task");
        Ok(updated)
    }

    async fn delete_task(&self, id: &TaskId) -> Result<()> {
        self.backend.delete(&task_endpoint(id)?).await?;
        info!(%id, "deleted task");
        Ok(())
    }

    async fn mark_completed(&self, id: &TaskId) -> Result<()> {
        self.backend
            .post_action(&mark_completed_endpoint(id)?, &json!({}))
            .await?;
        info!(%id, "marked task completed");
        Ok(())
    }
}
