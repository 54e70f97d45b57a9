use crate::error::{Result, SyncError};
use crate::task::{Created, Filter, NewTask, Task, TaskId, TaskReplace};
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// The task server's REST surface. The server is the only source of truth;
/// nothing behind this trait caches.
#[async_trait]
pub trait TaskApi: Send + Sync {
    async fn list(&self, filter: Filter) -> Result<Vec<Task>>;
    async fn create(&self, task: &NewTask) -> Result<Created>;
    async fn toggle(&self, id: TaskId) -> Result<()>;
    async fn replace(&self, id: TaskId, task: &TaskReplace) -> Result<()>;
    async fn delete(&self, id: TaskId) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct HttpTaskApi {
    client: Client,
    base_url: String,
}

impl HttpTaskApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn tasks_url(&self) -> String {
        format!("{}/api/tasks", self.base_url)
    }

    fn task_url(&self, id: TaskId) -> String {
        format!("{}/api/tasks/{}", self.base_url, id)
    }

    async fn send(&self, what: &str, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status();
        debug!("{what}: HTTP {status}");
        if status.is_success() {
            return Ok(response);
        }
        // The body is best effort; an unreadable one falls back to the reason phrase.
        let body = response.text().await.unwrap_or_default();
        let message = if body.trim().is_empty() {
            status.canonical_reason().unwrap_or("request failed").to_string()
        } else {
            body.trim().to_string()
        };
        warn!("{what} rejected with HTTP {status}: {message}");
        Err(SyncError::Server {
            status: status.as_u16(),
            message,
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl TaskApi for HttpTaskApi {
    async fn list(&self, filter: Filter) -> Result<Vec<Task>> {
        let request = self
            .client
            .get(self.tasks_url())
            .query(&[("status", filter.as_str())]);
        let response = self.send("list tasks", request).await?;
        Self::decode(response).await
    }

    async fn create(&self, task: &NewTask) -> Result<Created> {
        let request = self.client.post(self.tasks_url()).json(task);
        let response = self.send("create task", request).await?;
        Self::decode(response).await
    }

    async fn toggle(&self, id: TaskId) -> Result<()> {
        let request = self.client.patch(format!("{}/toggle", self.task_url(id)));
        self.send("toggle task", request).await.map(drop)
    }

    async fn replace(&self, id: TaskId, task: &TaskReplace) -> Result<()> {
        let request = self.client.put(self.task_url(id)).json(task);
        self.send("replace task", request).await.map(drop)
    }

    async fn delete(&self, id: TaskId) -> Result<()> {
        let request = self.client.delete(self.task_url(id));
        self.send("delete task", request).await.map(drop)
    }
}
