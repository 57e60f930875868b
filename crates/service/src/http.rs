//! JSON-over-HTTP binding of the core service.

use crate::error::{ServiceError, ServiceResult};
use crate::traits::{ByteStream, Connector, CoreService, StreamDownload};
use async_trait::async_trait;
use cmsweep_core::{
    ApplicationData, BatchData, BatchesFilter, ItemData, PublishTransactionData,
    PublishTransactionsFilter, PurgeOldVersionsInstruction, PurgeWorkflowHistoryInstruction,
    QueueData, QueueId, RepositoryData, ServiceFault, SessionConfig,
};
use futures::StreamExt;
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::sync::Arc;

/// Opens HTTP handles from the session configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpConnector;

#[async_trait]
impl Connector for HttpConnector {
    async fn connect(&self, config: &SessionConfig) -> ServiceResult<Arc<dyn CoreService>> {
        Ok(Arc::new(HttpCoreService::new(config)?))
    }

    async fn connect_download(
        &self,
        config: &SessionConfig,
    ) -> ServiceResult<Arc<dyn StreamDownload>> {
        Ok(Arc::new(HttpStreamDownload::new(config)?))
    }
}

fn parse_base(url: &str) -> ServiceResult<Url> {
    Url::parse(url).map_err(|e| ServiceError::InvalidUrl(format!("{url}: {e}")))
}

fn join_segments(base: &Url, segments: &[&str]) -> ServiceResult<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| ServiceError::InvalidUrl(format!("{base} cannot be a base")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Turn a non-success response into a fault, using the fault body when present.
fn fault_from_response(status: StatusCode, body: &str) -> ServiceError {
    match serde_json::from_str::<ServiceFault>(body) {
        Ok(fault) => ServiceError::Fault {
            code: fault.error_code,
            message: fault.message,
        },
        Err(_) => {
            let message = if body.trim().is_empty() {
                status.to_string()
            } else {
                body.trim().to_string()
            };
            ServiceError::fault(format!("Http{}", status.as_u16()), message)
        }
    }
}

// =============================================================================
// Request/response bodies
// =============================================================================

#[derive(Debug, Deserialize)]
struct ApiVersionResponse {
    version: String,
}

#[derive(Debug, Deserialize)]
struct PurgeCountResponse {
    count: i64,
}

#[derive(Debug, Deserialize)]
struct ResolveUriResponse {
    id: String,
}

#[derive(Debug, Serialize)]
struct DeleteApplicationDataRequest<'a> {
    subject_id: Option<&'a str>,
    application_id: &'a str,
}

#[derive(Debug, Serialize)]
struct ReindexRequest<'a> {
    repository_id: Option<&'a str>,
}

// =============================================================================
// Core service client
// =============================================================================

/// Request/response client for the core service endpoint.
#[derive(Clone)]
pub struct HttpCoreService {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpCoreService {
    /// Build a client for the service URL of `config`.
    ///
    /// The configured timeout bounds every call. Bodies are read whole, with no
    /// size or quota limit.
    pub fn new(config: &SessionConfig) -> ServiceResult<Self> {
        let base_url = parse_base(&config.service_url())?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self { http, base_url })
    }

    fn url(&self, segments: &[&str]) -> ServiceResult<Url> {
        join_segments(&self.base_url, segments)
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> ServiceResult<String> {
        let response = req.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(fault_from_response(status, &body));
        }
        Ok(response.text().await?)
    }

    async fn send_json<T: DeserializeOwned>(&self, req: reqwest::RequestBuilder) -> ServiceResult<T> {
        let body = self.send(req).await?;
        serde_json::from_str(&body).map_err(|e| ServiceError::Decode(e.to_string()))
    }

    async fn send_empty(&self, req: reqwest::RequestBuilder) -> ServiceResult<()> {
        self.send(req).await.map(|_| ())
    }
}

#[async_trait]
impl CoreService for HttpCoreService {
    async fn api_version(&self) -> ServiceResult<String> {
        let url = self.url(&["api-version"])?;
        let response: ApiVersionResponse = self.send_json(self.http.get(url)).await?;
        Ok(response.version)
    }

    async fn read(&self, id: &str) -> ServiceResult<ItemData> {
        let url = self.url(&["items", id])?;
        self.send_json(self.http.get(url)).await
    }

    async fn delete(&self, id: &str) -> ServiceResult<()> {
        let url = self.url(&["items", id])?;
        self.send_empty(self.http.delete(url)).await
    }

    async fn list_batches(&self, filter: &BatchesFilter) -> ServiceResult<Vec<BatchData>> {
        let url = self.url(&["lists", "batches"])?;
        self.send_json(self.http.post(url).json(filter)).await
    }

    async fn list_publish_transactions(
        &self,
        filter: &PublishTransactionsFilter,
    ) -> ServiceResult<Vec<PublishTransactionData>> {
        let url = self.url(&["lists", "publish-transactions"])?;
        self.send_json(self.http.post(url).json(filter)).await
    }

    async fn list_repositories(&self) -> ServiceResult<Vec<RepositoryData>> {
        let url = self.url(&["lists", "repositories"])?;
        self.send_json(self.http.get(url)).await
    }

    async fn list_queues(&self) -> ServiceResult<Vec<QueueData>> {
        let url = self.url(&["queues"])?;
        self.send_json(self.http.get(url)).await
    }

    async fn purge_old_versions(
        &self,
        instruction: &PurgeOldVersionsInstruction,
    ) -> ServiceResult<i64> {
        let url = self.url(&["purge", "old-versions"])?;
        let response: PurgeCountResponse =
            self.send_json(self.http.post(url).json(instruction)).await?;
        Ok(response.count)
    }

    async fn purge_workflow_history(
        &self,
        instruction: &PurgeWorkflowHistoryInstruction,
    ) -> ServiceResult<()> {
        let url = self.url(&["purge", "workflow-history"])?;
        self.send_empty(self.http.post(url).json(instruction)).await
    }

    async fn purge_application_data(&self, application_id: &str) -> ServiceResult<()> {
        let url = self.url(&["application-data", application_id])?;
        self.send_empty(self.http.delete(url)).await
    }

    async fn delete_application_data(
        &self,
        subject_id: Option<&str>,
        application_id: &str,
    ) -> ServiceResult<()> {
        let url = self.url(&["application-data", "delete"])?;
        let body = DeleteApplicationDataRequest {
            subject_id,
            application_id,
        };
        self.send_empty(self.http.post(url).json(&body)).await
    }

    async fn read_all_application_data(
        &self,
        subject_id: Option<&str>,
    ) -> ServiceResult<Vec<ApplicationData>> {
        let mut url = self.url(&["application-data"])?;
        if let Some(subject_id) = subject_id {
            url.query_pairs_mut().append_pair("subject_id", subject_id);
        }
        self.send_json(self.http.get(url)).await
    }

    async fn application_ids(&self) -> ServiceResult<Vec<String>> {
        let url = self.url(&["application-ids"])?;
        self.send_json(self.http.get(url)).await
    }

    async fn purge_queue(&self, queue: QueueId) -> ServiceResult<()> {
        let id = queue.id().to_string();
        let url = self.url(&["queues", &id, "purge"])?;
        self.send_empty(self.http.post(url)).await
    }

    async fn reindex(&self, repository_id: Option<&str>) -> ServiceResult<()> {
        let url = self.url(&["search", "reindex"])?;
        let body = ReindexRequest { repository_id };
        self.send_empty(self.http.post(url).json(&body)).await
    }

    async fn decommission_publication_target(&self, id: &str) -> ServiceResult<()> {
        let url = self.url(&["publication-targets", id, "decommission"])?;
        self.send_empty(self.http.post(url)).await
    }

    async fn resolve_uri(&self, webdav_url: &str) -> ServiceResult<String> {
        let mut url = self.url(&["uris", "resolve"])?;
        url.query_pairs_mut().append_pair("path", webdav_url);
        let response: ResolveUriResponse = self.send_json(self.http.get(url)).await?;
        Ok(response.id)
    }
}

// =============================================================================
// Streaming download client
// =============================================================================

/// Streaming client for the download endpoint.
#[derive(Clone)]
pub struct HttpStreamDownload {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpStreamDownload {
    /// Build a streaming client for the download URL of `config`.
    ///
    /// Uses connect and read timeouts so long transfers are not cut off.
    pub fn new(config: &SessionConfig) -> ServiceResult<Self> {
        let base_url = parse_base(&config.download_url())?;
        let http = reqwest::Client::builder()
            .connect_timeout(config.timeout())
            .read_timeout(config.timeout())
            .build()?;
        Ok(Self { http, base_url })
    }
}

#[async_trait]
impl StreamDownload for HttpStreamDownload {
    async fn download_application_data(&self, application_id: &str) -> ServiceResult<ByteStream> {
        let url = join_segments(&self.base_url, &["application-data", application_id])?;
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(fault_from_response(status, &body));
        }
        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(ServiceError::from));
        Ok(Box::pin(stream))
    }
}
