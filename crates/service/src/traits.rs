//! Core service capability definitions.

use crate::error::ServiceResult;
use async_trait::async_trait;
use bytes::Bytes;
use cmsweep_core::{
    ApplicationData, BatchData, BatchesFilter, ItemData, PublishTransactionData,
    PublishTransactionsFilter, PurgeOldVersionsInstruction, PurgeWorkflowHistoryInstruction,
    QueueData, QueueId, RepositoryData, SessionConfig,
};
use futures::Stream;
use std::pin::Pin;
use std::sync::Arc;

/// A boxed stream of bytes for streaming downloads.
pub type ByteStream = Pin<Box<dyn Stream<Item = ServiceResult<Bytes>> + Send>>;

/// Remote management service.
///
/// Every call is a single request/response. Implementations apply the
/// session timeout to each call and report faults as [`ServiceError::Fault`].
///
/// [`ServiceError::Fault`]: crate::error::ServiceError::Fault
#[async_trait]
pub trait CoreService: Send + Sync + 'static {
    /// Version of the service API. Used as the connectivity check.
    async fn api_version(&self) -> ServiceResult<String>;

    /// Read an item by URI or WebDAV URL.
    async fn read(&self, id: &str) -> ServiceResult<ItemData>;

    /// Delete an item by URI.
    async fn delete(&self, id: &str) -> ServiceResult<()>;

    /// List batches system-wide.
    async fn list_batches(&self, filter: &BatchesFilter) -> ServiceResult<Vec<BatchData>>;

    /// List publish transactions system-wide.
    async fn list_publish_transactions(
        &self,
        filter: &PublishTransactionsFilter,
    ) -> ServiceResult<Vec<PublishTransactionData>>;

    /// List repositories (publications).
    async fn list_repositories(&self) -> ServiceResult<Vec<RepositoryData>>;

    /// List message queues.
    async fn list_queues(&self) -> ServiceResult<Vec<QueueData>>;

    /// Purge old versions. Returns the number of versions removed.
    async fn purge_old_versions(
        &self,
        instruction: &PurgeOldVersionsInstruction,
    ) -> ServiceResult<i64>;

    /// Purge workflow process histories.
    async fn purge_workflow_history(
        &self,
        instruction: &PurgeWorkflowHistoryInstruction,
    ) -> ServiceResult<()>;

    /// Purge all application data stored under an application id.
    async fn purge_application_data(&self, application_id: &str) -> ServiceResult<()>;

    /// Delete application data for a subject (`None` for system-wide data).
    async fn delete_application_data(
        &self,
        subject_id: Option<&str>,
        application_id: &str,
    ) -> ServiceResult<()>;

    /// Read every application data entry for a subject (`None` for system-wide data).
    async fn read_all_application_data(
        &self,
        subject_id: Option<&str>,
    ) -> ServiceResult<Vec<ApplicationData>>;

    /// Every application id with stored data.
    async fn application_ids(&self) -> ServiceResult<Vec<String>>;

    /// Purge all messages from a queue.
    async fn purge_queue(&self, queue: QueueId) -> ServiceResult<()>;

    /// Re-index one repository, or everything when `repository_id` is `None`.
    async fn reindex(&self, repository_id: Option<&str>) -> ServiceResult<()>;

    /// Decommission a publication target.
    async fn decommission_publication_target(&self, id: &str) -> ServiceResult<()>;

    /// Resolve a WebDAV URL to a URI.
    async fn resolve_uri(&self, webdav_url: &str) -> ServiceResult<String>;
}

/// Streaming download channel, separate from the request/response service.
#[async_trait]
pub trait StreamDownload: Send + Sync + 'static {
    /// Stream the raw content of an application data entry.
    async fn download_application_data(&self, application_id: &str) -> ServiceResult<ByteStream>;
}

/// Opens service handles for a session.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn connect(&self, config: &SessionConfig) -> ServiceResult<Arc<dyn CoreService>>;

    async fn connect_download(
        &self,
        config: &SessionConfig,
    ) -> ServiceResult<Arc<dyn StreamDownload>>;
}
