//! Concrete purge jobs.

use crate::outcome::{ArtifactDescriptor, ArtifactKind};
use crate::plan::{BulkPurge, ItemPurge, Selection};
use async_trait::async_trait;
use cmsweep_core::undo;
use cmsweep_core::{
    ApplicationDataCriteria, ArtifactReference, BatchCriteria, BatchData, BatchPolicy, Error,
    OldVersionsCriteria, ProcessHistoryCriteria, PublicationTargetCriteria,
    PublishTransactionCriteria, PublishTransactionData, PurgeOldVersionsInstruction, QueueCriteria,
    QueueId, Result, RetentionPolicy, TcmUri, TransactionOutcomePolicy, UndoPackageCriteria,
    UndoPackagePolicy, UndoPackageRecord,
};
use cmsweep_service::CoreService;

// =============================================================================
// Client-side retention
// =============================================================================

pub struct BatchPurge {
    criteria: BatchCriteria,
    policy: BatchPolicy,
}

impl BatchPurge {
    pub fn new(criteria: BatchCriteria) -> Self {
        Self {
            policy: criteria.policy(),
            criteria,
        }
    }
}

#[async_trait]
impl ItemPurge for BatchPurge {
    type Item = BatchData;

    fn summary(&self) -> String {
        self.criteria.summary()
    }

    async fn list(&self, service: &dyn CoreService) -> Result<Selection<BatchData>> {
        Ok(service.list_batches(&self.criteria.filter()).await?.into())
    }

    fn qualifies(&self, batch: &BatchData) -> bool {
        self.policy.qualifies(batch)
    }

    fn describe(&self, batch: &BatchData) -> ArtifactDescriptor {
        ArtifactDescriptor::new(ArtifactKind::Batch, &batch.id).with_title(batch.title.clone())
    }

    async fn commit(&self, service: &dyn CoreService, batch: &BatchData) -> Result<()> {
        Ok(service.delete(&batch.id).await?)
    }
}

pub struct PublishTransactionPurge {
    criteria: PublishTransactionCriteria,
    policy: TransactionOutcomePolicy,
}

impl PublishTransactionPurge {
    pub fn new(criteria: PublishTransactionCriteria) -> Self {
        Self {
            policy: criteria.policy(),
            criteria,
        }
    }
}

#[async_trait]
impl ItemPurge for PublishTransactionPurge {
    type Item = PublishTransactionData;

    fn summary(&self) -> String {
        self.criteria.summary()
    }

    async fn list(&self, service: &dyn CoreService) -> Result<Selection<PublishTransactionData>> {
        Ok(service
            .list_publish_transactions(&self.criteria.filter())
            .await?
            .into())
    }

    fn qualifies(&self, tx: &PublishTransactionData) -> bool {
        self.policy.qualifies(tx)
    }

    fn describe(&self, tx: &PublishTransactionData) -> ArtifactDescriptor {
        ArtifactDescriptor::new(ArtifactKind::PublishTransaction, &tx.id)
            .with_title(tx.title.clone())
    }

    async fn commit(&self, service: &dyn CoreService, tx: &PublishTransactionData) -> Result<()> {
        Ok(service.delete(&tx.id).await?)
    }
}

pub struct UndoPackagePurge {
    criteria: UndoPackageCriteria,
    policy: UndoPackagePolicy,
}

impl UndoPackagePurge {
    pub fn new(criteria: &UndoPackageCriteria) -> Self {
        Self {
            policy: criteria.policy(),
            criteria: criteria.clone(),
        }
    }
}

#[async_trait]
impl ItemPurge for UndoPackagePurge {
    type Item = UndoPackageRecord;

    fn summary(&self) -> String {
        self.criteria.summary()
    }

    fn preflight_warning(&self) -> Option<String> {
        (!self.policy.has_criteria())
            .then(|| "either a package id or a keep-after date must be specified".to_string())
    }

    async fn list(&self, service: &dyn CoreService) -> Result<Selection<UndoPackageRecord>> {
        let entries = service.read_all_application_data(None).await?;
        let listing = undo::enumerate(&entries);
        Ok(Selection {
            items: listing.packages,
            warnings: listing.skipped.iter().map(ToString::to_string).collect(),
        })
    }

    fn qualifies(&self, package: &UndoPackageRecord) -> bool {
        self.policy.qualifies(package)
    }

    fn describe(&self, package: &UndoPackageRecord) -> ArtifactDescriptor {
        ArtifactDescriptor::new(ArtifactKind::UndoPackage, &package.package_id)
            .with_title(Some(package.description.clone()).filter(|d| !d.is_empty()))
    }

    async fn commit(&self, service: &dyn CoreService, package: &UndoPackageRecord) -> Result<()> {
        // Content first; the metadata blob keeps the package visible until then.
        service
            .delete_application_data(None, &package.package_id)
            .await?;
        service
            .delete_application_data(None, &package.metadata_key)
            .await?;
        Ok(())
    }
}

// =============================================================================
// Explicit selections
// =============================================================================

pub struct QueuePurge {
    summary: String,
    queues: Vec<QueueId>,
}

impl QueuePurge {
    pub fn new(criteria: &QueueCriteria) -> Result<Self> {
        Ok(Self {
            summary: criteria.summary(),
            queues: criteria.build()?,
        })
    }
}

#[async_trait]
impl ItemPurge for QueuePurge {
    type Item = QueueId;

    fn summary(&self) -> String {
        self.summary.clone()
    }

    async fn list(&self, _service: &dyn CoreService) -> Result<Selection<QueueId>> {
        Ok(self.queues.clone().into())
    }

    fn describe(&self, queue: &QueueId) -> ArtifactDescriptor {
        ArtifactDescriptor::new(ArtifactKind::Queue, queue.as_str())
    }

    async fn commit(&self, service: &dyn CoreService, queue: &QueueId) -> Result<()> {
        Ok(service.purge_queue(*queue).await?)
    }
}

pub struct PublicationTargetDecommission {
    summary: String,
    target_ids: Vec<String>,
}

impl PublicationTargetDecommission {
    pub fn new(criteria: &PublicationTargetCriteria) -> Result<Self> {
        Ok(Self {
            summary: criteria.summary(),
            target_ids: criteria.build()?,
        })
    }
}

#[async_trait]
impl ItemPurge for PublicationTargetDecommission {
    type Item = String;

    fn summary(&self) -> String {
        self.summary.clone()
    }

    fn selects_nothing(&self) -> bool {
        self.target_ids.is_empty()
    }

    async fn list(&self, _service: &dyn CoreService) -> Result<Selection<String>> {
        Ok(self.target_ids.clone().into())
    }

    fn describe(&self, id: &String) -> ArtifactDescriptor {
        ArtifactDescriptor::new(ArtifactKind::PublicationTarget, id)
    }

    async fn commit(&self, service: &dyn CoreService, id: &String) -> Result<()> {
        Ok(service.decommission_publication_target(id).await?)
    }
}

pub struct ApplicationDataPurge {
    summary: String,
    application_ids: Vec<String>,
}

impl ApplicationDataPurge {
    pub fn new(criteria: &ApplicationDataCriteria) -> Result<Self> {
        Ok(Self {
            summary: criteria.summary(),
            application_ids: criteria.build()?,
        })
    }
}

#[async_trait]
impl ItemPurge for ApplicationDataPurge {
    type Item = String;

    fn summary(&self) -> String {
        self.summary.clone()
    }

    async fn list(&self, _service: &dyn CoreService) -> Result<Selection<String>> {
        Ok(self.application_ids.clone().into())
    }

    fn describe(&self, id: &String) -> ArtifactDescriptor {
        ArtifactDescriptor::new(ArtifactKind::ApplicationData, id)
    }

    async fn commit(&self, service: &dyn CoreService, id: &String) -> Result<()> {
        Ok(service.purge_application_data(id).await?)
    }
}

// =============================================================================
// Bulk
// =============================================================================

pub struct OldVersionsPurge {
    summary: String,
    instruction: PurgeOldVersionsInstruction,
}

impl OldVersionsPurge {
    pub fn new(criteria: &OldVersionsCriteria) -> Result<Self> {
        Ok(Self {
            summary: criteria.summary(),
            instruction: criteria.build()?,
        })
    }
}

#[async_trait]
impl BulkPurge for OldVersionsPurge {
    fn summary(&self) -> String {
        self.summary.clone()
    }

    fn describe(&self) -> ArtifactDescriptor {
        let containers: Vec<String> = self
            .instruction
            .containers
            .iter()
            .map(ToString::to_string)
            .collect();
        ArtifactDescriptor::new(ArtifactKind::ItemVersions, containers.join(", "))
    }

    async fn commit(&self, service: &dyn CoreService) -> Result<Option<i64>> {
        let count = service.purge_old_versions(&self.instruction).await?;
        Ok(Some(count))
    }
}

pub struct ProcessHistoryPurge {
    criteria: ProcessHistoryCriteria,
    publication: Option<ArtifactReference>,
}

impl ProcessHistoryPurge {
    pub fn new(criteria: &ProcessHistoryCriteria) -> Result<Self> {
        Ok(Self {
            publication: criteria.publication()?,
            criteria: criteria.clone(),
        })
    }

    async fn resolve_publication(&self, service: &dyn CoreService) -> Result<Option<String>> {
        match &self.publication {
            None => Ok(None),
            Some(ArtifactReference::Uri(uri)) => Ok(Some(uri.to_string())),
            Some(ArtifactReference::Alias(url)) => {
                let resolved = service.resolve_uri(url).await?;
                if TcmUri::parse(&resolved)?.is_null() {
                    return Err(Error::validation(format!(
                        "operation not supported on a new item or null URI ({url})"
                    )));
                }
                tracing::debug!(webdav_url = %url, uri = %resolved, "Resolved publication");
                Ok(Some(resolved))
            }
        }
    }
}

#[async_trait]
impl BulkPurge for ProcessHistoryPurge {
    fn summary(&self) -> String {
        self.criteria.summary()
    }

    fn describe(&self) -> ArtifactDescriptor {
        let scope = self
            .publication
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "*".to_string());
        ArtifactDescriptor::new(ArtifactKind::ProcessHistory, scope)
    }

    async fn commit(&self, service: &dyn CoreService) -> Result<Option<i64>> {
        let publication = self.resolve_publication(service).await?;
        let instruction = self.criteria.build(publication);
        service.purge_workflow_history(&instruction).await?;
        Ok(None)
    }
}

/// Re-index the given repositories in order. The first fault aborts the rest.
pub struct RepositoryReindex {
    repository_ids: Vec<String>,
}

impl RepositoryReindex {
    pub fn new(repository_ids: Vec<String>) -> Self {
        Self { repository_ids }
    }
}

#[async_trait]
impl BulkPurge for RepositoryReindex {
    fn summary(&self) -> String {
        format!(
            "Search index of repositories: {}",
            self.repository_ids.join(", ")
        )
    }

    fn describe(&self) -> ArtifactDescriptor {
        ArtifactDescriptor::new(ArtifactKind::SearchIndex, self.repository_ids.join(", "))
    }

    async fn commit(&self, service: &dyn CoreService) -> Result<Option<i64>> {
        for id in &self.repository_ids {
            service.reindex(Some(id)).await?;
            tracing::debug!(repository_id = %id, "Reindexed repository");
        }
        Ok(None)
    }
}

/// Re-index every repository in one call.
pub struct ReindexAll;

#[async_trait]
impl BulkPurge for ReindexAll {
    fn summary(&self) -> String {
        "Search index of all repositories".to_string()
    }

    fn describe(&self) -> ArtifactDescriptor {
        ArtifactDescriptor::new(ArtifactKind::SearchIndex, "*")
    }

    async fn commit(&self, service: &dyn CoreService) -> Result<Option<i64>> {
        service.reindex(None).await?;
        Ok(None)
    }
}
