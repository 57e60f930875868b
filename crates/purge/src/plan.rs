//! Purge plans per artifact class.
//!
//! A [`PurgePlan`] holds the selection criteria as given. [`PurgePlan::prepare`]
//! validates them without touching the service and yields a [`Job`], which the
//! orchestrator runs either item by item ([`ItemPurge`]) or as one bulk call
//! ([`BulkPurge`]).

use crate::jobs::{
    ApplicationDataPurge, BatchPurge, OldVersionsPurge, ProcessHistoryPurge,
    PublicationTargetDecommission, PublishTransactionPurge, QueuePurge, RepositoryReindex,
    ReindexAll, UndoPackagePurge,
};
use crate::outcome::ArtifactDescriptor;
use async_trait::async_trait;
use cmsweep_core::{
    ApplicationDataCriteria, BatchCriteria, OldVersionsCriteria, ProcessHistoryCriteria,
    PublicationTargetCriteria, PublishTransactionCriteria, QueueCriteria, ReindexCriteria,
    ReindexScope, Result, UndoPackageCriteria,
};
use cmsweep_service::CoreService;

/// Candidates returned by listing, plus anything worth reporting about them.
#[derive(Debug)]
pub struct Selection<T> {
    pub items: Vec<T>,
    pub warnings: Vec<String>,
}

impl<T> From<Vec<T>> for Selection<T> {
    fn from(items: Vec<T>) -> Self {
        Self {
            items,
            warnings: Vec::new(),
        }
    }
}

/// A purge committed one artifact at a time.
///
/// A failed commit is recorded and the run moves on to the next artifact.
#[async_trait]
pub trait ItemPurge: Send + Sync {
    type Item: Send + Sync;

    fn summary(&self) -> String;

    /// True when the selection is known to be empty before listing.
    /// The run then ends without connecting or prompting.
    fn selects_nothing(&self) -> bool {
        false
    }

    /// Reason to skip the run entirely, reported as a warning.
    fn preflight_warning(&self) -> Option<String> {
        None
    }

    /// List the candidates. May be filtered coarsely on the service side.
    async fn list(&self, service: &dyn CoreService) -> Result<Selection<Self::Item>>;

    /// Client-side retention rule.
    fn qualifies(&self, _item: &Self::Item) -> bool {
        true
    }

    fn describe(&self, item: &Self::Item) -> ArtifactDescriptor;

    async fn commit(&self, service: &dyn CoreService, item: &Self::Item) -> Result<()>;
}

/// A purge covering the whole selection in one remote call.
#[async_trait]
pub trait BulkPurge: Send + Sync {
    fn summary(&self) -> String;

    fn describe(&self) -> ArtifactDescriptor;

    /// Commit the purge. Returns the count reported by the service, if any.
    async fn commit(&self, service: &dyn CoreService) -> Result<Option<i64>>;
}

/// A purge request, by artifact class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurgePlan {
    Batches(BatchCriteria),
    OldVersions(OldVersionsCriteria),
    ProcessHistories(ProcessHistoryCriteria),
    PublishTransactions(PublishTransactionCriteria),
    Queues(QueueCriteria),
    UndoPackages(UndoPackageCriteria),
    PublicationTargets(PublicationTargetCriteria),
    SearchIndex(ReindexCriteria),
    ApplicationData(ApplicationDataCriteria),
}

/// A validated plan, ready to run.
pub enum Job {
    Batches(BatchPurge),
    OldVersions(OldVersionsPurge),
    ProcessHistories(ProcessHistoryPurge),
    PublishTransactions(PublishTransactionPurge),
    Queues(QueuePurge),
    UndoPackages(UndoPackagePurge),
    PublicationTargets(PublicationTargetDecommission),
    ReindexAll(ReindexAll),
    ReindexRepositories(RepositoryReindex),
    ApplicationData(ApplicationDataPurge),
}

impl PurgePlan {
    /// Validate the criteria. Never calls the service.
    pub fn prepare(&self) -> Result<Job> {
        let job = match self {
            Self::Batches(criteria) => Job::Batches(BatchPurge::new(*criteria)),
            Self::OldVersions(criteria) => Job::OldVersions(OldVersionsPurge::new(criteria)?),
            Self::ProcessHistories(criteria) => {
                Job::ProcessHistories(ProcessHistoryPurge::new(criteria)?)
            }
            Self::PublishTransactions(criteria) => {
                Job::PublishTransactions(PublishTransactionPurge::new(*criteria))
            }
            Self::Queues(criteria) => Job::Queues(QueuePurge::new(criteria)?),
            Self::UndoPackages(criteria) => Job::UndoPackages(UndoPackagePurge::new(criteria)),
            Self::PublicationTargets(criteria) => {
                Job::PublicationTargets(PublicationTargetDecommission::new(criteria)?)
            }
            Self::SearchIndex(criteria) => match criteria.build()? {
                ReindexScope::All => Job::ReindexAll(ReindexAll),
                ReindexScope::Repositories(ids) => {
                    Job::ReindexRepositories(RepositoryReindex::new(ids))
                }
            },
            Self::ApplicationData(criteria) => {
                Job::ApplicationData(ApplicationDataPurge::new(criteria)?)
            }
        };
        Ok(job)
    }

    /// Human-readable description of the selection.
    pub fn summary(&self) -> String {
        match self {
            Self::Batches(criteria) => criteria.summary(),
            Self::OldVersions(criteria) => criteria.summary(),
            Self::ProcessHistories(criteria) => criteria.summary(),
            Self::PublishTransactions(criteria) => criteria.summary(),
            Self::Queues(criteria) => criteria.summary(),
            Self::UndoPackages(criteria) => criteria.summary(),
            Self::PublicationTargets(criteria) => criteria.summary(),
            Self::SearchIndex(criteria) => criteria.summary(),
            Self::ApplicationData(criteria) => criteria.summary(),
        }
    }
}
