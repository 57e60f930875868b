//! Selection criteria per artifact class.
//!
//! Absence of a criterion means no restriction on that dimension. Building
//! validates preconditions before anything is sent to the service.

use crate::models::{
    BatchesFilter, PublishTransactionsFilter, PurgeOldVersionsInstruction,
    PurgeWorkflowHistoryInstruction,
};
use crate::queue::QueueId;
use crate::retention::{BatchPolicy, TransactionOutcomePolicy, UndoPackagePolicy};
use crate::uri::ArtifactReference;
use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, PrimitiveDateTime};

/// Purge of old item versions inside publications or organizational items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OldVersionsCriteria {
    /// Publication or organizational item identifiers (URI or WebDAV URL).
    pub containers: Vec<String>,
    pub versions_to_keep: Option<u32>,
    pub keep_after: Option<OffsetDateTime>,
    pub keep_within_days_before: Option<u32>,
    pub recursive: bool,
    /// Upper bound on items resolved per pass on the service side.
    pub max_resolved_items: Option<u32>,
}

impl OldVersionsCriteria {
    /// Build the bulk instruction. Numeric and date values pass through unmodified.
    pub fn build(&self) -> crate::Result<PurgeOldVersionsInstruction> {
        if self.containers.is_empty() {
            return Err(crate::Error::validation(
                "at least one publication or organizational item is required",
            ));
        }
        let containers = self
            .containers
            .iter()
            .map(|id| ArtifactReference::parse(id))
            .collect::<crate::Result<Vec<_>>>()?;

        Ok(PurgeOldVersionsInstruction {
            containers,
            recursive: self.recursive,
            versions_to_keep: self.versions_to_keep,
            keep_versions_modified_after: self.keep_after,
            keep_versions_within_days_before_last_check_in: self.keep_within_days_before,
            max_resolved_versioned_items_count: self.max_resolved_items,
        })
    }

    pub fn summary(&self) -> String {
        format!("Old versions of items in {}", self.containers.join(", "))
    }
}

/// Purge of workflow process histories.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessHistoryCriteria {
    /// Only histories finished before this moment.
    pub before: Option<OffsetDateTime>,
    /// Only histories of this publication (URI or WebDAV URL).
    pub publication_id: Option<String>,
}

impl ProcessHistoryCriteria {
    /// The publication to scope to, if any. The null URI is rejected.
    pub fn publication(&self) -> crate::Result<Option<ArtifactReference>> {
        let Some(id) = self.publication_id.as_deref().filter(|id| !id.trim().is_empty()) else {
            return Ok(None);
        };
        let reference = ArtifactReference::parse(id)?;
        if reference.as_uri().is_some_and(|uri| uri.is_null()) {
            return Err(crate::Error::validation(
                "operation not supported on a new item or null URI (publication id)",
            ));
        }
        Ok(Some(reference))
    }

    /// Build the bulk instruction from the resolved publication URI.
    pub fn build(&self, resolved_publication: Option<String>) -> PurgeWorkflowHistoryInstruction {
        PurgeWorkflowHistoryInstruction {
            publication: resolved_publication,
            delete_history_before: self.before,
        }
    }

    pub fn summary(&self) -> String {
        let publication = self
            .publication_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty());
        if self.before.is_none() && publication.is_none() {
            return "All TCM process histories".to_string();
        }
        let mut summary = "TCM process histories".to_string();
        if let Some(before) = self.before {
            summary.push_str(&format!(" before {}", display_time(before)));
        }
        if let Some(publication) = publication {
            summary.push_str(&format!(" for Publication {publication}"));
        }
        summary
    }
}

/// Purge of queue messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueCriteria {
    /// Queue names; empty selects every known queue.
    pub queues: Vec<String>,
}

impl QueueCriteria {
    /// Resolve the queue names. Unknown names fail the whole selection.
    pub fn build(&self) -> crate::Result<Vec<QueueId>> {
        if self.queues.is_empty() {
            return Ok(QueueId::ALL
                .into_iter()
                .filter(|queue| *queue != QueueId::UnknownByClient)
                .collect());
        }
        self.queues.iter().map(|name| QueueId::parse(name)).collect()
    }

    pub fn summary(&self) -> String {
        if self.queues.is_empty() {
            "Messages in all queues".to_string()
        } else {
            format!("Messages in queues: {}", self.queues.join(", "))
        }
    }
}

/// Deletion of publish transactions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishTransactionCriteria {
    /// Only transactions completed before this moment.
    pub before: Option<OffsetDateTime>,
    pub successful: bool,
    pub failed: bool,
}

impl PublishTransactionCriteria {
    /// Coarse server-side filter: only the date bound is pushed to the service.
    pub fn filter(&self) -> PublishTransactionsFilter {
        PublishTransactionsFilter {
            end_date: self.before,
            ..Default::default()
        }
    }

    /// Outcome rule applied to each listed transaction.
    pub fn policy(&self) -> TransactionOutcomePolicy {
        TransactionOutcomePolicy {
            successful: self.successful,
            failed: self.failed,
        }
    }

    pub fn summary(&self) -> String {
        let mut summary = match self.before {
            Some(before) => format!(
                "TCM publish transactions completed before {}",
                display_time(before)
            ),
            None => "All TCM publish transactions".to_string(),
        };
        match (self.successful, self.failed) {
            (true, true) => summary.push_str(", successful or failed"),
            (true, false) => summary.push_str(", successful"),
            (false, true) => summary.push_str(", failed"),
            (false, false) => {}
        }
        summary
    }
}

/// Deletion of batches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchCriteria {
    /// Delete every batch, not only completed ones.
    pub all: bool,
}

impl BatchCriteria {
    /// Batches are listed without a server-side bound.
    pub fn filter(&self) -> BatchesFilter {
        BatchesFilter::default()
    }

    pub fn policy(&self) -> BatchPolicy {
        BatchPolicy {
            delete_all: self.all,
        }
    }

    pub fn summary(&self) -> String {
        if self.all {
            "All TCM batches".to_string()
        } else {
            "Only completed TCM batches".to_string()
        }
    }
}

/// Deletion of undo packages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UndoPackageCriteria {
    pub package_id: Option<String>,
    /// Packages created before this moment are deleted.
    pub keep_after: Option<PrimitiveDateTime>,
}

impl UndoPackageCriteria {
    pub fn policy(&self) -> UndoPackagePolicy {
        UndoPackagePolicy {
            package_id: self
                .package_id
                .as_deref()
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string),
            keep_after: self.keep_after,
        }
    }

    pub fn summary(&self) -> String {
        let policy = self.policy();
        match (policy.package_id.as_deref(), policy.keep_after) {
            (Some(id), Some(keep_after)) => {
                format!("Undo package {id} and undo packages created before {keep_after}")
            }
            (Some(id), None) => format!("Undo package {id}"),
            (None, Some(keep_after)) => format!("Undo packages created before {keep_after}"),
            (None, None) => "No undo packages".to_string(),
        }
    }
}

/// Decommissioning of publication targets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublicationTargetCriteria {
    /// Target identifiers; empty is a no-op.
    pub target_ids: Vec<String>,
}

impl PublicationTargetCriteria {
    pub fn build(&self) -> crate::Result<Vec<String>> {
        trimmed_ids(&self.target_ids)
    }

    pub fn summary(&self) -> String {
        format!("Publication targets: {}", self.target_ids.join(", "))
    }
}

/// What to re-index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReindexScope {
    /// Every repository, in one call with no repository selector.
    All,
    Repositories(Vec<String>),
}

/// Synchronization of the search index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReindexCriteria {
    /// Repository identifiers; empty re-indexes everything.
    pub repository_ids: Vec<String>,
}

impl ReindexCriteria {
    pub fn build(&self) -> crate::Result<ReindexScope> {
        let ids = trimmed_ids(&self.repository_ids)?;
        if ids.is_empty() {
            Ok(ReindexScope::All)
        } else {
            Ok(ReindexScope::Repositories(ids))
        }
    }

    pub fn summary(&self) -> String {
        if self.repository_ids.is_empty() {
            "Search index of all repositories".to_string()
        } else {
            format!(
                "Search index of repositories: {}",
                self.repository_ids.join(", ")
            )
        }
    }
}

/// Purge of application data by application id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationDataCriteria {
    pub application_ids: Vec<String>,
}

impl ApplicationDataCriteria {
    pub fn build(&self) -> crate::Result<Vec<String>> {
        let ids = trimmed_ids(&self.application_ids)?;
        if ids.is_empty() {
            return Err(crate::Error::validation(
                "at least one application id is required",
            ));
        }
        Ok(ids)
    }

    pub fn summary(&self) -> String {
        format!("Application data: {}", self.application_ids.join(", "))
    }
}

fn display_time(at: OffsetDateTime) -> String {
    at.format(&Rfc3339).unwrap_or_else(|_| at.to_string())
}

fn trimmed_ids(ids: &[String]) -> crate::Result<Vec<String>> {
    ids.iter()
        .map(|id| {
            let id = id.trim();
            if id.is_empty() {
                Err(crate::Error::validation("empty identifier in selection"))
            } else {
                Ok(id.to_string())
            }
        })
        .collect()
}
