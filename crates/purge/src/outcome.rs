//! Result of a purge run.

use serde::Serialize;

/// Class of a deleted or purged artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Batch,
    PublishTransaction,
    UndoPackage,
    Queue,
    PublicationTarget,
    SearchIndex,
    ApplicationData,
    ItemVersions,
    ProcessHistory,
}

/// Identifies one artifact touched by a purge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactDescriptor {
    pub kind: ArtifactKind,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl ArtifactDescriptor {
    pub fn new(kind: ArtifactKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
            title: None,
        }
    }

    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }
}

/// A per-artifact commit that failed without stopping the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    pub artifact: ArtifactDescriptor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub message: String,
}

impl ItemFailure {
    pub fn new(artifact: ArtifactDescriptor, error: &cmsweep_core::Error) -> Self {
        Self {
            artifact,
            code: error.remote_code().map(str::to_string),
            message: error.to_string(),
        }
    }
}

/// What a purge run did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PurgeOutcome {
    /// Human-readable description of the selection.
    pub summary: String,
    /// Artifacts deleted, in commit order.
    pub deleted: Vec<ArtifactDescriptor>,
    /// Count reported by a bulk purge.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,
    pub failures: Vec<ItemFailure>,
    pub warnings: Vec<String>,
    /// The confirmation was declined; nothing was mutated.
    pub cancelled: bool,
}

impl PurgeOutcome {
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            ..Default::default()
        }
    }

    pub fn cancelled(summary: impl Into<String>) -> Self {
        Self {
            cancelled: true,
            ..Self::new(summary)
        }
    }

    /// Whether every attempted commit succeeded.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_keeps_remote_code() {
        let error = cmsweep_core::Error::RemoteService {
            code: "ItemIsInUse".to_string(),
            message: "in use".to_string(),
        };
        let failure = ItemFailure::new(
            ArtifactDescriptor::new(ArtifactKind::Batch, "tcm:0-1-66048"),
            &error,
        );
        assert_eq!(failure.code.as_deref(), Some("ItemIsInUse"));
        assert!(failure.message.contains("in use"));
    }

    #[test]
    fn test_cancelled_outcome_is_empty() {
        let outcome = PurgeOutcome::cancelled("All TCM batches");
        assert!(outcome.cancelled);
        assert!(outcome.deleted.is_empty());
        assert!(outcome.is_success());
        assert_eq!(outcome.summary, "All TCM batches");
    }
}
