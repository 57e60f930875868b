//! Client-side retention rules.
//!
//! Used where the service cannot filter on the requested semantics itself:
//! batch completion, publish transaction outcome and undo package age.

use crate::models::{BatchData, PublishTransactionData, PublishTransactionState};
use crate::undo::UndoPackageRecord;
use time::PrimitiveDateTime;

/// Outcome of evaluating one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionDecision<T> {
    pub artifact: T,
    pub qualifies: bool,
}

/// A side-effect free deletion predicate.
pub trait RetentionPolicy<T> {
    /// Whether `artifact` qualifies for deletion.
    fn qualifies(&self, artifact: &T) -> bool;

    /// Evaluate `artifact`, keeping it alongside the decision.
    fn evaluate(&self, artifact: T) -> RetentionDecision<T> {
        let qualifies = self.qualifies(&artifact);
        RetentionDecision {
            artifact,
            qualifies,
        }
    }
}

/// Batch retention: everything, or only fully processed batches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchPolicy {
    pub delete_all: bool,
}

impl RetentionPolicy<BatchData> for BatchPolicy {
    fn qualifies(&self, batch: &BatchData) -> bool {
        // A batch without operations is done (0 == 0).
        self.delete_all || batch.number_of_done_operations == batch.total_number_of_operations
    }
}

/// Publish transaction retention by outcome.
///
/// With neither flag set every listed transaction qualifies. Setting both is a
/// union, not an error: it covers both terminal outcomes and still leaves
/// transactions in any other state alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionOutcomePolicy {
    pub successful: bool,
    pub failed: bool,
}

impl RetentionPolicy<PublishTransactionData> for TransactionOutcomePolicy {
    fn qualifies(&self, tx: &PublishTransactionData) -> bool {
        (!self.successful && !self.failed)
            || (self.successful && tx.state == PublishTransactionState::Success)
            || (self.failed && tx.state == PublishTransactionState::Failed)
    }
}

/// Undo package retention by identifier or creation time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UndoPackagePolicy {
    pub package_id: Option<String>,
    /// Packages created strictly before this moment qualify.
    pub keep_after: Option<PrimitiveDateTime>,
}

impl UndoPackagePolicy {
    /// Whether any criterion is set. Without one nothing qualifies.
    pub fn has_criteria(&self) -> bool {
        self.package_id.is_some() || self.keep_after.is_some()
    }
}

impl RetentionPolicy<UndoPackageRecord> for UndoPackagePolicy {
    fn qualifies(&self, package: &UndoPackageRecord) -> bool {
        let id_matches = self
            .package_id
            .as_deref()
            .is_some_and(|id| id == package.package_id);
        let older = self
            .keep_after
            .is_some_and(|keep_after| package.creation_time < keep_after);
        id_matches || older
    }
}
