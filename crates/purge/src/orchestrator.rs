//! Purge orchestration.
//!
//! One run per invocation: validate, establish the session, confirm, list,
//! evaluate, commit. Per-item failures are recorded and the run continues;
//! anything else aborts the remaining stages. Work already committed stays
//! committed.

use crate::confirm::Confirm;
use crate::outcome::{ItemFailure, PurgeOutcome};
use crate::plan::{BulkPurge, ItemPurge, Job, PurgePlan};
use cmsweep_core::Result;
use cmsweep_service::{CoreService, Session};
use std::fmt;
use std::sync::Arc;

/// Lifecycle of one purge run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    SessionEstablished,
    Filtered,
    Evaluating,
    Committing,
    Done,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::SessionEstablished => "session_established",
            Self::Filtered => "filtered",
            Self::Evaluating => "evaluating",
            Self::Committing => "committing",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks and traces stage transitions.
#[derive(Debug)]
struct StageTracker {
    stage: Stage,
}

impl StageTracker {
    fn new() -> Self {
        Self { stage: Stage::Idle }
    }

    fn advance(&mut self, next: Stage) {
        tracing::debug!(from = %self.stage, to = %next, "Purge stage transition");
        self.stage = next;
    }
}

/// Check connectivity and return the service handle.
pub async fn connect(session: &Session) -> Result<Arc<dyn CoreService>> {
    let version = session.version().await?;
    tracing::debug!(%version, "Core service version");
    session.service().await
}

/// Run a purge plan against an open session.
///
/// Criteria are validated before the service is contacted.
pub async fn execute(
    session: &Session,
    plan: &PurgePlan,
    confirm: &dyn Confirm,
) -> Result<PurgeOutcome> {
    let job = plan.prepare()?;
    match &job {
        Job::Batches(p) => run_items(session, p, confirm).await,
        Job::PublishTransactions(p) => run_items(session, p, confirm).await,
        Job::UndoPackages(p) => run_items(session, p, confirm).await,
        Job::Queues(p) => run_items(session, p, confirm).await,
        Job::PublicationTargets(p) => run_items(session, p, confirm).await,
        Job::ApplicationData(p) => run_items(session, p, confirm).await,
        Job::OldVersions(p) => run_bulk(session, p, confirm).await,
        Job::ProcessHistories(p) => run_bulk(session, p, confirm).await,
        Job::ReindexAll(p) => run_bulk(session, p, confirm).await,
        Job::ReindexRepositories(p) => run_bulk(session, p, confirm).await,
    }
}

/// Run an item-by-item purge.
pub async fn run_items<P: ItemPurge>(
    session: &Session,
    purge: &P,
    confirm: &dyn Confirm,
) -> Result<PurgeOutcome> {
    let mut stages = StageTracker::new();
    let summary = purge.summary();

    if purge.selects_nothing() {
        tracing::debug!(%summary, "Empty selection, nothing to purge");
        stages.advance(Stage::Done);
        return Ok(PurgeOutcome::new(summary));
    }

    let service = connect(session).await?;
    stages.advance(Stage::SessionEstablished);

    if let Some(warning) = purge.preflight_warning() {
        tracing::warn!(%summary, %warning, "Nothing selected");
        let mut outcome = PurgeOutcome::new(summary);
        outcome.warnings.push(warning);
        stages.advance(Stage::Done);
        return Ok(outcome);
    }

    if !confirm.confirm(&summary) {
        tracing::info!(%summary, "Purge cancelled");
        stages.advance(Stage::Done);
        return Ok(PurgeOutcome::cancelled(summary));
    }

    let mut outcome = PurgeOutcome::new(summary);
    let selection = purge.list(service.as_ref()).await?;
    outcome.warnings.extend(selection.warnings);
    stages.advance(Stage::Filtered);

    stages.advance(Stage::Evaluating);
    let listed = selection.items.len();
    let qualifying: Vec<&P::Item> = selection
        .items
        .iter()
        .filter(|item| purge.qualifies(item))
        .collect();
    tracing::info!(listed, qualifying = qualifying.len(), "Evaluated candidates");

    stages.advance(Stage::Committing);
    for item in qualifying {
        let descriptor = purge.describe(item);
        if let Err(e) = purge.commit(service.as_ref(), item).await {
            tracing::warn!(
                id = %descriptor.id,
                kind = ?descriptor.kind,
                error = %e,
                "Failed to purge artifact"
            );
            outcome.failures.push(ItemFailure::new(descriptor, &e));
        } else {
            tracing::debug!(id = %descriptor.id, kind = ?descriptor.kind, "Purged artifact");
            outcome.deleted.push(descriptor);
        }
    }

    stages.advance(Stage::Done);
    tracing::info!(
        deleted = outcome.deleted.len(),
        failed = outcome.failures.len(),
        "Purge finished"
    );
    Ok(outcome)
}

/// Run a single-call purge. Succeeds or fails as a unit.
pub async fn run_bulk<P: BulkPurge>(
    session: &Session,
    purge: &P,
    confirm: &dyn Confirm,
) -> Result<PurgeOutcome> {
    let mut stages = StageTracker::new();
    let summary = purge.summary();

    let service = connect(session).await?;
    stages.advance(Stage::SessionEstablished);

    if !confirm.confirm(&summary) {
        tracing::info!(%summary, "Purge cancelled");
        stages.advance(Stage::Done);
        return Ok(PurgeOutcome::cancelled(summary));
    }

    // The selection is filtered on the service side.
    stages.advance(Stage::Filtered);
    stages.advance(Stage::Committing);
    let count = purge.commit(service.as_ref()).await?;

    let mut outcome = PurgeOutcome::new(summary);
    outcome.deleted.push(purge.describe());
    outcome.count = count;
    stages.advance(Stage::Done);
    tracing::info!(count = ?count, "Bulk purge finished");
    Ok(outcome)
}
