//! Purge orchestration for cmsweep.
//!
//! This crate provides:
//! - Purge plans per artifact class and their validation
//! - The orchestrator running per-item and bulk purges
//! - Confirmation before mutation
//! - Read-only listings and undo package export

pub mod confirm;
pub mod jobs;
pub mod listing;
pub mod orchestrator;
pub mod outcome;
pub mod plan;

pub use confirm::{AssumeYes, Confirm};
pub use listing::PublishTransactionQuery;
pub use orchestrator::{Stage, execute};
pub use outcome::{ArtifactDescriptor, ArtifactKind, ItemFailure, PurgeOutcome};
pub use plan::{BulkPurge, ItemPurge, Job, PurgePlan, Selection};
