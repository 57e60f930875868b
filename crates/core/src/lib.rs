//! Core domain types and shared logic for cmsweep.
//!
//! This crate defines the data model used across all other crates:
//! - Item identifiers (URIs and WebDAV aliases)
//! - Session configuration defaults
//! - Wire records and bulk instructions
//! - Selection criteria per artifact class
//! - Client-side retention rules
//! - Undo package metadata decoding and correlation

pub mod config;
pub mod criteria;
pub mod error;
pub mod models;
pub mod queue;
pub mod retention;
pub mod undo;
pub mod uri;

pub use config::SessionConfig;
pub use criteria::{
    ApplicationDataCriteria, BatchCriteria, OldVersionsCriteria, ProcessHistoryCriteria,
    PublicationTargetCriteria, PublishTransactionCriteria, QueueCriteria, ReindexCriteria,
    ReindexScope, UndoPackageCriteria,
};
pub use error::{Error, Result};
pub use models::{
    ApplicationData, BatchData, BatchesFilter, ItemData, PublishTransactionData,
    PublishTransactionState, PublishTransactionsFilter, PurgeOldVersionsInstruction,
    PurgeWorkflowHistoryInstruction, QueueData, RepositoryData, ServiceFault,
};
pub use queue::QueueId;
pub use retention::{
    BatchPolicy, RetentionDecision, RetentionPolicy, TransactionOutcomePolicy, UndoPackagePolicy,
};
pub use undo::{UndoPackageListing, UndoPackageRecord};
pub use uri::{ArtifactReference, TcmUri};
