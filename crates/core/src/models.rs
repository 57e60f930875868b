//! Records and instructions exchanged with the core service.

use crate::uri::ArtifactReference;
use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;

// =============================================================================
// Listed artifacts
// =============================================================================

/// A batch of background operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchData {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    pub total_number_of_operations: u32,
    pub number_of_done_operations: u32,
}

/// Lifecycle state of a publish transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PublishTransactionState {
    ScheduledForPublish,
    WaitingForPublish,
    InProgress,
    ScheduledForDeployment,
    WaitingForDeployment,
    Failed,
    Success,
    Warning,
    Resolving,
    Rendering,
    Throttled,
    ReadyForTransport,
    Transporting,
    Deploying,
    PreparingDeployment,
    PreCommittingDeployment,
    CommittingDeployment,
    WaitingForCdEnvironment,
    #[serde(other)]
    UnknownByClient,
}

impl fmt::Display for PublishTransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A publish transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishTransactionData {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    pub state: PublishTransactionState,
    #[serde(default)]
    pub publisher_host: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub state_change_date: Option<OffsetDateTime>,
}

/// A repository (publication) entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryData {
    pub id: String,
    pub title: String,
}

/// A message queue and its current depth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueData {
    pub id: i32,
    pub name: String,
    #[serde(default)]
    pub message_count: Option<u64>,
}

/// Generic item returned when reading by identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemData {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    pub item_type: String,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

/// Opaque application data stored under an application id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationData {
    pub application_id: String,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
}

mod base64_bytes {
    use base64::{Engine as _, engine::general_purpose};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&general_purpose::STANDARD.encode(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        general_purpose::STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Filters and instructions
// =============================================================================

/// Filter for the system-wide batch list. Batches carry no server-side bound.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchesFilter {}

/// Filter for the system-wide publish transaction list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PublishTransactionsFilter {
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub end_date: Option<OffsetDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher_host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
}

/// Bulk instruction for purging old item versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurgeOldVersionsInstruction {
    pub containers: Vec<ArtifactReference>,
    pub recursive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub versions_to_keep: Option<u32>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub keep_versions_modified_after: Option<OffsetDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_versions_within_days_before_last_check_in: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_resolved_versioned_items_count: Option<u32>,
}

/// Bulk instruction for purging workflow process histories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PurgeWorkflowHistoryInstruction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publication: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub delete_history_before: Option<OffsetDateTime>,
}

/// Fault body reported by the core service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceFault {
    pub error_code: String,
    pub message: String,
}
