//! Predefined message queues.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of queues known to the core service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum QueueId {
    PublishQueue,
    DeployQueue,
    SearchQueue,
    WorkflowAgentQueue,
    BatchQueue,
    /// Reserved value for queues the client does not recognize. Never purged.
    UnknownByClient,
}

impl QueueId {
    /// Every known queue, in service order.
    pub const ALL: [QueueId; 6] = [
        Self::PublishQueue,
        Self::DeployQueue,
        Self::SearchQueue,
        Self::WorkflowAgentQueue,
        Self::BatchQueue,
        Self::UnknownByClient,
    ];

    /// Parse a queue name. Accepts the canonical name (`SearchQueue`) or the
    /// short form (`search`, `workflow-agent`), case-insensitively.
    pub fn parse(s: &str) -> crate::Result<Self> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(*c, '-' | '_' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        let short = normalized.strip_suffix("queue").unwrap_or(&normalized);
        match short {
            "publish" => Ok(Self::PublishQueue),
            "deploy" => Ok(Self::DeployQueue),
            "search" => Ok(Self::SearchQueue),
            "workflowagent" => Ok(Self::WorkflowAgentQueue),
            "batch" => Ok(Self::BatchQueue),
            _ => Err(crate::Error::validation(format!("unknown queue: {s}"))),
        }
    }

    /// Numeric identifier used by the service.
    pub fn id(&self) -> i32 {
        match self {
            Self::PublishQueue => 1,
            Self::DeployQueue => 2,
            Self::SearchQueue => 3,
            Self::WorkflowAgentQueue => 4,
            Self::BatchQueue => 5,
            Self::UnknownByClient => i32::MAX,
        }
    }

    /// Canonical name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PublishQueue => "PublishQueue",
            Self::DeployQueue => "DeployQueue",
            Self::SearchQueue => "SearchQueue",
            Self::WorkflowAgentQueue => "WorkflowAgentQueue",
            Self::BatchQueue => "BatchQueue",
            Self::UnknownByClient => "UnknownByClient",
        }
    }
}

impl fmt::Display for QueueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
