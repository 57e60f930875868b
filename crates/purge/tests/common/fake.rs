use async_trait::async_trait;
use bytes::Bytes;
use cmsweep_core::{
    ApplicationData, BatchData, BatchesFilter, ItemData, PublishTransactionData,
    PublishTransactionState, PublishTransactionsFilter, PurgeOldVersionsInstruction,
    PurgeWorkflowHistoryInstruction, QueueData, QueueId, RepositoryData, SessionConfig,
};
use cmsweep_service::{
    ByteStream, Connector, CoreService, ServiceError, ServiceResult, Session, StreamDownload,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Server-side state of the fake service.
#[allow(dead_code)]
#[derive(Default)]
pub struct FakeState {
    pub batches: Vec<BatchData>,
    pub transactions: Vec<PublishTransactionData>,
    pub application_data: Vec<ApplicationData>,
    pub repositories: Vec<RepositoryData>,
    pub queues: Vec<QueueData>,
    pub items: HashMap<String, ItemData>,
    /// WebDAV URL to URI.
    pub resolved: HashMap<String, String>,
    pub old_versions_count: i64,
    /// Identifiers whose mutation faults.
    pub failing: HashSet<String>,
    pub version_fails: bool,
    pub last_old_versions: Option<PurgeOldVersionsInstruction>,
    pub last_workflow_history: Option<PurgeWorkflowHistoryInstruction>,
}

/// In-memory core service that records every call.
pub struct FakeCoreService {
    state: Mutex<FakeState>,
    calls: Mutex<Vec<String>>,
}

const MUTATIONS: [&str; 7] = [
    "delete ",
    "delete_application_data ",
    "purge_application_data ",
    "purge_queue ",
    "reindex ",
    "decommission ",
    "purge_",
];

#[allow(dead_code)]
impl FakeCoreService {
    pub fn new(state: FakeState) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(state),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Recorded calls that change server state.
    pub fn mutations(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|call| MUTATIONS.iter().any(|prefix| call.starts_with(prefix)))
            .collect()
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&FakeState) -> R) -> R {
        f(&self.state.lock().unwrap())
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    fn check_failing(&self, id: &str) -> ServiceResult<()> {
        if self.state.lock().unwrap().failing.contains(id) {
            return Err(ServiceError::fault("ItemIsInUse", format!("{id} is in use")));
        }
        Ok(())
    }
}

#[async_trait]
impl CoreService for FakeCoreService {
    async fn api_version(&self) -> ServiceResult<String> {
        self.record("api_version");
        if self.state.lock().unwrap().version_fails {
            return Err(ServiceError::fault("ServiceUnavailable", "down for maintenance"));
        }
        Ok("10.1".to_string())
    }

    async fn read(&self, id: &str) -> ServiceResult<ItemData> {
        self.record(format!("read {id}"));
        self.state
            .lock()
            .unwrap()
            .items
            .get(id)
            .cloned()
            .ok_or_else(|| ServiceError::fault("ItemDoesNotExist", format!("{id} does not exist")))
    }

    async fn delete(&self, id: &str) -> ServiceResult<()> {
        self.record(format!("delete {id}"));
        self.check_failing(id)?;
        let mut state = self.state.lock().unwrap();
        state.batches.retain(|batch| batch.id != id);
        state.transactions.retain(|tx| tx.id != id);
        Ok(())
    }

    async fn list_batches(&self, _filter: &BatchesFilter) -> ServiceResult<Vec<BatchData>> {
        self.record("list_batches");
        Ok(self.state.lock().unwrap().batches.clone())
    }

    async fn list_publish_transactions(
        &self,
        filter: &PublishTransactionsFilter,
    ) -> ServiceResult<Vec<PublishTransactionData>> {
        self.record("list_publish_transactions");
        let state = self.state.lock().unwrap();
        Ok(state
            .transactions
            .iter()
            .filter(|tx| match (filter.end_date, tx.state_change_date) {
                (Some(end), Some(changed)) => changed < end,
                _ => true,
            })
            .filter(|tx| {
                filter
                    .publisher_host
                    .as_deref()
                    .is_none_or(|host| tx.publisher_host.as_deref() == Some(host))
            })
            .cloned()
            .collect())
    }

    async fn list_repositories(&self) -> ServiceResult<Vec<RepositoryData>> {
        self.record("list_repositories");
        Ok(self.state.lock().unwrap().repositories.clone())
    }

    async fn list_queues(&self) -> ServiceResult<Vec<QueueData>> {
        self.record("list_queues");
        Ok(self.state.lock().unwrap().queues.clone())
    }

    async fn purge_old_versions(
        &self,
        instruction: &PurgeOldVersionsInstruction,
    ) -> ServiceResult<i64> {
        self.record("purge_old_versions");
        let mut state = self.state.lock().unwrap();
        state.last_old_versions = Some(instruction.clone());
        Ok(state.old_versions_count)
    }

    async fn purge_workflow_history(
        &self,
        instruction: &PurgeWorkflowHistoryInstruction,
    ) -> ServiceResult<()> {
        self.record(format!(
            "purge_workflow_history {}",
            instruction.publication.as_deref().unwrap_or("*")
        ));
        self.state.lock().unwrap().last_workflow_history = Some(instruction.clone());
        Ok(())
    }

    async fn purge_application_data(&self, application_id: &str) -> ServiceResult<()> {
        self.record(format!("purge_application_data {application_id}"));
        self.check_failing(application_id)?;
        self.state
            .lock()
            .unwrap()
            .application_data
            .retain(|entry| entry.application_id != application_id);
        Ok(())
    }

    async fn delete_application_data(
        &self,
        subject_id: Option<&str>,
        application_id: &str,
    ) -> ServiceResult<()> {
        assert!(subject_id.is_none(), "undo packages are system-wide data");
        self.record(format!("delete_application_data {application_id}"));
        self.check_failing(application_id)?;
        self.state
            .lock()
            .unwrap()
            .application_data
            .retain(|entry| entry.application_id != application_id);
        Ok(())
    }

    async fn read_all_application_data(
        &self,
        _subject_id: Option<&str>,
    ) -> ServiceResult<Vec<ApplicationData>> {
        self.record("read_all_application_data");
        Ok(self.state.lock().unwrap().application_data.clone())
    }

    async fn application_ids(&self) -> ServiceResult<Vec<String>> {
        self.record("application_ids");
        Ok(self
            .state
            .lock()
            .unwrap()
            .application_data
            .iter()
            .map(|entry| entry.application_id.clone())
            .collect())
    }

    async fn purge_queue(&self, queue: QueueId) -> ServiceResult<()> {
        self.record(format!("purge_queue {queue}"));
        self.check_failing(queue.as_str())
    }

    async fn reindex(&self, repository_id: Option<&str>) -> ServiceResult<()> {
        let id = repository_id.unwrap_or("*");
        self.record(format!("reindex {id}"));
        self.check_failing(id)
    }

    async fn decommission_publication_target(&self, id: &str) -> ServiceResult<()> {
        self.record(format!("decommission {id}"));
        self.check_failing(id)
    }

    async fn resolve_uri(&self, webdav_url: &str) -> ServiceResult<String> {
        self.record(format!("resolve_uri {webdav_url}"));
        self.state
            .lock()
            .unwrap()
            .resolved
            .get(webdav_url)
            .cloned()
            .ok_or_else(|| ServiceError::fault("ItemDoesNotExist", webdav_url.to_string()))
    }
}

#[async_trait]
impl StreamDownload for FakeCoreService {
    async fn download_application_data(&self, application_id: &str) -> ServiceResult<ByteStream> {
        self.record(format!("download {application_id}"));
        let data = self
            .state
            .lock()
            .unwrap()
            .application_data
            .iter()
            .find(|entry| entry.application_id == application_id)
            .map(|entry| entry.data.clone())
            .ok_or_else(|| ServiceError::fault("ItemDoesNotExist", application_id.to_string()))?;
        let (head, tail) = data.split_at(data.len() / 2);
        let chunks = vec![Ok(Bytes::copy_from_slice(head)), Ok(Bytes::copy_from_slice(tail))];
        Ok(Box::pin(futures::stream::iter(chunks)))
    }
}

/// Connector handing out the same fake and counting connects.
pub struct FakeConnector {
    pub service: Arc<FakeCoreService>,
    pub connects: AtomicUsize,
}

#[allow(dead_code)]
impl FakeConnector {
    pub fn new(service: Arc<FakeCoreService>) -> Arc<Self> {
        Arc::new(Self {
            service,
            connects: AtomicUsize::new(0),
        })
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(&self, _config: &SessionConfig) -> ServiceResult<Arc<dyn CoreService>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(self.service.clone())
    }

    async fn connect_download(
        &self,
        _config: &SessionConfig,
    ) -> ServiceResult<Arc<dyn StreamDownload>> {
        Ok(self.service.clone())
    }
}

#[allow(dead_code)]
pub fn session(connector: &Arc<FakeConnector>) -> Session {
    Session::acquire(SessionConfig::default(), connector.clone())
}

#[allow(dead_code)]
pub fn batch(id: &str, done: u32, total: u32) -> BatchData {
    BatchData {
        id: id.to_string(),
        title: Some(format!("Batch {id}")),
        total_number_of_operations: total,
        number_of_done_operations: done,
    }
}

#[allow(dead_code)]
pub fn transaction(id: &str, state: PublishTransactionState) -> PublishTransactionData {
    PublishTransactionData {
        id: id.to_string(),
        title: None,
        state,
        publisher_host: Some("cm01".to_string()),
        state_change_date: None,
    }
}

/// Content and metadata blobs of one undo package.
#[allow(dead_code)]
pub fn metadata_blob(package_id: &str, created: &str) -> [ApplicationData; 2] {
    [
        ApplicationData {
            application_id: package_id.to_string(),
            data: format!("content of {package_id}").into_bytes(),
        },
        ApplicationData {
            application_id: format!("UndoPackageMetadata_{package_id}"),
            data: format!("{created}|tcm:0-1-65552|{package_id}|4|imported {package_id}")
                .into_bytes(),
        },
    ]
}
