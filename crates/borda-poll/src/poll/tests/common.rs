use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};

use axum::body::Body;
use axum::response::Response;
use serde_json::Value;

use crate::config::{Candidate, PollConfig, DEFAULT_WEIGHTS};
use crate::poll::ballot::Ballot;
use crate::poll::service::PollService;
use crate::poll::store::{BallotStore, MemoryBallotStore, StoreError};

pub(super) const TOKEN: &str = "let-me-in";

pub(super) fn poll_config() -> PollConfig {
    PollConfig::new(
        ["A", "B", "C", "D", "E"]
            .into_iter()
            .map(Candidate::new)
            .collect(),
        DEFAULT_WEIGHTS.to_vec(),
        TOKEN,
    )
    .expect("valid poll config")
}

pub(super) fn order(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

pub(super) fn build_service_with(
    config: PollConfig,
) -> (Arc<PollService<MemoryBallotStore>>, Arc<MemoryBallotStore>) {
    let store = Arc::new(MemoryBallotStore::default());
    let service = Arc::new(PollService::new(Arc::new(config), store.clone()));
    (service, store)
}

pub(super) fn build_service() -> (Arc<PollService<MemoryBallotStore>>, Arc<MemoryBallotStore>) {
    build_service_with(poll_config())
}

/// Store whose backend is permanently offline.
#[derive(Debug, Default)]
pub(super) struct OfflineStore;

impl BallotStore for OfflineStore {
    fn append(&self, _ballot: Ballot) -> Result<usize, StoreError> {
        Err(StoreError::Unavailable("disk offline".to_string()))
    }

    fn all(&self) -> Result<Vec<Ballot>, StoreError> {
        Err(StoreError::Unavailable("disk offline".to_string()))
    }

    fn clear(&self) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("disk offline".to_string()))
    }
}

pub(super) fn offline_service() -> Arc<PollService<OfflineStore>> {
    Arc::new(PollService::new(
        Arc::new(poll_config()),
        Arc::new(OfflineStore),
    ))
}

/// Memory store that remembers which threads touched it.
#[derive(Debug, Default)]
pub(super) struct ThreadTrackingStore {
    inner: MemoryBallotStore,
    threads: Mutex<Vec<ThreadId>>,
}

impl ThreadTrackingStore {
    fn record(&self) {
        self.threads
            .lock()
            .expect("thread log lock")
            .push(thread::current().id());
    }

    pub(super) fn threads(&self) -> Vec<ThreadId> {
        self.threads.lock().expect("thread log lock").clone()
    }
}

impl BallotStore for ThreadTrackingStore {
    fn append(&self, ballot: Ballot) -> Result<usize, StoreError> {
        self.record();
        self.inner.append(ballot)
    }

    fn all(&self) -> Result<Vec<Ballot>, StoreError> {
        self.record();
        self.inner.all()
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.record();
        self.inner.clear()
    }
}

/// Store whose every call panics mid-operation.
#[derive(Debug, Default)]
pub(super) struct PanickingStore;

impl BallotStore for PanickingStore {
    fn append(&self, _ballot: Ballot) -> Result<usize, StoreError> {
        panic!("ballot log backend crashed")
    }

    fn all(&self) -> Result<Vec<Ballot>, StoreError> {
        panic!("ballot log backend crashed")
    }

    fn clear(&self) -> Result<(), StoreError> {
        panic!("ballot log backend crashed")
    }
}

pub(super) async fn body_bytes(response: Response) -> Vec<u8> {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    bytes.to_vec()
}

pub(super) async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).expect("json body")
}

pub(super) fn json_body(value: &Value) -> Body {
    Body::from(serde_json::to_vec(value).expect("serializable"))
}
