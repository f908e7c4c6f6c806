use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::ballot::Ballot;

/// On-disk document: `{"votes": [[name, ...], ...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotLog {
    #[serde(default)]
    pub votes: Vec<Ballot>,
}

/// Append-only ballot log so the service can be exercised against any backend.
pub trait BallotStore: Send + Sync {
    /// Record `ballot` after every existing entry, returning the new log length.
    fn append(&self, ballot: Ballot) -> Result<usize, StoreError>;
    /// Every recorded ballot in arrival order.
    fn all(&self) -> Result<Vec<Ballot>, StoreError>;
    /// Replace the log with an empty one.
    fn clear(&self) -> Result<(), StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("ballot log i/o failed for {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("ballot log {} is not a valid document: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode ballot log: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("ballot store unavailable: {0}")]
    Unavailable(String),
}

/// JSON file store. Mutations hold a process-wide lock across the read-modify-write and
/// land through a temporary sibling file renamed over the original.
#[derive(Debug)]
pub struct JsonFileBallotStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileBallotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn guard(&self) -> Result<MutexGuard<'_, ()>, StoreError> {
        self.lock
            .lock()
            .map_err(|_| StoreError::Unavailable("ballot log lock poisoned".to_string()))
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn load(&self) -> Result<BallotLog, StoreError> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(BallotLog::default()),
            Err(err) => return Err(self.io_error(err)),
        };
        serde_json::from_slice(&data).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, log: &BallotLog) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| self.io_error(err))?;
        }

        let data = serde_json::to_vec_pretty(log).map_err(StoreError::Encode)?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, data).map_err(|err| self.io_error(err))?;
        fs::rename(&tmp_path, &self.path).map_err(|err| self.io_error(err))?;
        debug!(path = %self.path.display(), votes = log.votes.len(), "ballot log written");
        Ok(())
    }
}

impl BallotStore for JsonFileBallotStore {
    fn append(&self, ballot: Ballot) -> Result<usize, StoreError> {
        let _guard = self.guard()?;
        let mut log = self.load()?;
        log.votes.push(ballot);
        self.save(&log)?;
        Ok(log.votes.len())
    }

    fn all(&self) -> Result<Vec<Ballot>, StoreError> {
        let _guard = self.guard()?;
        Ok(self.load()?.votes)
    }

    fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.guard()?;
        self.save(&BallotLog::default())
    }
}

/// Volatile store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryBallotStore {
    ballots: Mutex<Vec<Ballot>>,
}

impl MemoryBallotStore {
    fn guard(&self) -> Result<MutexGuard<'_, Vec<Ballot>>, StoreError> {
        self.ballots
            .lock()
            .map_err(|_| StoreError::Unavailable("ballot log lock poisoned".to_string()))
    }
}

impl BallotStore for MemoryBallotStore {
    fn append(&self, ballot: Ballot) -> Result<usize, StoreError> {
        let mut ballots = self.guard()?;
        ballots.push(ballot);
        Ok(ballots.len())
    }

    fn all(&self) -> Result<Vec<Ballot>, StoreError> {
        Ok(self.guard()?.clone())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.guard()?.clear();
        Ok(())
    }
}
