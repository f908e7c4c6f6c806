use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::config::PollConfig;

/// One submitted ranking: a permutation of every configured candidate, best first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ballot(Vec<String>);

impl Ballot {
    /// Accept `order` only when it names every candidate exactly once.
    pub fn validate(order: Vec<String>, config: &PollConfig) -> Result<Self, BallotError> {
        let expected = config.candidates().len();
        if order.len() != expected {
            return Err(BallotError::WrongLength {
                expected,
                actual: order.len(),
            });
        }

        let mut seen = HashSet::with_capacity(order.len());
        for name in &order {
            if config.candidate(name).is_none() {
                return Err(BallotError::UnknownCandidate(name.clone()));
            }
            if !seen.insert(name.as_str()) {
                return Err(BallotError::DuplicateCandidate(name.clone()));
            }
        }

        Ok(Self(order))
    }

    /// Ranked names, best first.
    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn into_names(self) -> Vec<String> {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BallotError {
    #[error("invalid ranking: expected {expected} candidates, got {actual}")]
    WrongLength { expected: usize, actual: usize },
    #[error("invalid ranking: unknown candidate '{0}'")]
    UnknownCandidate(String),
    #[error("invalid ranking: '{0}' appears more than once")]
    DuplicateCandidate(String),
}

/// Body of `POST /vote`.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct VoteRequest {
    #[serde(default)]
    pub order: Vec<String>,
}

impl VoteRequest {
    /// Parse leniently: anything that is not a well-formed request becomes an empty order,
    /// which then fails ballot validation with a regular 400.
    pub fn from_body(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }
}
