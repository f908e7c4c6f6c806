use std::sync::Arc;

use axum::http::StatusCode;
use chrono::Utc;
use tracing::{info, warn};

use super::ballot::{Ballot, BallotError};
use super::export::export_csv;
use super::scoring::{ScoringEngine, Standings};
use super::store::{BallotStore, StoreError};
use super::views::ResultsView;
use crate::config::PollConfig;

/// Service composing ballot validation, the ballot store, and the scoring engine.
pub struct PollService<S> {
    config: Arc<PollConfig>,
    store: Arc<S>,
}

impl<S> PollService<S>
where
    S: BallotStore + 'static,
{
    pub fn new(config: Arc<PollConfig>, store: Arc<S>) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Validate and persist a ranking. Nothing is written when validation fails.
    pub fn submit(&self, order: Vec<String>) -> Result<Ballot, PollServiceError> {
        let ballot = match Ballot::validate(order, &self.config) {
            Ok(ballot) => ballot,
            Err(err) => {
                warn!(%err, "ballot rejected");
                return Err(err.into());
            }
        };

        let total_votes = self.store.append(ballot.clone())?;
        info!(total_votes, "ballot recorded");
        Ok(ballot)
    }

    pub fn ballots(&self) -> Result<Vec<Ballot>, PollServiceError> {
        Ok(self.store.all()?)
    }

    pub fn standings(&self) -> Result<Standings, PollServiceError> {
        let ballots = self.store.all()?;
        Ok(ScoringEngine::from_config(&self.config).compute(&ballots))
    }

    pub fn results(&self) -> Result<ResultsView, PollServiceError> {
        let standings = self.standings()?;
        Ok(ResultsView::new(standings, &self.config, Utc::now()))
    }

    pub fn export(&self) -> Result<Vec<u8>, PollServiceError> {
        let ballots = self.store.all()?;
        Ok(export_csv(&ballots)?)
    }

    /// Wipe the ballot log when `token` matches the configured admin secret.
    pub fn reset(&self, token: &str) -> Result<(), PollServiceError> {
        if !self.config.token_matches(token) {
            warn!("ballot log reset refused: token mismatch");
            return Err(PollServiceError::Unauthorized);
        }

        self.store.clear()?;
        info!("ballot log cleared");
        Ok(())
    }
}

/// Error raised by the poll service.
#[derive(Debug, thiserror::Error)]
pub enum PollServiceError {
    #[error(transparent)]
    InvalidBallot(#[from] BallotError),
    #[error("reset token rejected")]
    Unauthorized,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to render CSV export: {0}")]
    Export(#[from] csv::Error),
    #[error("poll worker did not finish: {0}")]
    Worker(String),
}

impl PollServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            PollServiceError::InvalidBallot(_) => StatusCode::BAD_REQUEST,
            PollServiceError::Unauthorized => StatusCode::FORBIDDEN,
            PollServiceError::Store(_)
            | PollServiceError::Export(_)
            | PollServiceError::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
