//! Single-question ranked-choice poll.
//!
//! Ballots are validated against the configured candidate set, appended to a
//! [`BallotStore`], and re-scored from the full log on every read by the
//! [`ScoringEngine`]. [`PollService`] composes the pieces for the HTTP router and CLI.

pub mod ballot;
pub mod export;
pub mod router;
pub mod scoring;
pub mod service;
pub mod store;
pub mod views;

#[cfg(test)]
mod tests;

pub use ballot::{Ballot, BallotError, VoteRequest};
pub use export::{export_csv, EXPORT_FILENAME, EXPORT_HEADER};
pub use router::poll_router;
pub use scoring::{RankedCandidate, ScoringEngine, Standings};
pub use service::{PollService, PollServiceError};
pub use store::{BallotLog, BallotStore, JsonFileBallotStore, MemoryBallotStore, StoreError};
pub use views::{BallotView, RankingRow, ResultsView};
