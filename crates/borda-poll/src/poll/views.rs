use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::scoring::Standings;
use crate::config::{Candidate, PollConfig};

/// Payload of `GET /`: what a voter needs to fill in a ballot.
#[derive(Debug, Clone, Serialize)]
pub struct BallotView {
    pub candidates: Vec<Candidate>,
    pub weights: Vec<u32>,
    pub single_vote: bool,
}

impl BallotView {
    pub fn new(config: &PollConfig) -> Self {
        Self {
            candidates: config.candidates().to_vec(),
            weights: config.weights().to_vec(),
            single_vote: config.single_vote(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankingRow {
    pub position: usize,
    pub name: String,
    pub score: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Payload of `GET /results`.
#[derive(Debug, Clone, Serialize)]
pub struct ResultsView {
    pub total_votes: usize,
    pub winner: Option<String>,
    pub ranking: Vec<RankingRow>,
    pub scores: BTreeMap<String, u64>,
    pub podium_counts: Vec<BTreeMap<String, u64>>,
    pub sum_weights: u64,
    pub candidates: Vec<Candidate>,
    pub generated_at: DateTime<Utc>,
}

impl ResultsView {
    pub fn new(standings: Standings, config: &PollConfig, generated_at: DateTime<Utc>) -> Self {
        let winner = standings.winner().map(|entry| entry.name.clone());
        let ranking = standings
            .ranking
            .into_iter()
            .map(|entry| RankingRow {
                image: config
                    .candidate(&entry.name)
                    .map(|candidate| candidate.image.clone()),
                position: entry.position,
                name: entry.name,
                score: entry.score,
            })
            .collect();

        Self {
            total_votes: standings.total_votes,
            winner,
            ranking,
            scores: standings.scores,
            podium_counts: standings.podium,
            sum_weights: config.max_points_per_ballot(),
            candidates: config.candidates().to_vec(),
            generated_at,
        }
    }
}
