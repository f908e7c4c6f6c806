use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::ballot::Ballot;
use crate::config::PollConfig;

/// One row of the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedCandidate {
    /// 1-based place on the leaderboard.
    pub position: usize,
    pub name: String,
    pub score: u64,
}

/// Everything derived from the ballot log. Never stored; rebuilt on each read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Standings {
    pub total_votes: usize,
    pub scores: BTreeMap<String, u64>,
    /// `podium[pos][name]` counts the ballots placing `name` at position `pos`.
    pub podium: Vec<BTreeMap<String, u64>>,
    pub ranking: Vec<RankedCandidate>,
}

impl Standings {
    pub fn winner(&self) -> Option<&RankedCandidate> {
        self.ranking.first()
    }

    pub fn score(&self, name: &str) -> u64 {
        self.scores.get(name).copied().unwrap_or_default()
    }

    pub fn podium_count(&self, position: usize, name: &str) -> u64 {
        self.podium
            .get(position)
            .and_then(|tier| tier.get(name))
            .copied()
            .unwrap_or_default()
    }
}

/// Borda-count scorer with a cascading podium tie-break.
#[derive(Debug, Clone, Copy)]
pub struct ScoringEngine<'a> {
    weights: &'a [u32],
    candidates: Option<&'a PollConfig>,
}

impl<'a> ScoringEngine<'a> {
    pub fn new(weights: &'a [u32]) -> Self {
        Self {
            weights,
            candidates: None,
        }
    }

    /// Scores every configured candidate, reporting zero for those nobody ranked.
    pub fn from_config(config: &'a PollConfig) -> Self {
        Self {
            weights: config.weights(),
            candidates: Some(config),
        }
    }

    pub fn compute(&self, ballots: &[Ballot]) -> Standings {
        let mut scores: BTreeMap<String, u64> = self
            .candidates
            .map(|config| config.names().map(|name| (name.to_string(), 0)).collect())
            .unwrap_or_default();
        let mut podium: Vec<BTreeMap<String, u64>> = vec![BTreeMap::new(); self.weights.len()];
        let mut ranked_names: BTreeSet<&str> = BTreeSet::new();

        for ballot in ballots {
            for (pos, name) in ballot.names().iter().enumerate() {
                let Some(weight) = self.weights.get(pos) else {
                    continue;
                };
                ranked_names.insert(name.as_str());
                *scores.entry(name.clone()).or_default() += u64::from(*weight);
                *podium[pos].entry(name.clone()).or_default() += 1;
            }
        }

        let sort_key = |name: &str| {
            let score = scores.get(name).copied().unwrap_or_default();
            let tiers: Vec<Reverse<u64>> = podium
                .iter()
                .map(|tier| Reverse(tier.get(name).copied().unwrap_or_default()))
                .collect();
            (Reverse(score), tiers, name.to_string())
        };

        let mut order: Vec<&str> = ranked_names.into_iter().collect();
        order.sort_by_cached_key(|name| sort_key(name));

        let ranking = order
            .into_iter()
            .enumerate()
            .map(|(index, name)| RankedCandidate {
                position: index + 1,
                name: name.to_string(),
                score: scores.get(name).copied().unwrap_or_default(),
            })
            .collect();

        Standings {
            total_votes: ballots.len(),
            scores,
            podium,
            ranking,
        }
    }
}
