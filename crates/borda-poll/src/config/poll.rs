use std::collections::HashSet;
use std::env;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::ConfigError;

/// Candidate names used when `POLL_CANDIDATES` is unset.
pub const DEFAULT_CANDIDATES: [&str; 5] = ["Aurora", "Birch", "Cedar", "Dune", "Ember"];

/// Points awarded to the first five ranked positions when `POLL_WEIGHTS` is unset.
pub const DEFAULT_WEIGHTS: [u32; 5] = [5, 4, 3, 2, 1];

const DEFAULT_ADMIN_TOKEN: &str = "change-me";
const VOTED_COOKIE: &str = "borda_poll_voted";

/// A poll option. The image reference is display metadata only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub name: String,
    pub image: String,
}

impl Candidate {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let image = format!("/static/img/{}.jpg", slug(&name));
        Self { name, image }
    }

    pub fn with_image(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
        }
    }
}

/// Lowercase ASCII file stem for `name`: accented Latin letters fold to their base letter,
/// everything else outside `[a-z0-9]` is dropped.
fn slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if let Some(folded) = fold_latin(c) {
            slug.push_str(folded);
        }
    }
    slug
}

fn fold_latin(c: char) -> Option<&'static str> {
    let folded = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => "a",
        'æ' => "ae",
        'ç' | 'ć' | 'č' | 'ĉ' => "c",
        'ď' | 'đ' => "d",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' | 'ě' => "e",
        'ğ' | 'ġ' => "g",
        'ı' | 'ì' | 'í' | 'î' | 'ï' | 'ī' | 'į' => "i",
        'ł' => "l",
        'ñ' | 'ń' | 'ň' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' => "o",
        'œ' => "oe",
        'ř' => "r",
        'ş' | 'ś' | 'š' | 'ș' => "s",
        'ß' => "ss",
        'ţ' | 'ť' | 'ț' => "t",
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' => "u",
        'ý' | 'ÿ' => "y",
        'ź' | 'ż' | 'ž' => "z",
        _ => return None,
    };
    Some(folded)
}

/// One `POLL_CANDIDATES` entry: `Name` or `Name=/static/img/file.jpg`.
fn parse_candidate(entry: &str) -> Candidate {
    match entry.split_once('=') {
        Some((name, image)) if !image.trim().is_empty() => {
            Candidate::with_image(name.trim(), image.trim())
        }
        Some((name, _)) => Candidate::new(name.trim()),
        None => Candidate::new(entry.trim()),
    }
}

/// Result of resolving one candidate image against the static directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageCheck {
    pub candidate: String,
    pub path: PathBuf,
    pub present: bool,
}

/// Immutable poll settings shared by the ballot validator, store and scoring engine.
#[derive(Debug, Clone)]
pub struct PollConfig {
    candidates: Vec<Candidate>,
    weights: Vec<u32>,
    admin_token: String,
    single_vote: bool,
}

impl PollConfig {
    pub fn new(
        candidates: Vec<Candidate>,
        weights: Vec<u32>,
        admin_token: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        if candidates.len() < 2 {
            return Err(ConfigError::TooFewCandidates {
                found: candidates.len(),
            });
        }

        let mut seen = HashSet::new();
        for candidate in &candidates {
            if candidate.name.trim().is_empty() {
                return Err(ConfigError::BlankCandidate);
            }
            if !seen.insert(candidate.name.as_str()) {
                return Err(ConfigError::DuplicateCandidate(candidate.name.clone()));
            }
        }

        if weights.is_empty() {
            return Err(ConfigError::InvalidWeights {
                value: String::new(),
            });
        }

        Ok(Self {
            candidates,
            weights,
            admin_token: admin_token.into(),
            single_vote: false,
        })
    }

    /// Built-in candidates and weights with the given reset secret.
    pub fn standard(admin_token: impl Into<String>) -> Self {
        Self {
            candidates: DEFAULT_CANDIDATES.iter().map(|name| Candidate::new(*name)).collect(),
            weights: DEFAULT_WEIGHTS.to_vec(),
            admin_token: admin_token.into(),
            single_vote: false,
        }
    }

    pub(super) fn from_env() -> Result<Self, ConfigError> {
        let candidates = match env::var("POLL_CANDIDATES") {
            Ok(raw) => raw.split(',').map(parse_candidate).collect(),
            Err(_) => DEFAULT_CANDIDATES.iter().map(|name| Candidate::new(*name)).collect(),
        };

        let weights = match env::var("POLL_WEIGHTS") {
            Ok(raw) => parse_weights(&raw)?,
            Err(_) => DEFAULT_WEIGHTS.to_vec(),
        };

        let admin_token =
            env::var("POLL_ADMIN_TOKEN").unwrap_or_else(|_| DEFAULT_ADMIN_TOKEN.to_string());

        let single_vote = match env::var("POLL_SINGLE_VOTE") {
            Ok(raw) => parse_flag("POLL_SINGLE_VOTE", &raw)?,
            Err(_) => false,
        };

        Ok(Self::new(candidates, weights, admin_token)?.with_single_vote(single_vote))
    }

    pub fn with_single_vote(mut self, enforced: bool) -> Self {
        self.single_vote = enforced;
        self
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.candidates.iter().map(|candidate| candidate.name.as_str())
    }

    pub fn candidate(&self, name: &str) -> Option<&Candidate> {
        self.candidates.iter().find(|candidate| candidate.name == name)
    }

    pub fn weights(&self) -> &[u32] {
        &self.weights
    }

    /// Points a single ballot distributes across all positions.
    pub fn max_points_per_ballot(&self) -> u64 {
        self.weights.iter().map(|weight| u64::from(*weight)).sum()
    }

    pub fn token_matches(&self, token: &str) -> bool {
        !token.is_empty() && token == self.admin_token
    }

    /// Whether the one-vote-per-browser cookie is enforced.
    pub fn single_vote(&self) -> bool {
        self.single_vote
    }

    pub fn cookie_name(&self) -> &'static str {
        VOTED_COOKIE
    }

    /// Resolve each candidate image under `static_dir`, ignoring cache-busting query strings.
    pub fn check_images(&self, static_dir: &Path) -> Vec<ImageCheck> {
        self.candidates
            .iter()
            .map(|candidate| {
                let reference = candidate.image.split('?').next().unwrap_or_default();
                let relative = reference
                    .strip_prefix("/static/")
                    .unwrap_or_else(|| reference.trim_start_matches('/'));
                let path = static_dir.join(relative);
                ImageCheck {
                    candidate: candidate.name.clone(),
                    present: path.exists(),
                    path,
                }
            })
            .collect()
    }
}

fn parse_weights(raw: &str) -> Result<Vec<u32>, ConfigError> {
    let invalid = || ConfigError::InvalidWeights {
        value: raw.to_string(),
    };

    let weights = raw
        .split(',')
        .map(|part| part.trim().parse::<u32>().map_err(|_| invalid()))
        .collect::<Result<Vec<_>, _>>()?;

    if weights.is_empty() || weights.contains(&0) {
        return Err(invalid());
    }
    Ok(weights)
}

fn parse_flag(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            name,
            value: raw.to_string(),
        }),
    }
}
