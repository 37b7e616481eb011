// Job matching core: text normalization, corpus builds, lexical + semantic matchers,
// and the recommendation service that persists their output.
// Matchers are pure functions of their fitted artifact and the request profile.

pub mod artifact;
pub mod corpus;
pub mod encoder;
pub mod handlers;
pub mod lexical;
pub mod lexicon;
pub mod normalizer;
pub mod profile;
pub mod registry;
pub mod semantic;
pub mod service;
pub mod tfidf;
pub mod training;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::MatchError;
use crate::matching::profile::UserProfile;

/// Which matcher backs a recommendation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelChoice {
    /// TF-IDF cosine similarity.
    #[serde(alias = "tfidf")]
    Lexical,
    /// Sentence-embedding cosine similarity.
    Semantic,
}

impl ModelChoice {
    pub const ALL: [ModelChoice; 2] = [ModelChoice::Lexical, ModelChoice::Semantic];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelChoice::Lexical => "lexical",
            ModelChoice::Semantic => "semantic",
        }
    }

    /// Result count when a request names none. Embedding scores are denser, so
    /// the semantic matcher returns a shorter list.
    pub fn default_top_n(&self) -> usize {
        match self {
            ModelChoice::Lexical => 10,
            ModelChoice::Semantic => 5,
        }
    }
}

impl fmt::Display for ModelChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lexical" | "tfidf" => Ok(ModelChoice::Lexical),
            "semantic" => Ok(ModelChoice::Semantic),
            other => Err(format!("unknown matcher '{other}'")),
        }
    }
}

/// One ranked recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub job_id: Uuid,
    /// Cosine similarity rounded to two decimals, within [0, 1].
    pub score: f64,
    /// At most five gap terms, most important first, no duplicates.
    pub missing_skills: Vec<String>,
    pub title: String,
    pub company: String,
}

/// Upper bound on `top_n` for a single request.
pub const MAX_TOP_N: usize = 100;

/// Most gap terms reported per match.
pub const MAX_MISSING_SKILLS: usize = 5;

/// The matcher capability the recommendation service depends on.
///
/// Implementations are immutable after load and shared as `Arc<dyn JobMatcher>`;
/// `recommend` is synchronous CPU work with no internal suspension points.
pub trait JobMatcher: Send + Sync {
    fn kind(&self) -> ModelChoice;

    fn recommend(&self, profile: &UserProfile, top_n: usize)
        -> Result<Vec<MatchResult>, MatchError>;
}

/// Rounds a similarity to two decimals and clamps float drift into [0, 1].
pub fn round_score(similarity: f32) -> f64 {
    let clamped = (similarity as f64).clamp(0.0, 1.0);
    (clamped * 100.0).round() / 100.0
}

/// Orders `(row, similarity)` pairs by descending similarity and keeps `top_n`.
/// The sort is stable, so exact ties keep ascending row order.
pub fn top_candidates(mut scored: Vec<(usize, f32)>, top_n: usize) -> Vec<(usize, f32)> {
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(top_n);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_choice_parses_aliases() {
        assert_eq!("tfidf".parse::<ModelChoice>().unwrap(), ModelChoice::Lexical);
        assert_eq!(" Semantic ".parse::<ModelChoice>().unwrap(), ModelChoice::Semantic);
        assert!("bm25".parse::<ModelChoice>().is_err());
    }

    #[test]
    fn test_model_choice_serde() {
        let parsed: ModelChoice = serde_json::from_str(r#""tfidf""#).unwrap();
        assert_eq!(parsed, ModelChoice::Lexical);
        assert_eq!(serde_json::to_string(&ModelChoice::Semantic).unwrap(), r#""semantic""#);
    }

    #[test]
    fn test_default_top_n_per_matcher() {
        assert_eq!(ModelChoice::Lexical.default_top_n(), 10);
        assert_eq!(ModelChoice::Semantic.default_top_n(), 5);
        assert!(ModelChoice::ALL.iter().all(|m| m.default_top_n() <= MAX_TOP_N));
    }

    #[test]
    fn test_round_score_two_decimals_and_clamped() {
        assert_eq!(round_score(0.12345), 0.12);
        assert_eq!(round_score(0.675_1), 0.68);
        assert_eq!(round_score(1.000_001), 1.0);
        assert_eq!(round_score(-0.01), 0.0);
    }

    #[test]
    fn test_top_candidates_stable_on_ties() {
        let scored = vec![(0, 0.5), (1, 0.9), (2, 0.5), (3, 0.1)];
        let top = top_candidates(scored, 3);
        assert_eq!(top, vec![(1, 0.9), (0, 0.5), (2, 0.5)]);
    }
}
