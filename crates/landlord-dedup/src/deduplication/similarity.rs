//! Similarity scoring for deduplication
//!
//! Scores operate on already normalized strings. The composite is the
//! weighted mean of the enabled sub-algorithms, so disabling one
//! renormalizes the others.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use strsim::levenshtein;

use crate::config::AlgorithmWeights;
use crate::error::ConfigError;

/// Per-algorithm scores; `None` for disabled algorithms
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SimilarityBreakdown {
    pub dice: Option<f64>,
    pub levenshtein: Option<f64>,
    pub tokens: Option<f64>,
}

/// Result of comparing two normalized strings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityResult {
    /// Composite score in [0, 1]
    pub score: f64,
    pub breakdown: SimilarityBreakdown,
}

/// Weighted composite of Dice, Levenshtein and token-set similarity
#[derive(Debug, Clone)]
pub struct SimilarityScorer {
    weights: AlgorithmWeights,
    total_weight: f64,
}

impl SimilarityScorer {
    pub fn new(weights: AlgorithmWeights) -> Result<Self, ConfigError> {
        let total_weight = weights.dice.effective_weight()
            + weights.levenshtein.effective_weight()
            + weights.tokens.effective_weight();
        if !total_weight.is_finite() || total_weight <= 0.0 {
            return Err(ConfigError::NoAlgorithmsEnabled);
        }
        Ok(Self {
            weights,
            total_weight,
        })
    }

    /// Score two normalized strings. Equal strings always score exactly 1.
    pub fn score(&self, a: &str, b: &str) -> SimilarityResult {
        let enabled = |on: bool, value: f64| if on { Some(value) } else { None };

        if a == b {
            return SimilarityResult {
                score: 1.0,
                breakdown: SimilarityBreakdown {
                    dice: enabled(self.weights.dice.enabled, 1.0),
                    levenshtein: enabled(self.weights.levenshtein.enabled, 1.0),
                    tokens: enabled(self.weights.tokens.enabled, 1.0),
                },
            };
        }

        let breakdown = SimilarityBreakdown {
            dice: self.weights.dice.enabled.then(|| dice_coefficient(a, b)),
            levenshtein: self
                .weights
                .levenshtein
                .enabled
                .then(|| levenshtein_similarity(a, b)),
            tokens: self.weights.tokens.enabled.then(|| token_similarity(a, b)),
        };

        let weighted = breakdown.dice.unwrap_or(0.0) * self.weights.dice.effective_weight()
            + breakdown.levenshtein.unwrap_or(0.0) * self.weights.levenshtein.effective_weight()
            + breakdown.tokens.unwrap_or(0.0) * self.weights.tokens.effective_weight();

        SimilarityResult {
            score: (weighted / self.total_weight).clamp(0.0, 1.0),
            breakdown,
        }
    }
}

impl Default for SimilarityScorer {
    fn default() -> Self {
        let weights = AlgorithmWeights::default();
        let total_weight = weights.dice.weight + weights.levenshtein.weight + weights.tokens.weight;
        Self {
            weights,
            total_weight,
        }
    }
}

/// Multiset of adjacent character pairs
fn bigrams(s: &str) -> HashMap<(char, char), usize> {
    let chars: Vec<char> = s.chars().collect();
    let mut counts = HashMap::new();
    for pair in chars.windows(2) {
        *counts.entry((pair[0], pair[1])).or_insert(0) += 1;
    }
    counts
}

/// Dice coefficient over character bigrams.
///
/// Strings shorter than two characters share no bigrams and score 0
/// unless identical.
pub fn dice_coefficient(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }

    let bigrams_a = bigrams(a);
    let bigrams_b = bigrams(b);
    let total: usize = bigrams_a.values().sum::<usize>() + bigrams_b.values().sum::<usize>();
    if total == 0 {
        return 0.0;
    }

    let shared: usize = bigrams_a
        .iter()
        .map(|(pair, count)| (*count).min(bigrams_b.get(pair).copied().unwrap_or(0)))
        .sum();

    (2 * shared) as f64 / total as f64
}

/// `1 - distance / longest length`, counted in characters
pub fn levenshtein_similarity(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    let distance = levenshtein(a, b);
    (1.0 - distance as f64 / longest as f64).clamp(0.0, 1.0)
}

/// Jaccard similarity over whitespace-separated tokens
pub fn token_similarity(a: &str, b: &str) -> f64 {
    let tokens_a: HashSet<&str> = a.split_whitespace().collect();
    let tokens_b: HashSet<&str> = b.split_whitespace().collect();

    let union = tokens_a.union(&tokens_b).count();
    if union == 0 {
        return 1.0;
    }
    let intersection = tokens_a.intersection(&tokens_b).count();

    intersection as f64 / union as f64
}
