//! Selection weights derived from history and the verse score ledger.
//!
//! `weight = base + wrong·w + skip·s − correct·c + score·v`, clamped to at
//! least 1, computed per corpus verse. Drawing uses a prefix-sum table and a
//! binary search.

use std::collections::HashMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::history::{Outcome, SessionRecord};
use crate::ledger::VerseScores;
use crate::model::Corpus;

/// Coefficients of the weight formula.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightParams {
    pub base: i64,
    pub wrong: i64,
    pub skip: i64,
    pub correct: i64,
    pub score_multiplier: i64,
}

impl Default for WeightParams {
    fn default() -> Self {
        Self {
            base: 1,
            wrong: 1,
            skip: 1,
            correct: 1,
            score_multiplier: 4,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Tally {
    correct: i64,
    wrong: i64,
    skip: i64,
}

/// Weights for every corpus verse, by corpus index, plus the prefix sums.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightTable {
    weights: Vec<u64>,
    prefix: Vec<u64>,
    total: u64,
}

impl WeightTable {
    /// Compute weights for `corpus` from every detail in `sessions` and the score ledger.
    pub fn build(
        corpus: &Corpus,
        sessions: &[SessionRecord],
        scores: &VerseScores,
        params: &WeightParams,
    ) -> Self {
        let mut tallies: HashMap<String, Tally> = HashMap::new();
        for d in sessions.iter().flat_map(|s| s.details.iter()) {
            let t = tallies.entry(d.key()).or_default();
            match d.outcome() {
                Outcome::Correct => t.correct += 1,
                Outcome::Wrong => t.wrong += 1,
                Outcome::Skipped => t.skip += 1,
            }
        }

        let weights: Vec<u64> = corpus
            .verses()
            .iter()
            .map(|v| {
                let key = v.key();
                let t = tallies.get(&key).copied().unwrap_or_default();
                let raw = params.base + params.wrong * t.wrong + params.skip * t.skip
                    - params.correct * t.correct
                    + params.score_multiplier * scores.get(&key) as i64;
                raw.max(1) as u64
            })
            .collect();

        Self::from_weights(weights)
    }

    /// Build the table from precomputed weights; zero weights are raised to 1.
    pub fn from_weights(weights: Vec<u64>) -> Self {
        let weights: Vec<u64> = weights.into_iter().map(|w| w.max(1)).collect();
        let mut prefix = Vec::with_capacity(weights.len());
        let mut acc = 0u64;
        for &w in &weights {
            acc += w;
            prefix.push(acc);
        }
        Self {
            weights,
            prefix,
            total: acc,
        }
    }

    pub fn weights(&self) -> &[u64] {
        &self.weights
    }

    pub fn prefix(&self) -> &[u64] {
        &self.prefix
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Draw a corpus index with probability proportional to its weight.
    /// Returns `None` only for an empty table.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<usize> {
        if self.total == 0 {
            return None;
        }
        let r = rng.gen_range(0..self.total);
        Some(self.prefix.partition_point(|&p| p <= r))
    }
}
