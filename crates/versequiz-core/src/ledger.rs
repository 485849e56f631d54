//! Per-verse error tally.
//!
//! A miss (wrong or skipped) adds one; a correct answer takes one away,
//! never going below zero. The tally drives the "worst verses" ranking and
//! the score term of the weight model.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::history::{DetailRecord, Outcome};

/// Default size of the worst-verses ranking.
pub const WORST_LIMIT: usize = 20;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VerseScores(BTreeMap<String, u32>);

impl VerseScores {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> u32 {
        self.0.get(key).copied().unwrap_or(0)
    }

    /// Apply one outcome and return the new score for `key`.
    pub fn record(&mut self, key: &str, outcome: Outcome) -> u32 {
        let score = self.0.entry(key.to_string()).or_insert(0);
        if outcome.is_miss() {
            *score = score.saturating_add(1);
        } else {
            *score = score.saturating_sub(1);
        }
        *score
    }

    /// Apply every detail of a session summary in order.
    pub fn apply_details(&mut self, details: &[DetailRecord]) {
        for d in details {
            self.record(&d.key(), d.outcome());
        }
    }

    /// Up to `limit` keys with a positive score, highest first, ties by key.
    pub fn worst(&self, limit: usize) -> Vec<(String, u32)> {
        let mut ranked: Vec<(String, u32)> = self
            .0
            .iter()
            .filter(|(_, &s)| s > 0)
            .map(|(k, &s)| (k.clone(), s))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(limit);
        ranked
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.0.remove(key).is_some()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.0.iter().map(|(k, &s)| (k.as_str(), s))
    }
}

impl FromIterator<(String, u32)> for VerseScores {
    fn from_iter<I: IntoIterator<Item = (String, u32)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{QuestionType, Verse};

    #[test]
    fn three_wrongs_one_correct_any_order() {
        let orders = [
            [Outcome::Wrong, Outcome::Wrong, Outcome::Wrong, Outcome::Correct],
            [Outcome::Correct, Outcome::Wrong, Outcome::Wrong, Outcome::Wrong],
            [Outcome::Wrong, Outcome::Correct, Outcome::Skipped, Outcome::Wrong],
        ];
        for order in orders {
            let mut scores = VerseScores::new();
            for o in order {
                scores.record("John|3|16", o);
            }
            // A leading correct floors at zero, so it only cancels when it
            // follows a miss.
            let expected = if order[0] == Outcome::Correct { 3 } else { 2 };
            assert_eq!(scores.get("John|3|16"), expected, "order {order:?}");
        }
    }

    #[test]
    fn floors_at_zero() {
        let mut scores = VerseScores::new();
        assert_eq!(scores.record("a|1|1", Outcome::Correct), 0);
        assert_eq!(scores.record("a|1|1", Outcome::Skipped), 1);
        assert_eq!(scores.record("a|1|1", Outcome::Correct), 0);
        assert_eq!(scores.record("a|1|1", Outcome::Correct), 0);
    }

    #[test]
    fn apply_details_uses_reference_key() {
        let v = Verse::new("Psalms", 23, 1, "The Lord is my shepherd");
        let details = vec![
            DetailRecord::new(QuestionType::Cloze, &v, Outcome::Wrong),
            DetailRecord::new(QuestionType::IdentifyRef, &v, Outcome::Skipped),
        ];
        let mut scores = VerseScores::new();
        scores.apply_details(&details);
        assert_eq!(scores.get("Psalms|23|1"), 2);
    }

    #[test]
    fn worst_ranking_order_and_limit() {
        let scores: VerseScores = [
            ("b|1|1".to_string(), 3),
            ("a|1|1".to_string(), 3),
            ("c|1|1".to_string(), 5),
            ("d|1|1".to_string(), 0),
            ("e|1|1".to_string(), 1),
        ]
        .into_iter()
        .collect();
        let worst = scores.worst(3);
        let keys: Vec<&str> = worst.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["c|1|1", "a|1|1", "b|1|1"]);
        assert_eq!(scores.worst(WORST_LIMIT).len(), 4);
    }

    #[test]
    fn serializes_as_plain_map() {
        let mut scores = VerseScores::new();
        scores.record("John|1|1", Outcome::Wrong);
        let json = serde_json::to_string(&scores).unwrap();
        assert_eq!(json, r#"{"John|1|1":1}"#);
    }
}
