//! Persisted session history records.
//!
//! The shapes here are what the store writes and what the weight model and
//! dashboard statistics read back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{verse_key, QuestionType, Verse};

/// How a single question ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Correct,
    Wrong,
    Skipped,
}

impl Outcome {
    pub fn from_grade(correct: bool) -> Self {
        if correct {
            Outcome::Correct
        } else {
            Outcome::Wrong
        }
    }

    pub fn is_correct(self) -> bool {
        self == Outcome::Correct
    }

    /// Wrong answers and skips both count as misses.
    pub fn is_miss(self) -> bool {
        !self.is_correct()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    Exam,
    Practice,
}

/// One answered or skipped question inside a session summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailRecord {
    pub qtype: QuestionType,
    #[serde(default)]
    pub subj: bool,
    pub book: String,
    pub chapter: u32,
    pub verse: u32,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub correct: bool,
    #[serde(default)]
    pub skipped: bool,
}

impl DetailRecord {
    pub fn new(qtype: QuestionType, verse: &Verse, outcome: Outcome) -> Self {
        Self {
            qtype,
            subj: qtype.is_subjective(),
            book: verse.book.clone(),
            chapter: verse.chapter,
            verse: verse.verse,
            text: verse.text.clone(),
            correct: outcome.is_correct(),
            skipped: outcome == Outcome::Skipped,
        }
    }

    pub fn key(&self) -> String {
        verse_key(&self.book, self.chapter, self.verse)
    }

    /// A skipped detail is a skip even if a stale `correct` flag is set.
    pub fn outcome(&self) -> Outcome {
        if self.skipped {
            Outcome::Skipped
        } else if self.correct {
            Outcome::Correct
        } else {
            Outcome::Wrong
        }
    }
}

/// Snapshot of a constructed question, enough to replay it exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDump {
    pub qtype: QuestionType,
    #[serde(default)]
    pub subj: bool,
    pub verse: Verse,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub options: Option<Vec<String>>,
    #[serde(default)]
    pub correct_index: Option<usize>,
    #[serde(default)]
    pub masked_text: Option<String>,
}

/// Summary of one exam or one practice attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: Option<SessionKind>,
    #[serde(rename = "dateISO", default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub correct: u32,
    #[serde(default)]
    pub skip: u32,
    #[serde(default)]
    pub score: u32,
    #[serde(default)]
    pub origin_session_id: Option<String>,
    #[serde(default)]
    pub details: Vec<DetailRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub questions_dump: Option<Vec<QuestionDump>>,
}

impl SessionRecord {
    /// Build a summary from detail records, computing the tallies.
    pub fn from_details(kind: SessionKind, details: Vec<DetailRecord>) -> Self {
        let correct = details.iter().filter(|d| d.outcome().is_correct()).count() as u32;
        let skip = details
            .iter()
            .filter(|d| d.outcome() == Outcome::Skipped)
            .count() as u32;
        Self {
            id: new_session_id(),
            kind: Some(kind),
            date: Some(Utc::now()),
            total: details.len() as u32,
            correct,
            skip,
            score: correct,
            origin_session_id: None,
            details,
            questions_dump: None,
        }
    }

    /// Exam-like sessions: explicitly typed exams, or legacy untyped records
    /// with more than one question.
    pub fn is_exam(&self) -> bool {
        match self.kind {
            Some(SessionKind::Exam) => true,
            Some(SessionKind::Practice) => false,
            None => self.total > 1,
        }
    }

    /// Fraction of questions answered correctly, 0 for an empty session.
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }
}

pub fn new_session_id() -> String {
    format!("sess_{}", Uuid::new_v4().simple())
}
