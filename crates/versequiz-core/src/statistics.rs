//! Dashboard figures and the cross-user leaderboard.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::history::{DetailRecord, Outcome, SessionRecord};
use crate::model::QuestionType;

/// Detail records considered for the recent per-book wrong rate.
pub const RECENT_WINDOW: usize = 100;
/// Exam scores are reported on this scale.
pub const TREND_SCALE: f64 = 30.0;
pub const LEADERBOARD_SIZE: usize = 10;
/// Most recent qualifying exams averaged per user.
pub const LEADERBOARD_SAMPLE: usize = 5;
/// Exams shorter than this do not count toward the leaderboard.
pub const LEADERBOARD_MIN_QUESTIONS: u32 = 10;

/// Answer counts for one slice of history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub total: u32,
    pub correct: u32,
    pub skipped: u32,
}

impl Tally {
    pub fn add(&mut self, outcome: Outcome) {
        self.total += 1;
        match outcome {
            Outcome::Correct => self.correct += 1,
            Outcome::Skipped => self.skipped += 1,
            Outcome::Wrong => {}
        }
    }

    /// Wrong or skipped.
    pub fn missed(&self) -> u32 {
        self.total - self.correct
    }

    pub fn accuracy(&self) -> Option<f64> {
        (self.total > 0).then(|| self.correct as f64 / self.total as f64)
    }

    pub fn miss_rate(&self) -> Option<f64> {
        (self.total > 0).then(|| self.missed() as f64 / self.total as f64)
    }

    pub fn skip_rate(&self) -> Option<f64> {
        (self.total > 0).then(|| self.skipped as f64 / self.total as f64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookRate {
    pub book: String,
    pub tally: Tally,
}

/// Summary of one user's history.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Dashboard {
    pub exam_count: usize,
    /// `(correct, total)` of the latest exam.
    pub last_exam: Option<(u32, u32)>,
    /// Mean exam score on the [`TREND_SCALE`] scale.
    pub average_score: Option<f64>,
    /// Each exam's score on the [`TREND_SCALE`] scale, oldest first.
    pub score_trend: Vec<u32>,
    pub by_type: BTreeMap<QuestionType, Tally>,
    pub subjective: Tally,
    pub objective: Tally,
    /// Over all exam details; subjective and objective combined.
    pub overall: Tally,
    pub by_book: BTreeMap<String, Tally>,
    /// Books ranked by miss rate over the most recent details of any session.
    pub recent_by_book: Vec<BookRate>,
    pub recent_window: usize,
}

fn scaled(record: &SessionRecord) -> f64 {
    record.correct as f64 / record.total.max(1) as f64 * TREND_SCALE
}

/// Compute the dashboard for `sessions`, given in stored order.
pub fn dashboard(sessions: &[SessionRecord]) -> Dashboard {
    let exams: Vec<&SessionRecord> = sessions.iter().filter(|s| s.is_exam()).collect();

    let mut dash = Dashboard {
        exam_count: exams.len(),
        last_exam: exams.last().map(|s| (s.correct, s.total)),
        average_score: (!exams.is_empty())
            .then(|| exams.iter().map(|s| scaled(s)).sum::<f64>() / exams.len() as f64),
        score_trend: exams.iter().map(|s| scaled(s).round() as u32).collect(),
        ..Dashboard::default()
    };

    for d in exams.iter().flat_map(|s| s.details.iter()) {
        let outcome = d.outcome();
        dash.by_type.entry(d.qtype).or_default().add(outcome);
        if d.subj {
            dash.subjective.add(outcome);
        } else {
            dash.objective.add(outcome);
        }
        dash.overall.add(outcome);
        dash.by_book.entry(d.book.clone()).or_default().add(outcome);
    }

    let recent = recent_details(sessions, RECENT_WINDOW);
    dash.recent_window = recent.len();
    dash.recent_by_book = rank_books(&recent);
    dash
}

/// Up to `limit` details, newest session first and, within a session, last
/// question first.
fn recent_details(sessions: &[SessionRecord], limit: usize) -> Vec<&DetailRecord> {
    let mut ordered: Vec<&SessionRecord> = sessions.iter().collect();
    ordered.sort_by(|a, b| b.date.cmp(&a.date));
    ordered
        .into_iter()
        .flat_map(|s| s.details.iter().rev())
        .take(limit)
        .collect()
}

fn rank_books(details: &[&DetailRecord]) -> Vec<BookRate> {
    let mut by_book: HashMap<&str, Tally> = HashMap::new();
    for d in details {
        by_book.entry(d.book.as_str()).or_default().add(d.outcome());
    }
    let mut rows: Vec<BookRate> = by_book
        .into_iter()
        .map(|(book, tally)| BookRate {
            book: book.to_string(),
            tally,
        })
        .collect();
    rows.sort_by(|a, b| {
        let rate = |r: &BookRate| r.tally.miss_rate().unwrap_or(0.0);
        rate(b)
            .total_cmp(&rate(a))
            .then(b.tally.total.cmp(&a.tally.total))
            .then_with(|| a.book.cmp(&b.book))
    });
    rows
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub username: String,
    pub avg_percent: f64,
    pub sample_count: usize,
}

/// Rank users by the average percentage of their most recent qualifying
/// exams. Users without one are left out.
pub fn leaderboard<'a>(
    users: impl IntoIterator<Item = (&'a str, &'a [SessionRecord])>,
) -> Vec<LeaderboardEntry> {
    let mut leaders: Vec<LeaderboardEntry> = users
        .into_iter()
        .filter_map(|(name, sessions)| {
            let mut exams: Vec<&SessionRecord> = sessions
                .iter()
                .filter(|s| s.is_exam() && s.total >= LEADERBOARD_MIN_QUESTIONS)
                .collect();
            if exams.is_empty() {
                return None;
            }
            exams.sort_by(|a, b| b.date.cmp(&a.date));
            exams.truncate(LEADERBOARD_SAMPLE);
            let sum: f64 = exams
                .iter()
                .map(|s| s.correct as f64 / s.total.max(1) as f64 * 100.0)
                .sum();
            Some(LeaderboardEntry {
                username: name.to_string(),
                avg_percent: sum / exams.len() as f64,
                sample_count: exams.len(),
            })
        })
        .collect();

    leaders.sort_by(|a, b| {
        b.avg_percent
            .total_cmp(&a.avg_percent)
            .then(b.sample_count.cmp(&a.sample_count))
            .then_with(|| a.username.cmp(&b.username))
    });
    leaders.truncate(LEADERBOARD_SIZE);
    leaders
}
