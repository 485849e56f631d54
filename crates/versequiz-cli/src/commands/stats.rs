//! The `versequiz stats` command.

use anyhow::Result;
use comfy_table::{Cell, Table};

use versequiz_core::statistics::{dashboard, Tally, TREND_SCALE};

use super::{Context, GlobalOpts};

/// Sessions listed at the bottom of the text report.
const RECENT_SESSIONS: usize = 10;

fn percent(rate: Option<f64>) -> String {
    rate.map_or_else(|| "-".to_string(), |r| format!("{:.1}%", r * 100.0))
}

fn tally_row(label: String, t: &Tally) -> Vec<Cell> {
    vec![
        Cell::new(label),
        Cell::new(t.total),
        Cell::new(t.correct),
        Cell::new(t.skipped),
        Cell::new(percent(t.accuracy())),
    ]
}

pub fn execute(opts: GlobalOpts, format: String) -> Result<()> {
    let ctx = Context::load(opts)?;
    let store = ctx.store();
    let user = store.user_or_default(&ctx.user);
    let dash = dashboard(&user.sessions);

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&dash)?);
        return Ok(());
    }

    println!("User: {}", ctx.user);
    println!("Exams taken: {}", dash.exam_count);
    if let Some((correct, total)) = dash.last_exam {
        println!("Last exam: {correct}/{total}");
    }
    if let Some(avg) = dash.average_score {
        println!("Average score: {avg:.1}/{TREND_SCALE}");
    }
    println!(
        "Subjective accuracy: {}  Objective accuracy: {}  Skip rate: {}",
        percent(dash.subjective.accuracy()),
        percent(dash.objective.accuracy()),
        percent(dash.overall.skip_rate())
    );
    if !dash.score_trend.is_empty() {
        let trend: Vec<String> = dash.score_trend.iter().map(u32::to_string).collect();
        println!("Score trend: {}", trend.join(" "));
    }

    if !dash.by_type.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Type", "Answered", "Correct", "Skipped", "Accuracy"]);
        for (qtype, t) in &dash.by_type {
            table.add_row(tally_row(qtype.to_string(), t));
        }
        println!("\n{table}");
    }

    if !dash.by_book.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Book", "Answered", "Correct", "Skipped", "Accuracy"]);
        for (book, t) in &dash.by_book {
            table.add_row(tally_row(book.clone(), t));
        }
        println!("\n{table}");
    }

    if !dash.recent_by_book.is_empty() {
        println!("\nRecent misses by book (last {} answers):", dash.recent_window);
        let mut table = Table::new();
        table.set_header(vec!["Book", "Answered", "Missed", "Miss rate"]);
        for row in &dash.recent_by_book {
            table.add_row(vec![
                Cell::new(&row.book),
                Cell::new(row.tally.total),
                Cell::new(row.tally.missed()),
                Cell::new(percent(row.tally.miss_rate())),
            ]);
        }
        println!("{table}");
    }

    if !user.sessions.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Id", "Date", "Kind", "Score", "Replayable"]);
        for s in user.sessions.iter().rev().take(RECENT_SESSIONS) {
            table.add_row(vec![
                Cell::new(&s.id),
                Cell::new(
                    s.date
                        .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_default(),
                ),
                Cell::new(if s.is_exam() { "exam" } else { "practice" }),
                Cell::new(format!("{}/{}", s.correct, s.total)),
                Cell::new(if s.questions_dump.is_some() { "yes" } else { "no" }),
            ]);
        }
        println!("\nRecent sessions:\n{table}");
    }

    Ok(())
}
