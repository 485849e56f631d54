//! The `versequiz leaderboard` command.

use anyhow::Result;
use comfy_table::{Cell, Table};

use versequiz_core::statistics::{leaderboard, LEADERBOARD_MIN_QUESTIONS, LEADERBOARD_SAMPLE};

use super::{Context, GlobalOpts};

pub fn execute(opts: GlobalOpts, format: String) -> Result<()> {
    let ctx = Context::load(opts)?;
    let store = ctx.store();
    let board = leaderboard(
        store
            .database()
            .users
            .iter()
            .map(|(name, u)| (name.as_str(), u.sessions.as_slice())),
    );

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&board)?);
        return Ok(());
    }

    if board.is_empty() {
        println!("No exams of {LEADERBOARD_MIN_QUESTIONS}+ questions recorded yet.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Rank", "User", "Average", "Exams"]);
    for (i, entry) in board.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&entry.username),
            Cell::new(format!("{:.1}%", entry.avg_percent)),
            Cell::new(entry.sample_count),
        ]);
    }
    println!("{table}");
    println!("Average of each user's last {LEADERBOARD_SAMPLE} exams with {LEADERBOARD_MIN_QUESTIONS}+ questions.");
    Ok(())
}
