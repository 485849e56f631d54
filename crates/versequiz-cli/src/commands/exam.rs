//! The `versequiz exam` command.

use std::io::{BufRead, Write};

use anyhow::Result;
use comfy_table::{Cell, Table};

use versequiz_core::history::{Outcome, SessionRecord};
use versequiz_core::model::QuestionType;
use versequiz_core::session::{start_exam, ExamSession};
use versequiz_core::statistics::TREND_SCALE;
use versequiz_core::store::Store;

use super::console::{Console, Input};
use super::{rng, Context, GlobalOpts};

pub fn execute(
    opts: GlobalOpts,
    questions: Option<u32>,
    types: Vec<QuestionType>,
    seed: Option<u64>,
) -> Result<()> {
    let ctx = Context::load(opts)?;
    let corpus = ctx.corpus()?;
    let mut store = ctx.store();
    let settings = ctx.settings_with(&store, questions, types);

    let mut rng = rng(seed);
    let exam = start_exam(&corpus, &settings, &mut rng)?;
    run_exam(exam, &mut store, &ctx.user, &mut Console::stdio())
}

/// Ask every question of `exam`, then save and print the result. Quitting
/// early discards the exam.
pub fn run_exam<R: BufRead, W: Write>(
    mut exam: ExamSession,
    store: &mut Store,
    user: &str,
    console: &mut Console<R, W>,
) -> Result<()> {
    console.say(format!(
        "Exam: {} question(s). Type :s to skip, :q to quit without saving.",
        exam.len()
    ))?;

    while !exam.is_complete() {
        let progress = Some((exam.position() + 1, exam.len()));
        match console.ask(exam.current(), progress)? {
            Input::Answer(answer) => {
                exam.answer(&answer)?;
            }
            Input::Skip => {
                exam.skip()?;
            }
            Input::Quit => {
                console.say(format!(
                    "Exam abandoned after {} of {} question(s); nothing saved.",
                    exam.answered(),
                    exam.len()
                ))?;
                return Ok(());
            }
        }
    }

    let record = exam.summary();
    store.commit_session(user, record.clone())?;
    print_results(&exam, &record, console)
}

fn print_results<R: BufRead, W: Write>(
    exam: &ExamSession,
    record: &SessionRecord,
    console: &mut Console<R, W>,
) -> Result<()> {
    let mut table = Table::new();
    table.set_header(vec!["#", "Reference", "Type", "Result", "Your answer", "Answer"]);
    for (i, q) in exam.questions().iter().enumerate() {
        let (result, given) = match exam.response(i) {
            Some(f) => (
                match f.outcome {
                    Outcome::Correct => "correct",
                    Outcome::Wrong => "wrong",
                    Outcome::Skipped => "skipped",
                },
                f.given.clone(),
            ),
            None => ("wrong", String::new()),
        };
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(q.verse.reference()),
            Cell::new(q.qtype()),
            Cell::new(result),
            Cell::new(given),
            Cell::new(q.correct_answer()),
        ]);
    }

    console.say(format!("\n{table}"))?;
    console.say(format!(
        "Score: {}/{} ({:.1}/{TREND_SCALE}), skipped {}",
        record.correct,
        record.total,
        record.accuracy() * TREND_SCALE,
        record.skip
    ))?;
    if record.origin_session_id.is_some() {
        console.say(format!("Replaced session {}", record.id))?;
    } else {
        console.say(format!("Saved session {}", record.id))?;
    }
    Ok(())
}
