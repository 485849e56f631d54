//! The `versequiz worst` command.

use anyhow::Result;
use comfy_table::{Cell, Table};

use versequiz_core::ledger::WORST_LIMIT;
use versequiz_core::model::QuestionType;
use versequiz_core::session::worst_verses_exam;

use super::console::Console;
use super::exam::run_exam;
use super::{rng, Context, GlobalOpts};

pub fn execute(
    opts: GlobalOpts,
    quiz: bool,
    types: Vec<QuestionType>,
    seed: Option<u64>,
) -> Result<()> {
    let ctx = Context::load(opts)?;
    let mut store = ctx.store();
    let scores = store.user_or_default(&ctx.user).verse_scores;

    if quiz {
        let corpus = ctx.corpus()?;
        let settings = ctx.settings_with(&store, None, types);
        let exam = worst_verses_exam(&corpus, &scores, &settings, &mut rng(seed))?;
        return run_exam(exam, &mut store, &ctx.user, &mut Console::stdio());
    }

    let worst = scores.worst(WORST_LIMIT);
    if worst.is_empty() {
        println!("No missed verses recorded for {}.", ctx.user);
        return Ok(());
    }

    // The listing still works without a readable corpus, just without text.
    let corpus = match ctx.corpus() {
        Ok(c) => Some(c),
        Err(e) => {
            tracing::warn!("{e:#}");
            None
        }
    };

    let mut table = Table::new();
    table.set_header(vec!["#", "Key", "Score", "Text"]);
    for (i, (key, score)) in worst.iter().enumerate() {
        let text = corpus
            .as_ref()
            .and_then(|c| c.find(key))
            .map_or("(not in corpus)", |v| v.text.as_str());
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(key),
            Cell::new(score),
            Cell::new(text),
        ]);
    }
    println!("{table}");
    Ok(())
}
