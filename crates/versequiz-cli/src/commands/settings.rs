//! The `versequiz settings` command.

use anyhow::Result;

use versequiz_core::model::{QuestionType, MAX_QUESTIONS, MIN_QUESTIONS};

use super::{Context, GlobalOpts};

pub fn execute(opts: GlobalOpts, questions: Option<u32>, types: Vec<QuestionType>) -> Result<()> {
    let ctx = Context::load(opts)?;
    let mut store = ctx.store();
    let mut settings = ctx.settings(&store);

    if questions.is_some() || !types.is_empty() {
        if let Some(n) = questions {
            if !(MIN_QUESTIONS..=MAX_QUESTIONS).contains(&n) {
                anyhow::bail!("questions must be between {MIN_QUESTIONS} and {MAX_QUESTIONS}, got {n}");
            }
            settings.num_questions = n;
        }
        if !types.is_empty() {
            settings.enabled_qtypes = types;
        }
        settings.enabled_qtypes = settings.question_types()?;
        store.update_settings(&ctx.user, settings.clone())?;
        println!("Saved settings for {}.", ctx.user);
    }

    let names: Vec<&str> = settings.enabled_qtypes.iter().map(|t| t.as_str()).collect();
    println!("Questions per exam: {}", settings.num_questions);
    println!("Question types: {}", names.join(", "));
    Ok(())
}
