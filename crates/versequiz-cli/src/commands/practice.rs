//! The `versequiz practice` command.

use std::sync::Arc;

use anyhow::{Context as _, Result};

use versequiz_core::model::QuestionType;
use versequiz_core::sampler::AdaptiveSampler;
use versequiz_core::session::PracticeSession;
use versequiz_core::weights::WeightTable;

use super::console::{Console, Input};
use super::{rng, Context, GlobalOpts};

pub fn execute(
    opts: GlobalOpts,
    limit: Option<usize>,
    types: Vec<QuestionType>,
    seed: Option<u64>,
) -> Result<()> {
    let ctx = Context::load(opts)?;
    let corpus = Arc::new(ctx.corpus()?);
    let mut store = ctx.store();
    let settings = ctx.settings_with(&store, None, types);
    let history = store.user_or_default(&ctx.user);

    let weights = WeightTable::build(
        &corpus,
        &history.sessions,
        &history.verse_scores,
        &ctx.config.weights,
    );
    let sampler =
        AdaptiveSampler::with_rng(corpus, weights, settings.question_types()?, rng(seed))?;
    let mut session = PracticeSession::new(sampler)?;

    let mut console = Console::stdio();
    console.say("Practice mode. Type :s to skip, :q to stop.")?;

    loop {
        let step = match console.ask(session.current(), None)? {
            Input::Quit => break,
            Input::Skip => session.skip()?,
            Input::Answer(answer) => session.answer(&answer)?,
        };
        console.show_feedback(&step.feedback)?;
        store
            .commit_session(&ctx.user, step.record)
            .context("failed to save practice answer")?;
        console.say(format!(
            "Accuracy: {}/{} ({:.1}%)",
            session.correct(),
            session.attempts(),
            session.accuracy() * 100.0
        ))?;

        if limit.is_some_and(|n| session.attempts() as usize >= n) {
            break;
        }
        session.advance()?;
    }

    console.say(format!(
        "Practice finished: {} answered, {} correct.",
        session.attempts(),
        session.correct()
    ))?;
    Ok(())
}
