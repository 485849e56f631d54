//! The `versequiz forget` command.

use anyhow::Result;

use super::{Context, GlobalOpts};

pub fn execute(
    opts: GlobalOpts,
    verse: Option<String>,
    session: Option<String>,
    all_scores: bool,
) -> Result<()> {
    if verse.is_none() && session.is_none() && !all_scores {
        anyhow::bail!("nothing to forget; pass --verse, --session, or --all-scores");
    }
    let ctx = Context::load(opts)?;
    let mut store = ctx.store();

    if let Some(key) = verse {
        if store.forget_verse(&ctx.user, &key)? {
            println!("Removed {key} from the missed-verse list.");
        } else {
            println!("{key} has no recorded score.");
        }
    }
    if let Some(id) = session {
        match store.delete_session(&ctx.user, &id)? {
            0 => println!("No session {id}."),
            n => println!("Deleted {n} session(s) with id {id}."),
        }
    }
    if all_scores {
        store.clear_scores(&ctx.user)?;
        println!("Cleared all verse scores for {}.", ctx.user);
    }
    Ok(())
}
