//! The `versequiz reset` command.

use anyhow::Result;

use super::{Context, GlobalOpts};

pub fn execute(opts: GlobalOpts, yes: bool) -> Result<()> {
    let ctx = Context::load(opts)?;
    if !yes {
        anyhow::bail!(
            "reset deletes every session, score, and setting for {}; pass --yes to confirm",
            ctx.user
        );
    }
    ctx.store().reset_user(&ctx.user)?;
    println!("Reset all data for {}.", ctx.user);
    Ok(())
}
