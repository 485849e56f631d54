//! The `versequiz retake` command.

use anyhow::Result;

use versequiz_core::session::{retake, retake_wrong_only};

use super::console::Console;
use super::exam::run_exam;
use super::{Context, GlobalOpts};

pub fn execute(opts: GlobalOpts, session_id: String, wrong_only: bool) -> Result<()> {
    let ctx = Context::load(opts)?;
    let mut store = ctx.store();

    let record = store
        .user(&ctx.user)
        .and_then(|u| u.find_session(&session_id))
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("no session {session_id} for user {}", ctx.user))?;

    let rebuilt = if wrong_only {
        retake_wrong_only(&record)?
    } else {
        retake(&record)?
    };
    if rebuilt.skipped > 0 {
        eprintln!(
            "Warning: {} question(s) in session {session_id} could not be rebuilt and were left out.",
            rebuilt.skipped
        );
    }

    run_exam(rebuilt.session, &mut store, &ctx.user, &mut Console::stdio())
}
