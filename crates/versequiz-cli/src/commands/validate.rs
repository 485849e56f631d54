//! The `versequiz validate` command.

use anyhow::Result;

use versequiz_core::parser::{load_corpus, validate_corpus};

use super::{Context, GlobalOpts};

pub fn execute(opts: GlobalOpts) -> Result<()> {
    let ctx = Context::load(opts)?;
    let path = &ctx.config.verses_file;
    let load = load_corpus(path)?;

    println!(
        "Corpus: {} ({} verses, {} unique references)",
        path.display(),
        load.corpus.len(),
        load.corpus.unique_capacity()
    );
    if !load.skipped_lines.is_empty() {
        let lines: Vec<String> = load.skipped_lines.iter().map(u64::to_string).collect();
        println!(
            "  Skipped {} unusable row(s) at line(s) {}.",
            load.skipped_rows(),
            lines.join(", ")
        );
    }

    let warnings = validate_corpus(&load.corpus);
    for w in &warnings {
        let prefix = w
            .key
            .as_ref()
            .map(|k| format!("  [{k}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }

    if warnings.is_empty() && load.skipped_lines.is_empty() {
        println!("Corpus valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len() + usize::from(load.skipped_rows() > 0));
    }
    Ok(())
}
