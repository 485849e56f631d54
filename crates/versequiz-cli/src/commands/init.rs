//! The `versequiz init` command.

use std::path::Path;

use anyhow::{Context, Result};

fn write_if_missing(path: &str, content: &str) -> Result<()> {
    if Path::new(path).exists() {
        println!("{path} already exists, skipping.");
    } else {
        std::fs::write(path, content).with_context(|| format!("failed to write {path}"))?;
        println!("Created {path}");
    }
    Ok(())
}

pub fn execute() -> Result<()> {
    write_if_missing("versequiz.toml", SAMPLE_CONFIG)?;
    write_if_missing("verses.csv", SAMPLE_VERSES)?;

    println!("\nNext steps:");
    println!("  1. Replace verses.csv with the verses you want to memorize");
    println!("  2. Run: versequiz validate");
    println!("  3. Run: versequiz exam   (or: versequiz practice)");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# versequiz configuration

# Verse corpus (Book,Chapter,Verse,Text). VERSEQUIZ_VERSES_FILE overrides it.
verses_file = "verses.csv"
# History store. VERSEQUIZ_DATA_FILE overrides it.
data_file = "quiz_stats.json"
username = "default"

[default_settings]
num_questions = 30
enabled_qtypes = ["identify_ref", "cloze", "multiple_choice", "continue_verse", "multiple_choice_text"]

# Practice weighting: base + wrong*w + skip*s - correct*c + verse_score*m
[weights]
base = 1
wrong = 1
skip = 1
correct = 1
score_multiplier = 4
"#;

const SAMPLE_VERSES: &str = "Book,Chapter,Verse,Text
Genesis,1,1,In the beginning God created the heaven and the earth.
Psalms,23,1,The LORD is my shepherd; I shall not want.
Proverbs,3,5,Trust in the LORD with all thine heart; and lean not unto thine own understanding.
Isaiah,40,31,But they that wait upon the LORD shall renew their strength.
Matthew,5,3,Blessed are the poor in spirit: for theirs is the kingdom of heaven.
John,3,16,For God so loved the world that he gave his only begotten Son.
Romans,8,28,And we know that all things work together for good to them that love God.
Philippians,4,13,I can do all things through Christ which strengtheneth me.
";
