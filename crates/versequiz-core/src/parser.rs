//! CSV corpus loader.
//!
//! Loads verses from `Book,Chapter,Verse,Text` files and validates the result.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};

use crate::model::{Corpus, Verse};

/// A loaded corpus plus the rows that could not be used.
#[derive(Debug, Clone)]
pub struct CorpusLoad {
    pub corpus: Corpus,
    /// 1-based file lines of skipped rows, header included in the count.
    pub skipped_lines: Vec<u64>,
}

impl CorpusLoad {
    pub fn skipped_rows(&self) -> usize {
        self.skipped_lines.len()
    }
}

/// Column positions resolved from the header row.
#[derive(Debug, Clone, Copy)]
struct Columns {
    book: usize,
    chapter: usize,
    verse: usize,
    text: usize,
}

impl Columns {
    fn resolve(headers: &csv::StringRecord) -> Result<Self> {
        let find = |name: &str| -> Result<usize> {
            headers
                .iter()
                .position(|h| h.trim_start_matches('\u{feff}').trim().eq_ignore_ascii_case(name))
                .with_context(|| format!("missing column '{name}' in corpus header"))
        };
        Ok(Self {
            book: find("book")?,
            chapter: find("chapter")?,
            verse: find("verse")?,
            text: find("text")?,
        })
    }
}

/// Parse a single CSV file into a corpus.
pub fn load_corpus(path: &Path) -> Result<CorpusLoad> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read corpus file: {}", path.display()))?;

    parse_corpus_str(&content)
        .with_context(|| format!("failed to parse corpus: {}", path.display()))
}

/// Parse CSV text into a corpus (useful for testing).
pub fn parse_corpus_str(content: &str) -> Result<CorpusLoad> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(content.as_bytes());

    let columns = Columns::resolve(reader.headers().context("failed to read CSV header")?)?;

    let mut verses = Vec::new();
    let mut skipped_lines = Vec::new();
    for record in reader.records() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                let at = e
                    .position()
                    .map(|p| format!(" at line {}", p.line()))
                    .unwrap_or_default();
                return Err(e).context(format!("malformed CSV record{at}"));
            }
        };
        let line = record.position().map_or(0, csv::Position::line);
        match parse_row(&record, columns) {
            Some(v) => verses.push(v),
            None => {
                tracing::warn!("skipping unusable corpus row at line {line}");
                skipped_lines.push(line);
            }
        }
    }

    tracing::debug!(
        "loaded {} verses ({} rows skipped)",
        verses.len(),
        skipped_lines.len()
    );

    Ok(CorpusLoad {
        corpus: Corpus::new(verses),
        skipped_lines,
    })
}

fn parse_row(record: &csv::StringRecord, columns: Columns) -> Option<Verse> {
    let book = record.get(columns.book)?.trim();
    let text = record.get(columns.text)?.trim();
    let chapter: u32 = record.get(columns.chapter)?.trim().parse().ok()?;
    let verse: u32 = record.get(columns.verse)?.trim().parse().ok()?;
    if book.is_empty() || text.is_empty() || chapter == 0 || verse == 0 {
        return None;
    }
    Some(Verse::new(book, chapter, verse, text))
}

/// A validation warning for a corpus.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The verse key (if applicable).
    pub key: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Validate a corpus for issues that degrade quizzes without breaking loading.
pub fn validate_corpus(corpus: &Corpus) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if corpus.is_empty() {
        warnings.push(ValidationWarning {
            key: None,
            message: "corpus is empty".into(),
        });
        return warnings;
    }

    let mut seen_keys = HashSet::new();
    for v in corpus.verses() {
        let key = v.key();
        if !seen_keys.insert(key.clone()) {
            warnings.push(ValidationWarning {
                message: format!("duplicate reference: {key}"),
                key: Some(key),
            });
        }
    }

    let mut seen_texts = HashSet::new();
    for v in corpus.verses() {
        if !seen_texts.insert(v.text.as_str()) {
            warnings.push(ValidationWarning {
                key: Some(v.key()),
                message: "text duplicates another verse".into(),
            });
        }
    }

    if corpus.unique_capacity() < 4 {
        warnings.push(ValidationWarning {
            key: None,
            message: format!(
                "only {} unique references; multiple-choice questions need 4",
                corpus.unique_capacity()
            ),
        });
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_CSV: &str = "\u{feff}Book,Chapter,Verse,Text
Matthew,5,3,\"Blessed are the poor in spirit, for theirs is the kingdom of heaven.\"
Matthew,5,4,Blessed are those who mourn for they will be comforted.
John,3,16,For God so loved the world
Romans,8,28,And we know that in all things God works for the good
";

    #[test]
    fn parse_valid_csv() {
        let load = parse_corpus_str(VALID_CSV).unwrap();
        assert_eq!(load.corpus.len(), 4);
        assert_eq!(load.skipped_rows(), 0);
        let first = load.corpus.get(0).unwrap();
        assert_eq!(first.key(), "Matthew|5|3");
        assert!(first.text.contains("kingdom of heaven"));
    }

    #[test]
    fn headers_are_case_insensitive_and_reorderable() {
        let csv = "text,VERSE,chapter,BOOK\nIn the beginning,1,1,Genesis\n";
        let load = parse_corpus_str(csv).unwrap();
        assert_eq!(load.corpus.get(0).unwrap().key(), "Genesis|1|1");
    }

    #[test]
    fn bad_rows_are_skipped_and_counted() {
        let csv = "Book,Chapter,Verse,Text
Genesis,1,1,In the beginning
Genesis,one,2,bad chapter
,1,3,no book
Genesis,1,4,
Genesis,0,5,zero chapter
Genesis,1,6,  And God said
";
        let load = parse_corpus_str(csv).unwrap();
        assert_eq!(load.corpus.len(), 2);
        assert_eq!(load.skipped_rows(), 4);
        assert_eq!(load.skipped_lines, vec![3, 4, 5, 6]);
        assert_eq!(load.corpus.get(1).unwrap().text, "And God said");
    }

    #[test]
    fn skipped_lines_follow_multiline_fields() {
        let csv = "Book,Chapter,Verse,Text
Genesis,1,1,\"In the beginning
God created\"
Genesis,x,2,bad chapter
Genesis,1,3,And God said
";
        let load = parse_corpus_str(csv).unwrap();
        assert_eq!(load.corpus.len(), 2);
        assert_eq!(load.skipped_lines, vec![4]);
    }

    #[test]
    fn missing_column_is_an_error() {
        let err = parse_corpus_str("Book,Chapter,Text\nGenesis,1,x\n").unwrap_err();
        assert!(format!("{err:#}").contains("verse"));
    }

    #[test]
    fn validate_flags_duplicates_and_small_corpus() {
        let csv = "Book,Chapter,Verse,Text
John,1,1,In the beginning was the Word
John,1,1,In the beginning was the Word
";
        let load = parse_corpus_str(csv).unwrap();
        let warnings = validate_corpus(&load.corpus);
        assert!(warnings.iter().any(|w| w.message.contains("duplicate reference")));
        assert!(warnings.iter().any(|w| w.message.contains("duplicates another")));
        assert!(warnings.iter().any(|w| w.message.contains("need 4")));
    }

    #[test]
    fn validate_clean_corpus() {
        let load = parse_corpus_str(VALID_CSV).unwrap();
        assert!(validate_corpus(&load.corpus).is_empty());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("verses.csv");
        std::fs::write(&path, VALID_CSV).unwrap();
        let load = load_corpus(&path).unwrap();
        assert_eq!(load.corpus.unique_capacity(), 4);
        assert!(load_corpus(&dir.path().join("missing.csv")).is_err());
    }
}
