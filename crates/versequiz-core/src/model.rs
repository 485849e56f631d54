//! Core data model types for versequiz.
//!
//! Verses, the corpus they live in, question type tags, and quiz settings.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{QuizError, QuizResult};

/// A single addressable unit of text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Verse {
    pub book: String,
    pub chapter: u32,
    pub verse: u32,
    pub text: String,
}

impl Verse {
    pub fn new(book: impl Into<String>, chapter: u32, verse: u32, text: impl Into<String>) -> Self {
        Self {
            book: book.into(),
            chapter,
            verse,
            text: text.into(),
        }
    }

    /// Canonical `book|chapter|verse` key used for weighting, retry matching,
    /// and recency tracking.
    pub fn key(&self) -> String {
        verse_key(&self.book, self.chapter, self.verse)
    }

    /// Human-readable reference, e.g. `Matthew 5,3`.
    pub fn reference(&self) -> String {
        format!("{} {},{}", self.book, self.chapter, self.verse)
    }

    /// Whether two verses point at the same (book, chapter, verse).
    pub fn same_ref(&self, other: &Verse) -> bool {
        self.book == other.book && self.chapter == other.chapter && self.verse == other.verse
    }
}

/// Build the canonical key from its parts.
pub fn verse_key(book: &str, chapter: u32, verse: u32) -> String {
    format!("{book}|{chapter}|{verse}")
}

/// Read-only ordered list of verses.
///
/// Duplicated references are allowed in the input; lookups by key resolve to
/// the first occurrence.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    verses: Vec<Verse>,
    by_key: HashMap<String, usize>,
    text_capacity: usize,
}

impl Corpus {
    pub fn new(verses: Vec<Verse>) -> Self {
        let mut by_key = HashMap::with_capacity(verses.len());
        for (i, v) in verses.iter().enumerate() {
            by_key.entry(v.key()).or_insert(i);
        }
        let mut texts = HashSet::new();
        let text_capacity = by_key
            .values()
            .filter(|&&i| texts.insert(verses[i].text.as_str()))
            .count();
        Self {
            verses,
            by_key,
            text_capacity,
        }
    }

    pub fn verses(&self) -> &[Verse] {
        &self.verses
    }

    pub fn len(&self) -> usize {
        self.verses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verses.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Verse> {
        self.verses.get(index)
    }

    pub fn find(&self, key: &str) -> Option<&Verse> {
        self.by_key.get(key).map(|&i| &self.verses[i])
    }

    /// Number of distinct reference keys, the upper bound on an exam size.
    pub fn unique_capacity(&self) -> usize {
        self.by_key.len()
    }

    /// Number of distinct references that also carry distinct texts.
    pub fn distinct_text_capacity(&self) -> usize {
        self.text_capacity
    }

    /// How many verses can share one multiple-choice question of `qtype`.
    /// `None` for free-form types, which need no distractors.
    pub fn option_capacity(&self, qtype: QuestionType) -> Option<usize> {
        match qtype {
            QuestionType::MultipleChoice => Some(self.unique_capacity()),
            QuestionType::MultipleChoiceText => Some(self.distinct_text_capacity()),
            _ => None,
        }
    }

    pub(crate) fn ensure_not_empty(&self) -> QuizResult<()> {
        if self.is_empty() {
            return Err(QuizError::EmptyCorpus);
        }
        Ok(())
    }
}

/// The five question recipes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    IdentifyRef,
    Cloze,
    MultipleChoice,
    ContinueVerse,
    MultipleChoiceText,
}

impl QuestionType {
    pub const ALL: [QuestionType; 5] = [
        QuestionType::IdentifyRef,
        QuestionType::Cloze,
        QuestionType::MultipleChoice,
        QuestionType::ContinueVerse,
        QuestionType::MultipleChoiceText,
    ];

    /// Subjective types are graded on free-form input; objective ones on an option index.
    pub fn is_subjective(self) -> bool {
        !matches!(
            self,
            QuestionType::MultipleChoice | QuestionType::MultipleChoiceText
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QuestionType::IdentifyRef => "identify_ref",
            QuestionType::Cloze => "cloze",
            QuestionType::MultipleChoice => "multiple_choice",
            QuestionType::ContinueVerse => "continue_verse",
            QuestionType::MultipleChoiceText => "multiple_choice_text",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "identify_ref" | "identify" => Ok(QuestionType::IdentifyRef),
            "cloze" => Ok(QuestionType::Cloze),
            "multiple_choice" | "mc" => Ok(QuestionType::MultipleChoice),
            "continue_verse" | "continue" => Ok(QuestionType::ContinueVerse),
            "multiple_choice_text" | "mc_text" => Ok(QuestionType::MultipleChoiceText),
            other => Err(format!("unknown question type: {other}")),
        }
    }
}

pub const MIN_QUESTIONS: u32 = 5;
pub const MAX_QUESTIONS: u32 = 100;

/// Per-user quiz settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(rename = "numQuestions", default = "default_num_questions")]
    pub num_questions: u32,
    #[serde(rename = "enabledQTypes", default = "default_qtypes")]
    pub enabled_qtypes: Vec<QuestionType>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            num_questions: default_num_questions(),
            enabled_qtypes: default_qtypes(),
        }
    }
}

fn default_num_questions() -> u32 {
    30
}

fn default_qtypes() -> Vec<QuestionType> {
    QuestionType::ALL.to_vec()
}

impl Settings {
    /// Requested exam size clamped into the supported range.
    pub fn clamped_num_questions(&self) -> usize {
        self.num_questions.clamp(MIN_QUESTIONS, MAX_QUESTIONS) as usize
    }

    /// Enabled types with duplicates removed, in first-seen order.
    pub fn question_types(&self) -> QuizResult<Vec<QuestionType>> {
        let mut types = Vec::with_capacity(self.enabled_qtypes.len());
        for t in &self.enabled_qtypes {
            if !types.contains(t) {
                types.push(*t);
            }
        }
        if types.is_empty() {
            return Err(QuizError::NoQuestionTypes);
        }
        Ok(types)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_and_reference_format() {
        let v = Verse::new("Matthew", 5, 3, "Blessed are the poor in spirit");
        assert_eq!(v.key(), "Matthew|5|3");
        assert_eq!(v.reference(), "Matthew 5,3");
    }

    #[test]
    fn question_type_display_and_parse() {
        for t in QuestionType::ALL {
            assert_eq!(t.to_string().parse::<QuestionType>().unwrap(), t);
        }
        assert_eq!("MC".parse::<QuestionType>().unwrap(), QuestionType::MultipleChoice);
        assert!("essay".parse::<QuestionType>().is_err());
        assert!(QuestionType::Cloze.is_subjective());
        assert!(!QuestionType::MultipleChoiceText.is_subjective());
    }

    #[test]
    fn corpus_lookup_uses_first_occurrence() {
        let corpus = Corpus::new(vec![
            Verse::new("John", 3, 16, "first"),
            Verse::new("John", 3, 16, "second"),
            Verse::new("John", 3, 17, "third"),
        ]);
        assert_eq!(corpus.len(), 3);
        assert_eq!(corpus.unique_capacity(), 2);
        assert_eq!(corpus.find("John|3|16").unwrap().text, "first");
        assert!(corpus.find("John|3|18").is_none());
    }

    #[test]
    fn text_capacity_counts_distinct_texts() {
        let corpus = Corpus::new(vec![
            Verse::new("Jude", 1, 1, "same"),
            Verse::new("Jude", 1, 2, "same"),
            Verse::new("Jude", 1, 3, "other"),
            Verse::new("Jude", 1, 4, "third"),
            Verse::new("Jude", 1, 4, "shadowed"),
        ]);
        assert_eq!(corpus.unique_capacity(), 4);
        assert_eq!(corpus.distinct_text_capacity(), 3);
        assert_eq!(corpus.option_capacity(QuestionType::MultipleChoice), Some(4));
        assert_eq!(corpus.option_capacity(QuestionType::MultipleChoiceText), Some(3));
        assert_eq!(corpus.option_capacity(QuestionType::Cloze), None);
    }

    #[test]
    fn settings_clamp_and_types() {
        let st = Settings {
            num_questions: 500,
            enabled_qtypes: vec![QuestionType::Cloze, QuestionType::Cloze],
        };
        assert_eq!(st.clamped_num_questions(), 100);
        assert_eq!(st.question_types().unwrap(), vec![QuestionType::Cloze]);

        let none = Settings {
            num_questions: 1,
            enabled_qtypes: vec![],
        };
        assert_eq!(none.clamped_num_questions(), 5);
        assert!(matches!(
            none.question_types(),
            Err(QuizError::NoQuestionTypes)
        ));
    }

    #[test]
    fn settings_serde_uses_camel_case() {
        let json = r#"{"numQuestions": 12, "enabledQTypes": ["cloze", "identify_ref"]}"#;
        let st: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(st.num_questions, 12);
        assert_eq!(
            st.enabled_qtypes,
            vec![QuestionType::Cloze, QuestionType::IdentifyRef]
        );
        let defaults: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(defaults, Settings::default());
    }
}
