//! Answer grading.
//!
//! Objective questions compare option indices. Reference questions compare a
//! normalized book label and exact chapter/verse numbers. Free-text questions
//! use a character LCS ratio that ignores whitespace, punctuation, and case.

use unicode_normalization::UnicodeNormalization;

use crate::question::{Question, QuestionBody};

/// Minimum similarity for a cloze answer to count as correct.
pub const CLOZE_THRESHOLD: f64 = 0.70;
/// Minimum similarity for a full-verse answer to count as correct.
pub const CONTINUE_THRESHOLD: f64 = 0.85;

/// A learner's submitted answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Reference {
        book: String,
        chapter: Option<u32>,
        verse: Option<u32>,
    },
    Text(String),
    Choice(usize),
}

impl Answer {
    /// How the answer is shown back in feedback.
    pub fn display(&self, question: &Question) -> String {
        let num = |n: &Option<u32>| n.map_or_else(|| "-".to_string(), |n| n.to_string());
        match self {
            Answer::Reference {
                book,
                chapter,
                verse,
            } => {
                let book = if book.trim().is_empty() { "-" } else { book.trim() };
                format!("{book} {}:{}", num(chapter), num(verse))
            }
            Answer::Text(t) => t.clone(),
            Answer::Choice(i) => question
                .options()
                .and_then(|o| o.get(*i))
                .cloned()
                .unwrap_or_else(|| format!("option {}", i + 1)),
        }
    }
}

/// Grade `answer` against `question`. An answer of the wrong shape is incorrect.
pub fn grade(question: &Question, answer: &Answer) -> bool {
    match (&question.body, answer) {
        (
            QuestionBody::IdentifyRef,
            Answer::Reference {
                book,
                chapter,
                verse,
            },
        ) => {
            normalize_label(book) == normalize_label(&question.verse.book)
                && *chapter == Some(question.verse.chapter)
                && *verse == Some(question.verse.verse)
        }
        (QuestionBody::Cloze { .. }, Answer::Text(t)) => {
            similarity(&question.verse.text, t) >= CLOZE_THRESHOLD
        }
        (QuestionBody::ContinueVerse, Answer::Text(t)) => {
            similarity(&question.verse.text, t) >= CONTINUE_THRESHOLD
        }
        (
            QuestionBody::MultipleChoice { correct_index, .. }
            | QuestionBody::MultipleChoiceText { correct_index, .. },
            Answer::Choice(i),
        ) => i == correct_index,
        _ => false,
    }
}

/// NFKC, trim, lowercase, and collapse inner whitespace runs to one space.
pub fn normalize_label(s: &str) -> String {
    let folded: String = s.nfkc().collect::<String>().to_lowercase();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_stripped_punct(c: char) -> bool {
    matches!(c, '\u{2000}'..='\u{206F}' | '\u{2E00}'..='\u{2E7F}')
        || c.is_ascii_punctuation()
}

/// Characters that take part in similarity: NFKC, lowercased, with
/// whitespace and punctuation removed.
pub fn normalize_for_compare(s: &str) -> Vec<char> {
    s.nfkc()
        .collect::<String>()
        .to_lowercase()
        .chars()
        .filter(|&c| !c.is_whitespace() && !is_stripped_punct(c))
        .collect()
}

/// Length of the longest common subsequence, using two rows sized to the
/// shorter input.
pub fn lcs_len(a: &[char], b: &[char]) -> usize {
    let (long, short) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    if short.is_empty() {
        return 0;
    }
    let mut prev = vec![0usize; short.len() + 1];
    let mut curr = vec![0usize; short.len() + 1];
    for &x in long {
        for (j, &y) in short.iter().enumerate() {
            curr[j + 1] = if x == y {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[short.len()]
}

/// `LCS(A, B) / max(|A|, |B|)` over normalized characters; 0 when both are empty.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = normalize_for_compare(a);
    let b = normalize_for_compare(b);
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 0.0;
    }
    lcs_len(&a, &b) as f64 / longest as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Verse;
    use crate::question::Question;

    fn question(body: QuestionBody) -> Question {
        Question {
            verse: Verse::new("Matthew", 5, 3, "Blessed are the poor in spirit"),
            prompt: String::new(),
            body,
        }
    }

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn similarity_ignores_spacing() {
        assert_eq!(similarity("그리스도 예수", "그리스도예수"), 1.0);
        assert_eq!(similarity("", "abc"), 0.0);
        assert_eq!(similarity("", ""), 0.0);
        assert_eq!(similarity("  ...  ", "!!"), 0.0);
    }

    #[test]
    fn similarity_ignores_case_and_punctuation() {
        assert_eq!(
            similarity("Jesus wept.", "jesus, WEPT"),
            1.0
        );
        assert_eq!(similarity("“Peace” — be still", "peace be still"), 1.0);
    }

    #[test]
    fn similarity_ratio_uses_longer_length() {
        assert!((similarity("abcd", "ab") - 0.5).abs() < 1e-12);
        assert!((similarity("ab", "abcd") - 0.5).abs() < 1e-12);
    }

    #[test]
    fn lcs_basic_cases() {
        assert_eq!(lcs_len(&chars("ABCBDAB"), &chars("BDCABA")), 4);
        assert_eq!(lcs_len(&chars("abc"), &chars("")), 0);
        assert_eq!(lcs_len(&chars("abc"), &chars("abc")), 3);
        assert_eq!(lcs_len(&chars("xyz"), &chars("abc")), 0);
    }

    #[test]
    fn lcs_is_symmetric() {
        let a = chars("in the beginning was the word");
        let b = chars("beginning the word was");
        assert_eq!(lcs_len(&a, &b), lcs_len(&b, &a));
    }

    #[test]
    fn identify_ref_normalizes_book() {
        let q = question(QuestionBody::IdentifyRef);
        let ok = Answer::Reference {
            book: "  Matthew  ".into(),
            chapter: Some(5),
            verse: Some(3),
        };
        assert!(grade(&q, &ok));
        let caps = Answer::Reference {
            book: "MATTHEW".into(),
            chapter: Some(5),
            verse: Some(3),
        };
        assert!(grade(&q, &caps));
        let wrong_verse = Answer::Reference {
            book: "Matthew".into(),
            chapter: Some(5),
            verse: Some(4),
        };
        assert!(!grade(&q, &wrong_verse));
        let missing = Answer::Reference {
            book: "Matthew".into(),
            chapter: None,
            verse: Some(3),
        };
        assert!(!grade(&q, &missing));
    }

    #[test]
    fn label_collapses_inner_whitespace() {
        assert_eq!(normalize_label("  1   Corinthians "), "1 corinthians");
    }

    #[test]
    fn thresholds_per_type() {
        // 25 normalized characters; dropping "spirit" keeps 19 of them.
        let partial = Answer::Text("Blessed are the poor in".into());
        let cloze = question(QuestionBody::Cloze {
            masked_text: String::new(),
            blanks: vec![],
        });
        let cont = question(QuestionBody::ContinueVerse);
        assert!(grade(&cloze, &partial));
        assert!(!grade(&cont, &partial));
        let full = Answer::Text("blessedarethepoorinspirit".into());
        assert!(grade(&cont, &full));
    }

    #[test]
    fn choice_and_shape_mismatch() {
        let q = question(QuestionBody::MultipleChoice {
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_index: 2,
        });
        assert!(grade(&q, &Answer::Choice(2)));
        assert!(!grade(&q, &Answer::Choice(1)));
        assert!(!grade(&q, &Answer::Text("Matthew 5,3".into())));
        assert_eq!(Answer::Choice(2).display(&q), "c");
    }
}
