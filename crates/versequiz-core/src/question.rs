//! Question construction.
//!
//! Each question snapshots everything it needs (verse, distractor options,
//! masked text) so it stays valid after the corpus or session moves on.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{QuizError, QuizResult};
use crate::history::QuestionDump;
use crate::model::{Corpus, QuestionType, Verse};

/// Number of options in a multiple-choice question.
pub const OPTION_COUNT: usize = 4;
/// Placeholder shown in place of a masked word.
pub const BLANK: &str = "____";

const MAX_DISTRACTOR_DRAWS: usize = 200;

/// Type-specific payload of a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionBody {
    IdentifyRef,
    Cloze {
        masked_text: String,
        blanks: Vec<String>,
    },
    ContinueVerse,
    MultipleChoice {
        options: Vec<String>,
        correct_index: usize,
    },
    MultipleChoiceText {
        options: Vec<String>,
        correct_index: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub verse: Verse,
    pub prompt: String,
    pub body: QuestionBody,
}

impl Question {
    pub fn qtype(&self) -> QuestionType {
        match self.body {
            QuestionBody::IdentifyRef => QuestionType::IdentifyRef,
            QuestionBody::Cloze { .. } => QuestionType::Cloze,
            QuestionBody::ContinueVerse => QuestionType::ContinueVerse,
            QuestionBody::MultipleChoice { .. } => QuestionType::MultipleChoice,
            QuestionBody::MultipleChoiceText { .. } => QuestionType::MultipleChoiceText,
        }
    }

    pub fn key(&self) -> String {
        self.verse.key()
    }

    pub fn options(&self) -> Option<&[String]> {
        match &self.body {
            QuestionBody::MultipleChoice { options, .. }
            | QuestionBody::MultipleChoiceText { options, .. } => Some(options),
            _ => None,
        }
    }

    pub fn correct_index(&self) -> Option<usize> {
        match self.body {
            QuestionBody::MultipleChoice { correct_index, .. }
            | QuestionBody::MultipleChoiceText { correct_index, .. } => Some(correct_index),
            _ => None,
        }
    }

    /// The text shown to the learner alongside the prompt, if any.
    pub fn passage(&self) -> Option<&str> {
        match &self.body {
            QuestionBody::IdentifyRef | QuestionBody::MultipleChoice { .. } => {
                Some(&self.verse.text)
            }
            QuestionBody::Cloze { masked_text, .. } => Some(masked_text),
            QuestionBody::ContinueVerse | QuestionBody::MultipleChoiceText { .. } => None,
        }
    }

    /// Canonical answer for feedback.
    pub fn correct_answer(&self) -> String {
        match self.qtype() {
            QuestionType::IdentifyRef | QuestionType::MultipleChoice => self.verse.reference(),
            QuestionType::Cloze
            | QuestionType::ContinueVerse
            | QuestionType::MultipleChoiceText => self.verse.text.clone(),
        }
    }

    pub fn to_dump(&self) -> QuestionDump {
        let masked_text = match &self.body {
            QuestionBody::Cloze { masked_text, .. } => Some(masked_text.clone()),
            _ => None,
        };
        QuestionDump {
            qtype: self.qtype(),
            subj: self.qtype().is_subjective(),
            verse: self.verse.clone(),
            prompt: self.prompt.clone(),
            options: self.options().map(<[String]>::to_vec),
            correct_index: self.correct_index(),
            masked_text,
        }
    }

    /// Rebuild a question from its dump. `index` is the position in the
    /// dump list and is only used for error reporting.
    pub fn from_dump(index: usize, dump: &QuestionDump) -> QuizResult<Self> {
        let malformed = |reason: &str| QuizError::MalformedRecord {
            index,
            reason: reason.to_string(),
        };

        let v = &dump.verse;
        if v.book.trim().is_empty() || v.text.trim().is_empty() {
            return Err(malformed("verse has an empty book or text"));
        }
        if v.chapter == 0 || v.verse == 0 {
            return Err(malformed("verse reference must be positive"));
        }

        let choice = || -> QuizResult<(Vec<String>, usize)> {
            let options = dump
                .options
                .clone()
                .ok_or_else(|| malformed("missing options"))?;
            if options.len() != OPTION_COUNT {
                return Err(malformed(&format!(
                    "expected {OPTION_COUNT} options, found {}",
                    options.len()
                )));
            }
            let correct_index = dump
                .correct_index
                .ok_or_else(|| malformed("missing correct index"))?;
            if correct_index >= options.len() {
                return Err(malformed("correct index out of range"));
            }
            Ok((options, correct_index))
        };

        let body = match dump.qtype {
            QuestionType::IdentifyRef => QuestionBody::IdentifyRef,
            QuestionType::ContinueVerse => QuestionBody::ContinueVerse,
            QuestionType::Cloze => {
                let masked_text = dump
                    .masked_text
                    .clone()
                    .ok_or_else(|| malformed("missing masked text"))?;
                QuestionBody::Cloze {
                    blanks: recover_blanks(&v.text, &masked_text),
                    masked_text,
                }
            }
            QuestionType::MultipleChoice => {
                let (options, correct_index) = choice()?;
                QuestionBody::MultipleChoice {
                    options,
                    correct_index,
                }
            }
            QuestionType::MultipleChoiceText => {
                let (options, correct_index) = choice()?;
                QuestionBody::MultipleChoiceText {
                    options,
                    correct_index,
                }
            }
        };

        let prompt = if dump.prompt.trim().is_empty() {
            prompt_for(dump.qtype, v)
        } else {
            dump.prompt.clone()
        };

        Ok(Self {
            verse: v.clone(),
            prompt,
            body,
        })
    }
}

fn prompt_for(qtype: QuestionType, verse: &Verse) -> String {
    match qtype {
        QuestionType::IdentifyRef => "Enter the book, chapter and verse of this passage:".into(),
        QuestionType::Cloze => format!("{}: restore the missing words", verse.reference()),
        QuestionType::ContinueVerse => format!("{}: write out the whole verse", verse.reference()),
        QuestionType::MultipleChoice => "Choose the reference of this passage:".into(),
        QuestionType::MultipleChoiceText => {
            format!("Choose the correct text for {}:", verse.reference())
        }
    }
}

fn too_small(qtype: QuestionType, corpus: &Corpus) -> QuizError {
    QuizError::CorpusTooSmall {
        qtype,
        needed: OPTION_COUNT,
        available: corpus.option_capacity(qtype).unwrap_or(0),
    }
}

/// Fail unless `corpus` can supply a full option set for every enabled
/// multiple-choice type.
pub fn ensure_option_capacity(corpus: &Corpus, qtypes: &[QuestionType]) -> QuizResult<()> {
    for &qtype in qtypes {
        if let Some(available) = corpus.option_capacity(qtype) {
            if available < OPTION_COUNT {
                return Err(too_small(qtype, corpus));
            }
        }
    }
    Ok(())
}

/// Build a question of type `preferred` for `verse`, falling back to the
/// other enabled types when the corpus cannot supply its options.
pub fn build_with_fallback<R: Rng + ?Sized>(
    preferred: QuestionType,
    qtypes: &[QuestionType],
    verse: &Verse,
    corpus: &Corpus,
    rng: &mut R,
) -> QuizResult<Question> {
    let err = match build_question(preferred, verse, corpus, rng) {
        Err(err @ QuizError::CorpusTooSmall { .. }) => err,
        other => return other,
    };
    for &qtype in qtypes.iter().filter(|&&t| t != preferred) {
        match build_question(qtype, verse, corpus, rng) {
            Err(QuizError::CorpusTooSmall { .. }) => continue,
            other => {
                tracing::debug!(
                    verse = %verse.reference(),
                    %preferred,
                    %qtype,
                    "fell back to another question type"
                );
                return other;
            }
        }
    }
    Err(err)
}

/// Build one question of type `qtype` for `verse`, drawing distractors from `corpus`.
pub fn build_question<R: Rng + ?Sized>(
    qtype: QuestionType,
    verse: &Verse,
    corpus: &Corpus,
    rng: &mut R,
) -> QuizResult<Question> {
    let body = match qtype {
        QuestionType::IdentifyRef => QuestionBody::IdentifyRef,
        QuestionType::ContinueVerse => QuestionBody::ContinueVerse,
        QuestionType::Cloze => {
            let count = rng.gen_range(2..=3);
            let (masked_text, blanks) = mask_words(&verse.text, count, rng);
            QuestionBody::Cloze {
                masked_text,
                blanks,
            }
        }
        QuestionType::MultipleChoice => {
            let picks = pick_options(verse, corpus, false, rng)
                .ok_or_else(|| too_small(qtype, corpus))?;
            let (options, correct_index) = shuffle_options(verse, picks, Verse::reference, rng);
            QuestionBody::MultipleChoice {
                options,
                correct_index,
            }
        }
        QuestionType::MultipleChoiceText => {
            let picks = pick_options(verse, corpus, true, rng)
                .ok_or_else(|| too_small(qtype, corpus))?;
            let (options, correct_index) = shuffle_options(verse, picks, |v| v.text.clone(), rng);
            QuestionBody::MultipleChoiceText {
                options,
                correct_index,
            }
        }
    };

    Ok(Question {
        verse: verse.clone(),
        prompt: prompt_for(qtype, verse),
        body,
    })
}

/// Pick `OPTION_COUNT - 1` distractors: no reference (and, if
/// `unique_text`, no text) may repeat among the options. Random draws are
/// bounded; a shuffled scan of the corpus fills whatever is still missing.
fn pick_options<'a, R: Rng + ?Sized>(
    verse: &Verse,
    corpus: &'a Corpus,
    unique_text: bool,
    rng: &mut R,
) -> Option<Vec<&'a Verse>> {
    let capacity = if unique_text {
        corpus.distinct_text_capacity()
    } else {
        corpus.unique_capacity()
    };
    if capacity < OPTION_COUNT {
        return None;
    }

    let mut picked: Vec<&Verse> = Vec::with_capacity(OPTION_COUNT - 1);
    let admissible = |candidate: &Verse, picked: &[&Verse]| {
        let clash = |o: &Verse| o.same_ref(candidate) || (unique_text && o.text == candidate.text);
        !clash(verse) && !picked.iter().any(|o| clash(*o))
    };

    for _ in 0..MAX_DISTRACTOR_DRAWS {
        if picked.len() == OPTION_COUNT - 1 {
            return Some(picked);
        }
        let candidate = &corpus.verses()[rng.gen_range(0..corpus.len())];
        if admissible(candidate, picked.as_slice()) {
            picked.push(candidate);
        }
    }

    let mut order: Vec<usize> = (0..corpus.len()).collect();
    order.shuffle(rng);
    for i in order {
        if picked.len() == OPTION_COUNT - 1 {
            break;
        }
        let candidate = &corpus.verses()[i];
        if admissible(candidate, picked.as_slice()) {
            picked.push(candidate);
        }
    }

    (picked.len() == OPTION_COUNT - 1).then_some(picked)
}

fn shuffle_options<R: Rng + ?Sized>(
    verse: &Verse,
    distractors: Vec<&Verse>,
    label: impl Fn(&Verse) -> String,
    rng: &mut R,
) -> (Vec<String>, usize) {
    let mut entries: Vec<(String, bool)> = Vec::with_capacity(OPTION_COUNT);
    entries.push((label(verse), true));
    entries.extend(distractors.into_iter().map(|d| (label(d), false)));
    entries.shuffle(rng);
    let correct_index = entries.iter().position(|(_, correct)| *correct).unwrap_or(0);
    (entries.into_iter().map(|(o, _)| o).collect(), correct_index)
}

/// Split text into alternating word and whitespace runs, preserving every byte.
pub fn split_keep_whitespace(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut prev_ws: Option<bool> = None;
    for (i, c) in text.char_indices() {
        let ws = c.is_whitespace();
        if matches!(prev_ws, Some(p) if p != ws) {
            tokens.push(&text[start..i]);
            start = i;
        }
        prev_ws = Some(ws);
    }
    if start < text.len() {
        tokens.push(&text[start..]);
    }
    tokens
}

fn is_word(token: &str) -> bool {
    token.chars().next().is_some_and(|c| !c.is_whitespace())
}

/// Replace up to `count` random words longer than two characters with
/// [`BLANK`]. Returns the masked text and the removed words in text order.
pub fn mask_words<R: Rng + ?Sized>(text: &str, count: usize, rng: &mut R) -> (String, Vec<String>) {
    let mut tokens: Vec<&str> = split_keep_whitespace(text);
    let mut candidates: Vec<usize> = tokens
        .iter()
        .enumerate()
        .filter(|(_, t)| is_word(t) && t.trim().chars().count() > 2)
        .map(|(i, _)| i)
        .collect();
    candidates.shuffle(rng);
    candidates.truncate(count);
    candidates.sort_unstable();

    let mut blanks = Vec::with_capacity(candidates.len());
    for &i in &candidates {
        blanks.push(tokens[i].to_string());
        tokens[i] = BLANK;
    }
    (tokens.concat(), blanks)
}

/// Words of `text` that `masked` hides, position by position.
fn recover_blanks(text: &str, masked: &str) -> Vec<String> {
    let original = split_keep_whitespace(text);
    let hidden = split_keep_whitespace(masked);
    if original.len() != hidden.len() {
        return Vec::new();
    }
    original
        .iter()
        .zip(&hidden)
        .filter(|(_, h)| **h == BLANK)
        .map(|(o, _)| o.to_string())
        .collect()
}
