//! Exam and practice sessions.
//!
//! An [`ExamSession`] is a fixed list of questions answered in order and
//! summarized once at the end. A [`PracticeSession`] wraps an
//! [`AdaptiveSampler`] and produces a one-question record per answer.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::Rng;

use crate::error::{QuizError, QuizResult};
use crate::grader::{grade, Answer};
use crate::history::{DetailRecord, Outcome, QuestionDump, SessionKind, SessionRecord};
use crate::ledger::{VerseScores, WORST_LIMIT};
use crate::model::{Corpus, QuestionType, Settings, Verse};
use crate::question::{build_with_fallback, ensure_option_capacity, Question};
use crate::sampler::{pick_unique_uniform, AdaptiveSampler};

/// Result of answering or skipping one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub outcome: Outcome,
    /// What the learner gave, formatted for display. Empty for a skip.
    pub given: String,
    pub expected: String,
}

impl Feedback {
    fn new(question: &Question, answer: Option<&Answer>) -> Self {
        let outcome = match answer {
            Some(a) => Outcome::from_grade(grade(question, a)),
            None => Outcome::Skipped,
        };
        Self {
            outcome,
            given: answer.map(|a| a.display(question)).unwrap_or_default(),
            expected: question.correct_answer(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExamSession {
    questions: Vec<Question>,
    responses: Vec<Option<Feedback>>,
    cursor: usize,
    origin_session_id: Option<String>,
}

impl ExamSession {
    pub fn new(questions: Vec<Question>) -> QuizResult<Self> {
        if questions.is_empty() {
            return Err(QuizError::NothingToQuiz("exam has no questions".into()));
        }
        Ok(Self {
            responses: vec![None; questions.len()],
            questions,
            cursor: 0,
            origin_session_id: None,
        })
    }

    /// Mark this exam as a retake whose summary replaces `origin`.
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin_session_id = Some(origin.into());
        self
    }

    pub fn origin_session_id(&self) -> Option<&str> {
        self.origin_session_id.as_deref()
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Zero-based index of the current question.
    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn current(&self) -> &Question {
        &self.questions[self.cursor]
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn response(&self, index: usize) -> Option<&Feedback> {
        self.responses.get(index).and_then(Option::as_ref)
    }

    /// Grade `answer` against the current question and move to the next one.
    pub fn answer(&mut self, answer: &Answer) -> QuizResult<Feedback> {
        self.respond(Some(answer))
    }

    pub fn skip(&mut self) -> QuizResult<Feedback> {
        self.respond(None)
    }

    fn respond(&mut self, answer: Option<&Answer>) -> QuizResult<Feedback> {
        if self.responses[self.cursor].is_some() {
            return Err(QuizError::InvalidState(format!(
                "question {} is already answered",
                self.cursor + 1
            )));
        }
        let feedback = Feedback::new(&self.questions[self.cursor], answer);
        self.responses[self.cursor] = Some(feedback.clone());
        self.next();
        Ok(feedback)
    }

    /// Move back one question. Returns `false` at the first question.
    pub fn prev(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        true
    }

    /// Move forward one question. Returns `false` at the last question.
    pub fn next(&mut self) -> bool {
        if self.cursor + 1 >= self.questions.len() {
            return false;
        }
        self.cursor += 1;
        true
    }

    pub fn answered(&self) -> usize {
        self.responses.iter().filter(|r| r.is_some()).count()
    }

    pub fn is_complete(&self) -> bool {
        self.responses.iter().all(Option::is_some)
    }

    /// Exam record with one detail per question and a full question dump.
    /// Unanswered questions count as wrong.
    pub fn summary(&self) -> SessionRecord {
        let details = self
            .questions
            .iter()
            .zip(&self.responses)
            .map(|(q, r)| {
                let outcome = r.as_ref().map_or(Outcome::Wrong, |f| f.outcome);
                DetailRecord::new(q.qtype(), &q.verse, outcome)
            })
            .collect();

        let mut record = SessionRecord::from_details(SessionKind::Exam, details);
        record.questions_dump = Some(self.questions.iter().map(Question::to_dump).collect());
        if let Some(origin) = &self.origin_session_id {
            record.id = origin.clone();
            record.origin_session_id = Some(origin.clone());
        }
        record
    }
}

fn build_set<'a, R: Rng + ?Sized>(
    verses: impl IntoIterator<Item = &'a Verse>,
    qtypes: &[QuestionType],
    corpus: &Corpus,
    rng: &mut R,
) -> QuizResult<Vec<Question>> {
    verses
        .into_iter()
        .map(|v| {
            let qtype = qtypes[rng.gen_range(0..qtypes.len())];
            build_with_fallback(qtype, qtypes, v, corpus, rng)
        })
        .collect()
}

/// A fresh exam: `numQuestions` clamped to 5..=100 and to the corpus's
/// unique reference count, drawn uniformly without repeats.
pub fn start_exam<R: Rng + ?Sized>(
    corpus: &Corpus,
    settings: &Settings,
    rng: &mut R,
) -> QuizResult<ExamSession> {
    corpus.ensure_not_empty()?;
    let qtypes = settings.question_types()?;
    ensure_option_capacity(corpus, &qtypes)?;
    let count = settings
        .clamped_num_questions()
        .min(corpus.unique_capacity());

    let picked = pick_unique_uniform(corpus, count, rng);
    let questions = build_set(
        picked.iter().map(|&i| &corpus.verses()[i]),
        &qtypes,
        corpus,
        rng,
    )?;
    tracing::info!("starting exam with {} questions", questions.len());
    ExamSession::new(questions)
}

/// An exam over the highest-scoring verses that still exist in the corpus.
pub fn worst_verses_exam<R: Rng + ?Sized>(
    corpus: &Corpus,
    scores: &VerseScores,
    settings: &Settings,
    rng: &mut R,
) -> QuizResult<ExamSession> {
    corpus.ensure_not_empty()?;
    let qtypes = settings.question_types()?;
    ensure_option_capacity(corpus, &qtypes)?;

    let worst = scores.worst(WORST_LIMIT);
    if worst.is_empty() {
        return Err(QuizError::NothingToQuiz("no missed verses recorded yet".into()));
    }
    let verses: Vec<&Verse> = worst
        .iter()
        .filter_map(|(key, _)| corpus.find(key))
        .collect();
    if verses.is_empty() {
        return Err(QuizError::NothingToQuiz(
            "none of the most missed verses are in the corpus".into(),
        ));
    }

    let questions = build_set(verses, &qtypes, corpus, rng)?;
    tracing::info!("starting worst-verses exam with {} questions", questions.len());
    ExamSession::new(questions)
}

/// A rebuilt exam plus the number of dump entries that had to be dropped.
#[derive(Debug)]
pub struct Retake {
    pub session: ExamSession,
    pub skipped: usize,
}

fn dump_of(record: &SessionRecord) -> QuizResult<&[QuestionDump]> {
    record
        .questions_dump
        .as_deref()
        .ok_or_else(|| QuizError::NothingToQuiz(format!("session {} has no question dump", record.id)))
}

fn rebuild<'a>(
    entries: impl IntoIterator<Item = (usize, &'a QuestionDump)>,
) -> (Vec<Question>, usize) {
    let mut questions = Vec::new();
    let mut skipped = 0;
    for (i, dump) in entries {
        match Question::from_dump(i, dump) {
            Ok(q) => questions.push(q),
            Err(e) => {
                tracing::warn!("skipping replay entry: {e}");
                skipped += 1;
            }
        }
    }
    (questions, skipped)
}

/// Replay every question of `record` exactly. The summary of the new session
/// replaces `record` in the store.
pub fn retake(record: &SessionRecord) -> QuizResult<Retake> {
    let (questions, skipped) = rebuild(dump_of(record)?.iter().enumerate());
    if questions.is_empty() {
        return Err(QuizError::NothingToQuiz(format!(
            "session {} has no usable questions",
            record.id
        )));
    }
    tracing::info!(
        "retaking session {} with {} questions ({skipped} skipped)",
        record.id,
        questions.len()
    );
    Ok(Retake {
        session: ExamSession::new(questions)?.with_origin(record.id.clone()),
        skipped,
    })
}

/// Replay only the questions answered wrong or skipped, one per reference.
/// The result is a new exam, not a replacement.
pub fn retake_wrong_only(record: &SessionRecord) -> QuizResult<Retake> {
    let dump = dump_of(record)?;
    let mut seen = HashSet::new();
    let wrong = dump.iter().enumerate().filter(|(i, d)| {
        let missed = record
            .details
            .get(*i)
            .map_or(true, |detail| detail.outcome().is_miss());
        missed && seen.insert(d.verse.key())
    });
    let (questions, skipped) = rebuild(wrong);
    if questions.is_empty() {
        return Err(QuizError::NothingToQuiz(format!(
            "session {} has no wrong answers to retake",
            record.id
        )));
    }
    tracing::info!(
        "retaking {} missed questions from session {}",
        questions.len(),
        record.id
    );
    Ok(Retake {
        session: ExamSession::new(questions)?,
        skipped,
    })
}

/// What a practice answer produced: feedback plus the record to persist.
#[derive(Debug, Clone)]
pub struct PracticeStep {
    pub feedback: Feedback,
    pub record: SessionRecord,
}

/// Endless practice over an [`AdaptiveSampler`], one question at a time.
///
/// Answering only grades. The outcome reaches the sampler's retry queue when
/// [`PracticeSession::advance`] is called, so a caller that persists each
/// [`PracticeStep`] should save it before advancing.
pub struct PracticeSession<R: Rng = StdRng> {
    sampler: AdaptiveSampler<R>,
    current: Question,
    answered: bool,
    pending: Option<Outcome>,
    attempts: u32,
    correct: u32,
}

impl<R: Rng> PracticeSession<R> {
    pub fn new(mut sampler: AdaptiveSampler<R>) -> QuizResult<Self> {
        let current = sampler.next_question()?;
        Ok(Self {
            sampler,
            current,
            answered: false,
            pending: None,
            attempts: 0,
            correct: 0,
        })
    }

    pub fn current(&self) -> &Question {
        &self.current
    }

    pub fn is_answered(&self) -> bool {
        self.answered
    }

    pub fn answer(&mut self, answer: &Answer) -> QuizResult<PracticeStep> {
        self.respond(Some(answer))
    }

    pub fn skip(&mut self) -> QuizResult<PracticeStep> {
        self.respond(None)
    }

    fn respond(&mut self, answer: Option<&Answer>) -> QuizResult<PracticeStep> {
        if self.answered {
            return Err(QuizError::InvalidState(
                "current practice question is already answered".into(),
            ));
        }
        let feedback = Feedback::new(&self.current, answer);
        self.pending = Some(feedback.outcome);
        self.answered = true;
        self.attempts += 1;
        if feedback.outcome.is_correct() {
            self.correct += 1;
        }

        let detail = DetailRecord::new(self.current.qtype(), &self.current.verse, feedback.outcome);
        Ok(PracticeStep {
            feedback,
            record: SessionRecord::from_details(SessionKind::Practice, vec![detail]),
        })
    }

    /// Hand the current outcome to the sampler and generate the next
    /// question. The current one must be answered first.
    pub fn advance(&mut self) -> QuizResult<&Question> {
        if !self.answered {
            return Err(QuizError::InvalidState(
                "answer or skip the current question before moving on".into(),
            ));
        }
        if let Some(outcome) = self.pending.take() {
            self.sampler.record(&self.current.verse, outcome);
        }
        self.current = self.sampler.next_question()?;
        self.answered = false;
        Ok(&self.current)
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn correct(&self) -> u32 {
        self.correct
    }

    /// Running accuracy, 0 before the first answer.
    pub fn accuracy(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            self.correct as f64 / self.attempts as f64
        }
    }

    pub fn sampler(&self) -> &AdaptiveSampler<R> {
        &self.sampler
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::weights::WeightTable;
    use rand::SeedableRng;

    fn corpus(n: u32) -> Corpus {
        Corpus::new(
            (1..=n)
                .map(|i| {
                    Verse::new(
                        "Psalms",
                        23,
                        i,
                        format!("the lord is my shepherd verse number {i}"),
                    )
                })
                .collect(),
        )
    }

    fn settings(num: u32, types: &[QuestionType]) -> Settings {
        Settings {
            num_questions: num,
            enabled_qtypes: types.to_vec(),
        }
    }

    fn right_answer(q: &Question) -> Answer {
        match q.qtype() {
            QuestionType::IdentifyRef => Answer::Reference {
                book: q.verse.book.clone(),
                chapter: Some(q.verse.chapter),
                verse: Some(q.verse.verse),
            },
            QuestionType::Cloze | QuestionType::ContinueVerse => Answer::Text(q.verse.text.clone()),
            QuestionType::MultipleChoice | QuestionType::MultipleChoiceText => {
                Answer::Choice(q.correct_index().unwrap())
            }
        }
    }

    #[test]
    fn exam_size_is_capped_by_unique_references() {
        let c = corpus(10);
        let mut rng = StdRng::seed_from_u64(1);
        let exam = start_exam(&c, &settings(15, &QuestionType::ALL), &mut rng).unwrap();
        assert_eq!(exam.len(), 10);
        let keys: HashSet<String> = exam.questions().iter().map(Question::key).collect();
        assert_eq!(keys.len(), 10);
    }

    #[test]
    fn exam_size_is_clamped_up_to_minimum() {
        let c = corpus(40);
        let mut rng = StdRng::seed_from_u64(2);
        let exam = start_exam(&c, &settings(1, &[QuestionType::Cloze]), &mut rng).unwrap();
        assert_eq!(exam.len(), 5);
        assert!(exam.questions().iter().all(|q| q.qtype() == QuestionType::Cloze));
    }

    #[test]
    fn exam_preconditions() {
        let mut rng = StdRng::seed_from_u64(3);
        let err = start_exam(&Corpus::default(), &Settings::default(), &mut rng).unwrap_err();
        assert!(matches!(err, QuizError::EmptyCorpus));
        let err = start_exam(&corpus(10), &settings(10, &[]), &mut rng).unwrap_err();
        assert!(matches!(err, QuizError::NoQuestionTypes));
        let err = start_exam(&corpus(3), &settings(10, &[QuestionType::MultipleChoice]), &mut rng)
            .unwrap_err();
        assert!(matches!(err, QuizError::CorpusTooSmall { .. }));
    }

    #[test]
    fn exams_check_text_choices_up_front() {
        let c = Corpus::new(
            (1..=6)
                .map(|i| Verse::new("Psalms", 23, i, format!("refrain {}", i % 3)))
                .collect(),
        );
        let st = settings(5, &[QuestionType::Cloze, QuestionType::MultipleChoiceText]);
        let mut rng = StdRng::seed_from_u64(3);
        let err = start_exam(&c, &st, &mut rng).unwrap_err();
        assert!(matches!(err, QuizError::CorpusTooSmall { available: 3, .. }));

        let scores: VerseScores = [("Psalms|23|1".to_string(), 2)].into_iter().collect();
        let err = worst_verses_exam(&c, &scores, &st, &mut rng).unwrap_err();
        assert!(matches!(err, QuizError::CorpusTooSmall { available: 3, .. }));

        let st = settings(5, &[QuestionType::Cloze, QuestionType::MultipleChoice]);
        assert_eq!(start_exam(&c, &st, &mut rng).unwrap().questions().len(), 5);
    }

    #[test]
    fn exam_flow_and_summary() {
        let c = corpus(12);
        let mut rng = StdRng::seed_from_u64(4);
        let mut exam = start_exam(&c, &settings(5, &QuestionType::ALL), &mut rng).unwrap();

        let first = exam.current().clone();
        assert!(exam.answer(&right_answer(&first)).unwrap().outcome.is_correct());
        assert_eq!(exam.position(), 1);
        assert_eq!(exam.skip().unwrap().outcome, Outcome::Skipped);

        // Review does not allow changing an answer.
        assert!(exam.prev());
        assert!(matches!(exam.skip(), Err(QuizError::InvalidState(_))));
        assert!(exam.next());
        assert!(!exam.is_complete());

        let summary = exam.summary();
        assert_eq!(summary.total, 5);
        assert_eq!(summary.correct, 1);
        assert_eq!(summary.skip, 1);
        assert!(summary.is_exam());
        assert_eq!(summary.questions_dump.as_ref().unwrap().len(), 5);
        assert!(!summary.details[2].correct && !summary.details[2].skipped);
    }

    #[test]
    fn worst_verses_exam_uses_known_scored_verses() {
        let c = corpus(10);
        let scores: VerseScores = [
            ("Psalms|23|2".to_string(), 3),
            ("Psalms|23|7".to_string(), 1),
            ("Nowhere|1|1".to_string(), 9),
            ("Psalms|23|9".to_string(), 0),
        ]
        .into_iter()
        .collect();
        let mut rng = StdRng::seed_from_u64(5);
        let exam =
            worst_verses_exam(&c, &scores, &settings(30, &[QuestionType::IdentifyRef]), &mut rng)
                .unwrap();
        let keys: Vec<String> = exam.questions().iter().map(Question::key).collect();
        assert_eq!(keys, vec!["Psalms|23|2", "Psalms|23|7"]);

        let err = worst_verses_exam(&c, &VerseScores::new(), &Settings::default(), &mut rng)
            .unwrap_err();
        assert!(matches!(err, QuizError::NothingToQuiz(_)));
    }

    #[test]
    fn retake_replays_and_replaces() {
        let c = corpus(12);
        let mut rng = StdRng::seed_from_u64(6);
        let mut exam = start_exam(&c, &settings(5, &QuestionType::ALL), &mut rng).unwrap();
        while !exam.is_complete() {
            exam.skip().unwrap();
        }
        let original = exam.summary();

        let Retake { session, skipped } = retake(&original).unwrap();
        assert_eq!(skipped, 0);
        assert_eq!(session.questions(), exam.questions());
        assert_eq!(session.summary().id, original.id);
        assert_eq!(
            session.summary().origin_session_id.as_deref(),
            Some(original.id.as_str())
        );
    }

    #[test]
    fn retake_skips_malformed_entries() {
        let c = corpus(12);
        let mut rng = StdRng::seed_from_u64(7);
        let exam = start_exam(&c, &settings(5, &[QuestionType::IdentifyRef]), &mut rng).unwrap();
        let mut record = exam.summary();
        record.questions_dump.as_mut().unwrap()[1].verse.text.clear();

        let r = retake(&record).unwrap();
        assert_eq!(r.skipped, 1);
        assert_eq!(r.session.len(), 4);

        record.questions_dump = None;
        assert!(matches!(retake(&record), Err(QuizError::NothingToQuiz(_))));
    }

    #[test]
    fn retake_wrong_only_filters_and_dedups() {
        let c = corpus(12);
        let mut rng = StdRng::seed_from_u64(8);
        let mut exam = start_exam(&c, &settings(5, &[QuestionType::ContinueVerse]), &mut rng).unwrap();
        let q0 = exam.current().clone();
        exam.answer(&right_answer(&q0)).unwrap();
        exam.answer(&Answer::Text("nothing alike".into())).unwrap();
        exam.skip().unwrap();
        let q3 = exam.current().clone();
        exam.answer(&right_answer(&q3)).unwrap();
        exam.skip().unwrap();

        let mut record = exam.summary();
        // Duplicate the skipped third entry; it must only be replayed once.
        let dup = record.questions_dump.as_ref().unwrap()[2].clone();
        let dup_detail = record.details[2].clone();
        record.questions_dump.as_mut().unwrap().push(dup);
        record.details.push(dup_detail);

        let r = retake_wrong_only(&record).unwrap();
        assert_eq!(r.session.len(), 3);
        assert!(r.session.origin_session_id().is_none());
        let wanted: Vec<String> = [1, 2, 4].iter().map(|&i| exam.questions()[i].key()).collect();
        let got: Vec<String> = r.session.questions().iter().map(Question::key).collect();
        assert_eq!(got, wanted);
    }

    #[test]
    fn retake_wrong_only_with_nothing_wrong() {
        let c = corpus(12);
        let mut rng = StdRng::seed_from_u64(9);
        let mut exam = start_exam(&c, &settings(5, &[QuestionType::MultipleChoice]), &mut rng).unwrap();
        while !exam.is_complete() {
            let q = exam.current().clone();
            exam.answer(&right_answer(&q)).unwrap();
        }
        assert!(matches!(
            retake_wrong_only(&exam.summary()),
            Err(QuizError::NothingToQuiz(_))
        ));
    }

    fn practice(seed: u64) -> PracticeSession<StdRng> {
        let c = Arc::new(corpus(20));
        let sampler = AdaptiveSampler::with_rng(
            c.clone(),
            WeightTable::from_weights(vec![1; c.len()]),
            QuestionType::ALL.to_vec(),
            StdRng::seed_from_u64(seed),
        )
        .unwrap();
        PracticeSession::new(sampler).unwrap()
    }

    #[test]
    fn practice_requires_answer_before_advance() {
        let mut p = practice(10);
        assert!(matches!(p.advance(), Err(QuizError::InvalidState(_))));
        let q = p.current().clone();
        let step = p.answer(&right_answer(&q)).unwrap();
        assert!(step.feedback.outcome.is_correct());
        assert!(matches!(p.skip(), Err(QuizError::InvalidState(_))));
        p.advance().unwrap();
        assert!(!p.is_answered());
    }

    #[test]
    fn practice_records_single_question_sessions() {
        let mut p = practice(11);
        let step = p.skip().unwrap();
        assert_eq!(step.record.kind, Some(SessionKind::Practice));
        assert_eq!(step.record.total, 1);
        assert_eq!(step.record.skip, 1);
        assert!(!step.record.is_exam());
        assert!(step.record.questions_dump.is_none());
    }

    #[test]
    fn practice_outcome_reaches_sampler_on_advance() {
        let mut p = practice(11);
        let missed = p.current().key();
        p.skip().unwrap();
        assert!(p.sampler().retry_queue().is_empty());
        assert_eq!(p.sampler().attempts(), 0);
        assert_eq!(p.attempts(), 1);

        p.advance().unwrap();
        assert_eq!(p.sampler().attempts(), 1);
        assert!(p.sampler().retry_queue().get(&missed).is_some());
    }

    #[test]
    fn practice_accuracy_tracks_attempts() {
        let mut p = practice(12);
        assert_eq!(p.accuracy(), 0.0);
        for i in 0..4 {
            let q = p.current().clone();
            if i % 2 == 0 {
                p.answer(&right_answer(&q)).unwrap();
            } else {
                p.skip().unwrap();
            }
            p.advance().unwrap();
        }
        assert_eq!(p.attempts(), 4);
        assert_eq!(p.correct(), 2);
        assert!((p.accuracy() - 0.5).abs() < 1e-12);
        assert_eq!(p.sampler().attempts(), 4);
    }
}
