//! Verse selection for exams and practice.
//!
//! Exams draw a uniform, reference-unique set up front. Practice runs an
//! unbounded [`AdaptiveSampler`] that serves due retries first and otherwise
//! alternates between uniform and weighted draws, steering away from
//! recently served verses.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::error::{QuizError, QuizResult};
use crate::history::Outcome;
use crate::model::{Corpus, QuestionType, Verse};
use crate::question::{build_with_fallback, ensure_option_capacity, Question};
use crate::retry::{RetryEntry, RetryScheduler};
use crate::weights::WeightTable;

/// How many recently served keys are avoided.
pub const RECENT_CAPACITY: usize = 10;
/// Draw attempts before a uniform draw gives up avoiding recent verses.
pub const UNIFORM_AVOID_TRIES: usize = 50;
/// Draw attempts before a weighted draw gives up avoiding recent verses.
pub const WEIGHTED_AVOID_TRIES: usize = 80;

/// Up to `want` corpus indices with pairwise-distinct reference keys, uniform
/// over permutations. Returns fewer when the corpus has fewer unique keys.
pub fn pick_unique_uniform<R: Rng + ?Sized>(
    corpus: &Corpus,
    want: usize,
    rng: &mut R,
) -> Vec<usize> {
    let mut order: Vec<usize> = (0..corpus.len()).collect();
    order.shuffle(rng);

    let mut used = HashSet::with_capacity(want);
    let mut selected = Vec::with_capacity(want.min(corpus.len()));
    for i in order {
        if selected.len() == want {
            break;
        }
        if used.insert(corpus.verses()[i].key()) {
            selected.push(i);
        }
    }
    selected
}

/// FIFO of the most recently served verse keys.
#[derive(Debug, Clone)]
pub struct RecencyBuffer {
    keys: VecDeque<String>,
    capacity: usize,
}

impl Default for RecencyBuffer {
    fn default() -> Self {
        Self::with_capacity(RECENT_CAPACITY)
    }
}

impl RecencyBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            keys: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    pub fn push(&mut self, key: String) {
        self.keys.push_back(key);
        while self.keys.len() > self.capacity {
            self.keys.pop_front();
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }
}

/// Which distribution the next non-retry draw uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawMode {
    /// Uniform over the corpus.
    Explore,
    /// Proportional to verse weight.
    Reinforce,
}

impl DrawMode {
    pub fn flipped(self) -> Self {
        match self {
            DrawMode::Explore => DrawMode::Reinforce,
            DrawMode::Reinforce => DrawMode::Explore,
        }
    }
}

/// Where a drawn verse came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawSource {
    Retry,
    Explore,
    Reinforce,
}

#[derive(Debug, Clone)]
pub struct Draw {
    pub verse: Verse,
    pub source: DrawSource,
}

/// Stateful practice-mode generator. One instance belongs to one practice
/// session; it never terminates on its own.
pub struct AdaptiveSampler<R: Rng = StdRng> {
    corpus: Arc<Corpus>,
    weights: WeightTable,
    qtypes: Vec<QuestionType>,
    recent: RecencyBuffer,
    retry: RetryScheduler,
    mode: DrawMode,
    attempts: u64,
    rng: R,
}

impl AdaptiveSampler<StdRng> {
    pub fn new(
        corpus: Arc<Corpus>,
        weights: WeightTable,
        qtypes: Vec<QuestionType>,
    ) -> QuizResult<Self> {
        Self::with_rng(corpus, weights, qtypes, StdRng::from_entropy())
    }
}

impl<R: Rng> AdaptiveSampler<R> {
    pub fn with_rng(
        corpus: Arc<Corpus>,
        weights: WeightTable,
        qtypes: Vec<QuestionType>,
        rng: R,
    ) -> QuizResult<Self> {
        corpus.ensure_not_empty()?;
        if qtypes.is_empty() {
            return Err(QuizError::NoQuestionTypes);
        }
        ensure_option_capacity(&corpus, &qtypes)?;

        let weights = if weights.weights().len() == corpus.len() {
            weights
        } else {
            tracing::warn!(
                "weight table has {} entries for {} verses, using uniform weights",
                weights.weights().len(),
                corpus.len()
            );
            WeightTable::from_weights(vec![1; corpus.len()])
        };

        Ok(Self {
            corpus,
            weights,
            qtypes,
            recent: RecencyBuffer::default(),
            retry: RetryScheduler::new(),
            mode: DrawMode::Explore,
            attempts: 0,
            rng,
        })
    }

    /// Choose the next verse: a due retry if any, otherwise a recency-avoiding
    /// draw in the current mode, after which the mode flips.
    pub fn choose_verse(&mut self) -> Draw {
        if let Some(RetryEntry { key, verse, .. }) = self.retry.pop_due(self.attempts) {
            tracing::debug!("serving retry {key} at attempt {}", self.attempts);
            self.recent.push(key);
            return Draw {
                verse,
                source: DrawSource::Retry,
            };
        }

        let (index, source) = match self.mode {
            DrawMode::Explore => (self.uniform_avoiding_recent(), DrawSource::Explore),
            DrawMode::Reinforce => (self.weighted_avoiding_recent(), DrawSource::Reinforce),
        };
        self.mode = self.mode.flipped();

        let verse = self.corpus.verses()[index].clone();
        tracing::debug!("drew {} via {source:?}", verse.key());
        self.recent.push(verse.key());
        Draw { verse, source }
    }

    fn uniform_avoiding_recent(&mut self) -> usize {
        let n = self.corpus.len();
        for _ in 0..UNIFORM_AVOID_TRIES {
            let i = self.rng.gen_range(0..n);
            if !self.recent.contains(&self.corpus.verses()[i].key()) {
                return i;
            }
        }
        self.rng.gen_range(0..n)
    }

    fn weighted_avoiding_recent(&mut self) -> usize {
        for _ in 0..WEIGHTED_AVOID_TRIES {
            let i = self.weighted_index();
            if !self.recent.contains(&self.corpus.verses()[i].key()) {
                return i;
            }
        }
        self.weighted_index()
    }

    fn weighted_index(&mut self) -> usize {
        // The table is never empty once construction has checked the corpus.
        self.weights
            .sample(&mut self.rng)
            .unwrap_or_else(|| self.rng.gen_range(0..self.corpus.len()))
    }

    /// Draw a verse and build a question of a uniformly chosen enabled type.
    ///
    /// If no enabled type can be built for the drawn verse, the retry queue,
    /// recency buffer and draw mode are left as they were before the call.
    pub fn next_question(&mut self) -> QuizResult<Question> {
        let saved = (self.retry.clone(), self.recent.clone(), self.mode);
        let draw = self.choose_verse();
        let qtype = self.qtypes[self.rng.gen_range(0..self.qtypes.len())];
        let built =
            build_with_fallback(qtype, &self.qtypes, &draw.verse, &self.corpus, &mut self.rng);
        if let Err(err) = &built {
            tracing::warn!("could not build a question for {}: {err}", draw.verse.reference());
            (self.retry, self.recent, self.mode) = saved;
        }
        built
    }

    /// Feed back the outcome of the question just served. Misses are queued
    /// for a retry; a correct answer cancels any pending retry. Either way
    /// the attempt counter advances.
    pub fn record(&mut self, verse: &Verse, outcome: Outcome) {
        if outcome.is_miss() {
            self.retry.schedule_miss(verse, self.attempts, &mut self.rng);
        } else {
            self.retry.discard(&verse.key());
        }
        self.attempts += 1;
    }

    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    pub fn mode(&self) -> DrawMode {
        self.mode
    }

    pub fn recent(&self) -> &RecencyBuffer {
        &self.recent
    }

    pub fn retry_queue(&self) -> &RetryScheduler {
        &self.retry
    }

    pub fn question_types(&self) -> &[QuestionType] {
        &self.qtypes
    }
}
