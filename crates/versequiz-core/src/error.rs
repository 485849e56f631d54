//! Engine error types.
//!
//! Every condition here is scoped to a single operation and recoverable by the
//! caller. Callers classify with the `is_*` helpers instead of matching on
//! message text.

use thiserror::Error;

use crate::model::QuestionType;

/// Errors raised by the selection, construction, session, and store layers.
#[derive(Debug, Error)]
pub enum QuizError {
    /// The corpus has no verses to draw from.
    #[error("corpus is empty")]
    EmptyCorpus,

    /// No question types are enabled in the settings.
    #[error("no question types are enabled")]
    NoQuestionTypes,

    /// The corpus cannot supply four distinct options for a multiple-choice question.
    #[error("{qtype} needs at least {needed} distinct verses, corpus has {available}")]
    CorpusTooSmall {
        qtype: QuestionType,
        needed: usize,
        available: usize,
    },

    /// A session operation was called in a state that does not allow it.
    #[error("invalid session state: {0}")]
    InvalidState(String),

    /// A requested selection produced nothing to quiz on.
    #[error("nothing to quiz: {0}")]
    NothingToQuiz(String),

    /// A persisted replay record could not be turned back into a question.
    #[error("malformed question record at index {index}: {reason}")]
    MalformedRecord { index: usize, reason: String },

    /// Reading or writing the store failed; in-memory state is unchanged.
    #[error("persistence failed: {0}")]
    Persistence(#[source] anyhow::Error),
}

impl QuizError {
    /// Returns `true` for caller mistakes that retrying with the same input cannot fix.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            QuizError::EmptyCorpus
                | QuizError::NoQuestionTypes
                | QuizError::CorpusTooSmall { .. }
                | QuizError::InvalidState(_)
                | QuizError::NothingToQuiz(_)
        )
    }

    /// Returns `true` if the error came from the external store.
    pub fn is_persistence(&self) -> bool {
        matches!(self, QuizError::Persistence(_))
    }

    /// Returns `true` if the error describes an unusable persisted record.
    pub fn is_data_integrity(&self) -> bool {
        matches!(self, QuizError::MalformedRecord { .. })
    }
}

pub type QuizResult<T> = std::result::Result<T, QuizError>;
