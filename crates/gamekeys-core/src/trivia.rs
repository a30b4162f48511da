//! Trivia questions whose correct answers pay out a balance reward.

use serde::{Deserialize, Serialize};

/// Default reward for a correct trivia answer.
pub const DEFAULT_TRIVIA_REWARD: u32 = 50;

/// A multiple-choice trivia question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriviaQuestion {
    /// Question text.
    pub question: String,

    /// Offered answers.
    pub options: Vec<String>,

    /// The correct answer, verbatim from `options`.
    pub correct: String,
}

impl TriviaQuestion {
    /// Whether `answer` is the correct option.
    #[must_use]
    pub fn is_correct(&self, answer: &str) -> bool {
        answer == self.correct
    }
}
