use serde::{Deserialize, Serialize};

use super::CorrectAnswer;

/// Per-choice explanation of why an option is right or wrong.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceExplanation {
    /// 1-indexed position of the choice this explanation belongs to.
    pub choice_number: usize,
    /// The choice text as shown to the reader.
    pub choice_text: String,
    /// Whether this choice is one of the correct answers.
    pub is_correct: bool,
    /// Free-text reasoning for the choice.
    #[serde(default)]
    pub explanation: String,
}

impl ChoiceExplanation {
    /// Creates an explanation entry.
    pub fn new(
        choice_number: usize,
        choice_text: impl Into<String>,
        is_correct: bool,
        explanation: impl Into<String>,
    ) -> Self {
        Self {
            choice_number,
            choice_text: choice_text.into(),
            is_correct,
            explanation: explanation.into(),
        }
    }

    /// Creates one entry per choice with empty explanation text.
    ///
    /// Correctness flags follow `answer`. Used when no explanations were
    /// supplied or none could be recovered from storage.
    pub fn synthesize(choices: &[String], answer: &CorrectAnswer) -> Vec<Self> {
        choices
            .iter()
            .enumerate()
            .map(|(i, text)| Self::new(i + 1, text.clone(), answer.contains(i + 1), ""))
            .collect()
    }
}
