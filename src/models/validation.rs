use std::collections::BTreeSet;

use thiserror::Error;

use super::{MAX_CHOICES, MIN_CHOICES, StructuredNote};
use crate::normalizer::PillarNormalizer;

/// Bullet that separates learning points in storage.
const BULLET: char = '•';

/// A structured note that violates a data-model invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("question text cannot be empty")]
    EmptyQuestion,

    #[error("expected between 2 and 8 choices, got {count}")]
    ChoiceCount { count: usize },

    #[error("choice {number} cannot be empty")]
    EmptyChoice { number: usize },

    #[error("choice {number} must fit on a single line")]
    MultilineChoice { number: usize },

    #[error("at least one correct answer is required")]
    NoCorrectAnswer,

    #[error("correct answer {answer} is outside 1..={choices}")]
    AnswerOutOfRange { answer: usize, choices: usize },

    #[error("expected {expected} choice explanations, got {actual}")]
    ExplanationCount { expected: usize, actual: usize },

    #[error("choice explanations must be numbered 1..={expected} without gaps or repeats (found {number})")]
    ExplanationNumbering { number: usize, expected: usize },

    #[error("choice explanation {number} has a correctness flag that disagrees with the correct answer")]
    CorrectFlagMismatch { number: usize },

    #[error("choice explanation {number} does not repeat the text of choice {number}")]
    ChoiceTextMismatch { number: usize },

    #[error("learning point {number} must be non-blank, trimmed and written without a bullet")]
    LearningPoint { number: usize },

    #[error("category {label:?} is not in normalized form")]
    Category { label: String },
}

impl StructuredNote {
    /// Checks every data-model invariant.
    ///
    /// Returns the first violation found. Categories must already be in
    /// normalized form, but unknown slugs are tolerated and preserved.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.question_text.trim().is_empty() {
            return Err(ValidationError::EmptyQuestion);
        }

        let count = self.choices.len();
        if !(MIN_CHOICES..=MAX_CHOICES).contains(&count) {
            return Err(ValidationError::ChoiceCount { count });
        }

        for (i, choice) in self.choices.iter().enumerate() {
            if choice.trim().is_empty() {
                return Err(ValidationError::EmptyChoice { number: i + 1 });
            }
            if choice.contains(['\n', '\r']) {
                return Err(ValidationError::MultilineChoice { number: i + 1 });
            }
        }

        if self.correct_answer.is_empty() {
            return Err(ValidationError::NoCorrectAnswer);
        }
        if let Some(answer) = self
            .correct_answer
            .iter()
            .find(|n| !(1..=count).contains(n))
        {
            return Err(ValidationError::AnswerOutOfRange {
                answer,
                choices: count,
            });
        }

        if self.choice_explanations.len() != count {
            return Err(ValidationError::ExplanationCount {
                expected: count,
                actual: self.choice_explanations.len(),
            });
        }

        let mut seen = BTreeSet::new();
        for entry in &self.choice_explanations {
            let number = entry.choice_number;
            if !(1..=count).contains(&number) || !seen.insert(number) {
                return Err(ValidationError::ExplanationNumbering {
                    number,
                    expected: count,
                });
            }
            if entry.is_correct != self.correct_answer.contains(number) {
                return Err(ValidationError::CorrectFlagMismatch { number });
            }
            if entry.choice_text != self.choices[number - 1] {
                return Err(ValidationError::ChoiceTextMismatch { number });
            }
        }

        for (i, point) in self.learning_points.iter().enumerate() {
            if !is_canonical_learning_point(point) {
                return Err(ValidationError::LearningPoint { number: i + 1 });
            }
        }

        if let Some(label) = self
            .well_architected_categories
            .iter()
            .find(|label| label.is_empty() || PillarNormalizer::normalize(label) != **label)
        {
            return Err(ValidationError::Category {
                label: label.clone(),
            });
        }

        Ok(())
    }
}

/// A learning point survives the bullet-joined storage format unchanged only
/// when it is trimmed, non-empty, not bullet-prefixed and free of line breaks
/// followed by a bullet.
pub(crate) fn is_canonical_learning_point(point: &str) -> bool {
    !point.is_empty()
        && point.trim() == point
        && !point.starts_with(BULLET)
        && !point.contains(&format!("\n{BULLET}"))
}
