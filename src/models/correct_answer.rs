use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The 1-indexed choice number(s) that answer a question.
///
/// Accepts either a single number or a list of numbers when deserialized,
/// and serializes back to a single number when only one answer is set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "AnswerRepr", into = "AnswerRepr")]
pub struct CorrectAnswer(BTreeSet<usize>);

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum AnswerRepr {
    Single(usize),
    Multiple(Vec<usize>),
}

impl From<AnswerRepr> for CorrectAnswer {
    fn from(repr: AnswerRepr) -> Self {
        match repr {
            AnswerRepr::Single(n) => Self::single(n),
            AnswerRepr::Multiple(ns) => ns.into_iter().collect(),
        }
    }
}

impl From<CorrectAnswer> for AnswerRepr {
    fn from(answer: CorrectAnswer) -> Self {
        match answer.primary() {
            Some(n) if answer.len() == 1 => AnswerRepr::Single(n),
            _ => AnswerRepr::Multiple(answer.0.into_iter().collect()),
        }
    }
}

impl CorrectAnswer {
    /// Creates an answer with exactly one correct choice.
    pub fn single(choice: usize) -> Self {
        Self(BTreeSet::from([choice]))
    }

    /// Returns the lowest correct choice number.
    ///
    /// This is the value persisted in the numeric answer field.
    pub fn primary(&self) -> Option<usize> {
        self.0.first().copied()
    }

    /// Returns true when `choice` is one of the correct answers.
    pub fn contains(&self, choice: usize) -> bool {
        self.0.contains(&choice)
    }

    /// Iterates correct choice numbers in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns true for questions with more than one correct choice.
    pub fn is_multiple(&self) -> bool {
        self.0.len() > 1
    }

    pub(crate) fn insert(&mut self, choice: usize) {
        self.0.insert(choice);
    }
}

impl From<usize> for CorrectAnswer {
    fn from(choice: usize) -> Self {
        Self::single(choice)
    }
}

impl FromIterator<usize> for CorrectAnswer {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
