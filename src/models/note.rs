use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{ChoiceExplanation, CorrectAnswer, Pillar, ValidationError};
use crate::normalizer::PillarNormalizer;

/// One fully explained multiple-choice exam question.
///
/// Constructed once per request by the caller and never mutated by the
/// store; encoding and decoding always produce new values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredNote {
    /// The question as presented in the exam.
    pub question_text: String,
    /// Choices in display order. Position `i` is choice number `i + 1`.
    pub choices: Vec<String>,
    /// 1-indexed correct choice number(s).
    pub correct_answer: CorrectAnswer,
    /// Text of the correct choice.
    #[serde(default)]
    pub correct_choice_text: String,
    /// Overall explanation of the answer.
    #[serde(default)]
    pub explanation: String,
    /// Cloud services the question touches on.
    #[serde(default)]
    pub related_services: BTreeSet<String>,
    /// Pillar slugs. Unknown slugs are kept as-is.
    #[serde(default)]
    pub well_architected_categories: BTreeSet<String>,
    /// One entry per choice, ordered by choice number.
    #[serde(default)]
    pub choice_explanations: Vec<ChoiceExplanation>,
    #[serde(default)]
    pub learning_points: Vec<String>,
    /// Diagram source, if the explanation produced one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub architecture_diagram: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similar_questions_hint: Option<String>,
}

impl StructuredNote {
    /// Returns the categories that are recognised pillars.
    pub fn pillars(&self) -> impl Iterator<Item = Pillar> + '_ {
        self.well_architected_categories
            .iter()
            .filter_map(|slug| Pillar::from_slug(slug))
    }

    /// Returns true when the note is tagged with `label` after normalization.
    pub fn has_category(&self, label: &str) -> bool {
        self.well_architected_categories
            .contains(&PillarNormalizer::normalize(label))
    }
}

/// Builder for constructing `StructuredNote` instances.
///
/// Categories are normalized as they are added. When no choice explanations
/// are supplied, empty ones are synthesized from the choices and answer;
/// supplied ones take their choice text from the choice they number. A
/// missing correct-choice text is taken from the primary answer. Learning
/// points are trimmed, stripped of leading bullets and blank ones dropped.
///
/// # Examples
///
/// ```
/// use quiznote::NoteBuilder;
///
/// let note = NoteBuilder::new()
///     .question_text("Which service provides block storage for EC2?")
///     .choices(["S3", "EBS", "EFS"])
///     .correct_answer(2)
///     .categories(["Cost Optimization"])
///     .build()
///     .unwrap();
///
/// assert_eq!(note.correct_choice_text, "EBS");
/// assert_eq!(note.choice_explanations.len(), 3);
/// assert!(note.well_architected_categories.contains("cost-optimization"));
/// ```
#[derive(Debug, Default)]
pub struct NoteBuilder {
    question_text: Option<String>,
    choices: Vec<String>,
    correct_answer: CorrectAnswer,
    correct_choice_text: Option<String>,
    explanation: String,
    related_services: BTreeSet<String>,
    categories: BTreeSet<String>,
    choice_explanations: Option<Vec<ChoiceExplanation>>,
    learning_points: Vec<String>,
    architecture_diagram: Option<String>,
    similar_questions_hint: Option<String>,
}

impl NoteBuilder {
    /// Creates a new `NoteBuilder`.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn question_text(mut self, text: impl Into<String>) -> Self {
        self.question_text = Some(text.into());
        self
    }

    pub fn choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = choices.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the correct answer from a single number or a `CorrectAnswer`.
    pub fn correct_answer(mut self, answer: impl Into<CorrectAnswer>) -> Self {
        self.correct_answer = answer.into();
        self
    }

    pub fn correct_choice_text(mut self, text: impl Into<String>) -> Self {
        self.correct_choice_text = Some(text.into());
        self
    }

    pub fn explanation(mut self, text: impl Into<String>) -> Self {
        self.explanation = text.into();
        self
    }

    pub fn related_services<I, S>(mut self, services: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.related_services = services.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the categories, normalizing each label to its slug form.
    pub fn categories<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.categories = PillarNormalizer::normalize_all(labels);
        self
    }

    pub fn choice_explanations(mut self, entries: Vec<ChoiceExplanation>) -> Self {
        self.choice_explanations = Some(entries);
        self
    }

    pub fn learning_points<I, S>(mut self, points: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.learning_points = points.into_iter().map(Into::into).collect();
        self
    }

    pub fn architecture_diagram(mut self, diagram: impl Into<String>) -> Self {
        self.architecture_diagram = Some(diagram.into());
        self
    }

    pub fn similar_questions_hint(mut self, hint: impl Into<String>) -> Self {
        self.similar_questions_hint = Some(hint.into());
        self
    }

    /// Builds and validates the note.
    ///
    /// # Errors
    ///
    /// Returns the first `ValidationError` the assembled note violates.
    pub fn build(self) -> Result<StructuredNote, ValidationError> {
        let choice_explanations = match self.choice_explanations {
            Some(mut entries) => {
                for entry in &mut entries {
                    if let Some(choice) = entry
                        .choice_number
                        .checked_sub(1)
                        .and_then(|i| self.choices.get(i))
                    {
                        entry.choice_text = choice.clone();
                    }
                }
                entries
            }
            None => ChoiceExplanation::synthesize(&self.choices, &self.correct_answer),
        };

        let correct_choice_text = self.correct_choice_text.unwrap_or_else(|| {
            self.correct_answer
                .primary()
                .and_then(|n| self.choices.get(n.wrapping_sub(1)))
                .cloned()
                .unwrap_or_default()
        });

        let note = StructuredNote {
            question_text: self.question_text.unwrap_or_default(),
            choices: self.choices,
            correct_answer: self.correct_answer,
            correct_choice_text,
            explanation: self.explanation,
            related_services: self.related_services,
            well_architected_categories: self.categories,
            choice_explanations,
            learning_points: self
                .learning_points
                .iter()
                .map(|point| {
                    point
                        .trim()
                        .trim_start_matches(|c: char| c == '•' || c.is_whitespace())
                        .to_string()
                })
                .filter(|point| !point.is_empty())
                .collect(),
            architecture_diagram: self.architecture_diagram,
            similar_questions_hint: self.similar_questions_hint,
        };

        note.validate()?;
        Ok(note)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage_question() -> NoteBuilder {
        NoteBuilder::new()
            .question_text("Which service provides block storage for EC2?")
            .choices(["S3", "EBS", "EFS"])
            .correct_answer(2)
    }

    #[test]
    fn builder_synthesizes_explanations_and_correct_text() {
        let note = storage_question().build().unwrap();

        assert_eq!(note.correct_choice_text, "EBS");
        assert_eq!(note.choice_explanations.len(), 3);
        assert!(note.choice_explanations[1].is_correct);
        assert!(note.architecture_diagram.is_none());
    }

    #[test]
    fn builder_keeps_explicit_explanations() {
        let entries = vec![
            ChoiceExplanation::new(1, "S3", false, "Object storage."),
            ChoiceExplanation::new(2, "EBS", true, "Block storage volumes."),
            ChoiceExplanation::new(3, "EFS", false, "Shared file system."),
        ];
        let note = storage_question()
            .choice_explanations(entries.clone())
            .build()
            .unwrap();

        assert_eq!(note.choice_explanations, entries);
    }

    #[test]
    fn builder_fills_explanation_choice_text_from_choices() {
        let note = storage_question()
            .choice_explanations(vec![
                ChoiceExplanation::new(1, "", false, "Object storage."),
                ChoiceExplanation::new(2, "B", true, "Block storage."),
                ChoiceExplanation::new(3, "EFS", false, ""),
            ])
            .build()
            .unwrap();

        assert_eq!(note.choice_explanations[0].choice_text, "S3");
        assert_eq!(note.choice_explanations[0].explanation, "Object storage.");
        assert_eq!(note.choice_explanations[1].choice_text, "EBS");
    }

    #[test]
    fn builder_cleans_learning_points() {
        let note = storage_question()
            .learning_points(["• bulleted", "  padded  ", "", " •  both"])
            .build()
            .unwrap();

        assert_eq!(note.learning_points, vec!["bulleted", "padded", "both"]);
    }

    #[test]
    fn builder_normalizes_categories() {
        let note = storage_question()
            .categories(["Cost Optimization", "security", "Data Governance"])
            .build()
            .unwrap();

        assert!(note.well_architected_categories.contains("cost-optimization"));
        assert!(note.well_architected_categories.contains("security"));
        assert!(note.well_architected_categories.contains("data-governance"));
        assert_eq!(
            note.pillars().collect::<Vec<_>>(),
            vec![Pillar::CostOptimization, Pillar::Security]
        );
        assert!(note.has_category("COST OPTIMIZATION"));
    }

    #[test]
    fn builder_rejects_invalid_note() {
        let result = storage_question().correct_answer(5).build();
        assert!(matches!(
            result,
            Err(ValidationError::AnswerOutOfRange { answer: 5, .. })
        ));
    }

    #[test]
    fn note_deserializes_from_orchestration_json() {
        let json = r#"{
            "question_text": "Pick two durable storage options",
            "choices": ["S3", "Instance store", "EBS"],
            "correct_answer": [1, 3],
            "choice_explanations": [
                {"choice_number": 1, "choice_text": "S3", "is_correct": true, "explanation": "11 nines."},
                {"choice_number": 2, "choice_text": "Instance store", "is_correct": false},
                {"choice_number": 3, "choice_text": "EBS", "is_correct": true, "explanation": "Replicated in an AZ."}
            ],
            "learning_points": ["Instance store is ephemeral"]
        }"#;

        let note: StructuredNote = serde_json::from_str(json).unwrap();
        assert!(note.correct_answer.is_multiple());
        assert_eq!(note.choice_explanations[1].explanation, "");
        assert!(note.related_services.is_empty());
        assert_eq!(note.validate(), Ok(()));
    }
}
