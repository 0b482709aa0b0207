use std::borrow::Cow;

use super::record::*;
use crate::models::{ChoiceExplanation, StructuredNote};
use crate::normalizer::PillarNormalizer;

/// Opening of every choice-explanation section header, e.g. `【選択肢2】`.
pub(crate) const SECTION_MARKER_PREFIX: &str = "【選択肢";
/// Replacement written in place of the marker prefix inside free text.
pub(crate) const ESCAPED_MARKER_PREFIX: &str = "［選択肢";
pub(crate) const CORRECT_STATUS: &str = "✓ 正解";
pub(crate) const INCORRECT_STATUS: &str = "✗ 不正解";
pub(crate) const SUCCESS_GLYPH: char = '✓';
pub(crate) const LEARNING_POINT_SEPARATOR: &str = "\n• ";

pub(super) fn encode(note: &StructuredNote) -> ExternalRecord {
    let mut record = ExternalRecord::new();

    record.insert(
        QUESTION_TEXT,
        PropertyValue::Title(note.question_text.clone()),
    );
    record.insert(
        CHOICES,
        PropertyValue::RichText(encode_choices(&note.choices)),
    );
    record.insert(
        CORRECT_ANSWER,
        PropertyValue::Number(note.correct_answer.primary().map(|n| n as f64)),
    );
    record.insert(
        CORRECT_CHOICE_TEXT,
        PropertyValue::RichText(note.correct_choice_text.clone()),
    );
    record.insert(
        EXPLANATION,
        PropertyValue::RichText(note.explanation.clone()),
    );
    record.insert(
        RELATED_SERVICES,
        PropertyValue::MultiSelect(note.related_services.iter().cloned().collect()),
    );
    record.insert(
        WELL_ARCHITECTED_CATEGORY,
        PropertyValue::MultiSelect(
            PillarNormalizer::normalize_all(&note.well_architected_categories)
                .into_iter()
                .collect(),
        ),
    );
    record.insert(
        CHOICE_EXPLANATIONS,
        PropertyValue::RichText(encode_choice_explanations(&note.choice_explanations)),
    );
    record.insert(
        LEARNING_POINTS,
        PropertyValue::RichText(encode_learning_points(&note.learning_points)),
    );

    if let Some(diagram) = non_empty(note.architecture_diagram.as_deref()) {
        record.insert(
            ARCHITECTURE_DIAGRAM,
            PropertyValue::RichText(diagram.to_string()),
        );
    }
    if let Some(hint) = non_empty(note.similar_questions_hint.as_deref()) {
        record.insert(
            SIMILAR_QUESTIONS_HINT,
            PropertyValue::RichText(hint.to_string()),
        );
    }

    record
}

/// Renders choices as `"1. <text>"` lines joined by newlines.
pub(crate) fn encode_choices(choices: &[String]) -> String {
    choices
        .iter()
        .enumerate()
        .map(|(i, choice)| format!("{}. {}", i + 1, choice))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Renders one section per explanation, ordered by choice number and
/// separated by a blank line.
pub(crate) fn encode_choice_explanations(entries: &[ChoiceExplanation]) -> String {
    let mut ordered: Vec<&ChoiceExplanation> = entries.iter().collect();
    ordered.sort_by_key(|entry| entry.choice_number);

    ordered
        .into_iter()
        .map(|entry| {
            let status = if entry.is_correct {
                CORRECT_STATUS
            } else {
                INCORRECT_STATUS
            };
            // The choice text occupies exactly one line of the section.
            let choice_text = escape_markers(&entry.choice_text).replace('\n', " ");
            format!(
                "{SECTION_MARKER_PREFIX}{}】{status}\n{choice_text}\n{}",
                entry.choice_number,
                escape_markers(&entry.explanation)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Joins learning points with `"\n• "`. The first point carries no bullet.
pub(crate) fn encode_learning_points(points: &[String]) -> String {
    points.join(LEARNING_POINT_SEPARATOR)
}

/// Rewrites section-marker openings inside free text so they cannot be
/// mistaken for section boundaries on decode.
pub(crate) fn escape_markers(text: &str) -> Cow<'_, str> {
    if text.contains(SECTION_MARKER_PREFIX) {
        Cow::Owned(text.replace(SECTION_MARKER_PREFIX, ESCAPED_MARKER_PREFIX))
    } else {
        Cow::Borrowed(text)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}
