use std::collections::BTreeSet;
use std::sync::LazyLock;

use log::warn;
use regex::Regex;

use super::encode::{LEARNING_POINT_SEPARATOR, SUCCESS_GLYPH};
use super::record::*;
use crate::models::{ChoiceExplanation, CorrectAnswer, StructuredNote};
use crate::normalizer::PillarNormalizer;

static SECTION_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"【選択肢(\d+)】").expect("section marker pattern is valid"));

/// The exact prefix `encode_choices` writes.
static CHOICE_NUMBER_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\. ").expect("choice prefix pattern is valid"));

/// Hand-edited numbering such as `" 2.EBS"`.
static LOOSE_CHOICE_NUMBER_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+\.\s*").expect("loose choice prefix pattern is valid"));

/// Separator `encode_choice_explanations` writes between sections.
const SECTION_SEPARATOR: &str = "\n\n";

pub(super) fn decode(record: &ExternalRecord) -> Option<StructuredNote> {
    let question_text = record.text(QUESTION_TEXT).unwrap_or_default();
    if question_text.trim().is_empty() {
        warn!("skipping record without question text");
        return None;
    }

    let choices = decode_choices(record.text(CHOICES).unwrap_or_default());
    if choices.is_empty() {
        warn!("skipping record with empty choice list: {}", preview(question_text));
        return None;
    }

    let Some(primary) = correct_answer_in_range(record.number(CORRECT_ANSWER), choices.len())
    else {
        warn!(
            "skipping record with missing or out-of-range correct answer {:?} ({} choices): {}",
            record.number(CORRECT_ANSWER),
            choices.len(),
            preview(question_text)
        );
        return None;
    };

    let parsed =
        parse_choice_explanations(record.text(CHOICE_EXPLANATIONS).unwrap_or_default(), &choices);

    let mut correct_answer = CorrectAnswer::single(primary);
    for entry in parsed.iter().filter(|entry| entry.is_correct) {
        correct_answer.insert(entry.choice_number);
    }

    let choice_explanations = if parsed.is_empty() {
        ChoiceExplanation::synthesize(&choices, &correct_answer)
    } else {
        complete_explanations(parsed, &choices, &correct_answer)
    };

    Some(StructuredNote {
        question_text: question_text.to_string(),
        correct_answer,
        correct_choice_text: text_or_empty(record, CORRECT_CHOICE_TEXT),
        explanation: text_or_empty(record, EXPLANATION),
        related_services: record.tags(RELATED_SERVICES).iter().cloned().collect(),
        well_architected_categories: PillarNormalizer::normalize_all(
            record.tags(WELL_ARCHITECTED_CATEGORY),
        ),
        choice_explanations,
        learning_points: decode_learning_points(record.text(LEARNING_POINTS).unwrap_or_default()),
        architecture_diagram: optional_text(record, ARCHITECTURE_DIAGRAM),
        similar_questions_hint: optional_text(record, SIMILAR_QUESTIONS_HINT),
        choices,
    })
}

/// Inverse of the numbered choice-list format. Blank lines are dropped.
///
/// Only the `"<n>. "` prefix is removed from encoded lines, so whitespace
/// that belongs to the choice itself survives. Lines without that exact
/// prefix are read leniently and trimmed.
pub(crate) fn decode_choices(block: &str) -> Vec<String> {
    block
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| match CHOICE_NUMBER_PREFIX.find(line) {
            Some(prefix) => line[prefix.end()..].to_string(),
            None => LOOSE_CHOICE_NUMBER_PREFIX
                .replace(line, "")
                .trim_end()
                .to_string(),
        })
        .filter(|choice| !choice.trim().is_empty())
        .collect()
}

/// Splits on `"\n• "`, trims each point and drops empties.
pub(crate) fn decode_learning_points(block: &str) -> Vec<String> {
    block
        .split(LEARNING_POINT_SEPARATOR)
        .map(|point| point.trim())
        .map(|point| point.strip_prefix('•').map(str::trim_start).unwrap_or(point))
        .filter(|point| !point.is_empty())
        .map(String::from)
        .collect()
}

/// Parses marker-delimited sections.
///
/// The choice number of each section comes from matching its choice text
/// against `choices`; the number inside the marker is only used when no
/// unclaimed choice matches. Entries take their choice text from `choices`.
/// Explanations are kept byte for byte apart from the separator between
/// sections. Sections that resolve to no choice are dropped.
pub(crate) fn parse_choice_explanations(block: &str, choices: &[String]) -> Vec<ChoiceExplanation> {
    let markers: Vec<(usize, usize, Option<usize>)> = SECTION_MARKER
        .captures_iter(block)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some((whole.start(), whole.end(), caps[1].parse().ok()))
        })
        .collect();

    let mut claimed = BTreeSet::new();
    let mut entries = Vec::new();

    for (i, &(_, body_start, marker_number)) in markers.iter().enumerate() {
        let body = match markers.get(i + 1) {
            Some(&(next_start, _, _)) => {
                let raw = &block[body_start..next_start];
                raw.strip_suffix(SECTION_SEPARATOR)
                    .unwrap_or_else(|| raw.trim_end_matches('\n'))
            }
            None => &block[body_start..],
        };

        let mut parts = body.splitn(3, '\n');
        let (Some(status), Some(choice_line)) = (parts.next(), parts.next()) else {
            continue;
        };
        let explanation = parts.next().unwrap_or_default();

        let choice_number = match_choice(choice_line.trim(), choices, &claimed).or_else(|| {
            marker_number.filter(|n| (1..=choices.len()).contains(n) && !claimed.contains(n))
        });
        let Some(choice_number) = choice_number else {
            warn!("choice explanation for {choice_line:?} matches no choice; dropping it");
            continue;
        };
        claimed.insert(choice_number);

        entries.push(ChoiceExplanation::new(
            choice_number,
            choices[choice_number - 1].clone(),
            status.contains(SUCCESS_GLYPH),
            explanation,
        ));
    }

    entries
}

/// Finds the 1-indexed choice for `text`: an exact match first, then a
/// substring match in either direction. Already claimed choices are skipped.
fn match_choice(text: &str, choices: &[String], claimed: &BTreeSet<usize>) -> Option<usize> {
    if text.is_empty() {
        return None;
    }
    let candidates: Vec<(usize, &str)> = choices
        .iter()
        .enumerate()
        .map(|(i, choice)| (i + 1, choice.trim()))
        .filter(|(n, _)| !claimed.contains(n))
        .collect();

    candidates
        .iter()
        .find(|(_, choice)| *choice == text)
        .or_else(|| {
            candidates.iter().find(|(_, choice)| {
                !choice.is_empty() && (choice.contains(text) || text.contains(choice))
            })
        })
        .map(|(n, _)| *n)
}

/// Backfills choices no section covered, orders by choice number and makes
/// every correctness flag agree with the answer set.
fn complete_explanations(
    mut entries: Vec<ChoiceExplanation>,
    choices: &[String],
    answer: &CorrectAnswer,
) -> Vec<ChoiceExplanation> {
    let covered: BTreeSet<usize> = entries.iter().map(|entry| entry.choice_number).collect();
    for (i, choice) in choices.iter().enumerate() {
        if !covered.contains(&(i + 1)) {
            entries.push(ChoiceExplanation::new(i + 1, choice.clone(), false, ""));
        }
    }

    entries.sort_by_key(|entry| entry.choice_number);
    for entry in &mut entries {
        entry.is_correct = answer.contains(entry.choice_number);
    }
    entries
}

fn correct_answer_in_range(value: Option<f64>, choices: usize) -> Option<usize> {
    let value = value?;
    if value.fract() != 0.0 || value < 1.0 || value > choices as f64 {
        return None;
    }
    Some(value as usize)
}

fn text_or_empty(record: &ExternalRecord, name: &str) -> String {
    record.text(name).unwrap_or_default().to_string()
}

fn optional_text(record: &ExternalRecord, name: &str) -> Option<String> {
    record
        .text(name)
        .filter(|text| !text.trim().is_empty())
        .map(String::from)
}

fn preview(text: &str) -> String {
    text.chars().take(40).collect()
}
