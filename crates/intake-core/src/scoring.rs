//! LLN scoring engine.
//!
//! Scoring is a pure function over a question bank and a response set: no
//! side effects, no failure modes. Unanswered questions simply score zero;
//! required-field validation belongs to the input-collection phase, not
//! here.

use std::collections::BTreeMap;

use chrono::Utc;

use crate::bank::QuestionBank;
use crate::model::{Answer, Question, Rating, ResponseKind, ResponseSet, ScoreResult, Section};

/// Overall percentage at and above which a student is eligible to enroll.
pub const ELIGIBILITY_THRESHOLD: u8 = 60;

/// Score a completed response set against a bank.
///
/// Each question contributes exactly one point to its section's
/// denominator and to the overall denominator. Percentages are rounded to
/// the nearest integer.
pub fn score(bank: &QuestionBank, responses: &ResponseSet) -> ScoreResult {
    let mut earned: BTreeMap<Section, u32> = BTreeMap::new();
    let mut totals: BTreeMap<Section, u32> = BTreeMap::new();
    let mut earned_overall = 0u32;

    for question in bank.questions() {
        *totals.entry(question.section).or_default() += 1;
        if credit(question, responses.answer(&question.id)) {
            *earned.entry(question.section).or_default() += 1;
            earned_overall += 1;
        }
    }

    let per_section = totals
        .iter()
        .map(|(&section, &total)| {
            let earned = earned.get(&section).copied().unwrap_or(0);
            (section, percentage(earned, total))
        })
        .collect();

    let overall = percentage(earned_overall, bank.len() as u32);

    ScoreResult {
        per_section,
        overall,
        rating: rating_for(overall),
        eligible: overall >= ELIGIBILITY_THRESHOLD,
        completed_at: Utc::now(),
    }
}

/// Whether a single answer earns the question's point.
fn credit(question: &Question, answer: Option<&Answer>) -> bool {
    let Some(answer) = answer else {
        return false;
    };
    if answer.is_blank() {
        return false;
    }

    match &question.kind {
        // Free-text comprehension checks are deliberately lenient: the
        // expected answer is credited on case-insensitive containment, not
        // exact match.
        ResponseKind::Text {
            expected: Some(expected),
        } => match answer {
            Answer::Text(text) => text.to_lowercase().contains(&expected.to_lowercase()),
            Answer::Selection(_) => false,
        },
        // Numeric and single-choice expected answers require exact string
        // equality ("15.0" does not match "15").
        ResponseKind::Number {
            expected: Some(expected),
        } => answer
            .as_single()
            .is_some_and(|value| value.trim() == expected),
        ResponseKind::SingleChoice {
            expected: Some(expected),
            ..
        } => answer.as_single().is_some_and(|value| value == expected),
        // Open-ended and demographic questions score presence, not
        // correctness; the non-blank check above already passed.
        ResponseKind::Text { expected: None }
        | ResponseKind::Number { expected: None }
        | ResponseKind::Email
        | ResponseKind::SingleChoice { expected: None, .. }
        | ResponseKind::MultiChoice { .. } => true,
    }
}

fn percentage(earned: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    (100.0 * earned as f64 / total as f64).round() as u8
}

/// The rating ladder. Comparisons are evaluated in the stated order and
/// the first match wins, so 40, 60, and 80 land in the bucket above.
pub fn rating_for(overall: u8) -> Rating {
    if overall < 40 {
        Rating::NeedsSignificantSupport
    } else if overall < 60 {
        Rating::NeedsSomeSupport
    } else if overall < 80 {
        Rating::Good
    } else {
        Rating::Excellent
    }
}
