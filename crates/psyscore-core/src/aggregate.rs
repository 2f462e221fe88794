//! Raw aggregation: answers to per-question contributions.

use crate::error::ScoringError;
use crate::model::{Answers, Instrument, QuestionKind};

/// The reversal-corrected value of one answered question.
#[derive(Debug, Clone, PartialEq)]
pub struct Contribution {
    pub question: String,
    /// Dimension tag of the question, if any.
    pub dimension: Option<String>,
    /// The submitted answer.
    pub value: f64,
    /// What the answer adds to sums: `value`, or its reversal.
    pub contribution: f64,
}

/// Flip `value` about the midpoint of `[min, max]`.
pub fn reverse(value: f64, min: f64, max: f64) -> f64 {
    (max + min) - value
}

/// Turn an answer set into per-question contributions, in question order.
///
/// Likert items are scored; choice and anchor items belong to the archetype
/// matcher and are only checked for presence and validity. Unanswered
/// optional questions are skipped so they never enter an average's
/// denominator.
pub fn aggregate(
    instrument: &Instrument,
    answers: &Answers,
) -> Result<Vec<Contribution>, ScoringError> {
    let mut contributions = Vec::with_capacity(instrument.questions.len());

    for question in &instrument.questions {
        let Some(value) = answers.get(&question.id) else {
            if question.required {
                return Err(ScoringError::MissingRequiredAnswer {
                    instrument: instrument.id.clone(),
                    question: question.id.clone(),
                });
            }
            continue;
        };

        if question.option(value).is_none() {
            return Err(ScoringError::InvalidAnswer {
                question: question.id.clone(),
                value,
            });
        }

        if question.kind != QuestionKind::Likert {
            continue;
        }

        let contribution = if question.reversed {
            reverse(value, question.min_value(), question.max_value())
        } else {
            value
        };

        contributions.push(Contribution {
            question: question.id.clone(),
            dimension: question.dimension.clone(),
            value,
            contribution,
        });
    }

    Ok(contributions)
}

/// Sum of all contributions.
pub fn total(contributions: &[Contribution]) -> f64 {
    contributions.iter().map(|c| c.contribution).sum()
}
