//! Threshold-triggered advisories.

use crate::model::{Answers, Instrument};
use crate::results::Alert;

/// Raise every alert whose question was answered at or above its cutoff.
///
/// Compares the submitted value, before any reversal.
pub fn evaluate(instrument: &Instrument, answers: &Answers) -> Vec<Alert> {
    instrument
        .alerts
        .iter()
        .filter_map(|rule| {
            let value = answers.get(&rule.question)?;
            (value >= rule.at_least).then(|| Alert {
                question: rule.question.clone(),
                value,
                severity: rule.severity.clone(),
                message: rule.message.clone(),
            })
        })
        .collect()
}
