//! Nonlinear remap of a bounded score into another domain.
//!
//! `output = offset + span * (score / input_max) ^ exponent`, optionally
//! rounded, then clamped. The output is classified into its own categories,
//! and a caller-supplied reference value is classified by the signed
//! difference `output - reference`.

use crate::classify::classify;
use crate::error::ScoringError;
use crate::model::RemapPolicy;
use crate::normalize::guarded_div;
use crate::results::RemapOutcome;

/// The remapped value alone.
pub fn remap_value(policy: &RemapPolicy, score: f64) -> f64 {
    let ratio = guarded_div(score, policy.input_max).max(0.0);
    let mut value = policy.offset + policy.span * ratio.powf(policy.exponent);
    if policy.round {
        value = value.round();
    }
    if let Some(clamp) = policy.clamp {
        value = value.clamp(clamp.min, clamp.max);
    }
    value
}

/// Remap `score` and classify the result.
pub fn apply(
    policy: &RemapPolicy,
    score: f64,
    reference: Option<f64>,
) -> Result<RemapOutcome, ScoringError> {
    let value = remap_value(policy, score);

    let category = policy
        .categories
        .as_ref()
        .map(|table| classify(table, value).map(Clone::clone))
        .transpose()
        .map_err(|e| e.in_table(format!("{} categories", policy.label)))?;

    let difference = reference.map(|r| value - r);
    let difference_band = match (&policy.reference_bands, difference) {
        (Some(table), Some(diff)) => Some(
            classify(table, diff)
                .map_err(|e| e.in_table(format!("{} reference bands", policy.label)))?
                .clone(),
        ),
        _ => None,
    };

    Ok(RemapOutcome {
        label: policy.label.clone(),
        value,
        category,
        reference,
        difference,
        difference_band,
    })
}
