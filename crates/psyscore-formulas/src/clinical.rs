//! Clinical composite: total, global severity, positive-symptom indices,
//! factor means, and a screening flag.
//!
//! | index | definition |
//! |-------|------------|
//! | total | sum of all answered items |
//! | GSI   | total / answered items |
//! | PST   | items at or above the positivity threshold |
//! | PSDI  | total / PST (0 when PST = 0) |
//!
//! Factor scores are dimension means with the dimension size as divisor.

use psyscore_core::aggregate::{aggregate, total};
use psyscore_core::classify::classify;
use psyscore_core::dimension::{by_dimension, score_dimensions};
use psyscore_core::model::ClinicalPolicy;
use psyscore_core::normalize::{guarded_div, normalize_between, round_to};
use psyscore_core::pipeline::classify_headline;
use psyscore_core::results::ClinicalIndices;
use psyscore_core::{Answers, FormulaPlugin, Instrument, ScoreContext, ScoreResult, ScoringError};

pub const CLINICAL_COMPOSITE: &str = "clinical_composite";

/// Symptom-inventory scoring in the style of the SCL-90.
#[derive(Debug, Default, Clone, Copy)]
pub struct ClinicalComposite;

fn default_policy() -> ClinicalPolicy {
    ClinicalPolicy {
        positive_threshold: 2.0,
        total_cutoff: None,
        factor_cutoff: None,
        positive_count_cutoff: None,
        mean_bands: None,
    }
}

impl FormulaPlugin for ClinicalComposite {
    fn id(&self) -> &str {
        CLINICAL_COMPOSITE
    }

    fn description(&self) -> &str {
        "total, GSI, PST, PSDI, factor means, and screening flag"
    }

    fn compute(
        &self,
        instrument: &Instrument,
        answers: &Answers,
        _ctx: &ScoreContext,
    ) -> Result<ScoreResult, ScoringError> {
        let fallback;
        let policy = match &instrument.clinical {
            Some(policy) => policy,
            None => {
                fallback = default_policy();
                &fallback
            }
        };

        let contributions = aggregate(instrument, answers)?;
        if contributions.is_empty() {
            return Err(ScoringError::InsufficientData {
                instrument: instrument.id.clone(),
                reason: "no answered items".into(),
            });
        }

        let sum = total(&contributions);
        let answered = contributions.len();
        let positive_count = contributions
            .iter()
            .filter(|c| c.contribution >= policy.positive_threshold)
            .count();
        let mean_all = round_to(guarded_div(sum, answered as f64), 2);
        let positive_mean = round_to(guarded_div(sum, positive_count as f64), 2);

        let vector = by_dimension(instrument, &contributions);
        let dimensions = score_dimensions(instrument, &vector)?;

        let mean_band = match &policy.mean_bands {
            Some(table) => Some(
                classify(table, mean_all)
                    .map_err(|e| e.in_table("clinical mean bands"))?
                    .clone(),
            ),
            None => None,
        };

        let above_total = policy.total_cutoff.is_some_and(|cutoff| sum > cutoff);
        let factor_hit = policy
            .factor_cutoff
            .is_some_and(|cutoff| dimensions.iter().any(|d| d.mean >= cutoff));
        let many_positive = policy
            .positive_count_cutoff
            .is_some_and(|cutoff| positive_count > cutoff);
        let screening_positive = above_total || factor_hit || many_positive;

        tracing::debug!(
            instrument = %instrument.id,
            total = sum,
            mean_all,
            positive_count,
            screening_positive,
            "clinical indices"
        );

        let mut result = ScoreResult::new(&instrument.id, CLINICAL_COMPOSITE, sum);
        result.answered = answered;
        result.normalized = Some(normalize_between(
            sum,
            instrument.scoring.scale.min,
            instrument.scoring.scale.max,
        ));
        result.range = classify_headline(instrument, sum)?;
        result.dimensions = dimensions;
        result.clinical = Some(ClinicalIndices {
            mean_all,
            positive_count,
            positive_mean,
            mean_band,
            screening_positive,
        });
        Ok(result)
    }
}
