//! Weighted blend of independently normalized dimensions.

use psyscore_core::aggregate::aggregate;
use psyscore_core::dimension::{by_dimension, score_dimensions};
use psyscore_core::normalize::round_to;
use psyscore_core::pipeline::classify_headline;
use psyscore_core::results::DimensionScore;
use psyscore_core::{Answers, FormulaPlugin, Instrument, ScoreContext, ScoreResult, ScoringError};

pub const WEIGHTED_BLEND: &str = psyscore_core::model::WEIGHTED_BLEND_FORMULA;

/// `total = sum(normalized_i * weight_i)`, weights summing to 1.
///
/// Each dimension is normalized against its own bounds and clamped to
/// `[0, 100]` before weighting; the blended total is not clamped again.
/// The catalog rejects blends whose weights do not sum to `scoring.weight_total`
/// (1 when omitted).
#[derive(Debug, Default, Clone, Copy)]
pub struct WeightedBlend;

impl FormulaPlugin for WeightedBlend {
    fn id(&self) -> &str {
        WEIGHTED_BLEND
    }

    fn description(&self) -> &str {
        "weighted sum of per-dimension normalized scores"
    }

    fn compute(
        &self,
        instrument: &Instrument,
        answers: &Answers,
        _ctx: &ScoreContext,
    ) -> Result<ScoreResult, ScoringError> {
        let (answered, dimensions) = dimension_scores(instrument, answers)?;

        let blended: f64 = dimensions.iter().map(|d| d.normalized * d.weight).sum();
        let total = round_to(blended, instrument.scoring.precision);

        let mut result = ScoreResult::new(&instrument.id, WEIGHTED_BLEND, total);
        result.answered = answered;
        result.normalized = Some(total);
        result.range = classify_headline(instrument, total)?;
        result.dimensions = dimensions;
        Ok(result)
    }
}

/// Aggregate, group, and score every dimension; fails when the instrument
/// declares none.
pub(crate) fn dimension_scores(
    instrument: &Instrument,
    answers: &Answers,
) -> Result<(usize, Vec<DimensionScore>), ScoringError> {
    if instrument.dimensions.is_empty() {
        return Err(ScoringError::InsufficientData {
            instrument: instrument.id.clone(),
            reason: "no dimensions to combine".into(),
        });
    }
    let contributions = aggregate(instrument, answers)?;
    let vector = by_dimension(instrument, &contributions);
    let dimensions = score_dimensions(instrument, &vector)?;
    Ok((contributions.len(), dimensions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use psyscore_core::parser::parse_instrument_str;
    use std::path::Path;

    const BLEND_TOML: &str = r#"
[instrument]
id = "blend"
name = "Blend"
formula = "weighted_blend"
options = "five"

[option_sets]
five = [{ value = 1 }, { value = 2 }, { value = 3 }, { value = 4 }, { value = 5 }]
seven = [
    { value = 1 }, { value = 2 }, { value = 3 }, { value = 4 },
    { value = 5 }, { value = 6 }, { value = 7 },
]

[scoring]
scale = { min = 0, max = 100 }
precision = 1
weight_total = 1.0

[scoring.ranges]
bounds = "upper_closed"
bands = [
    { min = 0, max = 50, level = "low" },
    { min = 50, max = 100, level = "high" },
]

[[dimensions]]
id = "short"
name = "Short"
weight = 0.25
questions = ["s1", "s2"]

[[dimensions]]
id = "long"
name = "Long"
weight = 0.75
questions = ["l1", "l2"]

[dimensions.bands]
bounds = "lower_closed"
bands = [
    { min = 0, max = 50, level = "calm" },
    { min = 50, max = 100, level = "strained" },
]

[[questions]]
id = "s1"
prompt = "short one"

[[questions]]
id = "s2"
prompt = "short two"
reversed = true

[[questions]]
id = "l1"
prompt = "long one"
options = "seven"

[[questions]]
id = "l2"
prompt = "long two"
options = "seven"
"#;

    fn blend() -> Instrument {
        parse_instrument_str(BLEND_TOML, Path::new("blend.toml")).unwrap()
    }

    #[test]
    fn total_is_weighted_sum_of_normalized_dimensions() {
        let instrument = blend();
        // short: 5 + (6 - 1) = 10 of [2, 10] -> 100
        // long: 4 + 4 = 8 of [2, 14] -> 50
        let answers = Answers::new()
            .with("s1", 5.0)
            .with("s2", 1.0)
            .with("l1", 4.0)
            .with("l2", 4.0);
        let result = WeightedBlend
            .compute(&instrument, &answers, &ScoreContext::default())
            .unwrap();

        assert_eq!(result.dimension("short").unwrap().normalized, 100.0);
        assert_eq!(result.dimension("long").unwrap().normalized, 50.0);
        assert_eq!(result.total, 62.5);
        assert_eq!(result.level(), Some("high"));
        assert_eq!(
            result.dimension("long").unwrap().band.as_ref().unwrap().level,
            "strained"
        );
        assert_eq!(result.answered, 4);
    }

    #[test]
    fn floor_answers_score_zero() {
        let instrument = blend();
        let answers = Answers::new()
            .with("s1", 1.0)
            .with("s2", 5.0)
            .with("l1", 1.0)
            .with("l2", 1.0);
        let result = WeightedBlend
            .compute(&instrument, &answers, &ScoreContext::default())
            .unwrap();
        assert_eq!(result.total, 0.0);
        assert_eq!(result.level(), Some("low"));
    }

    #[test]
    fn instrument_without_dimensions_is_rejected() {
        let mut instrument = blend();
        instrument.dimensions.clear();
        let err = WeightedBlend
            .compute(&instrument, &Answers::new(), &ScoreContext::default())
            .unwrap_err();
        assert!(matches!(err, ScoringError::InsufficientData { .. }));
    }

    proptest! {
        #[test]
        fn total_stays_on_scale(s1 in 1u8..=5, s2 in 1u8..=5, l1 in 1u8..=7, l2 in 1u8..=7) {
            let answers = Answers::new()
                .with("s1", f64::from(s1))
                .with("s2", f64::from(s2))
                .with("l1", f64::from(l1))
                .with("l2", f64::from(l2));
            let result = WeightedBlend
                .compute(&blend(), &answers, &ScoreContext::default())
                .unwrap();
            let weights: f64 = result.dimensions.iter().map(|d| d.weight).sum();
            let expected: f64 = result.dimensions.iter().map(|d| d.normalized * d.weight).sum();
            prop_assert!((weights - 1.0).abs() < 1e-9);
            prop_assert!((0.0..=100.0).contains(&result.total));
            prop_assert!((result.total - round_to(expected, 1)).abs() < 1e-9);
        }
    }
}
