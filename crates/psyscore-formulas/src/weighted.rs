//! Weighted mean of normalized dimensions.

use psyscore_core::normalize::{guarded_div, round_to};
use psyscore_core::pipeline::classify_headline;
use psyscore_core::{Answers, FormulaPlugin, Instrument, ScoreContext, ScoreResult, ScoringError};

use crate::blend::dimension_scores;

pub const WEIGHTED_MEAN: &str = "weighted_mean";

/// `total = sum(normalized_i * weight_i) / sum(weight_i)`.
///
/// Unlike [`WeightedBlend`](crate::WeightedBlend) the weights are relative
/// and need not sum to 1.
#[derive(Debug, Default, Clone, Copy)]
pub struct WeightedMean;

impl FormulaPlugin for WeightedMean {
    fn id(&self) -> &str {
        WEIGHTED_MEAN
    }

    fn description(&self) -> &str {
        "weight-normalized mean of per-dimension scores"
    }

    fn compute(
        &self,
        instrument: &Instrument,
        answers: &Answers,
        _ctx: &ScoreContext,
    ) -> Result<ScoreResult, ScoringError> {
        let (answered, dimensions) = dimension_scores(instrument, answers)?;

        let weighted: f64 = dimensions.iter().map(|d| d.normalized * d.weight).sum();
        let weights: f64 = dimensions.iter().map(|d| d.weight).sum();
        let total = round_to(guarded_div(weighted, weights), instrument.scoring.precision);

        let mut result = ScoreResult::new(&instrument.id, WEIGHTED_MEAN, total);
        result.answered = answered;
        result.normalized = Some(total);
        result.range = classify_headline(instrument, total)?;
        result.dimensions = dimensions;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use psyscore_core::parser::parse_instrument_str;
    use std::path::Path;

    const MATURITY_TOML: &str = r#"
[instrument]
id = "maturity"
name = "Maturity"
formula = "weighted_mean"
options = "uneven"

[option_sets]
uneven = [
    { value = 0, label = "Never" },
    { value = 0.5, label = "Rarely" },
    { value = 1, label = "Sometimes" },
    { value = 1.5, label = "Often" },
    { value = 2.5, label = "Always" },
]

[scoring]
scale = { min = 0, max = 100 }
precision = 1

[[dimensions]]
id = "steady"
name = "Steady"
weight = 1.4

[[dimensions]]
id = "open"
name = "Open"
weight = 0.7

[[questions]]
id = "p1"
prompt = "I stay composed."
dimension = "steady"

[[questions]]
id = "p2"
prompt = "I lash out when criticised."
dimension = "steady"
reversed = true

[[questions]]
id = "p3"
prompt = "I seek out other views."
dimension = "open"
"#;

    fn maturity() -> Instrument {
        parse_instrument_str(MATURITY_TOML, Path::new("maturity.toml")).unwrap()
    }

    #[test]
    fn weights_are_relative() {
        let instrument = maturity();
        // steady: 2.5 + (2.5 - 0) = 5 of [0, 5] -> 100; open: 0 of [0, 2.5] -> 0
        let answers = Answers::new().with("p1", 2.5).with("p2", 0.0).with("p3", 0.0);
        let result = WeightedMean
            .compute(&instrument, &answers, &ScoreContext::default())
            .unwrap();
        assert_eq!(result.dimension("steady").unwrap().normalized, 100.0);
        assert_eq!(result.dimension("open").unwrap().normalized, 0.0);
        // (100 * 1.4 + 0 * 0.7) / 2.1
        assert_eq!(result.total, 66.7);
        assert!(result.range.is_none());
    }

    #[test]
    fn uneven_scale_reverses_about_its_own_midpoint() {
        let instrument = maturity();
        let answers = Answers::new().with("p1", 1.0).with("p2", 1.5).with("p3", 1.0);
        let result = WeightedMean
            .compute(&instrument, &answers, &ScoreContext::default())
            .unwrap();
        // p2 reversed: 2.5 - 1.5 = 1.0
        assert_eq!(result.dimension("steady").unwrap().raw, 2.0);
        assert_eq!(result.dimension("steady").unwrap().normalized, 40.0);
        assert_eq!(result.dimension("open").unwrap().normalized, 40.0);
        assert_eq!(result.total, 40.0);
    }

    #[test]
    fn zero_weights_do_not_divide_by_zero() {
        let mut instrument = maturity();
        for dimension in &mut instrument.dimensions {
            dimension.weight = 0.0;
        }
        let answers = Answers::new().with("p1", 2.5).with("p2", 0.0).with("p3", 2.5);
        let result = WeightedMean
            .compute(&instrument, &answers, &ScoreContext::default())
            .unwrap();
        assert_eq!(result.total, 0.0);
    }
}
