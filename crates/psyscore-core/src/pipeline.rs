//! The generic pipeline: aggregate, group, normalize, classify.
//!
//! Used for every instrument that does not name a formula plugin.

use crate::aggregate::{aggregate, total};
use crate::classify::classify;
use crate::dimension::{by_dimension, score_dimensions};
use crate::error::ScoringError;
use crate::model::{Answers, Instrument, ScoreRange, ScoringMethod, GENERIC_FORMULA};
use crate::normalize::{guarded_div, normalize_between, round_to};
use crate::results::ScoreResult;
use crate::traits::{FormulaPlugin, ScoreContext};

/// Plain sum or average over all answered items.
#[derive(Debug, Default, Clone, Copy)]
pub struct GenericPipeline;

impl FormulaPlugin for GenericPipeline {
    fn id(&self) -> &str {
        GENERIC_FORMULA
    }

    fn description(&self) -> &str {
        "sum or average of item values, classified by range"
    }

    fn compute(
        &self,
        instrument: &Instrument,
        answers: &Answers,
        _ctx: &ScoreContext,
    ) -> Result<ScoreResult, ScoringError> {
        let contributions = aggregate(instrument, answers)?;
        let sum = total(&contributions);
        let headline = match instrument.scoring.method {
            ScoringMethod::Sum => sum,
            ScoringMethod::Average => guarded_div(sum, contributions.len() as f64),
        };
        let headline = round_to(headline, instrument.scoring.precision);

        let vector = by_dimension(instrument, &contributions);

        let mut result = ScoreResult::new(&instrument.id, GENERIC_FORMULA, headline);
        result.answered = contributions.len();
        result.normalized = Some(normalize_between(
            headline,
            instrument.scoring.scale.min,
            instrument.scoring.scale.max,
        ));
        result.dimensions = score_dimensions(instrument, &vector)?;
        result.range = classify_headline(instrument, headline)?;
        Ok(result)
    }
}

/// Classify a headline score against the instrument's ranges, if it has any.
pub fn classify_headline(
    instrument: &Instrument,
    score: f64,
) -> Result<Option<ScoreRange>, ScoringError> {
    match &instrument.scoring.ranges {
        Some(table) => classify(table, score)
            .map(|r| Some(r.clone()))
            .map_err(|e| e.in_table(format!("'{}' score ranges", instrument.id))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Bounds;
    use crate::testing::{dimension, likert_instrument, table};

    fn four_items() -> Instrument {
        let mut instrument = likert_instrument(4, &[]);
        instrument.scoring.ranges = Some(table(
            Bounds::Closed,
            &[(4.0, 9.0, "low"), (10.0, 15.0, "medium"), (16.0, 20.0, "high")],
        ));
        instrument
    }

    fn all(value: f64) -> Answers {
        (1..=4).map(|i| (format!("q{i}"), value)).collect()
    }

    #[test]
    fn four_item_scenarios() {
        let instrument = four_items();
        let ctx = ScoreContext::default();

        let high = GenericPipeline.compute(&instrument, &all(5.0), &ctx).unwrap();
        assert_eq!(high.total, 20.0);
        assert_eq!(high.normalized, Some(100.0));
        assert_eq!(high.level(), Some("high"));

        let low = GenericPipeline.compute(&instrument, &all(1.0), &ctx).unwrap();
        assert_eq!(low.total, 4.0);
        assert_eq!(low.normalized, Some(0.0));
        assert_eq!(low.level(), Some("low"));

        let mid = GenericPipeline.compute(&instrument, &all(3.0), &ctx).unwrap();
        assert_eq!(mid.total, 12.0);
        assert_eq!(mid.normalized, Some(50.0));
        assert_eq!(mid.level(), Some("medium"));
        assert_eq!(mid.answered, 4);
    }

    #[test]
    fn average_excludes_unanswered_optional_items() {
        let mut instrument = likert_instrument(3, &[]);
        instrument.scoring.method = ScoringMethod::Average;
        instrument.scoring.scale = crate::model::ValueRange::new(1.0, 5.0);
        instrument.scoring.precision = 2;
        instrument.questions[2].required = false;

        let answers = Answers::new().with("q1", 4.0).with("q2", 5.0);
        let result = GenericPipeline
            .compute(&instrument, &answers, &ScoreContext::default())
            .unwrap();
        assert_eq!(result.total, 4.5);
        assert_eq!(result.answered, 2);
        assert!(result.range.is_none());
    }

    #[test]
    fn dimensions_ride_along() {
        let mut instrument = four_items();
        instrument.dimensions = vec![
            dimension("first", &["q1", "q2"]),
            dimension("second", &["q3", "q4"]),
        ];
        let answers = Answers::new()
            .with("q1", 5.0)
            .with("q2", 5.0)
            .with("q3", 1.0)
            .with("q4", 1.0);
        let result = GenericPipeline
            .compute(&instrument, &answers, &ScoreContext::default())
            .unwrap();
        assert_eq!(result.dimension("first").unwrap().normalized, 100.0);
        assert_eq!(result.dimension("second").unwrap().normalized, 0.0);
    }

    #[test]
    fn headline_gap_is_reported() {
        let mut instrument = likert_instrument(4, &[]);
        instrument.scoring.ranges = Some(table(Bounds::Closed, &[(4.0, 9.0, "low")]));
        let err = GenericPipeline
            .compute(&instrument, &all(5.0), &ScoreContext::default())
            .unwrap_err();
        assert!(matches!(err, ScoringError::RangeCoverageGap { .. }));
    }
}
