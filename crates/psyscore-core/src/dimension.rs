//! Dimension aggregation and per-dimension scoring.

use crate::aggregate::Contribution;
use crate::classify::classify;
use crate::error::ScoringError;
use crate::model::{BandBasis, Dimension, Instrument, ValueRange};
use crate::normalize::{guarded_div, normalize_between};
use crate::results::DimensionScore;

/// Raw aggregate of one dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionTally {
    pub id: String,
    /// Sum of answered, reversal-corrected member contributions.
    pub raw: f64,
    pub answered: usize,
    /// Declared member count.
    pub size: usize,
    /// Theoretical raw bounds.
    pub bounds: ValueRange,
}

/// Dimension id to raw aggregate, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreVector(Vec<DimensionTally>);

impl ScoreVector {
    pub fn get(&self, id: &str) -> Option<&DimensionTally> {
        self.0.iter().find(|t| t.id == id)
    }

    pub fn raw(&self, id: &str) -> Option<f64> {
        self.get(id).map(|t| t.raw)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DimensionTally> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Normalization bounds of a dimension: the declared override, or the
/// reachable raw sums.
///
/// An override narrower than the reachable sums saturates: raw scores past
/// it normalize to 0 or 100.
pub fn dimension_bounds(instrument: &Instrument, dimension_id: &str) -> Option<ValueRange> {
    let dimension = instrument.dimension(dimension_id)?;
    Some(
        dimension
            .range
            .unwrap_or_else(|| reachable_bounds(instrument, dimension)),
    )
}

/// Sums of the member questions' option minima and maxima.
pub fn reachable_bounds(instrument: &Instrument, dimension: &Dimension) -> ValueRange {
    let members = instrument.members(dimension);
    ValueRange::new(
        members.iter().map(|q| q.min_value()).sum(),
        members.iter().map(|q| q.max_value()).sum(),
    )
}

/// Group contributions by dimension.
pub fn by_dimension(instrument: &Instrument, contributions: &[Contribution]) -> ScoreVector {
    let tallies = instrument
        .dimensions
        .iter()
        .map(|dimension| {
            let members = instrument.members(dimension);
            let mut raw = 0.0;
            let mut answered = 0;
            for c in contributions {
                if members.iter().any(|q| q.id == c.question) {
                    raw += c.contribution;
                    answered += 1;
                }
            }
            DimensionTally {
                id: dimension.id.clone(),
                raw,
                answered,
                size: members.len(),
                bounds: dimension_bounds(instrument, &dimension.id)
                    .unwrap_or(ValueRange::new(0.0, 0.0)),
            }
        })
        .collect();
    ScoreVector(tallies)
}

/// Normalize every dimension and classify it against its band table.
pub fn score_dimensions(
    instrument: &Instrument,
    vector: &ScoreVector,
) -> Result<Vec<DimensionScore>, ScoringError> {
    instrument
        .dimensions
        .iter()
        .zip(vector.iter())
        .map(|(dimension, tally)| {
            let normalized = normalize_between(tally.raw, tally.bounds.min, tally.bounds.max);
            let mean = guarded_div(tally.raw, tally.size as f64);

            let band = match instrument.bands_for(dimension) {
                Some(table) => {
                    let value = match instrument.basis_for(dimension) {
                        BandBasis::Raw => tally.raw,
                        BandBasis::Mean => mean,
                        BandBasis::Normalized => normalized,
                    };
                    let band = classify(table, value)
                        .map_err(|e| e.in_table(format!("dimension '{}'", dimension.id)))?;
                    Some(band.clone())
                }
                None => None,
            };

            Ok(DimensionScore {
                id: dimension.id.clone(),
                name: dimension.name.clone(),
                raw: tally.raw,
                answered: tally.answered,
                size: tally.size,
                mean,
                normalized,
                weight: dimension.weight,
                band,
            })
        })
        .collect()
}
