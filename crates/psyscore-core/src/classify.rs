//! Range classification.
//!
//! Maps a score onto the first band of a [`RangeTable`] that admits it,
//! honouring the table's interval convention. Open-ended tables extend their
//! outer bands without limit; otherwise a score outside every band is a
//! configuration defect and is reported, never clamped.

use crate::error::ScoringError;
use crate::model::{Bounds, RangeTable, ScoreRange, ValueRange};

const EDGE_EPSILON: f64 = 1e-9;

/// Find the band containing `score`.
pub fn classify(table: &RangeTable, score: f64) -> Result<&ScoreRange, ScoringError> {
    let last = table.bands.len().saturating_sub(1);
    table
        .bands
        .iter()
        .enumerate()
        .find(|(i, band)| {
            admits(table.bounds, band, score, *i == 0, *i == last)
                || (table.open_ended && overhangs(band, score, *i == 0, *i == last))
        })
        .map(|(_, band)| band)
        .ok_or_else(|| ScoringError::RangeCoverageGap {
            table: "score ranges".into(),
            score,
        })
}

fn admits(bounds: Bounds, band: &ScoreRange, score: f64, first: bool, last: bool) -> bool {
    match bounds {
        Bounds::Closed => score >= band.min && score <= band.max,
        Bounds::LowerClosed => {
            score >= band.min && (score < band.max || (last && score <= band.max))
        }
        Bounds::UpperClosed => {
            (score > band.min || (first && score >= band.min)) && score <= band.max
        }
    }
}

fn overhangs(band: &ScoreRange, score: f64, first: bool, last: bool) -> bool {
    (first && score < band.min) || (last && score > band.max)
}

/// Structural problems of a table: ordering, overlaps, gaps, and (when
/// `span` is given) coverage of the declared score range.
pub fn table_problems(table: &RangeTable, span: Option<ValueRange>) -> Vec<String> {
    let mut problems = Vec::new();

    if table.bands.is_empty() {
        problems.push("table declares no bands".to_string());
        return problems;
    }

    for band in &table.bands {
        if band.min > band.max {
            problems.push(format!(
                "band '{}' has min {} above max {}",
                band.level, band.min, band.max
            ));
        }
    }

    for pair in table.bands.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        if next.min < prev.min {
            problems.push(format!(
                "band '{}' is not sorted after '{}'",
                next.level, prev.level
            ));
            continue;
        }

        let step = next.min - prev.max;
        match table.bounds {
            Bounds::Closed => {
                if step <= 0.0 {
                    problems.push(format!(
                        "bands '{}' and '{}' overlap at {}",
                        prev.level, next.level, next.min
                    ));
                } else if step > table.resolution + EDGE_EPSILON {
                    problems.push(format!(
                        "gap between '{}' ({}) and '{}' ({})",
                        prev.level, prev.max, next.level, next.min
                    ));
                }
            }
            Bounds::LowerClosed | Bounds::UpperClosed => {
                if step < -EDGE_EPSILON {
                    problems.push(format!(
                        "bands '{}' and '{}' overlap between {} and {}",
                        prev.level, next.level, next.min, prev.max
                    ));
                } else if step > EDGE_EPSILON {
                    problems.push(format!(
                        "gap between '{}' ({}) and '{}' ({})",
                        prev.level, prev.max, next.level, next.min
                    ));
                }
            }
        }
    }

    if let (Some(span), Some(covered)) = (span, table.span()) {
        if covered.min > span.min + EDGE_EPSILON {
            problems.push(format!(
                "bands start at {} but scores reach down to {}",
                covered.min, span.min
            ));
        }
        if covered.max < span.max - EDGE_EPSILON {
            problems.push(format!(
                "bands end at {} but scores reach up to {}",
                covered.max, span.max
            ));
        }
    }

    problems
}
