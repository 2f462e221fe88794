//! Archetype matcher.
//!
//! Four stages, each usable on its own:
//!
//! 1. [`accumulate_raw`] sums option contribution vectors over answered
//!    forced-choice items.
//! 2. [`calibrate_anchors`] rescales each anchor item onto `[0, 1]`.
//! 3. [`blend`] mixes the max-possible-normalized raw sums with the anchors.
//! 4. [`match_archetypes`] ranks the catalog by similarity and keeps the top k.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::aggregate::aggregate;
use crate::error::ScoringError;
use crate::model::{
    Accumulation, Answers, ArchetypeProfile, Instrument, MatchingPolicy, QuestionKind,
    SimilarityMetric,
};
use crate::normalize::guarded_div;
use crate::results::ArchetypeMatch;

/// Per-dimension sums over answered choice items.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTally {
    pub sums: BTreeMap<String, f64>,
    /// Number of answered choice items.
    pub answered: usize,
}

/// Stage 1: sum contribution vectors of the chosen options.
///
/// Fails with `InsufficientData` when no choice item was answered, so an
/// empty answer set never lands on the all-zero archetype.
pub fn accumulate_raw(
    instrument: &Instrument,
    answers: &Answers,
) -> Result<RawTally, ScoringError> {
    let mut tally = RawTally::default();

    for question in instrument
        .questions
        .iter()
        .filter(|q| q.kind == QuestionKind::Choice)
    {
        let Some(value) = answers.get(&question.id) else {
            continue;
        };
        let option = question
            .option(value)
            .ok_or_else(|| ScoringError::InvalidAnswer {
                question: question.id.clone(),
                value,
            })?;
        for (dimension, score) in option.contributions(question.dimension.as_deref()) {
            *tally.sums.entry(dimension).or_insert(0.0) += score;
        }
        tally.answered += 1;
    }

    if tally.answered == 0 {
        return Err(ScoringError::InsufficientData {
            instrument: instrument.id.clone(),
            reason: "no forced-choice answers".into(),
        });
    }

    Ok(tally)
}

/// Largest raw total each dimension can reach: for every choice item, the
/// biggest positive contribution any single option offers that dimension.
pub fn max_possible(instrument: &Instrument) -> BTreeMap<String, f64> {
    let mut totals = BTreeMap::new();

    for question in instrument
        .questions
        .iter()
        .filter(|q| q.kind == QuestionKind::Choice)
    {
        let mut best: BTreeMap<String, f64> = BTreeMap::new();
        for option in &question.options {
            for (dimension, score) in option.contributions(question.dimension.as_deref()) {
                let slot = best.entry(dimension).or_insert(0.0);
                if score > *slot {
                    *slot = score;
                }
            }
        }
        for (dimension, score) in best {
            *totals.entry(dimension).or_insert(0.0) += score;
        }
    }

    totals
}

/// Stage 2: `(value - 1) / (steps - 1)` per anchor dimension, or the
/// policy default when the anchor is unanswered.
///
/// An answer that is not one of the anchor's options, or lies outside
/// `1..=anchor_steps`, is an `InvalidAnswer`.
pub fn calibrate_anchors(
    instrument: &Instrument,
    policy: &MatchingPolicy,
    answers: &Answers,
) -> Result<BTreeMap<String, f64>, ScoringError> {
    let steps = f64::from(policy.anchor_steps);
    let span = steps - 1.0;

    policy
        .dimensions
        .iter()
        .map(|dimension| {
            let anchor = instrument.questions.iter().find(|q| {
                q.kind == QuestionKind::Anchor
                    && q.dimension.as_deref() == Some(dimension.as_str())
            });
            let answered = anchor.and_then(|q| answers.get(&q.id).map(|v| (q, v)));
            let value = match answered {
                Some((question, v)) => {
                    if question.option(v).is_none() || !(1.0..=steps).contains(&v) {
                        return Err(ScoringError::InvalidAnswer {
                            question: question.id.clone(),
                            value: v,
                        });
                    }
                    guarded_div(v - 1.0, span)
                }
                None => policy.anchor_default,
            };
            Ok((dimension.clone(), value))
        })
        .collect()
}

/// Stage 3: `alpha * clamp(raw / max, 0, 1) + beta * anchor` per dimension,
/// in policy dimension order.
pub fn blend(
    raw: &RawTally,
    anchors: &BTreeMap<String, f64>,
    policy: &MatchingPolicy,
) -> Vec<f64> {
    policy
        .dimensions
        .iter()
        .map(|dimension| {
            let sum = raw.sums.get(dimension).copied().unwrap_or(0.0);
            let max = policy.max_possible.get(dimension).copied().unwrap_or(0.0);
            let relative = guarded_div(sum, max).clamp(0.0, 1.0);
            let anchor = anchors
                .get(dimension)
                .copied()
                .unwrap_or(policy.anchor_default);
            policy.choice_weight * relative + policy.anchor_weight * anchor
        })
        .collect()
}

/// Average contribution vector over answered choice items, for catalogs
/// whose option vectors already live on the archetype scale.
pub fn mean_vector(raw: &RawTally, policy: &MatchingPolicy) -> Vec<f64> {
    policy
        .dimensions
        .iter()
        .map(|d| guarded_div(raw.sums.get(d).copied().unwrap_or(0.0), raw.answered as f64))
        .collect()
}

/// Check the answers, run stages 1–3, and return the user vector in
/// policy dimension order.
pub fn user_vector(
    instrument: &Instrument,
    policy: &MatchingPolicy,
    answers: &Answers,
) -> Result<Vec<f64>, ScoringError> {
    // required answers and option membership, before any stage runs
    aggregate(instrument, answers)?;

    let raw = accumulate_raw(instrument, answers)?;
    let vector = match policy.accumulation {
        Accumulation::Anchored => {
            let anchors = calibrate_anchors(instrument, policy, answers)?;
            blend(&raw, &anchors, policy)
        }
        Accumulation::Mean => mean_vector(&raw, policy),
    };
    tracing::debug!(instrument = %instrument.id, ?vector, "calibrated user vector");
    Ok(vector)
}

// ---------------------------------------------------------------------------
// Similarity metrics
// ---------------------------------------------------------------------------

fn squared_distance(u: &[f64], a: &[f64]) -> f64 {
    u.iter().zip(a).map(|(x, y)| (x - y).powi(2)).sum()
}

/// `1 - ||u - a|| / sqrt(n)`, clamped to `[0, 1]`.
pub fn euclidean_similarity(u: &[f64], a: &[f64]) -> f64 {
    let n = u.len().min(a.len());
    if n == 0 {
        return 0.0;
    }
    let distance = guarded_div(squared_distance(u, a).sqrt(), (n as f64).sqrt());
    (1.0 - distance).clamp(0.0, 1.0)
}

/// Cosine similarity; 0 when either vector has zero magnitude.
pub fn cosine_similarity(u: &[f64], a: &[f64]) -> f64 {
    let dot: f64 = u.iter().zip(a).map(|(x, y)| x * y).sum();
    let norm_u = u.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    guarded_div(dot, norm_u * norm_a)
}

/// `0.5 * cosine + 0.5 * euclidean`.
pub fn hybrid_similarity(u: &[f64], a: &[f64]) -> f64 {
    (0.5 * cosine_similarity(u, a) + 0.5 * euclidean_similarity(u, a)).clamp(0.0, 1.0)
}

/// `1 / (1 + sqrt(sum w_i (u_i - a_i)^2))`.
pub fn weighted_inverse_similarity(u: &[f64], a: &[f64], weights: &[f64]) -> f64 {
    let distance: f64 = u
        .iter()
        .zip(a)
        .zip(weights)
        .map(|((x, y), w)| w * (x - y).powi(2))
        .sum::<f64>()
        .sqrt();
    1.0 / (1.0 + distance)
}

/// Similarity of `u` to `a` under the policy's metric.
pub fn similarity(policy: &MatchingPolicy, u: &[f64], a: &[f64]) -> f64 {
    match policy.metric {
        SimilarityMetric::Euclidean => euclidean_similarity(u, a),
        SimilarityMetric::Hybrid => hybrid_similarity(u, a),
        SimilarityMetric::WeightedInverse => {
            let weights: Vec<f64> = policy.dimensions.iter().map(|d| policy.weight(d)).collect();
            weighted_inverse_similarity(u, a, &weights)
        }
    }
}

/// Stage 4: rank the catalog by similarity to `user`, best first.
///
/// The sort is stable, so ties keep catalog declaration order.
pub fn match_archetypes(
    user: &[f64],
    catalog: &[ArchetypeProfile],
    policy: &MatchingPolicy,
    k: usize,
) -> Vec<ArchetypeMatch> {
    let mut matches: Vec<ArchetypeMatch> = catalog
        .iter()
        .map(|profile| ArchetypeMatch {
            id: profile.id.clone(),
            name: profile.name.clone(),
            subtitle: profile.subtitle.clone(),
            similarity: similarity(policy, user, &profile.point(&policy.dimensions)),
            vector: profile.vector.clone(),
        })
        .collect();

    matches.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(Ordering::Equal)
    });
    matches.truncate(k);
    matches
}
