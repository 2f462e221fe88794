//! Synthetic instruments shared by unit tests.

use std::collections::BTreeMap;

use crate::model::{
    ArchetypeProfile, BandBasis, Bounds, Dimension, Instrument, Question, QuestionKind,
    QuestionOption, RangeTable, ScoreRange, ScoringMethod, ScoringPolicy, ValueRange,
};

pub fn band(min: f64, max: f64, level: &str) -> ScoreRange {
    ScoreRange {
        min,
        max,
        level: level.into(),
        description: String::new(),
        color: None,
        suggestions: vec![],
    }
}

pub fn table(bounds: Bounds, bands: &[(f64, f64, &str)]) -> RangeTable {
    RangeTable {
        bounds,
        resolution: 1.0,
        open_ended: false,
        bands: bands.iter().map(|(lo, hi, l)| band(*lo, *hi, l)).collect(),
    }
}

pub fn options(values: &[f64]) -> Vec<QuestionOption> {
    values
        .iter()
        .map(|v| QuestionOption {
            value: *v,
            label: v.to_string(),
            scores: BTreeMap::new(),
        })
        .collect()
}

pub fn likert(id: &str, dimension: Option<&str>) -> Question {
    Question {
        id: id.into(),
        prompt: format!("statement {id}"),
        kind: QuestionKind::Likert,
        options: options(&[1.0, 2.0, 3.0, 4.0, 5.0]),
        reversed: false,
        required: true,
        dimension: dimension.map(String::from),
    }
}

pub fn dimension(id: &str, questions: &[&str]) -> Dimension {
    Dimension {
        id: id.into(),
        name: id.to_uppercase(),
        description: String::new(),
        questions: questions.iter().map(|q| q.to_string()).collect(),
        weight: 1.0,
        range: None,
        bands: None,
        basis: None,
    }
}

pub fn instrument(id: &str, questions: Vec<Question>, scale: ValueRange) -> Instrument {
    Instrument {
        id: id.into(),
        name: id.to_uppercase(),
        description: String::new(),
        questions,
        dimensions: vec![],
        scoring: ScoringPolicy {
            method: ScoringMethod::Sum,
            scale,
            precision: 0,
            ranges: None,
            dimension_bands: None,
            dimension_basis: BandBasis::Normalized,
            weight_total: None,
        },
        formula: None,
        alerts: vec![],
        clinical: None,
        remap: None,
        matching: None,
        archetypes: vec![],
    }
}

/// `n` five-point items `q1..qn`; ids in `reversed` are reverse-scored.
pub fn likert_instrument(n: usize, reversed: &[&str]) -> Instrument {
    let questions = (1..=n)
        .map(|i| {
            let mut q = likert(&format!("q{i}"), None);
            q.reversed = reversed.contains(&q.id.as_str());
            q
        })
        .collect();
    instrument(
        "likert",
        questions,
        ValueRange::new(n as f64, 5.0 * n as f64),
    )
}

/// Two items on the uneven 0 / 0.5 / 1 / 1.5 / 2.5 scale, the second reversed.
pub fn pat_style_instrument() -> Instrument {
    let opts = options(&[0.0, 0.5, 1.0, 1.5, 2.5]);
    let p1 = Question {
        options: opts.clone(),
        ..likert("p1", Some("maturity"))
    };
    let p2 = Question {
        options: opts,
        reversed: true,
        ..likert("p2", Some("maturity"))
    };
    instrument("pat_style", vec![p1, p2], ValueRange::new(0.0, 100.0))
}

/// Forced-choice option carrying a single-dimension score.
pub fn choice_option(value: f64, dimension: &str, score: f64) -> QuestionOption {
    QuestionOption {
        value,
        label: format!("option {value}"),
        scores: BTreeMap::from([(dimension.to_string(), score)]),
    }
}

pub fn choice(id: &str, dimension: &str, scores: &[f64]) -> Question {
    Question {
        id: id.into(),
        prompt: format!("choose {id}"),
        kind: QuestionKind::Choice,
        options: scores
            .iter()
            .enumerate()
            .map(|(i, s)| choice_option((i + 1) as f64, dimension, *s))
            .collect(),
        reversed: false,
        required: false,
        dimension: None,
    }
}

pub fn anchor(id: &str, dimension: &str) -> Question {
    Question {
        kind: QuestionKind::Anchor,
        required: false,
        ..likert(id, Some(dimension))
    }
}

pub fn archetype(id: &str, point: &[(&str, f64)]) -> ArchetypeProfile {
    ArchetypeProfile {
        id: id.into(),
        name: id.replace('_', " "),
        subtitle: String::new(),
        traits: vec![],
        vector: point.iter().map(|(d, v)| (d.to_string(), *v)).collect(),
    }
}
