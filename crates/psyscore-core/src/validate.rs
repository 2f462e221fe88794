//! Load-time instrument validation.
//!
//! Everything that can be checked without answers is checked here, once,
//! so that scoring never has to second-guess the catalog.

use std::collections::HashSet;
use std::fmt;

use crate::classify::table_problems;
use crate::dimension::reachable_bounds;
use crate::model::{
    BandBasis, Bounds, Instrument, Question, QuestionKind, RangeTable, ValueRange,
    WEIGHTED_BLEND_FORMULA,
};

const WEIGHT_EPSILON: f64 = 1e-9;
const EDGE_EPSILON: f64 = 1e-9;

/// How serious a validation finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    /// Rejects the catalog.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A problem found in an instrument definition.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    pub instrument: String,
    /// Question, dimension, or table the issue is about.
    pub subject: Option<String>,
    pub severity: Severity,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.subject {
            Some(subject) => write!(
                f,
                "{} [{}] {}: {}",
                self.severity, self.instrument, subject, self.message
            ),
            None => write!(f, "{} [{}] {}", self.severity, self.instrument, self.message),
        }
    }
}

struct Findings<'a> {
    instrument: &'a str,
    issues: Vec<ValidationIssue>,
}

impl<'a> Findings<'a> {
    fn push(&mut self, severity: Severity, subject: Option<&str>, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            instrument: self.instrument.to_string(),
            subject: subject.map(String::from),
            severity,
            message: message.into(),
        });
    }

    fn error(&mut self, subject: &str, message: impl Into<String>) {
        self.push(Severity::Error, Some(subject), message);
    }

    fn warn(&mut self, subject: &str, message: impl Into<String>) {
        self.push(Severity::Warning, Some(subject), message);
    }

    /// Structural table problems, plus closed-table gaps when the scored
    /// value is not always a whole number.
    fn table(
        &mut self,
        subject: &str,
        table: &RangeTable,
        span: Option<ValueRange>,
        integral: bool,
    ) {
        for problem in table_problems(table, span) {
            self.error(subject, problem);
        }
        if integral || table.bounds != Bounds::Closed {
            return;
        }
        for pair in table.bands.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            let step = next.min - prev.max;
            if step > EDGE_EPSILON && step <= table.resolution + EDGE_EPSILON {
                self.error(
                    subject,
                    format!(
                        "fractional scores between '{}' ({}) and '{}' ({}) fall in no band; \
                         declare lower_closed or upper_closed bounds",
                        prev.level, prev.max, next.level, next.min
                    ),
                );
            }
        }
    }
}

fn whole_valued<'q>(questions: impl IntoIterator<Item = &'q Question>) -> bool {
    questions
        .into_iter()
        .flat_map(|q| &q.options)
        .all(|o| o.value.fract() == 0.0)
}

/// Whether every headline score the instrument produces is a whole number.
fn integral_headline(instrument: &Instrument) -> bool {
    let likert = instrument
        .questions
        .iter()
        .filter(|q| q.kind == QuestionKind::Likert);
    instrument.scoring.precision == 0 && whole_valued(likert)
}

/// Check an instrument for structural problems.
///
/// Errors make the instrument unusable; warnings flag definitions that
/// score but probably do not mean what their author intended.
pub fn validate_instrument(instrument: &Instrument) -> Vec<ValidationIssue> {
    let mut findings = Findings {
        instrument: &instrument.id,
        issues: Vec::new(),
    };

    check_questions(instrument, &mut findings);
    check_dimensions(instrument, &mut findings);
    check_scoring(instrument, &mut findings);
    check_alerts(instrument, &mut findings);
    check_remap(instrument, &mut findings);
    check_matching(instrument, &mut findings);

    findings.issues
}

fn check_questions(instrument: &Instrument, findings: &mut Findings<'_>) {
    if instrument.questions.is_empty() {
        findings.push(Severity::Error, None, "instrument has no questions");
    }

    let matching_dims: HashSet<&str> = instrument
        .matching
        .iter()
        .flat_map(|m| m.dimensions.iter().map(String::as_str))
        .collect();

    let mut seen = HashSet::new();
    for question in &instrument.questions {
        let id = question.id.as_str();
        if !seen.insert(id) {
            findings.error(id, "duplicate question id");
        }
        if question.options.is_empty() {
            findings.error(id, "question has no options");
        }

        let mut values = HashSet::new();
        for option in &question.options {
            if !values.insert(option.value.to_bits()) {
                findings.warn(id, format!("option value {} is declared twice", option.value));
            }
            if question.kind == QuestionKind::Choice
                && option.scores.is_empty()
                && question.dimension.is_none()
            {
                findings.warn(id, format!("choice option {} scores nothing", option.value));
            }
        }

        if let Some(tag) = &question.dimension {
            if instrument.dimension(tag).is_none() && !matching_dims.contains(tag.as_str()) {
                findings.warn(id, format!("tagged with unknown dimension '{tag}'"));
            }
        }
    }
}

fn check_dimensions(instrument: &Instrument, findings: &mut Findings<'_>) {
    let mut seen = HashSet::new();
    for dimension in &instrument.dimensions {
        let id = dimension.id.as_str();
        if !seen.insert(id) {
            findings.error(id, "duplicate dimension id");
        }
        for member in &dimension.questions {
            if instrument.question(member).is_none() {
                findings.error(id, format!("unknown member question '{member}'"));
            }
        }
        let members = instrument.members(dimension);
        if members.is_empty() {
            findings.warn(id, "dimension has no member questions");
        }
        if dimension.weight < 0.0 {
            findings.error(id, format!("negative weight {}", dimension.weight));
        }

        if let Some(table) = instrument.bands_for(dimension) {
            let span = match instrument.basis_for(dimension) {
                BandBasis::Raw => Some(reachable_bounds(instrument, dimension)),
                BandBasis::Mean if members.is_empty() => None,
                BandBasis::Mean => Some(ValueRange::new(
                    members.iter().map(|q| q.min_value()).fold(f64::INFINITY, f64::min),
                    members
                        .iter()
                        .map(|q| q.max_value())
                        .fold(f64::NEG_INFINITY, f64::max),
                )),
                BandBasis::Normalized => Some(ValueRange::new(0.0, 100.0)),
            };
            let integral = instrument.basis_for(dimension) == BandBasis::Raw
                && whole_valued(members.iter().copied());
            findings.table(&format!("dimension '{id}' bands"), table, span, integral);
        }
    }

    let target = instrument.scoring.weight_total.or(
        (instrument.formula_id() == WEIGHTED_BLEND_FORMULA).then_some(1.0),
    );
    if let Some(expected) = target {
        let sum: f64 = instrument.dimensions.iter().map(|d| d.weight).sum();
        if (sum - expected).abs() > WEIGHT_EPSILON {
            findings.push(
                Severity::Error,
                None,
                format!("dimension weights sum to {sum}, expected {expected}"),
            );
        }
    }
}

fn check_scoring(instrument: &Instrument, findings: &mut Findings<'_>) {
    let scale = instrument.scoring.scale;
    if scale.min > scale.max {
        findings.error("scale", format!("min {} is above max {}", scale.min, scale.max));
    }
    if let Some(table) = &instrument.scoring.ranges {
        findings.table("score ranges", table, Some(scale), integral_headline(instrument));
    }

    if let Some(clinical) = &instrument.clinical {
        if let Some(table) = &clinical.mean_bands {
            let item_span = item_span(instrument);
            findings.table("clinical mean bands", table, item_span, false);
        }
    }
}

/// Smallest and largest value any single likert item can take.
fn item_span(instrument: &Instrument) -> Option<ValueRange> {
    let likert: Vec<_> = instrument
        .questions
        .iter()
        .filter(|q| q.kind == QuestionKind::Likert && !q.options.is_empty())
        .collect();
    if likert.is_empty() {
        return None;
    }
    Some(ValueRange::new(
        likert.iter().map(|q| q.min_value()).fold(f64::INFINITY, f64::min),
        likert.iter().map(|q| q.max_value()).fold(f64::NEG_INFINITY, f64::max),
    ))
}

fn check_alerts(instrument: &Instrument, findings: &mut Findings<'_>) {
    for rule in &instrument.alerts {
        if instrument.question(&rule.question).is_none() {
            findings.error(&rule.question, "alert refers to an unknown question");
        }
    }
}

fn check_remap(instrument: &Instrument, findings: &mut Findings<'_>) {
    let Some(remap) = &instrument.remap else {
        return;
    };
    if remap.input_max <= 0.0 {
        findings.error(
            &remap.label,
            format!("input_max must be positive, got {}", remap.input_max),
        );
    }
    if let Some(table) = &remap.categories {
        findings.table(
            &format!("{} categories", remap.label),
            table,
            remap.clamp,
            remap.round,
        );
    }
    if let Some(table) = &remap.reference_bands {
        findings.table(&format!("{} reference bands", remap.label), table, None, false);
    }
}

fn check_matching(instrument: &Instrument, findings: &mut Findings<'_>) {
    let Some(policy) = &instrument.matching else {
        if !instrument.archetypes.is_empty() {
            findings.push(
                Severity::Warning,
                None,
                "archetypes are declared but there is no matching policy",
            );
        }
        return;
    };

    if policy.dimensions.is_empty() {
        findings.error("matching", "no matcher dimensions");
    }
    if (policy.choice_weight + policy.anchor_weight - 1.0).abs() > WEIGHT_EPSILON {
        findings.error(
            "matching",
            format!(
                "choice_weight + anchor_weight must be 1, got {}",
                policy.choice_weight + policy.anchor_weight
            ),
        );
    }
    if policy.anchor_steps < 2 {
        findings.error("matching", "anchor_steps must be at least 2");
    }
    for dimension in &policy.dimensions {
        let reachable = policy.max_possible.get(dimension).copied().unwrap_or(0.0);
        if reachable <= 0.0 {
            findings.warn(
                dimension,
                "no choice option scores this dimension; its raw component is always 0",
            );
        }
    }

    if instrument.archetypes.is_empty() {
        findings.error("matching", "archetype catalog is empty");
    }
    let mut seen = HashSet::new();
    for profile in &instrument.archetypes {
        if !seen.insert(profile.id.as_str()) {
            findings.warn(&profile.id, "duplicate archetype id");
        }
        for dimension in &policy.dimensions {
            match profile.vector.get(dimension) {
                None => findings.error(&profile.id, format!("missing coordinate '{dimension}'")),
                Some(v) if !(0.0..=1.0).contains(v) => findings.error(
                    &profile.id,
                    format!("coordinate '{dimension}' = {v} is outside [0, 1]"),
                ),
                Some(_) => {}
            }
        }
    }
}

/// Whether any issue rejects the instrument.
pub fn has_errors(issues: &[ValidationIssue]) -> bool {
    issues.iter().any(|i| i.severity == Severity::Error)
}
