//! Core data model types for psyscore.
//!
//! An [`Instrument`] is pure data: questions, dimensions, a scoring policy,
//! and the optional policies consumed by formula plugins. Instruments are
//! built once at catalog load time and shared read-only afterwards.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Tolerance used when matching an answer against declared option values.
pub const VALUE_EPSILON: f64 = 1e-9;

/// A named assessment with its questions, dimensions, and scoring policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instrument {
    /// Unique identifier (e.g. "scl90").
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// What the instrument measures.
    #[serde(default)]
    pub description: String,
    /// Questions in presentation order.
    pub questions: Vec<Question>,
    /// Sub-scales, in declaration order.
    #[serde(default)]
    pub dimensions: Vec<Dimension>,
    /// How the headline score is computed and classified.
    pub scoring: ScoringPolicy,
    /// Formula plugin id; `None` selects the generic pipeline.
    #[serde(default)]
    pub formula: Option<String>,
    /// Advisory flags raised by specific answers.
    #[serde(default)]
    pub alerts: Vec<AlertRule>,
    /// Clinical composite parameters.
    #[serde(default)]
    pub clinical: Option<ClinicalPolicy>,
    /// Nonlinear remap of the headline score into another domain.
    #[serde(default)]
    pub remap: Option<RemapPolicy>,
    /// Archetype matcher parameters.
    #[serde(default)]
    pub matching: Option<MatchingPolicy>,
    /// Reference profiles for archetype matching.
    #[serde(default)]
    pub archetypes: Vec<ArchetypeProfile>,
}

impl Instrument {
    /// Look up a question by id.
    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// Look up a dimension by id.
    pub fn dimension(&self, id: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.id == id)
    }

    /// Member questions of a dimension.
    ///
    /// An explicit `questions` list wins; otherwise every question tagged
    /// with the dimension id belongs to it. Unknown ids are skipped here and
    /// reported by catalog validation.
    pub fn members<'a>(&'a self, dimension: &Dimension) -> Vec<&'a Question> {
        if dimension.questions.is_empty() {
            self.questions
                .iter()
                .filter(|q| q.dimension.as_deref() == Some(dimension.id.as_str()))
                .collect()
        } else {
            dimension
                .questions
                .iter()
                .filter_map(|id| self.question(id))
                .collect()
        }
    }

    /// Band basis for a dimension, falling back to the instrument default.
    pub fn basis_for(&self, dimension: &Dimension) -> BandBasis {
        dimension.basis.unwrap_or(self.scoring.dimension_basis)
    }

    /// Band table for a dimension, falling back to the instrument default.
    pub fn bands_for<'a>(&'a self, dimension: &'a Dimension) -> Option<&'a RangeTable> {
        dimension
            .bands
            .as_ref()
            .or(self.scoring.dimension_bands.as_ref())
    }

    /// The formula id this instrument dispatches to.
    pub fn formula_id(&self) -> &str {
        self.formula.as_deref().unwrap_or(GENERIC_FORMULA)
    }
}

/// Formula id of the built-in generic pipeline.
pub const GENERIC_FORMULA: &str = "generic";

/// Formula id whose dimension weights must always sum to 1.
pub const WEIGHTED_BLEND_FORMULA: &str = "weighted_blend";

/// How a question is presented and consumed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    /// Ordinal agreement scale; contributes its (possibly reversed) value.
    #[default]
    Likert,
    /// Forced choice whose options carry per-dimension score vectors.
    Choice,
    /// Ordinal calibration item for one archetype dimension.
    Anchor,
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionKind::Likert => write!(f, "likert"),
            QuestionKind::Choice => write!(f, "choice"),
            QuestionKind::Anchor => write!(f, "anchor"),
        }
    }
}

impl FromStr for QuestionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "likert" | "scale" | "single" => Ok(QuestionKind::Likert),
            "choice" | "forced_choice" => Ok(QuestionKind::Choice),
            "anchor" => Ok(QuestionKind::Anchor),
            other => Err(format!("unknown question kind: {other}")),
        }
    }
}

/// A single question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub prompt: String,
    #[serde(default)]
    pub kind: QuestionKind,
    pub options: Vec<QuestionOption>,
    /// Flip the value about the item midpoint before aggregation.
    #[serde(default)]
    pub reversed: bool,
    #[serde(default = "default_true")]
    pub required: bool,
    /// Dimension tag used when the dimension has no explicit member list,
    /// and as the implicit target of scalar options.
    #[serde(default)]
    pub dimension: Option<String>,
}

impl Question {
    /// Smallest declared option value (0 when there are no options).
    pub fn min_value(&self) -> f64 {
        self.options
            .iter()
            .map(|o| o.value)
            .reduce(f64::min)
            .unwrap_or(0.0)
    }

    /// Largest declared option value (0 when there are no options).
    pub fn max_value(&self) -> f64 {
        self.options
            .iter()
            .map(|o| o.value)
            .reduce(f64::max)
            .unwrap_or(0.0)
    }

    /// The option whose value matches `value`.
    pub fn option(&self, value: f64) -> Option<&QuestionOption> {
        self.options
            .iter()
            .find(|o| (o.value - value).abs() < VALUE_EPSILON)
    }
}

/// One selectable answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionOption {
    /// Canonical numeric value.
    pub value: f64,
    #[serde(default)]
    pub label: String,
    /// Per-dimension contributions; empty for scalar options.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub scores: BTreeMap<String, f64>,
}

impl QuestionOption {
    /// Per-dimension contribution vector.
    ///
    /// A scalar option contributes its value to `dimension`; an untagged
    /// scalar option contributes nothing.
    pub fn contributions(&self, dimension: Option<&str>) -> BTreeMap<String, f64> {
        if !self.scores.is_empty() {
            return self.scores.clone();
        }
        dimension
            .map(|d| BTreeMap::from([(d.to_string(), self.value)]))
            .unwrap_or_default()
    }
}

/// An inclusive numeric interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Which dimension quantity a band table is evaluated on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BandBasis {
    /// Reversal-corrected sum.
    Raw,
    /// Raw sum divided by the dimension size.
    Mean,
    /// Raw sum mapped onto 0–100.
    #[default]
    Normalized,
}

/// A named sub-scale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dimension {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Explicit member question ids; empty means "every tagged question".
    #[serde(default)]
    pub questions: Vec<String>,
    #[serde(default = "default_weight")]
    pub weight: f64,
    /// Normalization bounds override; defaults to the sum of member min/max
    /// values. Raw sums outside it normalize to 0 or 100.
    #[serde(default)]
    pub range: Option<ValueRange>,
    /// Qualitative bands specific to this dimension.
    #[serde(default)]
    pub bands: Option<RangeTable>,
    #[serde(default)]
    pub basis: Option<BandBasis>,
}

fn default_weight() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

/// How the generic pipeline folds contributions into a headline score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringMethod {
    #[default]
    Sum,
    /// Sum divided by the number of answered questions.
    Average,
}

/// Headline scoring parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringPolicy {
    #[serde(default)]
    pub method: ScoringMethod,
    /// Declared range of the headline score.
    pub scale: ValueRange,
    /// Decimal places kept on the headline score.
    #[serde(default)]
    pub precision: u32,
    /// Qualitative bands for the headline score.
    #[serde(default)]
    pub ranges: Option<RangeTable>,
    /// Bands shared by every dimension without its own table.
    #[serde(default)]
    pub dimension_bands: Option<RangeTable>,
    #[serde(default)]
    pub dimension_basis: BandBasis,
    /// Declared sum of dimension weights, checked at load time.
    #[serde(default)]
    pub weight_total: Option<f64>,
}

/// Interval convention for the ranges of a table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bounds {
    /// `[min, max]`; neighbours may be separated by up to `resolution`.
    #[default]
    Closed,
    /// `[min, max)`, with the last range closed.
    LowerClosed,
    /// `(min, max]`, with the first range closed.
    UpperClosed,
}

/// An ordered set of qualitative bands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangeTable {
    #[serde(default)]
    pub bounds: Bounds,
    /// Largest admissible step between closed neighbours.
    #[serde(default = "default_resolution")]
    pub resolution: f64,
    /// The first band also takes every score below it, the last band every
    /// score above it.
    #[serde(default)]
    pub open_ended: bool,
    pub bands: Vec<ScoreRange>,
}

fn default_resolution() -> f64 {
    1.0
}

impl RangeTable {
    /// Lowest and highest score the table covers.
    pub fn span(&self) -> Option<ValueRange> {
        let first = self.bands.first()?;
        let last = self.bands.last()?;
        if self.open_ended {
            return Some(ValueRange::new(f64::NEG_INFINITY, f64::INFINITY));
        }
        Some(ValueRange::new(first.min, last.max))
    }
}

/// A qualitative band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRange {
    pub min: f64,
    pub max: f64,
    pub level: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

/// Raises an advisory when a question is answered at or above a cutoff.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRule {
    pub question: String,
    pub at_least: f64,
    pub message: String,
    #[serde(default = "default_severity")]
    pub severity: String,
}

fn default_severity() -> String {
    "warning".to_string()
}

/// Parameters of the clinical composite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClinicalPolicy {
    /// Items at or above this contribution count as positive.
    #[serde(default = "default_positive_threshold")]
    pub positive_threshold: f64,
    /// Screening is positive when the total exceeds this.
    #[serde(default)]
    pub total_cutoff: Option<f64>,
    /// Screening is positive when any factor mean reaches this.
    #[serde(default)]
    pub factor_cutoff: Option<f64>,
    /// Screening is positive when the positive count exceeds this.
    #[serde(default)]
    pub positive_count_cutoff: Option<usize>,
    /// Bands for the mean-of-all-items index.
    #[serde(default)]
    pub mean_bands: Option<RangeTable>,
}

fn default_positive_threshold() -> f64 {
    2.0
}

/// `output = offset + span * (score / input_max) ^ exponent`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemapPolicy {
    /// Name of the output quantity (e.g. "psychological age").
    #[serde(default = "default_remap_label")]
    pub label: String,
    #[serde(default = "default_input_max")]
    pub input_max: f64,
    #[serde(default)]
    pub offset: f64,
    pub span: f64,
    #[serde(default = "default_exponent")]
    pub exponent: f64,
    /// Round the output to the nearest integer before clamping.
    #[serde(default = "default_true")]
    pub round: bool,
    #[serde(default)]
    pub clamp: Option<ValueRange>,
    /// Bands over the output domain.
    #[serde(default)]
    pub categories: Option<RangeTable>,
    /// Bands over `output - reference`.
    #[serde(default)]
    pub reference_bands: Option<RangeTable>,
}

fn default_remap_label() -> String {
    "remapped".to_string()
}

fn default_input_max() -> f64 {
    100.0
}

fn default_exponent() -> f64 {
    1.0
}

/// Similarity metric used to rank archetypes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMetric {
    /// `1 - ||u - a|| / sqrt(n)`.
    #[default]
    Euclidean,
    /// Even blend of cosine similarity and the euclidean similarity.
    Hybrid,
    /// `1 / (1 + sqrt(sum w_i (u_i - a_i)^2))`.
    WeightedInverse,
}

/// How answered choice items become a user vector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Accumulation {
    /// Raw sums over max-possible, blended with anchor items.
    #[default]
    Anchored,
    /// Average contribution vector over answered choice items.
    Mean,
}

/// Archetype matcher parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingPolicy {
    /// Matcher dimensions, in vector order.
    pub dimensions: Vec<String>,
    #[serde(default)]
    pub metric: SimilarityMetric,
    #[serde(default)]
    pub accumulation: Accumulation,
    /// Weight of the choice-derived component (alpha).
    #[serde(default = "default_choice_weight")]
    pub choice_weight: f64,
    /// Weight of the anchor component (beta).
    #[serde(default = "default_anchor_weight")]
    pub anchor_weight: f64,
    /// Number of points on each anchor scale.
    #[serde(default = "default_anchor_steps")]
    pub anchor_steps: u32,
    /// Calibrated value of an unanswered anchor.
    #[serde(default = "default_anchor_default")]
    pub anchor_default: f64,
    /// Per-dimension weights for the weighted-inverse metric.
    #[serde(default)]
    pub weights: BTreeMap<String, f64>,
    /// Largest achievable raw total per dimension, filled in at load time.
    #[serde(default)]
    pub max_possible: BTreeMap<String, f64>,
}

fn default_choice_weight() -> f64 {
    0.7
}
fn default_anchor_weight() -> f64 {
    0.3
}
fn default_anchor_steps() -> u32 {
    5
}
fn default_anchor_default() -> f64 {
    0.5
}

impl MatchingPolicy {
    /// A policy over `dimensions` with every other field at its default.
    pub fn over<I, S>(dimensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            dimensions: dimensions.into_iter().map(Into::into).collect(),
            metric: SimilarityMetric::default(),
            accumulation: Accumulation::default(),
            choice_weight: default_choice_weight(),
            anchor_weight: default_anchor_weight(),
            anchor_steps: default_anchor_steps(),
            anchor_default: default_anchor_default(),
            weights: BTreeMap::new(),
            max_possible: BTreeMap::new(),
        }
    }

    /// Weight of a dimension for the weighted-inverse metric.
    pub fn weight(&self, dimension: &str) -> f64 {
        self.weights.get(dimension).copied().unwrap_or(1.0)
    }
}

/// A fixed reference point in matcher space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchetypeProfile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub traits: Vec<String>,
    /// Coordinates keyed by dimension id, each in `[0, 1]`.
    pub vector: BTreeMap<String, f64>,
}

impl ArchetypeProfile {
    /// Coordinates aligned to `dimensions`; missing entries read as 0.
    pub fn point(&self, dimensions: &[String]) -> Vec<f64> {
        dimensions
            .iter()
            .map(|d| self.vector.get(d).copied().unwrap_or(0.0))
            .collect()
    }
}

/// A respondent's answers: question id to chosen option value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Answers(BTreeMap<String, f64>);

impl Answers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, question: impl Into<String>, value: f64) -> Self {
        self.0.insert(question.into(), value);
        self
    }

    pub fn insert(&mut self, question: impl Into<String>, value: f64) {
        self.0.insert(question.into(), value);
    }

    pub fn get(&self, question: &str) -> Option<f64> {
        self.0.get(question).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Parse a JSON object of `{"question_id": value}` pairs.
    pub fn from_json(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content)
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for Answers {
    fn from_iter<T: IntoIterator<Item = (S, f64)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}
