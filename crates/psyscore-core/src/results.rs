//! Scoring result types.
//!
//! A [`ScoreResult`] is a pure function of (instrument, answers, context).
//! Every collection in it is ordered, so identical inputs serialize to
//! identical bytes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::ScoreRange;

/// The outcome of scoring one answer set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Instrument id.
    pub instrument: String,
    /// Formula that produced the headline score.
    pub formula: String,
    /// Headline score (raw or formula-specific).
    pub total: f64,
    /// Headline score mapped onto 0–100, when meaningful.
    #[serde(default)]
    pub normalized: Option<f64>,
    /// Number of answered questions that were scored.
    pub answered: usize,
    /// Qualitative band of the headline score.
    #[serde(default)]
    pub range: Option<ScoreRange>,
    /// Per-dimension breakdown, in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dimensions: Vec<DimensionScore>,
    /// Clinical composite indices.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinical: Option<ClinicalIndices>,
    /// Advisory flags raised by specific answers. Never affect numbers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alerts: Vec<Alert>,
    /// Headline score remapped into another domain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remap: Option<RemapOutcome>,
    /// Calibrated user vector used for archetype matching.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub profile: BTreeMap<String, f64>,
    /// Ranked archetype matches, best first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub archetypes: Vec<ArchetypeMatch>,
}

impl ScoreResult {
    /// An empty result carrying only the headline score.
    pub fn new(instrument: impl Into<String>, formula: impl Into<String>, total: f64) -> Self {
        Self {
            instrument: instrument.into(),
            formula: formula.into(),
            total,
            normalized: None,
            answered: 0,
            range: None,
            dimensions: Vec::new(),
            clinical: None,
            alerts: Vec::new(),
            remap: None,
            profile: BTreeMap::new(),
            archetypes: Vec::new(),
        }
    }

    /// Look up a dimension score by id.
    pub fn dimension(&self, id: &str) -> Option<&DimensionScore> {
        self.dimensions.iter().find(|d| d.id == id)
    }

    /// The best archetype match, if any.
    pub fn top_match(&self) -> Option<&ArchetypeMatch> {
        self.archetypes.first()
    }

    /// Qualitative level of the headline score.
    pub fn level(&self) -> Option<&str> {
        self.range.as_ref().map(|r| r.level.as_str())
    }
}

/// Score of a single dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionScore {
    pub id: String,
    pub name: String,
    /// Reversal-corrected sum of answered members.
    pub raw: f64,
    /// Answered member count.
    pub answered: usize,
    /// Declared member count.
    pub size: usize,
    /// `raw / size`.
    pub mean: f64,
    /// `raw` mapped onto 0–100 and clamped.
    pub normalized: f64,
    pub weight: f64,
    #[serde(default)]
    pub band: Option<ScoreRange>,
}

/// Clinical composite indices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalIndices {
    /// Mean over all answered items.
    pub mean_all: f64,
    /// Items at or above the positivity threshold.
    pub positive_count: usize,
    /// Total divided by the positive count (0 when nothing is positive).
    pub positive_mean: f64,
    #[serde(default)]
    pub mean_band: Option<ScoreRange>,
    pub screening_positive: bool,
}

/// An advisory raised by a specific answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub question: String,
    pub value: f64,
    pub severity: String,
    pub message: String,
}

/// The headline score after a nonlinear remap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemapOutcome {
    pub label: String,
    pub value: f64,
    #[serde(default)]
    pub category: Option<ScoreRange>,
    /// Caller-supplied reference value.
    #[serde(default)]
    pub reference: Option<f64>,
    /// `value - reference`.
    #[serde(default)]
    pub difference: Option<f64>,
    #[serde(default)]
    pub difference_band: Option<ScoreRange>,
}

/// One ranked archetype.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchetypeMatch {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub subtitle: String,
    /// Similarity in `[0, 1]`.
    pub similarity: f64,
    /// The archetype's reference point.
    pub vector: BTreeMap<String, f64>,
}
