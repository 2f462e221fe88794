//! Core trait definitions for scoring formulas.
//!
//! The generic pipeline in this crate implements [`FormulaPlugin`]; the
//! bespoke formulas live in `psyscore-formulas`.

use crate::error::ScoringError;
use crate::model::{Answers, Instrument};
use crate::results::ScoreResult;

// ---------------------------------------------------------------------------
// Scoring context
// ---------------------------------------------------------------------------

/// Per-call inputs that are not part of the instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreContext {
    /// Caller-supplied reference for remap difference bands (e.g. actual age).
    pub reference: Option<f64>,
    /// How many archetype matches to keep.
    pub top_k: usize,
}

impl Default for ScoreContext {
    fn default() -> Self {
        Self {
            reference: None,
            top_k: 3,
        }
    }
}

impl ScoreContext {
    pub fn with_reference(mut self, reference: f64) -> Self {
        self.reference = Some(reference);
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }
}

// ---------------------------------------------------------------------------
// Formula plugin trait
// ---------------------------------------------------------------------------

/// A scoring algorithm that turns an answer set into a result.
///
/// Implementations must be pure: the same instrument, answers, and context
/// always produce the same result.
pub trait FormulaPlugin: Send + Sync {
    /// Identifier instruments use to select this formula.
    fn id(&self) -> &str;

    /// One-line description for listings.
    fn description(&self) -> &str {
        ""
    }

    /// Score an answer set.
    fn compute(
        &self,
        instrument: &Instrument,
        answers: &Answers,
        ctx: &ScoreContext,
    ) -> Result<ScoreResult, ScoringError>;
}
