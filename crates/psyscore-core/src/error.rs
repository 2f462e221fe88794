//! Scoring error types.
//!
//! Every failure a scoring call can surface to its caller. None of these are
//! fatal to the process: the caller decides whether to reject the submission,
//! retry, or degrade (for example by dropping the archetype section).

use thiserror::Error;

/// Errors that can occur while scoring or classifying against an instrument.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoringError {
    /// No instrument with this id exists in the catalog.
    #[error("unknown instrument: {0}")]
    UnknownInstrument(String),

    /// The instrument names a formula that has no registered implementation.
    #[error("instrument '{instrument}' uses unregistered formula '{formula}'")]
    UnknownFormula { instrument: String, formula: String },

    /// A required question was left unanswered.
    #[error("missing required answer for question '{question}' in '{instrument}'")]
    MissingRequiredAnswer { instrument: String, question: String },

    /// An answer value is not one of the question's declared option values.
    #[error("answer {value} is not a declared option of question '{question}'")]
    InvalidAnswer { question: String, value: f64 },

    /// A score fell outside every declared range of a table.
    #[error("score {score} is not covered by any range in {table}")]
    RangeCoverageGap { table: String, score: f64 },

    /// The instrument declares no range table to classify against.
    #[error("instrument '{0}' declares no score ranges")]
    NoRanges(String),

    /// Archetype matching could not build a meaningful vector.
    #[error("insufficient data for '{instrument}': {reason}")]
    InsufficientData { instrument: String, reason: String },
}

impl ScoringError {
    /// Returns `true` if the error is caused by the submitted answers rather
    /// than by the instrument definition.
    pub fn is_caller_fault(&self) -> bool {
        matches!(
            self,
            ScoringError::MissingRequiredAnswer { .. }
                | ScoringError::InvalidAnswer { .. }
                | ScoringError::InsufficientData { .. }
        )
    }

    /// Returns `true` if the error points at a defect in the catalog itself.
    pub fn is_configuration_defect(&self) -> bool {
        matches!(
            self,
            ScoringError::RangeCoverageGap { .. }
                | ScoringError::UnknownFormula { .. }
                | ScoringError::NoRanges(_)
        )
    }

    /// Attach a table label to a coverage gap raised by a bare classifier.
    pub fn in_table(self, label: impl Into<String>) -> Self {
        match self {
            ScoringError::RangeCoverageGap { score, .. } => ScoringError::RangeCoverageGap {
                table: label.into(),
                score,
            },
            other => other,
        }
    }
}
