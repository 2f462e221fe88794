//! psyscore-core: instrument model, scoring pipeline, and archetype matcher.
//!
//! This crate defines the data model, the [`FormulaPlugin`] seam, the
//! generic scoring pipeline, and the [`ScoringEngine`] that dispatches
//! between them. Scoring is pure and synchronous: no I/O, clocks, or
//! randomness once a [`Catalog`] has been loaded.

pub mod aggregate;
pub mod alerts;
pub mod archetype;
pub mod catalog;
pub mod classify;
pub mod dimension;
pub mod engine;
pub mod error;
pub mod model;
pub mod normalize;
pub mod parser;
pub mod pipeline;
pub mod remap;
pub mod results;
pub mod traits;
pub mod validate;

#[cfg(test)]
mod testing;

pub use catalog::Catalog;
pub use engine::{EngineConfig, ScoringEngine};
pub use error::ScoringError;
pub use model::{Answers, Instrument};
pub use results::ScoreResult;
pub use traits::{FormulaPlugin, ScoreContext};
