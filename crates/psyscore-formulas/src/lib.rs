//! psyscore-formulas: bespoke scoring formulas.
//!
//! Implements the `FormulaPlugin` trait for weighted blends, weighted means,
//! clinical composites, and archetype matching, and wires them into a
//! `ScoringEngine` from a `psyscore.toml` configuration.

pub mod archetype;
pub mod blend;
pub mod clinical;
pub mod config;
pub mod weighted;

pub use archetype::ArchetypeFormula;
pub use blend::WeightedBlend;
pub use clinical::ClinicalComposite;
pub use config::{
    build_engine, default_plugins, engine_with_catalog, load_config, load_config_from,
    PsyscoreConfig,
};
pub use weighted::WeightedMean;
