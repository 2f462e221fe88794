//! Central scoring engine.
//!
//! Resolves an instrument, dispatches to the formula plugin that owns it,
//! then applies the cross-cutting stages (alerts and remap) that every
//! formula shares.

use std::collections::HashMap;
use std::sync::Arc;

use crate::alerts;
use crate::catalog::Catalog;
use crate::classify::classify;
use crate::error::ScoringError;
use crate::model::{Answers, Instrument, ScoreRange};
use crate::pipeline::GenericPipeline;
use crate::remap;
use crate::results::ScoreResult;
use crate::traits::{FormulaPlugin, ScoreContext};

/// Configuration for the scoring engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Archetype matches kept when the caller does not say otherwise.
    pub top_k: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { top_k: 3 }
    }
}

/// The scoring engine: a validated catalog plus a formula registry.
///
/// Holds no mutable state; share it behind an `Arc` and call it from as
/// many threads as needed.
pub struct ScoringEngine {
    catalog: Arc<Catalog>,
    formulas: HashMap<String, Arc<dyn FormulaPlugin>>,
    overrides: HashMap<String, Arc<dyn FormulaPlugin>>,
    config: EngineConfig,
}

impl ScoringEngine {
    /// An engine with only the generic pipeline registered.
    pub fn new(catalog: Arc<Catalog>, config: EngineConfig) -> Self {
        let mut engine = Self {
            catalog,
            formulas: HashMap::new(),
            overrides: HashMap::new(),
            config,
        };
        engine.register(Arc::new(GenericPipeline));
        engine
    }

    /// Register a formula under its own id, replacing any previous one.
    pub fn register(&mut self, plugin: Arc<dyn FormulaPlugin>) {
        self.formulas.insert(plugin.id().to_string(), plugin);
    }

    /// Route one instrument to `plugin` regardless of its declared formula.
    pub fn register_for(
        &mut self,
        instrument_id: impl Into<String>,
        plugin: Arc<dyn FormulaPlugin>,
    ) {
        self.overrides.insert(instrument_id.into(), plugin);
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Registered formula ids, sorted.
    pub fn formula_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.formulas.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// The context used by [`score`](Self::score).
    pub fn default_context(&self) -> ScoreContext {
        ScoreContext::default().with_top_k(self.config.top_k)
    }

    /// Score an answer set with the default context.
    pub fn score(
        &self,
        instrument_id: &str,
        answers: &Answers,
    ) -> Result<ScoreResult, ScoringError> {
        self.score_with(instrument_id, answers, &self.default_context())
    }

    /// Score an answer set with a caller-supplied context.
    pub fn score_with(
        &self,
        instrument_id: &str,
        answers: &Answers,
        ctx: &ScoreContext,
    ) -> Result<ScoreResult, ScoringError> {
        let instrument = self.instrument(instrument_id)?;
        let formula = self.resolve(instrument)?;
        tracing::debug!(
            instrument = %instrument.id,
            formula = formula.id(),
            answers = answers.len(),
            "dispatching"
        );

        let mut result = formula.compute(instrument, answers, ctx)?;

        result.alerts = alerts::evaluate(instrument, answers);
        if let Some(policy) = &instrument.remap {
            result.remap = Some(remap::apply(policy, result.total, ctx.reference)?);
        }

        tracing::debug!(
            instrument = %instrument.id,
            total = result.total,
            level = result.level().unwrap_or("-"),
            "scored"
        );
        Ok(result)
    }

    /// Classify an arbitrary score against an instrument's headline ranges.
    pub fn classify(&self, score: f64, instrument_id: &str) -> Result<&ScoreRange, ScoringError> {
        let instrument = self.instrument(instrument_id)?;
        let table = instrument
            .scoring
            .ranges
            .as_ref()
            .ok_or_else(|| ScoringError::NoRanges(instrument.id.clone()))?;
        classify(table, score).map_err(|e| e.in_table(format!("'{}' score ranges", instrument.id)))
    }

    fn instrument(&self, id: &str) -> Result<&Instrument, ScoringError> {
        self.catalog
            .get(id)
            .map(|i| i.as_ref())
            .ok_or_else(|| ScoringError::UnknownInstrument(id.to_string()))
    }

    fn resolve(&self, instrument: &Instrument) -> Result<&Arc<dyn FormulaPlugin>, ScoringError> {
        if let Some(plugin) = self.overrides.get(&instrument.id) {
            return Ok(plugin);
        }
        self.formulas
            .get(instrument.formula_id())
            .ok_or_else(|| ScoringError::UnknownFormula {
                instrument: instrument.id.clone(),
                formula: instrument.formula_id().to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AlertRule, Bounds, RemapPolicy, ValueRange};
    use crate::testing::{likert_instrument, table};

    struct Constant(f64);

    impl FormulaPlugin for Constant {
        fn id(&self) -> &str {
            "constant"
        }

        fn compute(
            &self,
            instrument: &Instrument,
            _answers: &Answers,
            _ctx: &ScoreContext,
        ) -> Result<ScoreResult, ScoringError> {
            Ok(ScoreResult::new(&instrument.id, "constant", self.0))
        }
    }

    fn four_items() -> Instrument {
        let mut instrument = likert_instrument(4, &[]);
        instrument.scoring.ranges = Some(table(
            Bounds::Closed,
            &[(4.0, 9.0, "low"), (10.0, 15.0, "medium"), (16.0, 20.0, "high")],
        ));
        instrument
    }

    fn engine(instruments: Vec<Instrument>) -> ScoringEngine {
        let catalog = Catalog::new(instruments).unwrap();
        ScoringEngine::new(Arc::new(catalog), EngineConfig::default())
    }

    fn all(value: f64) -> Answers {
        (1..=4).map(|i| (format!("q{i}"), value)).collect()
    }

    #[test]
    fn generic_fallback_scores() {
        let engine = engine(vec![four_items()]);
        let result = engine.score("likert", &all(3.0)).unwrap();
        assert_eq!(result.formula, "generic");
        assert_eq!(result.total, 12.0);
        assert_eq!(result.level(), Some("medium"));
    }

    #[test]
    fn unknown_instrument() {
        let engine = engine(vec![four_items()]);
        let err = engine.score("nope", &all(3.0)).unwrap_err();
        assert_eq!(err, ScoringError::UnknownInstrument("nope".into()));
    }

    #[test]
    fn unregistered_formula_is_reported() {
        let mut instrument = four_items();
        instrument.formula = Some("constant".into());
        let engine = engine(vec![instrument]);
        let err = engine.score("likert", &all(3.0)).unwrap_err();
        assert!(matches!(err, ScoringError::UnknownFormula { .. }));
    }

    #[test]
    fn dispatch_prefers_instrument_override() {
        let mut instrument = four_items();
        instrument.formula = Some("constant".into());
        let mut engine = engine(vec![instrument]);
        engine.register(Arc::new(Constant(1.0)));
        assert_eq!(engine.score("likert", &all(3.0)).unwrap().total, 1.0);

        engine.register_for("likert", Arc::new(Constant(2.0)));
        assert_eq!(engine.score("likert", &all(3.0)).unwrap().total, 2.0);
        assert_eq!(engine.formula_ids(), vec!["constant", "generic"]);
    }

    #[test]
    fn alerts_and_remap_are_applied_after_the_formula() {
        let mut instrument = four_items();
        instrument.alerts = vec![AlertRule {
            question: "q1".into(),
            at_least: 4.0,
            message: "high q1".into(),
            severity: "warning".into(),
        }];
        instrument.remap = Some(RemapPolicy {
            label: "doubled".into(),
            input_max: 20.0,
            offset: 0.0,
            span: 40.0,
            exponent: 1.0,
            round: true,
            clamp: Some(ValueRange::new(0.0, 40.0)),
            categories: None,
            reference_bands: Some(table(
                Bounds::UpperClosed,
                &[(-40.0, 0.0, "at or below"), (0.0, 40.0, "above")],
            )),
        });
        let engine = engine(vec![instrument]);

        let ctx = engine.default_context().with_reference(20.0);
        let result = engine.score_with("likert", &all(4.0), &ctx).unwrap();
        assert_eq!(result.total, 16.0);
        assert_eq!(result.alerts.len(), 1);
        let remap = result.remap.unwrap();
        assert_eq!(remap.value, 32.0);
        assert_eq!(remap.difference, Some(12.0));
        assert_eq!(remap.difference_band.unwrap().level, "above");
    }

    #[test]
    fn classify_against_instrument_ranges() {
        let engine = engine(vec![four_items(), {
            let mut bare = likert_instrument(2, &[]);
            bare.id = "bare".into();
            bare
        }]);
        assert_eq!(engine.classify(12.0, "likert").unwrap().level, "medium");
        assert!(matches!(
            engine.classify(42.0, "likert"),
            Err(ScoringError::RangeCoverageGap { .. })
        ));
        assert_eq!(
            engine.classify(3.0, "bare").unwrap_err(),
            ScoringError::NoRanges("bare".into())
        );
    }

    #[test]
    fn engine_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ScoringEngine>();
    }
}
