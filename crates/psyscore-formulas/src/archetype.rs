//! Archetype matching as a formula plugin.

use psyscore_core::archetype::{match_archetypes, user_vector};
use psyscore_core::model::QuestionKind;
use psyscore_core::normalize::round_to;
use psyscore_core::pipeline::classify_headline;
use psyscore_core::{Answers, FormulaPlugin, Instrument, ScoreContext, ScoreResult, ScoringError};

pub const ARCHETYPE: &str = "archetype";

/// Ranks the instrument's archetype catalog against the respondent.
///
/// The headline score is the best similarity on a 0–100 scale.
#[derive(Debug, Default, Clone, Copy)]
pub struct ArchetypeFormula;

impl FormulaPlugin for ArchetypeFormula {
    fn id(&self) -> &str {
        ARCHETYPE
    }

    fn description(&self) -> &str {
        "nearest archetype profiles by similarity"
    }

    fn compute(
        &self,
        instrument: &Instrument,
        answers: &Answers,
        ctx: &ScoreContext,
    ) -> Result<ScoreResult, ScoringError> {
        let insufficient = |reason: &str| ScoringError::InsufficientData {
            instrument: instrument.id.clone(),
            reason: reason.to_string(),
        };
        let policy = instrument
            .matching
            .as_ref()
            .ok_or_else(|| insufficient("no matching policy"))?;
        if instrument.archetypes.is_empty() {
            return Err(insufficient("archetype catalog is empty"));
        }

        let user = user_vector(instrument, policy, answers)?;
        let matches = match_archetypes(&user, &instrument.archetypes, policy, ctx.top_k);

        let best = matches.first().map_or(0.0, |m| m.similarity);
        let total = round_to(best * 100.0, instrument.scoring.precision);

        let mut result = ScoreResult::new(&instrument.id, ARCHETYPE, total);
        result.answered = instrument
            .questions
            .iter()
            .filter(|q| q.kind != QuestionKind::Likert && answers.get(&q.id).is_some())
            .count();
        result.normalized = Some(total);
        result.range = classify_headline(instrument, total)?;
        result.profile = policy.dimensions.iter().cloned().zip(user).collect();
        result.archetypes = matches;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use psyscore_core::Catalog;
    use psyscore_core::parser::parse_instrument_str;
    use std::path::Path;
    use std::sync::Arc;

    const ANIMALS_TOML: &str = r#"
[instrument]
id = "animals"
name = "Animals"
formula = "archetype"

[option_sets]
anchor5 = [{ value = 1 }, { value = 2 }, { value = 3 }, { value = 4 }, { value = 5 }]

[scoring]
scale = { min = 0, max = 100 }

[matching]
dimensions = ["pace", "order"]

[[questions]]
id = "c1"
prompt = "Free afternoon?"
kind = "choice"
options = [
    { value = 1, label = "Sprint", scores = { pace = 2, order = 0 } },
    { value = 2, label = "Plan", scores = { pace = 0, order = 2 } },
    { value = 3, label = "Both", scores = { pace = 2, order = 2 } },
    { value = 4, label = "Neither", scores = { pace = 0, order = 0 } },
]

[[questions]]
id = "a_pace"
prompt = "How fast do you move?"
kind = "anchor"
dimension = "pace"
options = "anchor5"

[[questions]]
id = "a_order"
prompt = "How tidy are you?"
kind = "anchor"
dimension = "order"
options = "anchor5"

[[archetypes]]
id = "sloth"
name = "Sloth"
vector = { pace = 0.1, order = 0.1 }

[[archetypes]]
id = "cheetah"
name = "Cheetah"
subtitle = "Always first"
vector = { pace = 0.9, order = 0.9 }

[[archetypes]]
id = "fox"
name = "Fox"
vector = { pace = 0.9, order = 0.2 }
"#;

    fn animals() -> Arc<Instrument> {
        let instrument = parse_instrument_str(ANIMALS_TOML, Path::new("animals.toml")).unwrap();
        let catalog = Catalog::new(vec![instrument]).unwrap();
        Arc::clone(catalog.get("animals").unwrap())
    }

    #[test]
    fn calibrated_user_lands_on_matching_archetype() {
        let instrument = animals();
        // raw (2, 2) of max (2, 2) -> 1.0; anchors 4 of 5 -> 0.75
        // 0.7 * 1.0 + 0.3 * 0.75 = 0.925 on both axes
        let answers = Answers::new()
            .with("c1", 3.0)
            .with("a_pace", 4.0)
            .with("a_order", 4.0);
        let result = ArchetypeFormula
            .compute(&instrument, &answers, &ScoreContext::default())
            .unwrap();

        let top = result.top_match().unwrap();
        assert_eq!(top.id, "cheetah");
        assert_eq!(top.subtitle, "Always first");
        assert!((result.profile["pace"] - 0.925).abs() < 1e-12);
        assert_eq!(result.archetypes.len(), 3);
        assert_eq!(result.answered, 3);
        assert!(result.total > 95.0);
    }

    #[test]
    fn exact_profile_scores_one_hundred() {
        let mut instrument = (*animals()).clone();
        instrument.archetypes[1].vector =
            [("pace".to_string(), 0.925), ("order".to_string(), 0.925)].into();
        let answers = Answers::new()
            .with("c1", 3.0)
            .with("a_pace", 4.0)
            .with("a_order", 4.0);
        let result = ArchetypeFormula
            .compute(&instrument, &answers, &ScoreContext::default())
            .unwrap();
        assert_eq!(result.top_match().unwrap().id, "cheetah");
        assert_eq!(result.total, 100.0);
    }

    #[test]
    fn top_k_limits_matches() {
        let instrument = animals();
        let answers = Answers::new().with("c1", 1.0);
        let ctx = ScoreContext::default().with_top_k(1);
        let result = ArchetypeFormula.compute(&instrument, &answers, &ctx).unwrap();
        assert_eq!(result.archetypes.len(), 1);
        // pace 0.7 + 0.15, order 0 + 0.15 with default anchors
        assert_eq!(result.top_match().unwrap().id, "fox");
    }

    #[test]
    fn no_choice_answers_is_insufficient() {
        let instrument = animals();
        let answers = Answers::new().with("a_pace", 5.0);
        let err = ArchetypeFormula
            .compute(&instrument, &answers, &ScoreContext::default())
            .unwrap_err();
        assert!(matches!(err, ScoringError::InsufficientData { .. }));
    }

    #[test]
    fn out_of_scale_anchor_is_invalid() {
        let instrument = animals();
        let answers = Answers::new().with("c1", 3.0).with("a_pace", 9.0);
        let err = ArchetypeFormula
            .compute(&instrument, &answers, &ScoreContext::default())
            .unwrap_err();
        assert_eq!(
            err,
            ScoringError::InvalidAnswer {
                question: "a_pace".into(),
                value: 9.0
            }
        );
    }

    #[test]
    fn missing_policy_is_insufficient() {
        let mut instrument = (*animals()).clone();
        instrument.matching = None;
        let err = ArchetypeFormula
            .compute(&instrument, &Answers::new().with("c1", 1.0), &ScoreContext::default())
            .unwrap_err();
        assert!(err.to_string().contains("no matching policy"));
    }
}
