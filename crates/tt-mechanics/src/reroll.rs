//! Reproducible rolls.
//!
//! A [`RerollDescriptor`] captures the inputs of a roll, never its output.
//! Rolling a descriptor yields a [`RolledDie`] that carries the same
//! descriptor again, so a reroll can be rerolled indefinitely without
//! looking at the skill or character it came from.

use serde::{Deserialize, Serialize};
use tt_core::{Die, DieType, ModifierSet};

use crate::dice::RandomSource;
use crate::engine::{RollMode, RollOutcome, RollRequest, evaluate};
use crate::error::MechResult;
use crate::formula::parse_formula;
use crate::modifier::contextual_modifier;

/// The inputs of a roll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RerollDescriptor {
    /// The die formula as written on the sheet.
    pub base_formula: String,
    /// The free modifier typed in for the roll.
    #[serde(default)]
    pub flat_modifier: i32,
    /// The contextual modifier resolved when the roll was made.
    #[serde(default)]
    pub contextual_modifier: i32,
    /// The die type tag.
    #[serde(default)]
    pub die_type: DieType,
    /// Cosmetic die annotations.
    #[serde(default)]
    pub annotations: Vec<String>,
    /// Skill or entry name the roll came from.
    #[serde(default)]
    pub source_name: String,
    /// How the dice were resolved.
    #[serde(default)]
    pub mode: RollMode,
}

impl RerollDescriptor {
    /// Describe a roll of `die` by a character with `modifiers`.
    pub fn for_die(
        die: &Die,
        modifiers: &ModifierSet,
        source_name: impl Into<String>,
        flat_modifier: i32,
        mode: RollMode,
    ) -> Self {
        Self {
            base_formula: die.formula.clone(),
            flat_modifier,
            contextual_modifier: contextual_modifier(&die.die_type, modifiers),
            die_type: die.die_type.clone(),
            annotations: die.annotations.clone(),
            source_name: source_name.into(),
            mode,
        }
    }

    /// Describe a plain formula roll with no die context.
    pub fn for_formula(
        formula: impl Into<String>,
        die_type: DieType,
        source_name: impl Into<String>,
    ) -> Self {
        Self {
            base_formula: formula.into(),
            flat_modifier: 0,
            contextual_modifier: 0,
            die_type,
            annotations: Vec::new(),
            source_name: source_name.into(),
            mode: RollMode::Normal,
        }
    }

    /// The engine request this descriptor stands for.
    pub fn request(&self) -> MechResult<RollRequest> {
        let formula = parse_formula(&self.base_formula)?;
        Ok(RollRequest::new(formula)
            .contextual(self.contextual_modifier)
            .free(self.flat_modifier)
            .mode(self.mode))
    }

    /// Roll with fresh randomness.
    ///
    /// A malformed formula aborts the roll before any die is drawn.
    pub fn roll(&self, dice: &mut dyn RandomSource) -> MechResult<RolledDie> {
        let request = self.request()?;
        Ok(RolledDie {
            outcome: evaluate(&request, dice),
            descriptor: self.clone(),
        })
    }
}

/// A roll result paired with the descriptor that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolledDie {
    /// The evaluated roll.
    pub outcome: RollOutcome,
    /// Inputs for rolling again.
    pub descriptor: RerollDescriptor,
}

impl RolledDie {
    /// The final total.
    pub fn total(&self) -> i64 {
        self.outcome.total
    }

    /// The rendered arithmetic.
    pub fn trace(&self) -> &str {
        &self.outcome.trace
    }

    /// Roll the same inputs again.
    pub fn reroll(&self, dice: &mut dyn RandomSource) -> MechResult<RolledDie> {
        self.descriptor.roll(dice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::ScriptedDice;
    use crate::error::MechError;
    use insta::assert_snapshot;
    use tt_core::{DieKind, ModifierCategory};

    fn slash_die() -> Die {
        Die::new(DieType::Standard(DieKind::Slash), "2d6+1").annotated("On Hit: Bleed 2")
    }

    fn modifiers() -> ModifierSet {
        ModifierSet::new()
            .with(ModifierCategory::All, 1)
            .with(ModifierCategory::Slash, 2)
    }

    #[test]
    fn descriptor_captures_inputs() {
        let d = RerollDescriptor::for_die(&slash_die(), &modifiers(), "Overhead Slash", -1, RollMode::Normal);
        assert_eq!(d.base_formula, "2d6+1");
        assert_eq!(d.contextual_modifier, 3);
        assert_eq!(d.flat_modifier, -1);
        assert_eq!(d.annotations, vec!["On Hit: Bleed 2".to_string()]);
        assert_eq!(d.source_name, "Overhead Slash");
    }

    #[test]
    fn reroll_chain_keeps_inputs_and_draws_fresh_faces() {
        let d = RerollDescriptor::for_die(&slash_die(), &modifiers(), "Overhead Slash", 0, RollMode::Normal);
        let mut dice = ScriptedDice::new([1, 2, 6, 6, 3, 3]);

        let first = d.roll(&mut dice).unwrap();
        assert_eq!(first.total(), 1 + 2 + 1 + 3);
        let second = first.reroll(&mut dice).unwrap();
        assert_eq!(second.total(), 6 + 6 + 1 + 3);
        let third = second.reroll(&mut dice).unwrap();
        assert_eq!(third.total(), 3 + 3 + 1 + 3);

        assert_eq!(first.descriptor, d);
        assert_eq!(third.descriptor, d);
    }

    #[test]
    fn trace_omits_zero_modifiers() {
        let d = RerollDescriptor::for_formula("1d4", DieType::default(), "test");
        let mut dice = ScriptedDice::new([2]);
        assert_snapshot!(d.roll(&mut dice).unwrap().trace(), @"1d4 [2] = 2");
    }

    #[test]
    fn malformed_formula_draws_nothing() {
        let d = RerollDescriptor::for_formula("2d", DieType::default(), "broken");
        let mut dice = ScriptedDice::new([5, 5]);
        assert!(matches!(d.roll(&mut dice), Err(MechError::MalformedFormula(_))));
        assert_eq!(dice.remaining(), 2);
    }

    #[test]
    fn override_mode_survives_reroll() {
        let d = RerollDescriptor::for_die(&slash_die(), &modifiers(), "Slash", 2, RollMode::Maximum);
        let mut dice = ScriptedDice::default();
        let out = d.roll(&mut dice).unwrap().reroll(&mut dice).unwrap();
        assert_eq!(out.total(), 12 + 1 + 2);
        assert_snapshot!(out.trace(), @"Poise (2d6) + 1 + 2 = 15");
    }

    #[test]
    fn json_shape_uses_camel_case() {
        let d = RerollDescriptor::for_formula("1d6+2", DieType::parse("counter_evade"), "Dodge");
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["baseFormula"], "1d6+2");
        assert_eq!(json["dieType"], "counter_evade");
        assert_eq!(json["sourceName"], "Dodge");

        let back: RerollDescriptor =
            serde_json::from_str(r#"{"baseFormula":"1d8","dieType":"block"}"#).unwrap();
        assert_eq!(back.flat_modifier, 0);
        assert_eq!(back.mode, RollMode::Normal);
    }
}
