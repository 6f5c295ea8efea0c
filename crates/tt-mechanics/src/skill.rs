//! Rolling and declaring skills.

use serde::{Deserialize, Serialize};
use tracing::warn;
use tt_core::{Character, Die, Skill};

use crate::dice::RandomSource;
use crate::engine::RollMode;
use crate::error::{MechError, MechResult};
use crate::reroll::{RerollDescriptor, RolledDie};

/// Per-die choices made when rolling a skill.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DieOptions {
    /// Modifier typed in for this die.
    pub free_modifier: i32,
    /// Force every face to 1.
    pub paralysis: bool,
    /// Force every face to its maximum.
    pub poise: bool,
}

impl DieOptions {
    /// Options with only a free modifier.
    pub fn modifier(free_modifier: i32) -> Self {
        Self {
            free_modifier,
            ..Self::default()
        }
    }
}

/// The result for one die slot of a skill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DieRoll {
    /// The die rolled.
    Rolled(RolledDie),
    /// The die could not be rolled; the rest of the skill still was.
    Failed {
        /// The die as written on the skill.
        die: Die,
        /// Why it failed.
        message: String,
    },
}

/// Every die of a skill, rolled together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillRoll {
    /// Skill name.
    pub skill: String,
    /// Attack weight, if set.
    pub weight: Option<u32>,
    /// Skill module notes.
    pub modules: Vec<String>,
    /// One result per die, in skill order.
    pub dice: Vec<DieRoll>,
}

impl SkillRoll {
    /// The dice that rolled successfully.
    pub fn rolled(&self) -> Vec<RolledDie> {
        self.dice
            .iter()
            .filter_map(|d| match d {
                DieRoll::Rolled(r) => Some(r.clone()),
                DieRoll::Failed { .. } => None,
            })
            .collect()
    }

    /// Number of dice that failed to roll.
    pub fn failures(&self) -> usize {
        self.dice
            .iter()
            .filter(|d| matches!(d, DieRoll::Failed { .. }))
            .count()
    }

    /// Render the roll as chat text.
    pub fn render(&self) -> String {
        let mut out = header(&self.skill, self.weight, &self.modules);
        for roll in &self.dice {
            match roll {
                DieRoll::Rolled(r) => {
                    out.push_str(&format!("[{}] {}\n", r.descriptor.die_type, r.trace()));
                    push_annotations(&mut out, &r.descriptor.annotations);
                }
                DieRoll::Failed { die, message } => {
                    out.push_str(&format!("[{}] {message}\n", die.die_type));
                }
            }
        }
        out
    }
}

fn header(name: &str, weight: Option<u32>, modules: &[String]) -> String {
    let mut out = format!("{name}\n");
    if let Some(weight) = weight.filter(|&w| w > 1) {
        out.push_str(&format!("Attack Weight: {weight}\n"));
    }
    for module in modules {
        out.push_str(&format!("{module}\n"));
    }
    out
}

fn push_annotations(out: &mut String, annotations: &[String]) {
    for note in annotations {
        out.push_str(&format!("  • {note}\n"));
    }
}

/// Roll every die of a skill.
///
/// `options[i]` applies to die `i`; missing options default to a plain roll.
/// A die with a malformed formula or with both overrides set is reported in
/// its slot and does not stop the other dice.
pub fn roll_skill(
    character: &Character,
    skill: &Skill,
    options: &[DieOptions],
    dice: &mut dyn RandomSource,
) -> SkillRoll {
    let results = skill
        .dice
        .iter()
        .enumerate()
        .map(|(i, die)| {
            let opts = options.get(i).copied().unwrap_or_default();
            match roll_one(character, skill, die, opts, dice) {
                Ok(rolled) => DieRoll::Rolled(rolled),
                Err(e) => {
                    warn!(skill = %skill.name, die = i, error = %e, "die not rolled");
                    DieRoll::Failed {
                        die: die.clone(),
                        message: e.to_string(),
                    }
                }
            }
        })
        .collect();

    SkillRoll {
        skill: skill.name.clone(),
        weight: skill.weight,
        modules: skill.modules.clone(),
        dice: results,
    }
}

fn roll_one(
    character: &Character,
    skill: &Skill,
    die: &Die,
    options: DieOptions,
    dice: &mut dyn RandomSource,
) -> MechResult<RolledDie> {
    let mode = RollMode::from_flags(options.paralysis, options.poise)?;
    RerollDescriptor::for_die(
        die,
        &character.modifiers,
        skill.name.clone(),
        options.free_modifier,
        mode,
    )
    .roll(dice)
}

/// Roll a single die of a skill with no extra options.
pub fn roll_die(
    character: &Character,
    skill: &Skill,
    index: usize,
    dice: &mut dyn RandomSource,
) -> MechResult<RolledDie> {
    let die = skill.dice.get(index).ok_or_else(|| {
        MechError::MissingItem(format!("die {} of skill '{}'", index + 1, skill.name))
    })?;
    roll_one(character, skill, die, DieOptions::default(), dice)
}

/// Announce a skill without rolling it.
pub fn declare_skill(skill: &Skill) -> String {
    let mut out = header(&skill.name, skill.weight, &skill.modules);
    for die in &skill.dice {
        out.push_str(&format!("[{}] {}\n", die.die_type, die.formula));
        push_annotations(&mut out, &die.annotations);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::ScriptedDice;
    use insta::assert_snapshot;
    use tt_core::{DieKind, DieType, ModifierCategory};

    fn roland() -> Character {
        Character::new("Roland")
            .with_modifier(ModifierCategory::All, 1)
            .with_modifier(ModifierCategory::Offense, 1)
            .with_modifier(ModifierCategory::Defense, 2)
    }

    fn skill() -> Skill {
        Skill::new("Furioso")
            .with_weight(2)
            .with_module("Clash Win: gain 1 Poise")
            .with_die(
                Die::new(DieType::Standard(DieKind::Slash), "2d6+1").annotated("On Hit: Bleed 2"),
            )
            .with_die(Die::new(DieType::Standard(DieKind::Block), "1d8"))
    }

    #[test]
    fn rolls_every_die_with_its_own_options() {
        let mut dice = ScriptedDice::new([3, 5, 7]);
        let roll = roll_skill(&roland(), &skill(), &[DieOptions::modifier(2)], &mut dice);
        assert_eq!(roll.dice.len(), 2);
        assert_eq!(roll.failures(), 0);
        let totals: Vec<i64> = roll.rolled().iter().map(RolledDie::total).collect();
        assert_eq!(totals, vec![3 + 5 + 1 + 2 + 2, 7 + 3]);
        assert_snapshot!(roll.render(), @r"
        Furioso
        Attack Weight: 2
        Clash Win: gain 1 Poise
        [slash] 2d6 [3, 5] + 1 + 2 + 2 = 13
          • On Hit: Bleed 2
        [block] 1d8 [7] + 3 = 10
        ");
    }

    #[test]
    fn malformed_die_does_not_stop_the_others() {
        let skill = Skill::new("Broken")
            .with_die(Die::new(DieType::Standard(DieKind::Evade), "banana"))
            .with_die(Die::new(DieType::Standard(DieKind::Pierce), "1d4"));
        let mut dice = ScriptedDice::new([2]);
        let roll = roll_skill(&Character::new("X"), &skill, &[], &mut dice);
        assert_eq!(roll.failures(), 1);
        assert_eq!(roll.rolled().len(), 1);
        match &roll.dice[0] {
            DieRoll::Failed { message, .. } => assert!(message.contains("banana")),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn conflicting_overrides_fail_that_die() {
        let both = DieOptions {
            paralysis: true,
            poise: true,
            ..DieOptions::default()
        };
        let mut dice = ScriptedDice::new([1]);
        let roll = roll_skill(&roland(), &skill(), &[both], &mut dice);
        assert_eq!(roll.failures(), 1);
        assert!(matches!(roll.dice[1], DieRoll::Rolled(_)));
    }

    #[test]
    fn weight_of_one_is_hidden() {
        let skill = Skill::new("Jab")
            .with_weight(1)
            .with_die(Die::new(DieType::Standard(DieKind::Blunt), "1d4"));
        assert!(!declare_skill(&skill).contains("Attack Weight"));
    }

    #[test]
    fn declare_lists_formulas_without_rolling() {
        assert_snapshot!(declare_skill(&skill()), @r"
        Furioso
        Attack Weight: 2
        Clash Win: gain 1 Poise
        [slash] 2d6+1
          • On Hit: Bleed 2
        [block] 1d8
        ");
    }

    #[test]
    fn single_die_roll() {
        let mut dice = ScriptedDice::new([6]);
        let rolled = roll_die(&roland(), &skill(), 1, &mut dice).unwrap();
        assert_eq!(rolled.total(), 6 + 3);
        assert_eq!(rolled.descriptor.source_name, "Furioso");
        assert!(matches!(
            roll_die(&roland(), &skill(), 5, &mut dice),
            Err(MechError::MissingItem(_))
        ));
    }
}
