//! Roll evaluation.
//!
//! [`evaluate`] turns a parsed formula and its modifiers into a total and a
//! readable trace. Two override modes replace the dice with their worst or
//! best faces without touching the random source:
//!
//! | mode      | total                                   |
//! |-----------|-----------------------------------------|
//! | normal    | dice + offset + contextual + free       |
//! | paralysis | count + offset + free                   |
//! | poise     | count × size + offset + free            |
//!
//! The contextual modifier is left out of both override modes.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dice::{DiceRoll, RandomSource};
use crate::error::{MechError, MechResult};
use crate::formula::ParsedFormula;

/// How the dice of a roll are resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollMode {
    /// Roll the dice.
    #[default]
    Normal,
    /// Every die shows 1.
    #[serde(alias = "paralysis")]
    Minimum,
    /// Every die shows its highest face.
    #[serde(alias = "poise")]
    Maximum,
}

impl RollMode {
    /// Pick a mode from the two override checkboxes.
    pub fn from_flags(paralysis: bool, poise: bool) -> MechResult<Self> {
        match (paralysis, poise) {
            (true, true) => Err(MechError::ConflictingOverrides),
            (true, false) => Ok(Self::Minimum),
            (false, true) => Ok(Self::Maximum),
            (false, false) => Ok(Self::Normal),
        }
    }

    /// The status name shown in traces for override modes.
    pub fn label(self) -> Option<&'static str> {
        match self {
            Self::Normal => None,
            Self::Minimum => Some("Paralysis"),
            Self::Maximum => Some("Poise"),
        }
    }
}

impl fmt::Display for RollMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label().unwrap_or("Normal"))
    }
}

/// Everything needed to evaluate one roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollRequest {
    /// The parsed formula.
    pub formula: ParsedFormula,
    /// Modifier resolved from the character sheet and the die type.
    pub contextual_modifier: i32,
    /// Modifier typed in for this roll only.
    pub free_modifier: i32,
    /// How the dice are resolved.
    pub mode: RollMode,
}

impl RollRequest {
    /// A normal-mode request with no modifiers.
    pub fn new(formula: ParsedFormula) -> Self {
        Self {
            formula,
            contextual_modifier: 0,
            free_modifier: 0,
            mode: RollMode::Normal,
        }
    }

    /// Set the contextual modifier.
    pub fn contextual(mut self, value: i32) -> Self {
        self.contextual_modifier = value;
        self
    }

    /// Set the free modifier.
    pub fn free(mut self, value: i32) -> Self {
        self.free_modifier = value;
        self
    }

    /// Set the roll mode.
    pub fn mode(mut self, mode: RollMode) -> Self {
        self.mode = mode;
        self
    }
}

/// The result of one evaluated roll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollOutcome {
    /// The mode the roll was evaluated in.
    pub mode: RollMode,
    /// Faces rolled; `None` for override modes.
    pub dice: Option<DiceRoll>,
    /// The final total.
    pub total: i64,
    /// Arithmetic shown before the total, e.g. `2d6 [3, 5] + 2 = 10`.
    pub trace: String,
}

/// Evaluate a roll. Only normal mode draws from `dice`.
pub fn evaluate(request: &RollRequest, dice: &mut dyn RandomSource) -> RollOutcome {
    let formula = request.formula;
    let offset = formula.flat_offset;
    let contextual = i64::from(request.contextual_modifier);
    let free = i64::from(request.free_modifier);

    let (head, base, terms, rolled) = match request.mode {
        RollMode::Normal => {
            let rolled = dice.roll_dice(formula.count, formula.die_size);
            let head = format!("{} {rolled}", formula.dice_term());
            (head, rolled.total(), vec![offset, contextual, free], Some(rolled))
        }
        mode @ (RollMode::Minimum | RollMode::Maximum) => {
            let base = if mode == RollMode::Minimum {
                formula.min_dice()
            } else {
                formula.max_dice()
            };
            debug!(%mode, formula = %formula, base, "override roll");
            let head = format!(
                "{} ({})",
                mode.label().unwrap_or_default(),
                formula.dice_term()
            );
            (head, base, vec![offset, free], None)
        }
    };

    let total = terms.iter().fold(base, |acc, t| acc.saturating_add(*t));
    RollOutcome {
        mode: request.mode,
        dice: rolled,
        total,
        trace: render_trace(head, &terms, total),
    }
}

fn render_trace(head: String, terms: &[i64], total: i64) -> String {
    let mut trace = head;
    for &term in terms {
        if term > 0 {
            trace.push_str(&format!(" + {term}"));
        } else if term < 0 {
            trace.push_str(&format!(" - {}", term.unsigned_abs()));
        }
    }
    trace.push_str(&format!(" = {total}"));
    trace
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::{ScriptedDice, StdDice};
    use crate::formula::parse_formula;
    use insta::assert_snapshot;

    fn request(formula: &str) -> RollRequest {
        RollRequest::new(parse_formula(formula).unwrap())
    }

    #[test]
    fn normal_mode_sums_everything() {
        let mut dice = ScriptedDice::new([3, 5]);
        let out = evaluate(&request("2d6+3-1").contextual(1), &mut dice);
        assert_eq!(out.total, 3 + 5 + 2 + 1);
        assert_eq!(out.dice.as_ref().map(|d| d.faces.clone()), Some(vec![3, 5]));
        assert_snapshot!(out.trace, @"2d6 [3, 5] + 2 + 1 = 11");
    }

    #[test]
    fn normal_mode_total_is_within_bounds() {
        let mut dice = StdDice::seeded(11);
        let req = request("2d6+3-1").contextual(1);
        for _ in 0..100 {
            let out = evaluate(&req, &mut dice);
            assert!((2 + 3..=12 + 3).contains(&out.total));
        }
    }

    #[test]
    fn zero_terms_are_omitted_from_trace() {
        let mut dice = ScriptedDice::new([4]);
        let out = evaluate(&request("1d8"), &mut dice);
        assert_snapshot!(out.trace, @"1d8 [4] = 4");
    }

    #[test]
    fn negative_terms_render_as_subtraction() {
        let mut dice = ScriptedDice::new([6]);
        let out = evaluate(&request("1d6-2").free(-1), &mut dice);
        assert_eq!(out.total, 3);
        assert_snapshot!(out.trace, @"1d6 [6] - 2 - 1 = 3");
    }

    #[test]
    fn paralysis_forces_ones_and_skips_contextual() {
        let mut dice = ScriptedDice::new([6]);
        let req = request("3d8+2")
            .contextual(5)
            .free(1)
            .mode(RollMode::Minimum);
        let out = evaluate(&req, &mut dice);
        assert_eq!(out.total, 3 + 2 + 1);
        assert!(out.dice.is_none());
        assert_eq!(dice.remaining(), 1);
        assert_snapshot!(out.trace, @"Paralysis (3d8) + 2 + 1 = 6");
    }

    #[test]
    fn poise_forces_max_faces() {
        let mut dice = ScriptedDice::new([1]);
        let req = request("3d8+2").contextual(5).mode(RollMode::Maximum);
        let out = evaluate(&req, &mut dice);
        assert_eq!(out.total, 24 + 2);
        assert_snapshot!(out.trace, @"Poise (3d8) + 2 = 26");
    }

    #[test]
    fn huge_counts_roll_without_keeping_every_face() {
        let mut dice = ScriptedDice::new([2]);
        let out = evaluate(&request("2000000d6+1"), &mut dice);
        assert_eq!(out.total, 4_000_001);
        let kept = out.dice.as_ref().map(|d| (d.count, d.faces.len()));
        assert_eq!(kept, Some((2_000_000, crate::dice::SHOWN_FACES)));
        assert!(out.trace.len() < 1_000);
        assert!(out.trace.ends_with("2, … 1999900 more] + 1 = 4000001"));
    }

    #[test]
    fn mode_flags() {
        assert_eq!(RollMode::from_flags(false, false).unwrap(), RollMode::Normal);
        assert_eq!(RollMode::from_flags(true, false).unwrap(), RollMode::Minimum);
        assert_eq!(RollMode::from_flags(false, true).unwrap(), RollMode::Maximum);
        assert!(matches!(
            RollMode::from_flags(true, true),
            Err(MechError::ConflictingOverrides)
        ));
    }

    #[test]
    fn mode_serde_accepts_status_names() {
        let m: RollMode = serde_json::from_str("\"poise\"").unwrap();
        assert_eq!(m, RollMode::Maximum);
        assert_eq!(serde_json::to_string(&RollMode::Minimum).unwrap(), "\"minimum\"");
    }

    proptest::proptest! {
        #[test]
        fn overrides_are_exact(
            count in 1u32..20,
            size in 1u32..20,
            offset in -50i64..50,
            contextual in -10i32..10,
            free in -10i32..10,
            seed in proptest::prelude::any::<u64>(),
        ) {
            let formula = ParsedFormula { count, die_size: size, flat_offset: offset };
            let base = RollRequest::new(formula).contextual(contextual).free(free);
            let mut dice = StdDice::seeded(seed);
            let min = evaluate(&base.mode(RollMode::Minimum), &mut dice);
            let max = evaluate(&base.mode(RollMode::Maximum), &mut dice);
            proptest::prop_assert_eq!(min.total, i64::from(count) + offset + i64::from(free));
            proptest::prop_assert_eq!(
                max.total,
                i64::from(count) * i64::from(size) + offset + i64::from(free)
            );
        }
    }
}
