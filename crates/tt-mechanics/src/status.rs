//! Firing stackable statuses.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use tt_core::{Character, ItemId, PostActiveOperator, PostActiveRule, StatusEffect};

use crate::error::{MechError, MechResult};

/// What firing a status did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusFiring {
    /// Status name.
    pub status: String,
    /// Change applied to health.
    pub health_delta: i32,
    /// Change applied to stagger.
    pub stagger_delta: i32,
    /// Count before the rule applied.
    pub previous_count: u32,
    /// Count after the rule applied.
    pub new_count: u32,
}

impl StatusFiring {
    /// Render as chat text.
    pub fn render(&self, character: &str) -> String {
        let mut parts = Vec::new();
        if self.health_delta != 0 {
            parts.push(format!("HP {:+}", self.health_delta));
        }
        if self.stagger_delta != 0 {
            parts.push(format!("Stagger {:+}", self.stagger_delta));
        }
        if parts.is_empty() {
            parts.push("no effect".to_string());
        }
        format!(
            "{} fires on {character}: {} (count {} -> {})",
            self.status,
            parts.join(", "),
            self.previous_count,
            self.new_count
        )
    }
}

/// Apply a post-active rule to a count.
///
/// Division floors, and a zero divisor leaves the count unchanged. Results
/// below zero clamp to zero.
pub fn apply_post_active(count: u32, rule: &PostActiveRule) -> MechResult<u32> {
    let current = i64::from(count);
    let v = rule.variable;
    let next = match &rule.operator {
        PostActiveOperator::Add => current.saturating_add(v),
        PostActiveOperator::Subtract => current.saturating_sub(v),
        PostActiveOperator::Multiply => current.saturating_mul(v),
        PostActiveOperator::Divide if v == 0 => current,
        PostActiveOperator::Divide => current.div_euclid(v),
        PostActiveOperator::Maintain => current,
        PostActiveOperator::Unknown(op) => return Err(MechError::InvalidOperator(op.clone())),
    };
    Ok(u32::try_from(next.max(0)).unwrap_or(u32::MAX))
}

/// Fire a status on a character.
///
/// The resource change is `count × potency`, negated for
/// [`StatusEffect::Decrease`], applied to health, stagger or both. The rule at
/// `rule_index` then updates the count; `None` keeps it. An unknown operator
/// is logged and leaves the count alone, but the resource change stands.
pub fn fire_status(
    character: &mut Character,
    status_id: ItemId,
    rule_index: Option<usize>,
) -> MechResult<StatusFiring> {
    let name = character.name.clone();
    let status = character
        .status(status_id)
        .ok_or_else(|| MechError::MissingItem(format!("status {status_id} on {name}")))?;

    let rule = match rule_index {
        Some(i) => Some(status.post_actives.get(i).cloned().ok_or_else(|| {
            MechError::MissingItem(format!("post-active rule {} of '{}'", i + 1, status.name))
        })?),
        None => None,
    };

    let magnitude = i64::from(status.count).saturating_mul(i64::from(status.potency));
    let signed = match status.effect {
        StatusEffect::Increase => magnitude,
        StatusEffect::Decrease => -magnitude,
    };
    let delta = i32::try_from(signed).unwrap_or(if signed < 0 { i32::MIN } else { i32::MAX });
    let target = status.target;
    let previous_count = status.count;
    let status_name = status.name.clone();

    let new_count = match &rule {
        Some(rule) => match apply_post_active(previous_count, rule) {
            Ok(count) => count,
            Err(e) => {
                warn!(status = %status_name, error = %e, "count left unchanged");
                previous_count
            }
        },
        None => previous_count,
    };

    let health_delta = if target.hits_health() { delta } else { 0 };
    let stagger_delta = if target.hits_stagger() { delta } else { 0 };
    character.health.adjust(health_delta);
    character.stagger.adjust(stagger_delta);
    if let Some(status) = character.status_mut(status_id) {
        status.count = new_count;
    }

    debug!(status = %status_name, health_delta, stagger_delta, new_count, "status fired");
    Ok(StatusFiring {
        status: status_name,
        health_delta,
        stagger_delta,
        previous_count,
        new_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tt_core::{Status, StatusTarget};

    fn rule(op: &str, v: i64) -> PostActiveRule {
        PostActiveRule::new(PostActiveOperator::from(op.to_string()), v)
    }

    #[test]
    fn decrease_hp_by_count_times_potency() {
        let bleed = Status::new("Bleed", StatusEffect::Decrease, StatusTarget::Hp)
            .with_count(3)
            .with_potency(2);
        let id = bleed.id;
        let mut c = Character::new("Roland").with_resources(50, 20).with_status(bleed);

        let fired = fire_status(&mut c, id, None).unwrap();
        assert_eq!(fired.health_delta, -6);
        assert_eq!(fired.stagger_delta, 0);
        assert_eq!(c.health.value, 44);
        assert_eq!(c.stagger.value, 20);
        assert_eq!(c.status(id).map(|s| s.count), Some(3));
    }

    #[test]
    fn increase_both_tracks_then_subtract_count() {
        let regen = Status::new("Regen", StatusEffect::Increase, StatusTarget::HpStagger)
            .with_count(4)
            .with_rule(rule("subtract", 1));
        let id = regen.id;
        let mut c = Character::new("Angela").with_resources(10, 10).with_status(regen);

        let fired = fire_status(&mut c, id, Some(0)).unwrap();
        assert_eq!((fired.health_delta, fired.stagger_delta), (4, 4));
        assert_eq!(c.health.value, 14);
        assert_eq!(c.stagger.value, 14);
        assert_eq!(fired.new_count, 3);
        assert_eq!(c.status(id).map(|s| s.count), Some(3));
        assert_eq!(fired.render("Angela"), "Regen fires on Angela: HP +4, Stagger +4 (count 4 -> 3)");
    }

    #[test]
    fn post_active_operators() {
        assert_eq!(apply_post_active(4, &rule("add", 2)).unwrap(), 6);
        assert_eq!(apply_post_active(4, &rule("subtract", 9)).unwrap(), 0);
        assert_eq!(apply_post_active(4, &rule("multiply", 3)).unwrap(), 12);
        assert_eq!(apply_post_active(7, &rule("divide", 2)).unwrap(), 3);
        assert_eq!(apply_post_active(4, &rule("maintain", 99)).unwrap(), 4);
    }

    #[test]
    fn divide_by_zero_is_a_no_op() {
        assert_eq!(apply_post_active(4, &rule("divide", 0)).unwrap(), 4);
    }

    #[test]
    fn unknown_operator_keeps_count_but_applies_damage() {
        let burn = Status::new("Burn", StatusEffect::Decrease, StatusTarget::Stagger)
            .with_count(2)
            .with_rule(rule("explode", 1));
        let id = burn.id;
        let mut c = Character::new("X").with_resources(10, 10).with_status(burn);

        assert!(matches!(
            apply_post_active(2, &rule("explode", 1)),
            Err(MechError::InvalidOperator(op)) if op == "explode"
        ));
        let fired = fire_status(&mut c, id, Some(0)).unwrap();
        assert_eq!(fired.new_count, 2);
        assert_eq!(c.stagger.value, 8);
    }

    #[test]
    fn missing_status_or_rule_changes_nothing() {
        let status = Status::new("Bleed", StatusEffect::Decrease, StatusTarget::Hp).with_count(5);
        let id = status.id;
        let mut c = Character::new("X").with_resources(10, 10).with_status(status);

        assert!(matches!(
            fire_status(&mut c, ItemId::new(), None),
            Err(MechError::MissingItem(_))
        ));
        assert!(matches!(
            fire_status(&mut c, id, Some(3)),
            Err(MechError::MissingItem(_))
        ));
        assert_eq!(c.health.value, 10);
    }
}
