//! Turn order and round management.
//!
//! Entries sort by initiative, highest first; unrolled entries sort last and
//! ties keep creation order. A combat's `turn` indexes into that order.

pub mod initiative;
pub mod sync;

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::info;
use tt_core::{ClientId, CombatId, Combatant, CombatantId, CombatantPatch, CoreError, RecordStore};

use crate::error::{MechError, MechResult};

/// Ordering for initiative values: descending, `None` last.
pub fn compare_initiative(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Entries of a combat in turn order.
pub fn turn_order(store: &dyn RecordStore, combat: CombatId) -> Vec<&Combatant> {
    let mut entries = store.combatants(combat);
    entries.sort_by(|a, b| compare_initiative(a.initiative, b.initiative));
    entries
}

/// Index of the first entry with an initiative.
pub fn first_rolled(order: &[&Combatant]) -> Option<usize> {
    order.iter().position(|e| e.initiative.is_some())
}

/// The entry whose turn it is.
pub fn current_entry(store: &dyn RecordStore, combat: CombatId) -> MechResult<Option<&Combatant>> {
    let record = store
        .combat(combat)
        .ok_or(CoreError::CombatNotFound(combat))?;
    Ok(record
        .turn
        .and_then(|t| turn_order(store, combat).get(t).copied()))
}

/// What [`next_turn`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum TurnAdvance {
    /// The turn moved to another entry in the same round.
    Next {
        /// Position in the turn order.
        index: usize,
        /// The entry now acting.
        entry: CombatantId,
    },
    /// The order wrapped and a new round began.
    NewRound {
        /// The new round number.
        round: u32,
        /// Entries whose initiative was cleared.
        reset: usize,
    },
}

/// Start round 1 with the turn on the first rolled entry.
pub fn start_combat(store: &mut dyn RecordStore, combat: CombatId, actor: ClientId) -> MechResult<()> {
    let mut record = store
        .combat(combat)
        .cloned()
        .ok_or(CoreError::CombatNotFound(combat))?;
    record.round = 1;
    record.turn = first_rolled(&turn_order(store, combat));
    store.update_combat(record, actor)?;
    info!(%combat, "combat started");
    Ok(())
}

/// Move the turn pointer forward, starting a new round after the last entry.
pub fn next_turn(
    store: &mut dyn RecordStore,
    combat: CombatId,
    actor: ClientId,
) -> MechResult<TurnAdvance> {
    let mut record = store
        .combat(combat)
        .cloned()
        .ok_or(CoreError::CombatNotFound(combat))?;
    let order: Vec<CombatantId> = turn_order(store, combat).iter().map(|e| e.id).collect();
    if order.is_empty() {
        return Err(MechError::NoActiveEntry);
    }

    let next = record.turn.map_or(0, |t| t + 1);
    match order.get(next) {
        Some(&entry) => {
            record.turn = Some(next);
            record.round = record.round.max(1);
            store.update_combat(record, actor)?;
            Ok(TurnAdvance::Next { index: next, entry })
        }
        None => {
            let (round, reset) = advance_round(store, combat, actor)?;
            Ok(TurnAdvance::NewRound { round, reset })
        }
    }
}

/// Begin the next round.
///
/// Every entry whose character has speed dice loses its initiative and its
/// used mark in one batched write; other entries keep theirs. Initiative is
/// not carried over, so those entries must roll again. Returns the new round
/// number and how many entries were reset.
pub fn advance_round(
    store: &mut dyn RecordStore,
    combat: CombatId,
    actor: ClientId,
) -> MechResult<(u32, usize)> {
    let mut record = store
        .combat(combat)
        .cloned()
        .ok_or(CoreError::CombatNotFound(combat))?;

    let patches: Vec<CombatantPatch> = store
        .combatants(combat)
        .into_iter()
        .filter(|e| {
            store
                .character(e.character)
                .is_some_and(|c| c.speed_dice.is_some())
        })
        .map(|e| CombatantPatch::new(e.id).initiative(None).used(false))
        .collect();
    let reset = patches.len();
    if !patches.is_empty() {
        store.update_combatants(patches, actor)?;
    }

    record.round += 1;
    record.turn = first_rolled(&turn_order(store, combat));
    let round = record.round;
    store.update_combat(record, actor)?;
    info!(%combat, round, reset, "new round");
    Ok((round, reset))
}

/// Flip an entry's used mark. Returns the new value.
pub fn toggle_used(store: &mut dyn RecordStore, entry: CombatantId, actor: ClientId) -> MechResult<bool> {
    let used = !store
        .combatant(entry)
        .ok_or(MechError::MissingEntry(entry))?
        .used;
    store.update_combatants(vec![CombatantPatch::new(entry).used(used)], actor)?;
    Ok(used)
}
