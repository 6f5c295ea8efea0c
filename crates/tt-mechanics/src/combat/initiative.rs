//! Rolling initiative for turn-order entries.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;
use tt_core::{
    Character, ClientId, CombatId, CombatantId, CombatantPatch, DieType, ModifierCategory,
    RecordStore,
};

use crate::chat::{ChatEntry, ChatSink, MessageId};
use crate::combat::{first_rolled, turn_order};
use crate::config::MechanicsConfig;
use crate::dice::RandomSource;
use crate::error::{MechError, MechResult};
use crate::formula::{append_term, parse_formula};
use crate::reroll::{RerollDescriptor, RolledDie};

/// One entry's initiative roll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitiativeRoll {
    /// The entry that rolled.
    pub entry: CombatantId,
    /// Entry display name.
    pub name: String,
    /// Roll total after the floor, before the player tie-break.
    pub rolled: i64,
    /// Stored initiative.
    pub initiative: f64,
    /// The roll itself.
    pub roll: RolledDie,
    /// The chat message announcing it.
    pub message: MessageId,
}

/// The formula a character rolls for initiative.
///
/// The sheet's speed-die formula is used when it parses, the configured
/// default otherwise. The `speed` modifier is appended as one term on the
/// whole formula.
pub fn initiative_formula(character: &Character, config: &MechanicsConfig) -> String {
    let sheet = character
        .speed_dice
        .as_ref()
        .map(|s| s.die_size_formula.trim())
        .filter(|f| parse_formula(f).is_ok());
    let base = match sheet {
        Some(f) => f.to_string(),
        None => {
            debug!(character = %character.name, "using default initiative formula");
            config.default_initiative_formula.clone()
        }
    };
    append_term(&base, i64::from(character.modifiers.get(ModifierCategory::Speed)))
}

/// Roll initiative for a set of entries.
///
/// Every entry and character is looked up before anything is rolled, so a
/// missing one aborts the whole call with no writes. Totals are floored at
/// `initiative_floor` and players get `player_tiebreak` added. All results
/// are stored in one batched write, each entry gets its own chat message,
/// and every affected combat points its turn at the first rolled entry.
pub fn roll_initiative(
    store: &mut dyn RecordStore,
    chat: &mut dyn ChatSink,
    dice: &mut dyn RandomSource,
    config: &MechanicsConfig,
    entries: &[CombatantId],
    actor: ClientId,
) -> MechResult<Vec<InitiativeRoll>> {
    let mut plans = Vec::with_capacity(entries.len());
    for &id in entries {
        let entry = store.combatant(id).ok_or(MechError::MissingEntry(id))?;
        let character = store.character(entry.character).ok_or_else(|| {
            MechError::MissingItem(format!("character {} of '{}'", entry.character, entry.name))
        })?;
        plans.push((
            id,
            entry.combat,
            entry.character,
            entry.name.clone(),
            initiative_formula(character, config),
            character.is_player(),
        ));
    }

    let mut rolls = Vec::with_capacity(plans.len());
    for (id, _, _, name, formula, is_player) in &plans {
        let roll = RerollDescriptor::for_formula(formula.clone(), DieType::parse("speed"), name.clone())
            .roll(dice)?;
        let rolled = roll.total().max(config.initiative_floor);
        let tiebreak = if *is_player { config.player_tiebreak } else { 0.0 };
        let initiative = rolled as f64 + tiebreak;
        rolls.push((*id, rolled, initiative, roll));
    }

    let patches = rolls
        .iter()
        .map(|(id, _, initiative, _)| CombatantPatch::new(*id).initiative(Some(*initiative)))
        .collect();
    store.update_combatants(patches, actor)?;

    let mut results = Vec::with_capacity(rolls.len());
    for ((_, _, character, name, _, _), (id, rolled, initiative, roll)) in plans.iter().zip(rolls) {
        let text = format!(
            "{name} rolls initiative: {rolled} ({})",
            config.format_initiative(initiative)
        );
        let message = chat.append(
            ChatEntry::flavor(name.clone(), text)
                .spoken_by(*character)
                .with_rolls(vec![roll.clone()]),
        );
        results.push(InitiativeRoll {
            entry: id,
            name: name.clone(),
            rolled,
            initiative,
            roll,
            message,
        });
    }

    let combats: BTreeSet<CombatId> = plans.iter().map(|(_, combat, ..)| *combat).collect();
    for combat in combats {
        if let Some(mut record) = store.combat(combat).cloned() {
            record.turn = first_rolled(&turn_order(store, combat));
            store.update_combat(record, actor)?;
        }
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ChatLog;
    use crate::dice::ScriptedDice;
    use tt_core::{Combat, MemoryStore, NewCombatant, PlacementId};

    struct Table {
        store: MemoryStore,
        chat: ChatLog,
        gm: ClientId,
        combat: CombatId,
        config: MechanicsConfig,
    }

    impl Table {
        fn new() -> Self {
            let mut store = MemoryStore::new();
            let gm = ClientId::new();
            let combat = store.create_combat(Combat::new(), gm).unwrap();
            Self {
                store,
                chat: ChatLog::new(),
                gm,
                combat,
                config: MechanicsConfig::default(),
            }
        }

        fn add(&mut self, character: Character) -> CombatantId {
            let name = character.name.clone();
            let c = self.store.insert_character(character, self.gm).unwrap();
            self.store
                .create_combatants(
                    self.combat,
                    vec![NewCombatant::primary(c, PlacementId::new(), name)],
                    self.gm,
                )
                .unwrap()[0]
        }

        fn roll(&mut self, entries: &[CombatantId], faces: &[u32]) -> MechResult<Vec<InitiativeRoll>> {
            let mut dice = ScriptedDice::new(faces.iter().copied());
            roll_initiative(
                &mut self.store,
                &mut self.chat,
                &mut dice,
                &self.config,
                entries,
                self.gm,
            )
        }
    }

    #[test]
    fn formula_uses_sheet_and_speed() {
        let config = MechanicsConfig::default();
        let c = Character::new("Roland")
            .with_speed_dice("1d8", 2)
            .with_modifier(ModifierCategory::Speed, 2);
        assert_eq!(initiative_formula(&c, &config), "1d8 + 2");
    }

    #[test]
    fn formula_falls_back_when_missing_or_malformed() {
        let config = MechanicsConfig::default();
        assert_eq!(initiative_formula(&Character::new("A"), &config), "1d6");
        let broken = Character::new("B")
            .with_speed_dice("d", 1)
            .with_modifier(ModifierCategory::Speed, -1);
        assert_eq!(initiative_formula(&broken, &config), "1d6 - 1");
    }

    #[test]
    fn initiative_is_floored_at_one() {
        let mut t = Table::new();
        let e = t.add(
            Character::new("Sluggish")
                .with_speed_dice("1d4", 1)
                .with_modifier(ModifierCategory::Speed, -10),
        );
        let rolls = t.roll(&[e], &[1]).unwrap();
        assert_eq!(rolls[0].rolled, 1);
        assert_eq!(rolls[0].roll.total(), -9);
        assert_eq!(t.store.combatant(e).and_then(|c| c.initiative), Some(1.0));
    }

    #[test]
    fn players_win_exact_ties() {
        let mut t = Table::new();
        let npc = t.add(Character::new("Guard").with_speed_dice("1d6", 1));
        let pc = t.add(Character::new("Angela").with_speed_dice("1d6", 1).player());
        let rolls = t.roll(&[npc, pc], &[4, 4]).unwrap();
        assert!((rolls[0].initiative - 4.0).abs() < 1e-9);
        assert!((rolls[1].initiative - 4.01).abs() < 1e-9);

        let order: Vec<CombatantId> = turn_order(&t.store, t.combat).iter().map(|e| e.id).collect();
        assert_eq!(order, vec![pc, npc]);
        assert_eq!(t.store.combat(t.combat).and_then(|c| c.turn), Some(0));
    }

    #[test]
    fn tiebreak_never_bridges_an_integer_gap() {
        let mut t = Table::new();
        let npc = t.add(Character::new("Guard").with_speed_dice("1d6", 1));
        let pc = t.add(Character::new("Angela").with_speed_dice("1d6", 1).player());
        t.roll(&[npc, pc], &[5, 4]).unwrap();
        let order: Vec<CombatantId> = turn_order(&t.store, t.combat).iter().map(|e| e.id).collect();
        assert_eq!(order, vec![npc, pc]);
    }

    #[test]
    fn one_chat_message_per_entry_with_both_values() {
        let mut t = Table::new();
        let pc = t.add(Character::new("Angela").with_speed_dice("1d6", 1).player());
        let rolls = t.roll(&[pc], &[3]).unwrap();
        assert_eq!(t.chat.len(), 1);
        let msg = t.chat.get(rolls[0].message).unwrap();
        assert_eq!(msg.body.text(), "Angela rolls initiative: 3 (3.01)");
        assert_eq!(msg.rolls.len(), 1);
        assert_eq!(msg.rolls[0].descriptor.source_name, "Angela");
    }

    #[test]
    fn results_are_written_in_one_batch() {
        let mut t = Table::new();
        let a = t.add(Character::new("A"));
        let b = t.add(Character::new("B"));
        t.store.drain_events();
        t.roll(&[a, b], &[2, 5]).unwrap();
        // Two entry updates from one batch, then the turn pointer.
        assert_eq!(t.store.drain_events().len(), 3);
    }

    #[test]
    fn missing_entry_aborts_without_writes() {
        let mut t = Table::new();
        let a = t.add(Character::new("A"));
        t.store.drain_events();
        let result = t.roll(&[a, CombatantId::new()], &[6]);
        assert!(matches!(result, Err(MechError::MissingEntry(_))));
        assert_eq!(t.store.pending_events(), 0);
        assert!(t.chat.is_empty());
        assert_eq!(t.store.combatant(a).and_then(|c| c.initiative), None);
    }
}
