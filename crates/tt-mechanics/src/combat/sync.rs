//! Keeping speed-die entries in step with character sheets.
//!
//! A character with `N` speed dice owns `N` entries per placement: one
//! primary and `N - 1` clones named `#2`, `#3`, and so on. Every client runs
//! a synchronizer over the same change events, so each handler acts only on
//! events its own client caused. A client that merely observes the event,
//! even a privileged one, does nothing.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use tt_core::{
    Change, ChangeEvent, Character, CharacterId, ClientId, CombatId, Combatant, CombatantId,
    CombatantQuery, NewCombatant, PlacementId, RecordStore,
};

use crate::error::MechResult;

/// Entries a synchronizer created and removed while handling one event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOutcome {
    /// Clone entries created.
    pub created: Vec<CombatantId>,
    /// Clone entries removed.
    pub removed: Vec<CombatantId>,
}

impl SyncOutcome {
    /// Whether nothing changed.
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.removed.is_empty()
    }

    fn merge(&mut self, other: SyncOutcome) {
        self.created.extend(other.created);
        self.removed.extend(other.removed);
    }
}

/// Reacts to change events on behalf of one client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeedDieSynchronizer {
    local: ClientId,
}

impl SpeedDieSynchronizer {
    /// A synchronizer for the given client.
    pub fn new(local: ClientId) -> Self {
        Self { local }
    }

    /// The client this synchronizer acts for.
    pub fn local(&self) -> ClientId {
        self.local
    }

    /// Whether this client caused the event.
    pub fn originated(&self, event: &ChangeEvent) -> bool {
        event.actor == self.local
    }

    /// Handle one change event.
    ///
    /// Primary entries created or deleted by this client get their clones
    /// created or removed, and a die-count change made by this client is
    /// reconciled in every placement of the character. Everything else,
    /// including any event from another client, is ignored.
    pub fn handle(
        &self,
        store: &mut dyn RecordStore,
        event: &ChangeEvent,
    ) -> MechResult<SyncOutcome> {
        let relevant = match &event.change {
            Change::CombatantCreated(entry) | Change::CombatantDeleted(entry) => !entry.is_clone,
            Change::CharacterUpdated { previous, current } => {
                previous.required_entries() != current.required_entries()
            }
            _ => false,
        };
        if !relevant {
            return Ok(SyncOutcome::default());
        }
        if !self.originated(event) {
            debug!(actor = %event.actor, local = %self.local, "ignoring event from another client");
            return Ok(SyncOutcome::default());
        }

        match &event.change {
            Change::CombatantCreated(entry) => self.on_primary_created(store, entry),
            Change::CombatantDeleted(entry) => Ok(self.on_primary_removed(store, entry)),
            Change::CharacterUpdated { current, .. } => self.on_die_count_changed(store, current),
            _ => Ok(SyncOutcome::default()),
        }
    }

    fn on_primary_created(
        &self,
        store: &mut dyn RecordStore,
        entry: &Combatant,
    ) -> MechResult<SyncOutcome> {
        let Some(character) = store.character(entry.character) else {
            warn!(entry = %entry.id, character = %entry.character, "entry for unknown character");
            return Ok(SyncOutcome::default());
        };
        let Some(required) = character.required_entries() else {
            return Ok(SyncOutcome::default());
        };
        self.reconcile_slot(store, entry.combat, entry.character, entry.placement, required)
    }

    fn on_primary_removed(&self, store: &mut dyn RecordStore, entry: &Combatant) -> SyncOutcome {
        let slot = store.slot(entry.combat, entry.character, entry.placement);
        if slot.iter().any(|e| !e.is_clone) {
            return SyncOutcome::default();
        }
        let clones: Vec<CombatantId> = slot.iter().rev().map(|e| e.id).collect();
        if clones.is_empty() {
            return SyncOutcome::default();
        }

        let removed: Vec<CombatantId> = store
            .delete_combatants(&clones, self.local)
            .into_iter()
            .map(|e| e.id)
            .collect();
        info!(name = %entry.name, placement = %entry.placement, count = removed.len(), "removed clones");
        SyncOutcome {
            created: Vec::new(),
            removed,
        }
    }

    fn on_die_count_changed(
        &self,
        store: &mut dyn RecordStore,
        character: &Character,
    ) -> MechResult<SyncOutcome> {
        let required = character.required_entries().unwrap_or(1);
        let slots: Vec<(CombatId, PlacementId)> = CombatantQuery::new(&*store)
            .character(character.id)
            .primaries()
            .execute()
            .into_iter()
            .map(|e| (e.combat, e.placement))
            .collect();

        let mut outcome = SyncOutcome::default();
        for (combat, placement) in slots {
            outcome.merge(self.reconcile_slot(store, combat, character.id, placement, required)?);
        }
        Ok(outcome)
    }

    /// Bring one slot to exactly `required` entries.
    ///
    /// Missing clone indices are created in one batch. Clones at or past
    /// `required`, and duplicates of an index, are removed highest first in
    /// one batch. A slot without a primary is left alone.
    fn reconcile_slot(
        &self,
        store: &mut dyn RecordStore,
        combat: CombatId,
        character: CharacterId,
        placement: PlacementId,
        required: u32,
    ) -> MechResult<SyncOutcome> {
        let slot = store.slot(combat, character, placement);
        let Some(primary) = slot.iter().find(|e| !e.is_clone) else {
            return Ok(SyncOutcome::default());
        };
        let base_name = primary.name.clone();

        let mut present = BTreeSet::new();
        let mut excess = Vec::new();
        for clone in slot.iter().filter(|e| e.is_clone) {
            let index = clone.clone_index;
            if index == 0 || index >= required || !present.insert(index) {
                excess.push(clone.id);
            }
        }
        excess.reverse();
        let missing: Vec<NewCombatant> = (1..required)
            .filter(|i| !present.contains(i))
            .map(|i| NewCombatant::clone_of(character, placement, &base_name, i))
            .collect();

        let mut outcome = SyncOutcome::default();
        if !missing.is_empty() {
            outcome.created = store.create_combatants(combat, missing, self.local)?;
            info!(name = %base_name, %placement, count = outcome.created.len(), "created clones");
        }
        if !excess.is_empty() {
            outcome.removed = store
                .delete_combatants(&excess, self.local)
                .into_iter()
                .map(|e| e.id)
                .collect();
            info!(name = %base_name, %placement, count = outcome.removed.len(), "removed clones");
        }
        Ok(outcome)
    }
}
