use std::collections::{HashMap, VecDeque};

use crate::character::Character;
use crate::combat::{Combat, Combatant, CombatantPatch, NewCombatant};
use crate::error::{CoreError, CoreResult};
use crate::ids::{CharacterId, ClientId, CombatId, CombatantId, PlacementId};

/// What changed in the store.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// A character was added.
    CharacterCreated(Character),
    /// A character was replaced.
    CharacterUpdated {
        /// The record before the write.
        previous: Box<Character>,
        /// The record after the write.
        current: Box<Character>,
    },
    /// A combat was created.
    CombatCreated(Combat),
    /// A combat's round or turn pointer changed.
    CombatUpdated(Combat),
    /// A turn-order entry was created.
    CombatantCreated(Combatant),
    /// A turn-order entry was patched.
    CombatantUpdated {
        /// The entry before the write.
        previous: Combatant,
        /// The entry after the write.
        current: Combatant,
    },
    /// A turn-order entry was deleted.
    CombatantDeleted(Combatant),
}

/// A change notification, stamped with the client that caused it.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    /// The client whose write produced this change.
    pub actor: ClientId,
    /// The change itself.
    pub change: Change,
}

/// The record store the combat core reads from and writes to.
///
/// Multi-entry writes are batched: one call validates every record before
/// touching any, so a failed batch leaves the store unchanged. Every write
/// queues one [`ChangeEvent`] per affected record; hosts deliver them to
/// clients by draining [`RecordStore::drain_events`].
pub trait RecordStore {
    /// Look up a character.
    fn character(&self, id: CharacterId) -> Option<&Character>;

    /// Look up a combat.
    fn combat(&self, id: CombatId) -> Option<&Combat>;

    /// Look up a turn-order entry.
    fn combatant(&self, id: CombatantId) -> Option<&Combatant>;

    /// All entries of a combat in creation order.
    fn combatants(&self, combat: CombatId) -> Vec<&Combatant>;

    /// Entries of one (combat, character, placement) slot, ordered by clone index.
    fn slot(
        &self,
        combat: CombatId,
        character: CharacterId,
        placement: PlacementId,
    ) -> Vec<&Combatant>;

    /// All entries matching a predicate, in creation order.
    fn query(&self, predicate: &dyn Fn(&Combatant) -> bool) -> Vec<&Combatant>;

    /// Add a character.
    fn insert_character(&mut self, character: Character, actor: ClientId)
    -> CoreResult<CharacterId>;

    /// Replace a character record.
    fn update_character(&mut self, character: Character, actor: ClientId) -> CoreResult<()>;

    /// Add a combat.
    fn create_combat(&mut self, combat: Combat, actor: ClientId) -> CoreResult<CombatId>;

    /// Replace a combat record.
    fn update_combat(&mut self, combat: Combat, actor: ClientId) -> CoreResult<()>;

    /// Create several entries in one write.
    fn create_combatants(
        &mut self,
        combat: CombatId,
        entries: Vec<NewCombatant>,
        actor: ClientId,
    ) -> CoreResult<Vec<CombatantId>>;

    /// Patch several entries in one write.
    fn update_combatants(
        &mut self,
        patches: Vec<CombatantPatch>,
        actor: ClientId,
    ) -> CoreResult<()>;

    /// Delete several entries in one write. Ids that are already gone are
    /// skipped; the removed records are returned.
    fn delete_combatants(&mut self, ids: &[CombatantId], actor: ClientId) -> Vec<Combatant>;

    /// Take every queued change event, oldest first.
    fn drain_events(&mut self) -> Vec<ChangeEvent>;
}

type SlotKey = (CombatId, CharacterId, PlacementId);

/// An in-memory [`RecordStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    characters: HashMap<CharacterId, Character>,
    combats: HashMap<CombatId, Combat>,
    combatants: HashMap<CombatantId, Combatant>,

    // Indexes
    by_combat: HashMap<CombatId, Vec<CombatantId>>,
    by_slot: HashMap<SlotKey, Vec<CombatantId>>,
    creation_order: Vec<CombatantId>,

    events: VecDeque<ChangeEvent>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries across all combats.
    pub fn combatant_count(&self) -> usize {
        self.combatants.len()
    }

    /// Number of queued, undelivered change events.
    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    /// All characters, in no particular order.
    pub fn all_characters(&self) -> impl Iterator<Item = &Character> {
        self.characters.values()
    }

    fn emit(&mut self, actor: ClientId, change: Change) {
        self.events.push_back(ChangeEvent { actor, change });
    }

    fn unindex(&mut self, entry: &Combatant) {
        if let Some(ids) = self.by_combat.get_mut(&entry.combat) {
            ids.retain(|id| *id != entry.id);
        }
        let key = entry.slot();
        if let Some(ids) = self.by_slot.get_mut(&key) {
            ids.retain(|id| *id != entry.id);
            if ids.is_empty() {
                self.by_slot.remove(&key);
            }
        }
        self.creation_order.retain(|id| *id != entry.id);
    }
}

impl RecordStore for MemoryStore {
    fn character(&self, id: CharacterId) -> Option<&Character> {
        self.characters.get(&id)
    }

    fn combat(&self, id: CombatId) -> Option<&Combat> {
        self.combats.get(&id)
    }

    fn combatant(&self, id: CombatantId) -> Option<&Combatant> {
        self.combatants.get(&id)
    }

    fn combatants(&self, combat: CombatId) -> Vec<&Combatant> {
        self.by_combat
            .get(&combat)
            .map(|ids| ids.iter().filter_map(|id| self.combatants.get(id)).collect())
            .unwrap_or_default()
    }

    fn slot(
        &self,
        combat: CombatId,
        character: CharacterId,
        placement: PlacementId,
    ) -> Vec<&Combatant> {
        let mut entries: Vec<&Combatant> = self
            .by_slot
            .get(&(combat, character, placement))
            .map(|ids| ids.iter().filter_map(|id| self.combatants.get(id)).collect())
            .unwrap_or_default();
        entries.sort_by_key(|c| c.clone_index);
        entries
    }

    fn query(&self, predicate: &dyn Fn(&Combatant) -> bool) -> Vec<&Combatant> {
        self.creation_order
            .iter()
            .filter_map(|id| self.combatants.get(id))
            .filter(|c| predicate(c))
            .collect()
    }

    fn insert_character(
        &mut self,
        character: Character,
        actor: ClientId,
    ) -> CoreResult<CharacterId> {
        if self.characters.contains_key(&character.id) {
            return Err(CoreError::Duplicate(format!("character {}", character.id)));
        }
        let id = character.id;
        self.characters.insert(id, character.clone());
        self.emit(actor, Change::CharacterCreated(character));
        Ok(id)
    }

    fn update_character(&mut self, character: Character, actor: ClientId) -> CoreResult<()> {
        let slot = self
            .characters
            .get_mut(&character.id)
            .ok_or(CoreError::CharacterNotFound(character.id))?;
        let previous = std::mem::replace(slot, character.clone());
        self.emit(
            actor,
            Change::CharacterUpdated {
                previous: Box::new(previous),
                current: Box::new(character),
            },
        );
        Ok(())
    }

    fn create_combat(&mut self, combat: Combat, actor: ClientId) -> CoreResult<CombatId> {
        if self.combats.contains_key(&combat.id) {
            return Err(CoreError::Duplicate(format!("combat {}", combat.id)));
        }
        let id = combat.id;
        self.combats.insert(id, combat.clone());
        self.by_combat.entry(id).or_default();
        self.emit(actor, Change::CombatCreated(combat));
        Ok(id)
    }

    fn update_combat(&mut self, combat: Combat, actor: ClientId) -> CoreResult<()> {
        let slot = self
            .combats
            .get_mut(&combat.id)
            .ok_or(CoreError::CombatNotFound(combat.id))?;
        *slot = combat.clone();
        self.emit(actor, Change::CombatUpdated(combat));
        Ok(())
    }

    fn create_combatants(
        &mut self,
        combat: CombatId,
        entries: Vec<NewCombatant>,
        actor: ClientId,
    ) -> CoreResult<Vec<CombatantId>> {
        if !self.combats.contains_key(&combat) {
            return Err(CoreError::CombatNotFound(combat));
        }
        if let Some(missing) = entries
            .iter()
            .find(|e| !self.characters.contains_key(&e.character))
        {
            return Err(CoreError::CharacterNotFound(missing.character));
        }

        let mut ids = Vec::with_capacity(entries.len());
        for new in entries {
            let entry = Combatant {
                id: CombatantId::new(),
                combat,
                character: new.character,
                placement: new.placement,
                name: new.name,
                is_clone: new.is_clone,
                clone_index: new.clone_index,
                initiative: None,
                used: false,
            };
            let id = entry.id;
            self.by_combat.entry(combat).or_default().push(id);
            self.by_slot.entry(entry.slot()).or_default().push(id);
            self.creation_order.push(id);
            self.combatants.insert(id, entry.clone());
            self.emit(actor, Change::CombatantCreated(entry));
            ids.push(id);
        }
        Ok(ids)
    }

    fn update_combatants(
        &mut self,
        patches: Vec<CombatantPatch>,
        actor: ClientId,
    ) -> CoreResult<()> {
        if let Some(missing) = patches
            .iter()
            .find(|p| !self.combatants.contains_key(&p.id))
        {
            return Err(CoreError::CombatantNotFound(missing.id));
        }

        for patch in patches {
            let Some(entry) = self.combatants.get_mut(&patch.id) else {
                continue;
            };
            let previous = entry.clone();
            patch.apply(entry);
            let current = entry.clone();
            self.emit(actor, Change::CombatantUpdated { previous, current });
        }
        Ok(())
    }

    fn delete_combatants(&mut self, ids: &[CombatantId], actor: ClientId) -> Vec<Combatant> {
        let mut removed = Vec::new();
        for id in ids {
            let Some(entry) = self.combatants.remove(id) else {
                continue;
            };
            self.unindex(&entry);
            self.emit(actor, Change::CombatantDeleted(entry.clone()));
            removed.push(entry);
        }
        removed
    }

    fn drain_events(&mut self) -> Vec<ChangeEvent> {
        self.events.drain(..).collect()
    }
}
