use crate::combat::Combatant;
use crate::ids::{CharacterId, CombatId, PlacementId};
use crate::store::RecordStore;

/// A builder for filtering turn-order entries in a store.
pub struct CombatantQuery<'s> {
    store: &'s dyn RecordStore,
    combat: Option<CombatId>,
    character: Option<CharacterId>,
    placement: Option<PlacementId>,
    clones: Option<bool>,
    rolled: Option<bool>,
    name_contains: Option<String>,
}

impl<'s> CombatantQuery<'s> {
    /// Start a query that matches every entry.
    pub fn new(store: &'s dyn RecordStore) -> Self {
        Self {
            store,
            combat: None,
            character: None,
            placement: None,
            clones: None,
            rolled: None,
            name_contains: None,
        }
    }

    /// Only entries of this combat.
    pub fn combat(mut self, id: CombatId) -> Self {
        self.combat = Some(id);
        self
    }

    /// Only entries acting for this character.
    pub fn character(mut self, id: CharacterId) -> Self {
        self.character = Some(id);
        self
    }

    /// Only entries of this placement.
    pub fn placement(mut self, id: PlacementId) -> Self {
        self.placement = Some(id);
        self
    }

    /// Only primary entries.
    pub fn primaries(mut self) -> Self {
        self.clones = Some(false);
        self
    }

    /// Only clone entries.
    pub fn clones(mut self) -> Self {
        self.clones = Some(true);
        self
    }

    /// Only entries whose initiative is set (`true`) or unset (`false`).
    pub fn rolled(mut self, rolled: bool) -> Self {
        self.rolled = Some(rolled);
        self
    }

    /// Only entries whose name contains the substring (case-insensitive).
    pub fn name_contains(mut self, s: impl Into<String>) -> Self {
        self.name_contains = Some(s.into().to_lowercase());
        self
    }

    /// Execute the query. Results are in creation order.
    pub fn execute(self) -> Vec<&'s Combatant> {
        let store = self.store;
        store.query(&|c| self.matches(c))
    }

    /// Count matching entries.
    pub fn count(self) -> usize {
        self.execute().len()
    }

    fn matches(&self, entry: &Combatant) -> bool {
        if self.combat.is_some_and(|id| entry.combat != id) {
            return false;
        }
        if self.character.is_some_and(|id| entry.character != id) {
            return false;
        }
        if self.placement.is_some_and(|id| entry.placement != id) {
            return false;
        }
        if self.clones.is_some_and(|clones| entry.is_clone != clones) {
            return false;
        }
        if self
            .rolled
            .is_some_and(|rolled| entry.initiative.is_some() != rolled)
        {
            return false;
        }
        if let Some(ref s) = self.name_contains {
            if !entry.name.to_lowercase().contains(s) {
                return false;
            }
        }
        true
    }
}
