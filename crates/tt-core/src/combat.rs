use serde::{Deserialize, Serialize};

use crate::ids::{CharacterId, CombatId, CombatantId, PlacementId};

/// A combat session: round counter and active-turn pointer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combat {
    /// Record identifier.
    pub id: CombatId,
    /// Current round (0 before the first round starts).
    pub round: u32,
    /// Index into the sorted turn order of the entry whose turn it is.
    pub turn: Option<usize>,
}

impl Combat {
    /// Create a combat that has not started.
    pub fn new() -> Self {
        Self {
            id: CombatId::new(),
            round: 0,
            turn: None,
        }
    }
}

impl Default for Combat {
    fn default() -> Self {
        Self::new()
    }
}

/// One turn-order entry.
///
/// Each placement of a character owns one primary entry (`clone_index` 0)
/// plus one clone per extra speed die.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combatant {
    /// Record identifier.
    pub id: CombatantId,
    /// The combat this entry belongs to.
    pub combat: CombatId,
    /// The character this entry acts for.
    pub character: CharacterId,
    /// The board placement this entry belongs to.
    pub placement: PlacementId,
    /// Display name; clones carry a `#n` suffix.
    pub name: String,
    /// Whether this is a synthetic speed-die clone.
    pub is_clone: bool,
    /// 0 for the primary entry, 1.. for clones.
    pub clone_index: u32,
    /// Rolled initiative; `None` until rolled and after every round reset.
    pub initiative: Option<f64>,
    /// Advisory marker toggled by players once a die has acted.
    pub used: bool,
}

impl Combatant {
    /// The slot this entry belongs to.
    pub fn slot(&self) -> (CombatId, CharacterId, PlacementId) {
        (self.combat, self.character, self.placement)
    }
}

/// Data for an entry that does not exist yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCombatant {
    /// The character the entry acts for.
    pub character: CharacterId,
    /// The board placement.
    pub placement: PlacementId,
    /// Display name.
    pub name: String,
    /// Whether this is a speed-die clone.
    pub is_clone: bool,
    /// 0 for the primary entry, 1.. for clones.
    pub clone_index: u32,
}

impl NewCombatant {
    /// A primary entry for a placement.
    pub fn primary(
        character: CharacterId,
        placement: PlacementId,
        name: impl Into<String>,
    ) -> Self {
        Self {
            character,
            placement,
            name: name.into(),
            is_clone: false,
            clone_index: 0,
        }
    }

    /// A clone entry; the display name gets a 1-based `#n` suffix.
    pub fn clone_of(
        character: CharacterId,
        placement: PlacementId,
        base_name: &str,
        clone_index: u32,
    ) -> Self {
        Self {
            character,
            placement,
            name: format!("{base_name} #{}", clone_index + 1),
            is_clone: true,
            clone_index,
        }
    }
}

/// A partial update of one entry. Unset fields are left alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatantPatch {
    /// The entry to update.
    pub id: CombatantId,
    /// New initiative (`Some(None)` clears it).
    pub initiative: Option<Option<f64>>,
    /// New used flag.
    pub used: Option<bool>,
}

impl CombatantPatch {
    /// Start an empty patch.
    pub fn new(id: CombatantId) -> Self {
        Self {
            id,
            initiative: None,
            used: None,
        }
    }

    /// Set or clear the initiative.
    pub fn initiative(mut self, value: Option<f64>) -> Self {
        self.initiative = Some(value);
        self
    }

    /// Set the used flag.
    pub fn used(mut self, used: bool) -> Self {
        self.used = Some(used);
        self
    }

    /// Apply the patch to an entry.
    pub fn apply(&self, entry: &mut Combatant) {
        if let Some(initiative) = self.initiative {
            entry.initiative = initiative;
        }
        if let Some(used) = self.used {
            entry.used = used;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clone_names_are_one_based() {
        let c = NewCombatant::clone_of(CharacterId::new(), PlacementId::new(), "Roland", 1);
        assert_eq!(c.name, "Roland #2");
        assert!(c.is_clone);
        assert_eq!(c.clone_index, 1);
    }

    #[test]
    fn patch_only_touches_set_fields() {
        let mut entry = Combatant {
            id: CombatantId::new(),
            combat: CombatId::new(),
            character: CharacterId::new(),
            placement: PlacementId::new(),
            name: "Angela".to_string(),
            is_clone: false,
            clone_index: 0,
            initiative: Some(4.0),
            used: true,
        };

        CombatantPatch::new(entry.id).used(false).apply(&mut entry);
        assert_eq!(entry.initiative, Some(4.0));
        assert!(!entry.used);

        CombatantPatch::new(entry.id).initiative(None).apply(&mut entry);
        assert_eq!(entry.initiative, None);
    }
}
