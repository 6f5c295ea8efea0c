use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::{CharacterId, ItemId};
use crate::item::{Skill, Status};

/// A character's speed-dice configuration.
///
/// Controls how many turn-order entries the character contributes and which
/// formula each of them rolls for initiative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeedDice {
    /// Formula rolled for each entry's initiative (e.g. "1d6").
    #[serde(alias = "dice_size")]
    pub die_size_formula: String,
    /// Number of speed dice; values below 1 behave as 1.
    #[serde(alias = "num_dice", default = "default_die_count")]
    pub die_count: u32,
}

fn default_die_count() -> u32 {
    1
}

impl SpeedDice {
    /// Create a speed-dice configuration.
    pub fn new(die_size_formula: impl Into<String>, die_count: u32) -> Self {
        Self {
            die_size_formula: die_size_formula.into(),
            die_count,
        }
    }

    /// Number of turn-order entries this configuration requires per placement.
    pub fn entry_count(&self) -> u32 {
        self.die_count.max(1)
    }
}

/// How a character's initiative is tie-broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitiativeType {
    /// Player characters act first on exact ties.
    Player,
    /// Anything that is not a player.
    #[default]
    #[serde(other)]
    Other,
}

/// One of the fixed modifier categories on a character sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierCategory {
    /// Applies to every die.
    All,
    /// Applies to slash, pierce and blunt dice (and their counters).
    Offense,
    /// Applies to block and evade dice (and their counters).
    Defense,
    /// Applies to initiative rolls.
    Speed,
    /// Slash dice.
    #[serde(rename = "slash_mod", alias = "slash")]
    Slash,
    /// Pierce dice.
    #[serde(rename = "pierce_mod", alias = "pierce")]
    Pierce,
    /// Blunt dice.
    #[serde(rename = "blunt_mod", alias = "blunt")]
    Blunt,
    /// Block dice.
    #[serde(rename = "block_mod", alias = "block")]
    Block,
    /// Evade dice.
    #[serde(rename = "evade_mod", alias = "evade")]
    Evade,
}

impl ModifierCategory {
    /// Every category, in sheet order.
    pub const ALL: [ModifierCategory; 9] = [
        Self::All,
        Self::Offense,
        Self::Defense,
        Self::Speed,
        Self::Slash,
        Self::Pierce,
        Self::Blunt,
        Self::Block,
        Self::Evade,
    ];

    /// The sheet key for this category.
    pub fn key(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Offense => "offense",
            Self::Defense => "defense",
            Self::Speed => "speed",
            Self::Slash => "slash_mod",
            Self::Pierce => "pierce_mod",
            Self::Blunt => "blunt_mod",
            Self::Block => "block_mod",
            Self::Evade => "evade_mod",
        }
    }
}

impl fmt::Display for ModifierCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A character's modifier values. Absent categories read as 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModifierSet(BTreeMap<ModifierCategory, i32>);

impl ModifierSet {
    /// Create an empty modifier set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of a category, 0 when unset.
    pub fn get(&self, category: ModifierCategory) -> i32 {
        self.0.get(&category).copied().unwrap_or(0)
    }

    /// Set the value of a category.
    pub fn set(&mut self, category: ModifierCategory, value: i32) {
        self.0.insert(category, value);
    }

    /// Builder form of [`ModifierSet::set`].
    pub fn with(mut self, category: ModifierCategory, value: i32) -> Self {
        self.set(category, value);
        self
    }
}

/// A numeric resource such as health or stagger.
///
/// Unlike a gauge with hard bounds, the value may be pushed below zero or
/// above its maximum by status effects; the table decides what that means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// Current value.
    pub value: i32,
    /// Nominal maximum.
    pub max: i32,
}

impl Track {
    /// Create a track starting at its maximum.
    pub fn new(max: i32) -> Self {
        Self { value: max, max }
    }

    /// Adjust the value by a delta. Returns the new value.
    pub fn adjust(&mut self, delta: i32) -> i32 {
        self.value = self.value.saturating_add(delta);
        self.value
    }
}

impl Default for Track {
    fn default() -> Self {
        Self::new(0)
    }
}

/// A character sheet as seen by the combat core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    /// Record identifier.
    #[serde(default)]
    pub id: CharacterId,
    /// Display name.
    pub name: String,
    /// Speed-dice configuration; characters without one never get clones
    /// and are ignored by the round reset.
    #[serde(default)]
    pub speed_dice: Option<SpeedDice>,
    /// Modifier values by category.
    #[serde(default)]
    pub modifiers: ModifierSet,
    /// Initiative tie-break class.
    #[serde(default)]
    pub initiative_type: InitiativeType,
    /// Health track.
    #[serde(default)]
    pub health: Track,
    /// Stagger track.
    #[serde(default)]
    pub stagger: Track,
    /// Skill items.
    #[serde(default)]
    pub skills: Vec<Skill>,
    /// Status items.
    #[serde(default)]
    pub statuses: Vec<Status>,
}

impl Character {
    /// Create a character with no speed dice and empty modifiers.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: CharacterId::new(),
            name: name.into(),
            speed_dice: None,
            modifiers: ModifierSet::new(),
            initiative_type: InitiativeType::Other,
            health: Track::default(),
            stagger: Track::default(),
            skills: Vec::new(),
            statuses: Vec::new(),
        }
    }

    /// Set the speed-dice configuration.
    pub fn with_speed_dice(mut self, formula: impl Into<String>, count: u32) -> Self {
        self.speed_dice = Some(SpeedDice::new(formula, count));
        self
    }

    /// Set one modifier category.
    pub fn with_modifier(mut self, category: ModifierCategory, value: i32) -> Self {
        self.modifiers.set(category, value);
        self
    }

    /// Mark the character as a player.
    pub fn player(mut self) -> Self {
        self.initiative_type = InitiativeType::Player;
        self
    }

    /// Set the health and stagger maxima (both start full).
    pub fn with_resources(mut self, health: i32, stagger: i32) -> Self {
        self.health = Track::new(health);
        self.stagger = Track::new(stagger);
        self
    }

    /// Add a skill item.
    pub fn with_skill(mut self, skill: Skill) -> Self {
        self.skills.push(skill);
        self
    }

    /// Add a status item.
    pub fn with_status(mut self, status: Status) -> Self {
        self.statuses.push(status);
        self
    }

    /// Number of turn-order entries required per placement, if the
    /// character has speed dice at all.
    pub fn required_entries(&self) -> Option<u32> {
        self.speed_dice.as_ref().map(SpeedDice::entry_count)
    }

    /// Whether the character is a player for initiative purposes.
    pub fn is_player(&self) -> bool {
        self.initiative_type == InitiativeType::Player
    }

    /// Find a skill by id.
    pub fn skill(&self, id: ItemId) -> Option<&Skill> {
        self.skills.iter().find(|s| s.id == id)
    }

    /// Find a skill by name (case-insensitive).
    pub fn skill_by_name(&self, name: &str) -> Option<&Skill> {
        self.skills
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }

    /// Find a status by id.
    pub fn status(&self, id: ItemId) -> Option<&Status> {
        self.statuses.iter().find(|s| s.id == id)
    }

    /// Find a status by id, mutably.
    pub fn status_mut(&mut self, id: ItemId) -> Option<&mut Status> {
        self.statuses.iter_mut().find(|s| s.id == id)
    }

    /// Find a status by name (case-insensitive).
    pub fn status_by_name(&self, name: &str) -> Option<&Status> {
        self.statuses
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }
}
