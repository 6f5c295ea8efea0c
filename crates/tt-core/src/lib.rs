//! Core records for Tabletop Tracker: characters, items, combats, and the record store.
//!
//! This crate owns the data model that the mechanics engine reads and the
//! narrow [`RecordStore`] interface through which it writes. It knows nothing
//! about dice; [`MemoryStore`] is a complete in-process implementation that
//! hosts and tests can use directly.

/// Characters, speed dice, modifier categories, and resource tracks.
pub mod character;
/// Combat sessions and their turn-order entries.
pub mod combat;
/// Error types used throughout the crate.
pub mod error;
/// Opaque identifiers for records and clients.
pub mod ids;
/// Skill and status items carried by characters.
pub mod item;
/// Query builder for filtering turn-order entries.
pub mod query;
/// The record-store interface, change events, and the in-memory store.
pub mod store;

/// Re-export character types.
pub use character::{Character, InitiativeType, ModifierCategory, ModifierSet, SpeedDice, Track};
/// Re-export combat record types.
pub use combat::{Combat, Combatant, CombatantPatch, NewCombatant};
/// Re-export error types.
pub use error::{CoreError, CoreResult};
/// Re-export identifier types.
pub use ids::{CharacterId, ClientId, CombatId, CombatantId, ItemId, PlacementId};
/// Re-export item types.
pub use item::{
    Die, DieKind, DieType, PostActiveOperator, PostActiveRule, Skill, Stance, Status,
    StatusEffect, StatusTarget,
};
/// Re-export the query builder.
pub use query::CombatantQuery;
/// Re-export store types.
pub use store::{Change, ChangeEvent, MemoryStore, RecordStore};
