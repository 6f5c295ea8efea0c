//! Dice formulas, roll resolution, speed-die sync, and turn order for Tabletop Tracker.
//!
//! The pieces build on each other: [`formula`] parses `XdY+Z` strings,
//! [`modifier`] turns a die's type tag into a contextual modifier,
//! [`engine`] evaluates both under one of three roll modes, and [`reroll`]
//! pairs every result with the descriptor needed to roll it again. On the
//! combat side, [`combat::sync`] keeps each character's speed-die entries in
//! step with its sheet and [`combat::initiative`] rolls and orders them.
//! [`session::CombatSession`] wires everything to a store and a chat log and
//! delivers change events to any number of clients.

pub mod chat;
pub mod combat;
pub mod config;
pub mod dice;
pub mod engine;
pub mod error;
pub mod formula;
pub mod modifier;
pub mod reroll;
pub mod session;
pub mod skill;
pub mod status;

pub use chat::{ChatBody, ChatEntry, ChatLog, ChatSink, MessageId};
pub use combat::initiative::{InitiativeRoll, roll_initiative};
pub use combat::sync::{SpeedDieSynchronizer, SyncOutcome};
pub use combat::{TurnAdvance, advance_round, next_turn, toggle_used, turn_order};
pub use config::MechanicsConfig;
pub use dice::{RandomSource, ScriptedDice, StdDice};
pub use engine::{RollMode, RollOutcome, RollRequest, evaluate};
pub use error::{MechError, MechResult};
pub use formula::{ParsedFormula, append_term, parse_formula};
pub use modifier::{contextual_modifier, modifier_categories};
pub use reroll::{RerollDescriptor, RolledDie};
pub use session::{ClientRole, CombatSession};
pub use skill::{DieOptions, DieRoll, SkillRoll, declare_skill, roll_die, roll_skill};
pub use status::{StatusFiring, apply_post_active, fire_status};
