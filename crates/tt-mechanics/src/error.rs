//! Error types for the mechanics engine.

use tt_core::{ClientId, CombatantId, CoreError};

/// Errors that can occur during mechanics operations.
///
/// Every variant aborts a single action; none of them leaves the turn order
/// half-written.
#[derive(Debug, thiserror::Error)]
pub enum MechError {
    /// A dice formula does not match `XdY` followed by `+N`/`-N` terms.
    #[error("invalid formula '{0}': must be of the format XdY+Z")]
    MalformedFormula(String),

    /// Both the minimum and the maximum override were requested.
    #[error("paralysis and poise cannot both apply to one roll")]
    ConflictingOverrides,

    /// A character, skill, status, die or rule no longer exists.
    #[error("missing item: {0}")]
    MissingItem(String),

    /// A turn-order entry no longer exists.
    #[error("missing turn-order entry: {0}")]
    MissingEntry(CombatantId),

    /// A post-active rule names an operator the engine does not know.
    #[error("unknown post-active operator '{0}'")]
    InvalidOperator(String),

    /// An action was attributed to a client that never connected.
    #[error("unknown client: {0}")]
    UnknownClient(ClientId),

    /// The combat has no entries to take a turn.
    #[error("no active entry")]
    NoActiveEntry,

    /// The mechanics configuration is malformed.
    #[error("invalid mechanics config: {0}")]
    InvalidConfig(String),

    /// The record store rejected a read or write.
    #[error(transparent)]
    Store(#[from] CoreError),
}

/// Convenience result type for mechanics operations.
pub type MechResult<T> = Result<T, MechError>;
