use crate::ids::{CharacterId, CombatId, CombatantId};

/// Alias for `Result<T, CoreError>`.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur when reading or writing records.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The requested character does not exist in the store.
    #[error("character not found: {0}")]
    CharacterNotFound(CharacterId),

    /// The requested combat does not exist in the store.
    #[error("combat not found: {0}")]
    CombatNotFound(CombatId),

    /// The requested turn-order entry does not exist in the store.
    #[error("combatant not found: {0}")]
    CombatantNotFound(CombatantId),

    /// A record with the same identifier is already stored.
    #[error("duplicate record: {0}")]
    Duplicate(String),

    /// A generic validation error with a descriptive message.
    #[error("validation error: {0}")]
    Validation(String),
}
