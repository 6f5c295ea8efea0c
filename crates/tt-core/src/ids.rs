use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", &self.0.to_string()[..8])
            }
        }
    };
}

define_id!(
    /// Identifier of a character record.
    CharacterId
);
define_id!(
    /// Identifier of a skill or status item owned by a character.
    ItemId
);
define_id!(
    /// Identifier of a combat session.
    CombatId
);
define_id!(
    /// Identifier of a single turn-order entry.
    CombatantId
);
define_id!(
    /// Identifier of one placement (token) of a character on the board.
    ///
    /// A character may be placed several times; each placement owns its own
    /// set of speed-die entries.
    PlacementId
);
define_id!(
    /// Opaque identity of a connected client.
    ///
    /// Stamped on every change event so handlers can tell whether they
    /// originated the change.
    ClientId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        assert_ne!(CharacterId::new(), CharacterId::new());
        assert_ne!(ClientId::new(), ClientId::new());
    }

    #[test]
    fn display_is_short_prefix() {
        let id = CombatantId::new();
        let shown = id.to_string();
        assert_eq!(shown.len(), 8);
        assert!(id.0.to_string().starts_with(&shown));
    }

    #[test]
    fn serializes_as_bare_uuid() {
        let id = PlacementId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.0));
        let back: PlacementId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
