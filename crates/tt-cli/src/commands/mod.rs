pub mod encounter;
pub mod reroll;
pub mod roll;
pub mod skill;

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;
use tt_core::Character;
use tt_mechanics::MechanicsConfig;

/// A roster file: the characters taking part.
#[derive(Debug, Deserialize)]
pub struct Roster {
    pub characters: Vec<RosterEntry>,
}

/// One roster character and how many times it is placed in combat.
#[derive(Debug, Deserialize)]
pub struct RosterEntry {
    #[serde(flatten)]
    pub character: Character,
    #[serde(default = "one")]
    pub placements: u32,
}

fn one() -> u32 {
    1
}

impl Roster {
    /// Find a character by name (case-insensitive).
    pub fn find(&self, name: &str) -> Result<&Character, String> {
        self.characters
            .iter()
            .map(|e| &e.character)
            .find(|c| c.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| format!("no character named '{name}' in roster"))
    }
}

/// Load the mechanics config, falling back to defaults when no file is
/// given. A `--seed` flag wins over the file's seed.
pub fn load_config(path: Option<&Path>, seed: Option<u64>) -> Result<MechanicsConfig, String> {
    let mut config = match path {
        Some(path) => {
            let source = read(path)?;
            let config = MechanicsConfig::from_toml_str(&source).map_err(|e| e.to_string())?;
            debug!(path = %path.display(), "loaded config");
            config
        }
        None => MechanicsConfig::default(),
    };
    if let Some(seed) = seed {
        config = config.with_seed(seed);
    }
    Ok(config)
}

pub fn load_roster(path: &Path) -> Result<Roster, String> {
    let source = read(path)?;
    serde_json::from_str(&source).map_err(|e| format!("invalid roster {}: {e}", path.display()))
}

fn read(path: &Path) -> Result<String, String> {
    fs::read_to_string(path).map_err(|e| format!("cannot read {}: {e}", path.display()))
}
