use std::fs;
use std::path::Path;

use serde::Deserialize;
use tt_mechanics::{MechanicsConfig, RerollDescriptor, RolledDie, StdDice};

/// Either a bare descriptor or a full roll carrying one.
#[derive(Deserialize)]
#[serde(untagged)]
enum SavedRoll {
    Rolled(RolledDie),
    Descriptor(RerollDescriptor),
}

impl SavedRoll {
    fn into_descriptor(self) -> RerollDescriptor {
        match self {
            Self::Rolled(rolled) => rolled.descriptor,
            Self::Descriptor(descriptor) => descriptor,
        }
    }
}

pub fn run(config: &MechanicsConfig, path: &Path, json: bool) -> Result<(), String> {
    let source =
        fs::read_to_string(path).map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    let saved: SavedRoll = serde_json::from_str(&source)
        .map_err(|_| format!("{} holds neither a roll nor a reroll descriptor", path.display()))?;
    let descriptor = saved.into_descriptor();

    let mut dice = StdDice::from_seed_option(config.seed);
    let rolled = descriptor.roll(&mut dice).map_err(|e| e.to_string())?;
    if !json && !descriptor.source_name.is_empty() {
        println!("Reroll of {}", descriptor.source_name);
    }
    super::roll::print_roll(&rolled, json)
}
