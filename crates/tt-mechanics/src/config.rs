//! Configuration for the mechanics engine.

use serde::{Deserialize, Serialize};

use crate::error::{MechError, MechResult};
use crate::formula::parse_formula;

/// Tunable constants for rolling and ordering initiative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MechanicsConfig {
    /// Formula used when a character has no valid speed-dice formula.
    pub default_initiative_formula: String,
    /// Added to a player's initiative so players win exact ties.
    pub player_tiebreak: f64,
    /// Lowest initiative a roll may produce.
    pub initiative_floor: i64,
    /// Decimals shown when reporting initiative.
    pub initiative_decimals: usize,
    /// RNG seed for reproducible sessions; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for MechanicsConfig {
    fn default() -> Self {
        Self {
            default_initiative_formula: "1d6".to_string(),
            player_tiebreak: 0.01,
            initiative_floor: 1,
            initiative_decimals: 2,
            seed: None,
        }
    }
}

impl MechanicsConfig {
    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(source: &str) -> MechResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| MechError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Set the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the fallback initiative formula.
    pub fn with_default_formula(mut self, formula: impl Into<String>) -> Self {
        self.default_initiative_formula = formula.into();
        self
    }

    /// Set the player tie-break.
    pub fn with_player_tiebreak(mut self, tiebreak: f64) -> Self {
        self.player_tiebreak = tiebreak;
        self
    }

    /// Check that the values can be used.
    ///
    /// The fallback formula must parse, the floor must be at least 1, and the
    /// tie-break must lie in `[0, 1)` so it can never bridge an integer gap.
    pub fn validate(&self) -> MechResult<()> {
        parse_formula(&self.default_initiative_formula).map_err(|_| {
            MechError::InvalidConfig(format!(
                "default_initiative_formula '{}' is not a valid formula",
                self.default_initiative_formula
            ))
        })?;
        if self.initiative_floor < 1 {
            return Err(MechError::InvalidConfig(format!(
                "initiative_floor must be at least 1, got {}",
                self.initiative_floor
            )));
        }
        if !(0.0..1.0).contains(&self.player_tiebreak) {
            return Err(MechError::InvalidConfig(format!(
                "player_tiebreak must be in [0, 1), got {}",
                self.player_tiebreak
            )));
        }
        Ok(())
    }

    /// Render an initiative value with the configured precision.
    pub fn format_initiative(&self, value: f64) -> String {
        format!("{:.*}", self.initiative_decimals, value)
    }
}
