//! The faces produced by one batch of dice.

use serde::{Deserialize, Serialize};

/// Most faces a roll keeps for display. Dice past this are summed only.
pub const SHOWN_FACES: usize = 100;

/// Faces rolled for one `XdY` term.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DiceRoll {
    /// Faces on each die.
    pub sides: u32,
    /// Number of dice rolled.
    pub count: u32,
    /// The first [`SHOWN_FACES`] faces, in roll order.
    pub faces: Vec<u32>,
    /// Sum of every face, shown or not.
    pub sum: i64,
}

impl DiceRoll {
    /// Roll `count` dice, drawing each face from `face`.
    pub fn collect(sides: u32, count: u32, mut face: impl FnMut() -> u32) -> Self {
        let mut faces = Vec::with_capacity((count as usize).min(SHOWN_FACES));
        let mut sum: i64 = 0;
        for _ in 0..count {
            let value = face();
            sum = sum.saturating_add(i64::from(value));
            if faces.len() < SHOWN_FACES {
                faces.push(value);
            }
        }
        Self {
            sides,
            count,
            faces,
            sum,
        }
    }

    /// A roll made of exactly these faces.
    pub fn from_faces(sides: u32, faces: Vec<u32>) -> Self {
        let mut faces = faces.into_iter();
        Self::collect(sides, faces.len() as u32, || faces.next().unwrap_or(0))
    }

    /// Sum of all faces.
    pub fn total(&self) -> i64 {
        self.sum
    }

    /// Dice rolled but not kept in `faces`.
    pub fn hidden(&self) -> u32 {
        self.count.saturating_sub(self.faces.len() as u32)
    }
}

impl std::fmt::Display for DiceRoll {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut values: Vec<String> = self.faces.iter().map(|v| v.to_string()).collect();
        if self.hidden() > 0 {
            values.push(format!("… {} more", self.hidden()));
        }
        write!(f, "[{}]", values.join(", "))
    }
}
