//! Random sources for rolling dice.
//!
//! Everything that rolls takes a `&mut dyn RandomSource`, so sessions can
//! run on a seeded generator and tests can script exact faces.

pub mod roll;

pub use roll::{DiceRoll, SHOWN_FACES};

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Produces die faces.
pub trait RandomSource {
    /// Roll one die with `sides` faces. Returns a value in `1..=sides`.
    fn roll_face(&mut self, sides: u32) -> u32;

    /// Roll `count` dice with `sides` faces each.
    fn roll_dice(&mut self, count: u32, sides: u32) -> DiceRoll {
        DiceRoll::collect(sides, count, || self.roll_face(sides))
    }
}

/// A random source backed by the standard RNG.
#[derive(Debug, Clone)]
pub struct StdDice {
    rng: StdRng,
}

impl StdDice {
    /// A reproducible source.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// A source seeded from the operating system.
    pub fn from_os() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Seeded when `seed` is set, OS-seeded otherwise.
    pub fn from_seed_option(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_os, Self::seeded)
    }
}

impl RandomSource for StdDice {
    fn roll_face(&mut self, sides: u32) -> u32 {
        self.rng.random_range(1..=sides.max(1))
    }
}

/// Replays a fixed list of faces, cycling when it runs out.
///
/// Faces are clamped into `1..=sides` for the die being rolled. An empty
/// script always rolls 1.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDice {
    script: Vec<u32>,
    queue: VecDeque<u32>,
}

impl ScriptedDice {
    /// Script the given faces.
    pub fn new(faces: impl IntoIterator<Item = u32>) -> Self {
        let script: Vec<u32> = faces.into_iter().collect();
        Self {
            queue: script.iter().copied().collect(),
            script,
        }
    }

    /// Faces left before the script restarts.
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl RandomSource for ScriptedDice {
    fn roll_face(&mut self, sides: u32) -> u32 {
        if self.queue.is_empty() {
            self.queue.extend(self.script.iter().copied());
        }
        let face = self.queue.pop_front().unwrap_or(1);
        face.clamp(1, sides.max(1))
    }
}
