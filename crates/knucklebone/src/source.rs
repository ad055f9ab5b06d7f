//! Dice engines: where random faces come from.
//!
//! [`DiceEngine`] has a single required method, [`DiceEngine::roll_die`].
//! Everything else (expressions, advantage, d20 checks) is built on top of it,
//! so swapping the source swaps every roll in the rules engine.
//!
//! - [`SeededDice`]: ChaCha8-backed and reproducible from its seed
//! - [`ScriptedDice`]: replays a fixed list of faces (tests, replays)

use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::warn;

use crate::expr::DiceExpr;
use crate::roll::{AdvantageRoll, D20Roll, RollMode, RollOutcome, D20};

/// A source of die faces plus the standard rolls derived from it.
pub trait DiceEngine {
    /// Roll one die, uniform in `[1, sides]`. A zero-sided die acts as a d1.
    fn roll_die(&mut self, sides: u32) -> u32;

    /// Roll a notation string such as `"2d6+3"`.
    ///
    /// Malformed notation is logged and yields [`RollOutcome::empty`]; it
    /// never panics.
    fn roll_expression(&mut self, notation: &str) -> RollOutcome {
        match notation.parse::<DiceExpr>() {
            Ok(expr) => expr.roll(self),
            Err(err) => {
                warn!(notation, error = %err, "malformed dice expression, rolling nothing");
                RollOutcome::empty()
            }
        }
    }

    /// Two d20s, keep the higher.
    fn roll_with_advantage(&mut self) -> AdvantageRoll {
        let first = self.roll_die(D20);
        let second = self.roll_die(D20);
        AdvantageRoll::advantage(first, second)
    }

    /// Two d20s, keep the lower.
    fn roll_with_disadvantage(&mut self) -> AdvantageRoll {
        let first = self.roll_die(D20);
        let second = self.roll_die(D20);
        AdvantageRoll::disadvantage(first, second)
    }

    /// A d20 under the given mode.
    fn roll_d20(&mut self, mode: RollMode) -> D20Roll {
        match mode {
            RollMode::Normal => D20Roll::single(self.roll_die(D20)),
            RollMode::Advantage => D20Roll::paired(mode, self.roll_with_advantage()),
            RollMode::Disadvantage => D20Roll::paired(mode, self.roll_with_disadvantage()),
        }
    }
}

impl<D: DiceEngine + ?Sized> DiceEngine for Box<D> {
    fn roll_die(&mut self, sides: u32) -> u32 {
        (**self).roll_die(sides)
    }
}

impl<D: DiceEngine + ?Sized> DiceEngine for &mut D {
    fn roll_die(&mut self, sides: u32) -> u32 {
        (**self).roll_die(sides)
    }
}

// =============================================================================
// SeededDice
// =============================================================================

/// Deterministic dice backed by ChaCha8.
///
/// Two engines built from the same seed produce the same faces in the same
/// order, which is what makes combat logs replayable.
#[derive(Debug, Clone)]
pub struct SeededDice {
    rng: ChaCha8Rng,
    seed: u64,
}

impl SeededDice {
    /// Create dice from a seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Create dice from a random seed. The seed is still recorded.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::new(rand::random())
    }

    /// The seed these dice were created from.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Rewind to the first face of the seed.
    pub fn reset(&mut self) {
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);
    }
}

impl DiceEngine for SeededDice {
    fn roll_die(&mut self, sides: u32) -> u32 {
        self.rng.gen_range(1..=sides.max(1))
    }
}

// =============================================================================
// ScriptedDice
// =============================================================================

/// Dice that return a fixed script of faces.
///
/// Each face is clamped into `[1, sides]` of the die being rolled. Once the
/// script runs out the last face repeats, so `ScriptedDice::constant(3)` is a
/// die that always shows 3.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDice {
    script: VecDeque<u32>,
    last: Option<u32>,
    rolled: usize,
}

impl ScriptedDice {
    /// Dice that replay `faces` in order.
    pub fn new(faces: impl IntoIterator<Item = u32>) -> Self {
        Self {
            script: faces.into_iter().collect(),
            last: None,
            rolled: 0,
        }
    }

    /// Dice that always show `face`.
    #[must_use]
    pub fn constant(face: u32) -> Self {
        Self::new([face])
    }

    /// Append faces to the end of the script.
    pub fn extend(&mut self, faces: impl IntoIterator<Item = u32>) {
        self.script.extend(faces);
    }

    /// Faces left before the last one starts repeating.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.script.len()
    }

    /// How many dice have been rolled so far.
    #[must_use]
    pub fn rolled(&self) -> usize {
        self.rolled
    }
}

impl DiceEngine for ScriptedDice {
    fn roll_die(&mut self, sides: u32) -> u32 {
        let face = match self.script.pop_front() {
            Some(face) => {
                self.last = Some(face);
                face
            }
            None => self.last.unwrap_or(1),
        };
        self.rolled += 1;
        face.clamp(1, sides.max(1))
    }
}
