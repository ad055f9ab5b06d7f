//! Roll results.
//!
//! Everything here is an immutable record of what the dice showed. Critical
//! detection looks only at the natural face of a d20, never at a modified
//! total.

use serde::{Deserialize, Serialize};

/// Sides on the die that decides checks.
pub const D20: u32 = 20;

/// Result of rolling a dice expression.
///
/// An empty outcome (`rolls == []`, `total == 0`) is what a malformed
/// expression produces; callers treat it as a no-op roll.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollOutcome {
    rolls: Vec<u32>,
    total: i32,
}

impl RollOutcome {
    /// Create an outcome from individual die faces and the final total.
    #[must_use]
    pub fn new(rolls: Vec<u32>, total: i32) -> Self {
        Self { rolls, total }
    }

    /// The no-op roll returned for malformed expressions.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Individual die faces, in roll order.
    #[must_use]
    pub fn rolls(&self) -> &[u32] {
        &self.rolls
    }

    /// Sum of the dice plus the modifier.
    #[must_use]
    pub fn total(&self) -> i32 {
        self.total
    }

    /// Whether no dice were rolled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rolls.is_empty()
    }
}

/// How a d20 is rolled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollMode {
    /// One die
    #[default]
    Normal,
    /// Two dice, keep the higher
    Advantage,
    /// Two dice, keep the lower
    Disadvantage,
}

/// Two independent d20s and the one that counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvantageRoll {
    /// First die
    pub first: u32,
    /// Second die
    pub second: u32,
    /// The kept die: max for advantage, min for disadvantage
    pub chosen: u32,
}

impl AdvantageRoll {
    /// Keep the higher of two dice.
    #[must_use]
    pub fn advantage(first: u32, second: u32) -> Self {
        Self {
            first,
            second,
            chosen: first.max(second),
        }
    }

    /// Keep the lower of two dice.
    #[must_use]
    pub fn disadvantage(first: u32, second: u32) -> Self {
        Self {
            first,
            second,
            chosen: first.min(second),
        }
    }
}

/// A d20 roll under some [`RollMode`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct D20Roll {
    mode: RollMode,
    rolls: Vec<u32>,
    natural: u32,
}

impl D20Roll {
    /// A single die.
    #[must_use]
    pub fn single(face: u32) -> Self {
        Self {
            mode: RollMode::Normal,
            rolls: vec![face],
            natural: face,
        }
    }

    /// Two dice under advantage or disadvantage.
    #[must_use]
    pub fn paired(mode: RollMode, pair: AdvantageRoll) -> Self {
        Self {
            mode,
            rolls: vec![pair.first, pair.second],
            natural: pair.chosen,
        }
    }

    /// Mode this roll was made under.
    #[must_use]
    pub fn mode(&self) -> RollMode {
        self.mode
    }

    /// Every die rolled (one or two).
    #[must_use]
    pub fn rolls(&self) -> &[u32] {
        &self.rolls
    }

    /// The face that counts, before modifiers.
    #[must_use]
    pub fn natural(&self) -> u32 {
        self.natural
    }

    /// Natural 20.
    #[must_use]
    pub fn is_critical_success(&self) -> bool {
        is_critical_success(D20, self.natural)
    }

    /// Natural 1.
    #[must_use]
    pub fn is_critical_failure(&self) -> bool {
        is_critical_failure(D20, self.natural)
    }
}

/// A natural maximum on a d20. Meaningless for other dice.
#[must_use]
pub fn is_critical_success(sides: u32, natural: u32) -> bool {
    sides == D20 && natural == D20
}

/// A natural 1 on a d20. Meaningless for other dice.
#[must_use]
pub fn is_critical_failure(sides: u32, natural: u32) -> bool {
    sides == D20 && natural == 1
}
