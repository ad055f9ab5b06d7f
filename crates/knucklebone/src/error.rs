//! Errors produced while parsing dice notation.

use thiserror::Error;

/// Reasons a dice expression failed to parse.
///
/// These only surface through [`DiceExpr::from_str`](crate::DiceExpr). The
/// rolling entry point [`DiceEngine::roll_expression`](crate::DiceEngine::roll_expression)
/// swallows them and returns an empty roll instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceError {
    /// The expression was empty or whitespace.
    #[error("empty dice expression")]
    Empty,

    /// No `d` separator between count and sides.
    #[error("missing 'd' in dice expression '{0}'")]
    MissingSeparator(String),

    /// The dice count was not a number.
    #[error("invalid dice count: '{0}'")]
    InvalidCount(String),

    /// The dice count was zero.
    #[error("dice count must be at least 1")]
    ZeroCount,

    /// More dice than a single roll allows.
    #[error("dice count {count} exceeds the limit of {limit}")]
    TooManyDice {
        /// Requested count
        count: u32,
        /// Maximum accepted count
        limit: u32,
    },

    /// The number of sides was not a number.
    #[error("invalid die sides: '{0}'")]
    InvalidSides(String),

    /// The die had zero sides.
    #[error("die sides must be at least 1")]
    ZeroSides,

    /// More sides than a die allows.
    #[error("die sides {sides} exceed the limit of {limit}")]
    TooManySides {
        /// Requested sides
        sides: u32,
        /// Maximum accepted sides
        limit: u32,
    },

    /// The trailing modifier was not a signed number.
    #[error("invalid modifier: '{0}'")]
    InvalidModifier(String),
}
