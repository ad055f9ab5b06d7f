//! # Knucklebone
//!
//! Dice for d20 rules engines.
//!
//! Knucklebone parses dice notation and rolls it against a pluggable source of
//! randomness. It knows nothing about characters or combat; it only answers
//! "what did the dice show?".
//!
//! - **Notation**: `NdM`, `NdM+K`, `NdM-K`, with `N` defaulting to 1
//! - **Advantage**: two d20s, keep the higher (or lower for disadvantage)
//! - **Criticals**: decided by the natural d20 face, never the modified total
//! - **Determinism**: [`SeededDice`] replays identically from a seed;
//!   [`ScriptedDice`] replays a fixed list of faces
//!
//! ## Quick Start
//!
//! ```
//! use knucklebone::{DiceEngine, RollMode, ScriptedDice};
//!
//! let mut dice = ScriptedDice::constant(3);
//! let outcome = dice.roll_expression("2d6+3");
//! assert_eq!(outcome.rolls(), &[3, 3]);
//! assert_eq!(outcome.total(), 9);
//!
//! // Malformed notation never panics
//! assert!(dice.roll_expression("xyz").is_empty());
//!
//! let check = dice.roll_d20(RollMode::Advantage);
//! assert_eq!(check.rolls().len(), 2);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod expr;
pub mod roll;
pub mod source;

// Re-exports for convenience
pub use error::DiceError;
pub use expr::{DiceExpr, MAX_DICE, MAX_SIDES};
pub use roll::{
    is_critical_failure, is_critical_success, AdvantageRoll, D20Roll, RollMode, RollOutcome, D20,
};
pub use source::{DiceEngine, ScriptedDice, SeededDice};
