//! Dice notation.
//!
//! Parses and rolls expressions of the form `NdM`, `NdM+K` and `NdM-K`,
//! e.g. `"2d6+3"`, `"1d20"`, `"d8"`, `"4d6-2"`. The count defaults to 1 when
//! omitted. Parsing is case-insensitive and ignores whitespace.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DiceError;
use crate::roll::RollOutcome;
use crate::source::DiceEngine;

/// Largest dice count accepted in one expression.
pub const MAX_DICE: u32 = 1000;

/// Largest die accepted in one expression.
pub const MAX_SIDES: u32 = 1000;

/// A parsed dice expression.
///
/// Serializes as its notation string, so condition and weapon data can carry
/// `"1d6"` directly and have it validated once at load time.
///
/// # Example
///
/// ```
/// use knucklebone::DiceExpr;
///
/// let expr: DiceExpr = "2d6+3".parse().unwrap();
/// assert_eq!(expr.count, 2);
/// assert_eq!(expr.sides, 6);
/// assert_eq!(expr.modifier, 3);
/// assert_eq!(expr.to_string(), "2d6+3");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DiceExpr {
    /// Number of dice to roll
    pub count: u32,
    /// Number of sides per die
    pub sides: u32,
    /// Flat modifier added to the sum
    pub modifier: i32,
}

impl DiceExpr {
    /// Create a new expression.
    #[must_use]
    pub const fn new(count: u32, sides: u32, modifier: i32) -> Self {
        Self {
            count,
            sides,
            modifier,
        }
    }

    /// Parse an expression, returning `None` for malformed input.
    #[must_use]
    pub fn parse(notation: &str) -> Option<Self> {
        notation.parse().ok()
    }

    /// The same expression with its dice count doubled (critical damage).
    ///
    /// The modifier is not doubled.
    #[must_use]
    pub const fn doubled(self) -> Self {
        self.multiplied(2)
    }

    /// The same expression with its dice count multiplied by `factor`.
    #[must_use]
    pub const fn multiplied(self, factor: u32) -> Self {
        Self {
            count: self.count.saturating_mul(factor),
            ..self
        }
    }

    /// Roll every die and sum with the modifier.
    pub fn roll<D: DiceEngine + ?Sized>(&self, dice: &mut D) -> RollOutcome {
        let rolls: Vec<u32> = (0..self.count).map(|_| dice.roll_die(self.sides)).collect();
        let sum = rolls
            .iter()
            .fold(0_i32, |acc, r| acc.saturating_add(i32::try_from(*r).unwrap_or(i32::MAX)));
        RollOutcome::new(rolls, sum.saturating_add(self.modifier))
    }

    /// Smallest possible total.
    #[must_use]
    pub fn min(&self) -> i32 {
        to_i32(self.count).saturating_add(self.modifier)
    }

    /// Largest possible total.
    #[must_use]
    pub fn max(&self) -> i32 {
        to_i32(self.count)
            .saturating_mul(to_i32(self.sides))
            .saturating_add(self.modifier)
    }

    /// Expected total, rounded down.
    #[must_use]
    pub fn average(&self) -> i32 {
        let avg_per_die = (1.0 + f64::from(self.sides)) / 2.0;
        #[allow(clippy::cast_possible_truncation)]
        let avg = (f64::from(self.count) * avg_per_die + f64::from(self.modifier)).floor() as i32;
        avg
    }
}

fn to_i32(v: u32) -> i32 {
    i32::try_from(v).unwrap_or(i32::MAX)
}

impl FromStr for DiceExpr {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let notation: String = s
            .split_whitespace()
            .collect::<String>()
            .to_ascii_lowercase();
        if notation.is_empty() {
            return Err(DiceError::Empty);
        }

        let d_pos = notation
            .find('d')
            .ok_or_else(|| DiceError::MissingSeparator(s.trim().to_string()))?;

        let count_str = &notation[..d_pos];
        let count: u32 = if count_str.is_empty() {
            1
        } else {
            count_str
                .parse()
                .map_err(|_| DiceError::InvalidCount(count_str.to_string()))?
        };
        if count == 0 {
            return Err(DiceError::ZeroCount);
        }
        if count > MAX_DICE {
            return Err(DiceError::TooManyDice {
                count,
                limit: MAX_DICE,
            });
        }

        let rest = &notation[d_pos + 1..];
        let (sides_str, modifier) = match rest.find(['+', '-']) {
            Some(0) | None => (rest, 0),
            Some(pos) => {
                let sign = &rest[pos..=pos];
                let digits = &rest[pos + 1..];
                if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(DiceError::InvalidModifier(rest[pos..].to_string()));
                }
                let magnitude: i32 = digits
                    .parse()
                    .map_err(|_| DiceError::InvalidModifier(rest[pos..].to_string()))?;
                let modifier = if sign == "-" { -magnitude } else { magnitude };
                (&rest[..pos], modifier)
            }
        };

        if sides_str.is_empty() || !sides_str.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DiceError::InvalidSides(sides_str.to_string()));
        }
        let sides: u32 = sides_str
            .parse()
            .map_err(|_| DiceError::InvalidSides(sides_str.to_string()))?;
        if sides == 0 {
            return Err(DiceError::ZeroSides);
        }
        if sides > MAX_SIDES {
            return Err(DiceError::TooManySides {
                sides,
                limit: MAX_SIDES,
            });
        }

        Ok(Self {
            count,
            sides,
            modifier,
        })
    }
}

impl TryFrom<String> for DiceExpr {
    type Error = DiceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DiceExpr> for String {
    fn from(expr: DiceExpr) -> Self {
        expr.to_string()
    }
}

impl fmt::Display for DiceExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.modifier {
            0 => write!(f, "{}d{}", self.count, self.sides),
            m if m > 0 => write!(f, "{}d{}+{}", self.count, self.sides, m),
            m => write!(f, "{}d{}{}", self.count, self.sides, m),
        }
    }
}
