//! Table rules that vary between groups.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::condition::DEFAULT_SAVE_DC;

/// Errors from loading or validating a [`RulesConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The JSON could not be parsed.
    #[error("invalid rules JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is out of range.
    #[error("invalid value for {field}: {reason}")]
    InvalidValue {
        /// Offending field
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

/// Tunable combat rules.
///
/// Missing JSON fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// A natural 20 hits regardless of armor class
    pub natural_twenty_always_hits: bool,
    /// A natural 1 misses regardless of the total
    pub natural_one_always_misses: bool,
    /// Dexterity check needed to flee; `None` means fleeing always works
    pub flee_dc: Option<i32>,
    /// Save DC for conditions applied without one
    pub default_save_dc: i32,
    /// Damage dice count multiplier on a critical hit
    pub critical_dice_multiplier: u32,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            natural_twenty_always_hits: true,
            natural_one_always_misses: true,
            flee_dc: None,
            default_save_dc: DEFAULT_SAVE_DC,
            critical_dice_multiplier: 2,
        }
    }
}

impl RulesConfig {
    /// Default rules with a flee DC.
    #[must_use]
    pub fn with_flee_dc(dc: i32) -> Self {
        Self {
            flee_dc: Some(dc),
            ..Default::default()
        }
    }

    /// Parse and validate a JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and
    /// [`ConfigError::InvalidValue`] for out-of-range values.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=10).contains(&self.critical_dice_multiplier) {
            return Err(ConfigError::InvalidValue {
                field: "critical_dice_multiplier",
                reason: format!("{} is outside 1..=10", self.critical_dice_multiplier),
            });
        }
        if !(1..=40).contains(&self.default_save_dc) {
            return Err(ConfigError::InvalidValue {
                field: "default_save_dc",
                reason: format!("{} is outside 1..=40", self.default_save_dc),
            });
        }
        if let Some(dc) = self.flee_dc {
            if !(1..=40).contains(&dc) {
                return Err(ConfigError::InvalidValue {
                    field: "flee_dc",
                    reason: format!("{dc} is outside 1..=40"),
                });
            }
        }
        Ok(())
    }
}
