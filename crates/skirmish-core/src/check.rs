//! Check resolution.
//!
//! [`resolve_check`] turns a d20 roll, a creature's attributes and a
//! [`Situation`] into a [`CheckResult`]. Ability checks, skill checks, saving
//! throws and attack rolls all go through the same function; only the
//! modifier differs:
//!
//! | check | modifier |
//! |---|---|
//! | ability | ability modifier |
//! | skill | ability modifier + proficiency (doubled for expertise) |
//! | save | ability modifier + proficiency if proficient |
//! | attack | ability modifier + proficiency if proficient + equipment bonus |
//!
//! Resolution is pure: the actor is only read.
//!
//! # Example
//!
//! ```
//! use knucklebone::ScriptedDice;
//! use skirmish_core::{resolve_check, Ability, Attributes, Check, Situation};
//!
//! let mut dice = ScriptedDice::constant(10);
//! let actor = Attributes::default();
//! let check = Check::Ability { ability: Ability::Strength };
//! let result = resolve_check(&mut dice, &actor, check, Some(10), Situation::NORMAL);
//! assert_eq!(result.total(), 10);
//! assert_eq!(result.success(), Some(true));
//! ```

use knucklebone::{DiceEngine, RollMode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ability::{Ability, Skill};
use crate::attributes::AttributeProvider;
use crate::combatant::AttackProfile;

/// What is being rolled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Check {
    /// Raw ability check
    Ability {
        /// Ability tested
        ability: Ability,
    },
    /// Skill check
    Skill {
        /// Skill tested
        skill: Skill,
    },
    /// Saving throw; proficiency comes from class or monster data
    Save {
        /// Ability saved with
        ability: Ability,
        /// Whether the save proficiency applies
        proficient: bool,
    },
    /// Attack roll
    Attack {
        /// Ability used to hit
        ability: Ability,
        /// Whether the proficiency bonus applies
        proficient: bool,
        /// Flat bonus from equipment
        bonus: i32,
    },
}

impl Check {
    /// A saving throw with the proficiency the provider declares.
    pub fn saving_throw(actor: &(impl AttributeProvider + ?Sized), ability: Ability) -> Self {
        Self::Save {
            ability,
            proficient: actor.save_proficiency(ability),
        }
    }

    /// An attack roll with the given weapon.
    #[must_use]
    pub fn attack(profile: &AttackProfile) -> Self {
        Self::Attack {
            ability: profile.ability,
            proficient: profile.proficient,
            bonus: profile.to_hit_bonus,
        }
    }

    /// The ability whose modifier applies.
    #[must_use]
    pub const fn ability(&self) -> Ability {
        match *self {
            Self::Ability { ability }
            | Self::Save { ability, .. }
            | Self::Attack { ability, .. } => ability,
            Self::Skill { skill } => skill.ability(),
        }
    }

    /// Whether this is a saving throw.
    #[must_use]
    pub const fn is_save(&self) -> bool {
        matches!(self, Self::Save { .. })
    }

    /// Total modifier the actor adds to the d20.
    pub fn modifier(&self, actor: &(impl AttributeProvider + ?Sized)) -> i32 {
        let base = actor.modifier(self.ability());
        let prof = actor.proficiency_bonus();
        match *self {
            Self::Ability { .. } => base,
            Self::Skill { skill } => base + actor.skill_proficiency(skill).bonus(prof),
            Self::Save { proficient, .. } => base + if proficient { prof } else { 0 },
            Self::Attack {
                proficient, bonus, ..
            } => base + if proficient { prof } else { 0 } + bonus,
        }
    }
}

/// Circumstances around a roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Situation {
    /// Something grants advantage
    pub advantage: bool,
    /// Something imposes disadvantage
    pub disadvantage: bool,
    /// The roll fails regardless of the dice
    pub auto_fail: bool,
}

impl Situation {
    /// Nothing special.
    pub const NORMAL: Self = Self {
        advantage: false,
        disadvantage: false,
        auto_fail: false,
    };

    /// Advantage only.
    #[must_use]
    pub const fn with_advantage() -> Self {
        Self {
            advantage: true,
            ..Self::NORMAL
        }
    }

    /// Disadvantage only.
    #[must_use]
    pub const fn with_disadvantage() -> Self {
        Self {
            disadvantage: true,
            ..Self::NORMAL
        }
    }

    /// Combine two sources of circumstance; any source can set each flag.
    #[must_use]
    pub const fn merge(self, other: Self) -> Self {
        Self {
            advantage: self.advantage || other.advantage,
            disadvantage: self.disadvantage || other.disadvantage,
            auto_fail: self.auto_fail || other.auto_fail,
        }
    }

    /// The roll mode. Advantage and disadvantage together cancel out to a
    /// normal roll, however many sources impose each.
    #[must_use]
    pub const fn mode(&self) -> RollMode {
        match (self.advantage, self.disadvantage) {
            (true, false) => RollMode::Advantage,
            (false, true) => RollMode::Disadvantage,
            (true, true) | (false, false) => RollMode::Normal,
        }
    }
}

/// Immutable record of one resolved check.
///
/// This is the audit record handed to presentation and to save-to-remove
/// logic. Fields are read through accessors only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    check: Check,
    mode: RollMode,
    rolls: Vec<u32>,
    natural: u32,
    modifier: i32,
    total: i32,
    dc: Option<i32>,
    success: Option<bool>,
    critical: bool,
    critical_failure: bool,
    auto_failed: bool,
}

impl CheckResult {
    /// What was rolled.
    #[must_use]
    pub fn check(&self) -> Check {
        self.check
    }

    /// Mode actually used after advantage/disadvantage cancellation.
    #[must_use]
    pub fn mode(&self) -> RollMode {
        self.mode
    }

    /// Every d20 rolled (two under advantage or disadvantage).
    #[must_use]
    pub fn rolls(&self) -> &[u32] {
        &self.rolls
    }

    /// The d20 face that counted.
    #[must_use]
    pub fn natural(&self) -> u32 {
        self.natural
    }

    /// Modifier added to the natural face.
    #[must_use]
    pub fn modifier(&self) -> i32 {
        self.modifier
    }

    /// Natural face plus modifier.
    #[must_use]
    pub fn total(&self) -> i32 {
        self.total
    }

    /// Difficulty the check was made against, if any.
    #[must_use]
    pub fn dc(&self) -> Option<i32> {
        self.dc
    }

    /// `Some(total >= dc)` when a DC was given, `None` for a free roll.
    #[must_use]
    pub fn success(&self) -> Option<bool> {
        self.success
    }

    /// Whether the check met its DC. Free rolls never succeed.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.success == Some(true)
    }

    /// Natural 20.
    #[must_use]
    pub fn critical(&self) -> bool {
        self.critical
    }

    /// Natural 1.
    #[must_use]
    pub fn critical_failure(&self) -> bool {
        self.critical_failure
    }

    /// Failed because of an auto-fail effect, not the dice.
    #[must_use]
    pub fn auto_failed(&self) -> bool {
        self.auto_failed
    }
}

/// Roll a check.
///
/// `success` is `total >= dc` (ties succeed) when `dc` is given and `None`
/// otherwise. An auto-fail situation still rolls the dice for the record but
/// reports `Some(false)`.
pub fn resolve_check<D, A>(
    dice: &mut D,
    actor: &A,
    check: Check,
    dc: Option<i32>,
    situation: Situation,
) -> CheckResult
where
    D: DiceEngine + ?Sized,
    A: AttributeProvider + ?Sized,
{
    let mode = situation.mode();
    let roll = dice.roll_d20(mode);
    let modifier = check.modifier(actor);
    let natural = roll.natural();
    let total = i32::try_from(natural).unwrap_or(i32::MAX) + modifier;

    let auto_failed = situation.auto_fail && dc.is_some();
    let success = dc.map(|dc| !auto_failed && total >= dc);

    debug!(
        ?check,
        ?mode,
        natural,
        modifier,
        total,
        ?dc,
        ?success,
        "check resolved"
    );

    CheckResult {
        check,
        mode,
        rolls: roll.rolls().to_vec(),
        natural,
        modifier,
        total,
        dc,
        success,
        critical: roll.is_critical_success(),
        critical_failure: roll.is_critical_failure(),
        auto_failed,
    }
}
