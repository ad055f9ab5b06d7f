//! Condition definitions and the registry they are loaded into.
//!
//! Definitions are data. Effects are tagged variants decoded once when the
//! registry is built, so nothing is re-parsed while a fight is running.
//!
//! ```json
//! {
//!   "id": "burning",
//!   "name": "Burning",
//!   "effects": [{ "type": "damage_per_turn", "dice": "1d6" }],
//!   "duration": { "fixed_turns": 3 }
//! }
//! ```

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;

use bitflags::bitflags;
use knucklebone::DiceExpr;
use serde::{Deserialize, Serialize};

use super::ConditionError;
use crate::ability::Ability;

// =============================================================================
// Identifiers
// =============================================================================

/// Identifier of a condition definition, e.g. `"poisoned"`.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConditionId(String);

impl ConditionId {
    /// Creates a new `ConditionId`.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ConditionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConditionId({})", self.0)
    }
}

impl fmt::Display for ConditionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConditionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl Borrow<str> for ConditionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// Effects
// =============================================================================

/// One mechanical consequence of a condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Effect {
    /// The bearer's attack rolls have disadvantage
    AttackDisadvantage,
    /// The bearer's attack rolls have advantage
    AttackAdvantage,
    /// Attack rolls against the bearer have advantage
    GrantsAdvantageToAttackers,
    /// Attack rolls against the bearer have disadvantage
    ImposesDisadvantageOnAttackers,
    /// The bearer's ability and skill checks have disadvantage
    AbilityCheckDisadvantage,
    /// The bearer automatically fails saves with these abilities
    AutoFailSaves {
        /// Abilities whose saves fail
        abilities: Vec<Ability>,
    },
    /// Damage rolled at each end of turn
    DamagePerTurn {
        /// Damage dice
        dice: DiceExpr,
    },
    /// Healing rolled at each end of turn
    HealPerTurn {
        /// Healing dice
        dice: DiceExpr,
    },
    /// Flat armor class bonus (negative for a penalty)
    AcBonus {
        /// Amount added to armor class
        amount: i32,
    },
    /// One extra action each turn
    ExtraAction,
    /// The bearer cannot take actions
    CannotAct,
    /// The bearer cannot move
    CannotMove,
}

bitflags! {
    /// Fast-query summary of a set of effects.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct EffectTags: u16 {
        /// See [`Effect::AttackDisadvantage`]
        const ATTACK_DISADVANTAGE = 1 << 0;
        /// See [`Effect::AttackAdvantage`]
        const ATTACK_ADVANTAGE = 1 << 1;
        /// See [`Effect::GrantsAdvantageToAttackers`]
        const GRANTS_ADVANTAGE_TO_ATTACKERS = 1 << 2;
        /// See [`Effect::ImposesDisadvantageOnAttackers`]
        const IMPOSES_DISADVANTAGE_ON_ATTACKERS = 1 << 3;
        /// See [`Effect::AbilityCheckDisadvantage`]
        const ABILITY_CHECK_DISADVANTAGE = 1 << 4;
        /// See [`Effect::AutoFailSaves`]
        const AUTO_FAIL_SAVES = 1 << 5;
        /// See [`Effect::DamagePerTurn`]
        const DAMAGE_PER_TURN = 1 << 6;
        /// See [`Effect::HealPerTurn`]
        const HEAL_PER_TURN = 1 << 7;
        /// See [`Effect::AcBonus`]
        const AC_BONUS = 1 << 8;
        /// See [`Effect::ExtraAction`]
        const EXTRA_ACTION = 1 << 9;
        /// See [`Effect::CannotAct`]
        const CANNOT_ACT = 1 << 10;
        /// See [`Effect::CannotMove`]
        const CANNOT_MOVE = 1 << 11;
    }
}

impl Effect {
    /// Tag for this effect.
    #[must_use]
    pub const fn tag(&self) -> EffectTags {
        match self {
            Self::AttackDisadvantage => EffectTags::ATTACK_DISADVANTAGE,
            Self::AttackAdvantage => EffectTags::ATTACK_ADVANTAGE,
            Self::GrantsAdvantageToAttackers => EffectTags::GRANTS_ADVANTAGE_TO_ATTACKERS,
            Self::ImposesDisadvantageOnAttackers => EffectTags::IMPOSES_DISADVANTAGE_ON_ATTACKERS,
            Self::AbilityCheckDisadvantage => EffectTags::ABILITY_CHECK_DISADVANTAGE,
            Self::AutoFailSaves { .. } => EffectTags::AUTO_FAIL_SAVES,
            Self::DamagePerTurn { .. } => EffectTags::DAMAGE_PER_TURN,
            Self::HealPerTurn { .. } => EffectTags::HEAL_PER_TURN,
            Self::AcBonus { .. } => EffectTags::AC_BONUS,
            Self::ExtraAction => EffectTags::EXTRA_ACTION,
            Self::CannotAct => EffectTags::CANNOT_ACT,
            Self::CannotMove => EffectTags::CANNOT_MOVE,
        }
    }
}

// =============================================================================
// Duration
// =============================================================================

/// How a condition ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationPolicy {
    /// A saving throw at each end of turn removes it on success
    UntilSaved,
    /// Counts down once per end of turn and ends at zero
    FixedTurns(u32),
    /// Ends at the next end-of-turn tick
    UntilNextTurn,
    /// Ends only when concentration is broken
    Concentration,
}

// =============================================================================
// Definition
// =============================================================================

/// A named condition: its effects and how it ends.
///
/// Built with [`ConditionDefinition::new`] and the `with_*` methods, or
/// deserialized from JSON. The effect tags are derived on construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "DefinitionData", into = "DefinitionData")]
pub struct ConditionDefinition {
    id: ConditionId,
    name: String,
    effects: Vec<Effect>,
    saving_ability: Option<Ability>,
    duration: DurationPolicy,
    save_dc: Option<i32>,
    tags: EffectTags,
}

#[derive(Clone, Serialize, Deserialize)]
struct DefinitionData {
    id: ConditionId,
    name: String,
    #[serde(default)]
    effects: Vec<Effect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    saving_ability: Option<Ability>,
    duration: DurationPolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    save_dc: Option<i32>,
}

impl From<DefinitionData> for ConditionDefinition {
    fn from(data: DefinitionData) -> Self {
        let tags = tags_of(&data.effects);
        Self {
            id: data.id,
            name: data.name,
            effects: data.effects,
            saving_ability: data.saving_ability,
            duration: data.duration,
            save_dc: data.save_dc,
            tags,
        }
    }
}

impl From<ConditionDefinition> for DefinitionData {
    fn from(def: ConditionDefinition) -> Self {
        Self {
            id: def.id,
            name: def.name,
            effects: def.effects,
            saving_ability: def.saving_ability,
            duration: def.duration,
            save_dc: def.save_dc,
        }
    }
}

fn tags_of(effects: &[Effect]) -> EffectTags {
    effects
        .iter()
        .fold(EffectTags::empty(), |tags, effect| tags | effect.tag())
}

impl ConditionDefinition {
    /// A definition with no effects.
    pub fn new(id: impl Into<String>, name: &str, duration: DurationPolicy) -> Self {
        Self {
            id: ConditionId::new(id),
            name: name.to_string(),
            effects: Vec::new(),
            saving_ability: None,
            duration,
            save_dc: None,
            tags: EffectTags::empty(),
        }
    }

    /// Add an effect.
    #[must_use]
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.tags |= effect.tag();
        self.effects.push(effect);
        self
    }

    /// Set the ability used to save against this condition.
    #[must_use]
    pub fn with_save(mut self, ability: Ability) -> Self {
        self.saving_ability = Some(ability);
        self
    }

    /// Set the default save DC, used when an application gives none.
    #[must_use]
    pub fn with_save_dc(mut self, dc: i32) -> Self {
        self.save_dc = Some(dc);
        self
    }

    /// Identifier.
    #[must_use]
    pub fn id(&self) -> &ConditionId {
        &self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Effects in declaration order.
    #[must_use]
    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    /// Ability for the save that ends the condition.
    #[must_use]
    pub fn saving_ability(&self) -> Option<Ability> {
        self.saving_ability
    }

    /// Default duration policy.
    #[must_use]
    pub fn duration(&self) -> DurationPolicy {
        self.duration
    }

    /// Default save DC.
    #[must_use]
    pub fn save_dc(&self) -> Option<i32> {
        self.save_dc
    }

    /// Union of the effect tags.
    #[must_use]
    pub fn tags(&self) -> EffectTags {
        self.tags
    }

    fn validate(&self) -> Result<(), ConditionError> {
        if self.id.as_str().is_empty() {
            return Err(ConditionError::Load("condition with an empty id".to_string()));
        }
        if self.duration == DurationPolicy::UntilSaved && self.saving_ability.is_none() {
            return Err(ConditionError::Load(format!(
                "{} lasts until saved but names no saving ability",
                self.id
            )));
        }
        Ok(())
    }
}

// =============================================================================
// Registry
// =============================================================================

/// All known condition definitions, keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionRegistry {
    definitions: BTreeMap<ConditionId, ConditionDefinition>,
}

impl ConditionRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in conditions.
    #[must_use]
    pub fn standard() -> Self {
        let str_dex = vec![Ability::Strength, Ability::Dexterity];
        let mut registry = Self::new();
        let standard = [
            ConditionDefinition::new("blinded", "Blinded", DurationPolicy::FixedTurns(1))
                .with_effect(Effect::AttackDisadvantage)
                .with_effect(Effect::GrantsAdvantageToAttackers),
            ConditionDefinition::new("poisoned", "Poisoned", DurationPolicy::UntilSaved)
                .with_effect(Effect::AttackDisadvantage)
                .with_effect(Effect::AbilityCheckDisadvantage)
                .with_save(Ability::Constitution),
            ConditionDefinition::new("frightened", "Frightened", DurationPolicy::UntilSaved)
                .with_effect(Effect::AttackDisadvantage)
                .with_effect(Effect::AbilityCheckDisadvantage)
                .with_save(Ability::Wisdom),
            ConditionDefinition::new("stunned", "Stunned", DurationPolicy::UntilSaved)
                .with_effect(Effect::CannotAct)
                .with_effect(Effect::CannotMove)
                .with_effect(Effect::AutoFailSaves {
                    abilities: str_dex.clone(),
                })
                .with_effect(Effect::GrantsAdvantageToAttackers)
                .with_save(Ability::Constitution),
            ConditionDefinition::new("paralyzed", "Paralyzed", DurationPolicy::UntilSaved)
                .with_effect(Effect::CannotAct)
                .with_effect(Effect::CannotMove)
                .with_effect(Effect::AutoFailSaves {
                    abilities: str_dex.clone(),
                })
                .with_effect(Effect::GrantsAdvantageToAttackers)
                .with_save(Ability::Wisdom),
            ConditionDefinition::new("unconscious", "Unconscious", DurationPolicy::FixedTurns(10))
                .with_effect(Effect::CannotAct)
                .with_effect(Effect::CannotMove)
                .with_effect(Effect::AutoFailSaves { abilities: str_dex })
                .with_effect(Effect::GrantsAdvantageToAttackers),
            ConditionDefinition::new("restrained", "Restrained", DurationPolicy::UntilSaved)
                .with_effect(Effect::CannotMove)
                .with_effect(Effect::AttackDisadvantage)
                .with_effect(Effect::GrantsAdvantageToAttackers)
                .with_save(Ability::Strength),
            ConditionDefinition::new("prone", "Prone", DurationPolicy::UntilNextTurn)
                .with_effect(Effect::AttackDisadvantage)
                .with_effect(Effect::GrantsAdvantageToAttackers),
            ConditionDefinition::new("invisible", "Invisible", DurationPolicy::Concentration)
                .with_effect(Effect::AttackAdvantage)
                .with_effect(Effect::ImposesDisadvantageOnAttackers),
            ConditionDefinition::new("burning", "Burning", DurationPolicy::FixedTurns(3))
                .with_effect(Effect::DamagePerTurn {
                    dice: DiceExpr::new(1, 6, 0),
                }),
            ConditionDefinition::new("bleeding", "Bleeding", DurationPolicy::UntilSaved)
                .with_effect(Effect::DamagePerTurn {
                    dice: DiceExpr::new(1, 4, 0),
                })
                .with_save(Ability::Constitution),
            ConditionDefinition::new("regenerating", "Regenerating", DurationPolicy::FixedTurns(3))
                .with_effect(Effect::HealPerTurn {
                    dice: DiceExpr::new(2, 4, 2),
                }),
            ConditionDefinition::new("dodging", "Dodging", DurationPolicy::UntilNextTurn)
                .with_effect(Effect::ImposesDisadvantageOnAttackers),
            ConditionDefinition::new("hasted", "Hasted", DurationPolicy::Concentration)
                .with_effect(Effect::ExtraAction)
                .with_effect(Effect::AcBonus { amount: 2 }),
            ConditionDefinition::new("shielded", "Shielded", DurationPolicy::UntilNextTurn)
                .with_effect(Effect::AcBonus { amount: 5 }),
        ];
        for def in standard {
            registry.insert(def);
        }
        registry
    }

    /// Load definitions from a JSON array.
    ///
    /// # Errors
    ///
    /// Returns [`ConditionError::Load`] if the JSON is malformed, an id
    /// repeats, or a definition is inconsistent.
    pub fn from_json(json: &str) -> Result<Self, ConditionError> {
        let mut registry = Self::new();
        registry.load_json(json)?;
        Ok(registry)
    }

    /// Add definitions from a JSON array on top of the current ones.
    ///
    /// Nothing is added if any definition is rejected.
    ///
    /// # Errors
    ///
    /// See [`ConditionRegistry::from_json`]. A JSON definition may replace
    /// an existing one, but ids must be unique within the array.
    pub fn load_json(&mut self, json: &str) -> Result<usize, ConditionError> {
        let definitions: Vec<ConditionDefinition> =
            serde_json::from_str(json).map_err(|e| ConditionError::Load(e.to_string()))?;

        let mut seen = BTreeMap::new();
        for def in &definitions {
            def.validate()?;
            if seen.insert(def.id().clone(), ()).is_some() {
                return Err(ConditionError::Load(format!("duplicate condition {}", def.id())));
            }
        }

        let count = definitions.len();
        for def in definitions {
            self.insert(def);
        }
        Ok(count)
    }

    /// Insert a definition, returning the one it replaced.
    pub fn insert(&mut self, definition: ConditionDefinition) -> Option<ConditionDefinition> {
        self.definitions.insert(definition.id().clone(), definition)
    }

    /// Look up a definition.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ConditionDefinition> {
        self.definitions.get(id)
    }

    /// Whether a definition exists.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.definitions.contains_key(id)
    }

    /// Number of definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// No definitions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Definitions in id order.
    pub fn iter(&self) -> impl Iterator<Item = &ConditionDefinition> {
        self.definitions.values()
    }
}
