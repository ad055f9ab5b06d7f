//! Combatants: everything that can take a turn in a fight.
//!
//! A [`Combatant`] is a plain data record. Hit points are private and only
//! change through [`Combatant::apply_damage`] and [`Combatant::apply_healing`],
//! which keep `0 <= current <= max` at all times.

use std::fmt;

use knucklebone::DiceExpr;
use serde::{Deserialize, Serialize};

use crate::ability::{Ability, Proficiency, Skill};
use crate::attributes::{AttributeProvider, Attributes};
use crate::condition::ActiveConditions;

/// Unique identifier for a combatant within a session.
///
/// Ordered by numeric value; ids are chosen by whoever builds the roster.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CombatantId(u64);

impl CombatantId {
    /// Creates a new `CombatantId` from a raw value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for CombatantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CombatantId({})", self.0)
    }
}

impl fmt::Display for CombatantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for CombatantId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

/// How a combatant attacks: the equipment-derived half of an attack roll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackProfile {
    /// Display name of the weapon or attack
    pub name: String,
    /// Ability used for to-hit and damage
    pub ability: Ability,
    /// Whether the proficiency bonus applies to hit
    pub proficient: bool,
    /// Damage dice, doubled in count on a critical
    pub damage: DiceExpr,
    /// Flat to-hit bonus from equipment (e.g. a +1 weapon)
    #[serde(default)]
    pub to_hit_bonus: i32,
    /// Flat damage bonus from equipment
    #[serde(default)]
    pub damage_bonus: i32,
}

impl AttackProfile {
    /// A proficient attack with no magic bonuses.
    #[must_use]
    pub fn melee(ability: Ability, damage: DiceExpr) -> Self {
        Self {
            name: "attack".to_string(),
            ability,
            proficient: true,
            damage,
            to_hit_bonus: 0,
            damage_bonus: 0,
        }
    }

    /// Rename the attack.
    #[must_use]
    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }
}

impl Default for AttackProfile {
    fn default() -> Self {
        // Unarmed strike
        Self::melee(Ability::Strength, DiceExpr::new(1, 1, 0)).named("unarmed strike")
    }
}

/// A participant in combat.
///
/// Deserializing clamps hit points back into `0..=max`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "CombatantData")]
pub struct Combatant {
    id: CombatantId,
    name: String,
    player_controlled: bool,
    attributes: Attributes,
    attack: AttackProfile,
    max_hit_points: i32,
    current_hit_points: i32,
    initiative: i32,
    has_acted: bool,
    has_moved: bool,
    extra_actions: u8,
    conditions: ActiveConditions,
}

/// Wire form of [`Combatant`], before the hit point invariant is enforced.
#[derive(Deserialize)]
struct CombatantData {
    id: CombatantId,
    name: String,
    player_controlled: bool,
    attributes: Attributes,
    attack: AttackProfile,
    max_hit_points: i32,
    current_hit_points: i32,
    #[serde(default)]
    initiative: i32,
    #[serde(default)]
    has_acted: bool,
    #[serde(default)]
    has_moved: bool,
    #[serde(default)]
    extra_actions: u8,
    #[serde(default)]
    conditions: ActiveConditions,
}

impl From<CombatantData> for Combatant {
    fn from(data: CombatantData) -> Self {
        let max_hit_points = data.max_hit_points.max(0);
        Self {
            id: data.id,
            name: data.name,
            player_controlled: data.player_controlled,
            attributes: data.attributes,
            attack: data.attack,
            max_hit_points,
            current_hit_points: data.current_hit_points.clamp(0, max_hit_points),
            initiative: data.initiative,
            has_acted: data.has_acted,
            has_moved: data.has_moved,
            extra_actions: data.extra_actions,
            conditions: data.conditions,
        }
    }
}

impl Combatant {
    /// Creates a combatant at full health.
    ///
    /// A negative maximum is treated as 0.
    #[must_use]
    pub fn new(
        id: CombatantId,
        name: &str,
        player_controlled: bool,
        attributes: Attributes,
        max_hit_points: i32,
    ) -> Self {
        let max_hit_points = max_hit_points.max(0);
        Self {
            id,
            name: name.to_string(),
            player_controlled,
            attributes,
            attack: AttackProfile::default(),
            max_hit_points,
            current_hit_points: max_hit_points,
            initiative: 0,
            has_acted: false,
            has_moved: false,
            extra_actions: 0,
            conditions: ActiveConditions::new(),
        }
    }

    /// Replace the attack profile.
    #[must_use]
    pub fn with_attack(mut self, attack: AttackProfile) -> Self {
        self.attack = attack;
        self
    }

    /// Identifier.
    #[must_use]
    pub fn id(&self) -> CombatantId {
        self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the player controls this combatant.
    #[must_use]
    pub fn is_player_controlled(&self) -> bool {
        self.player_controlled
    }

    /// Attribute snapshot.
    #[must_use]
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Attack profile.
    #[must_use]
    pub fn attack(&self) -> &AttackProfile {
        &self.attack
    }

    /// Hit point maximum.
    #[must_use]
    pub fn max_hit_points(&self) -> i32 {
        self.max_hit_points
    }

    /// Current hit points.
    #[must_use]
    pub fn current_hit_points(&self) -> i32 {
        self.current_hit_points
    }

    /// At 0 hit points.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.current_hit_points == 0
    }

    /// Above 0 hit points.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        !self.is_dead()
    }

    /// Lose hit points, never below 0. Returns the hit points actually lost.
    ///
    /// Non-positive amounts do nothing.
    pub fn apply_damage(&mut self, amount: i32) -> i32 {
        let lost = amount.clamp(0, self.current_hit_points);
        self.current_hit_points -= lost;
        lost
    }

    /// Regain hit points, never above the maximum. Returns the hit points
    /// actually regained.
    ///
    /// Non-positive amounts do nothing.
    pub fn apply_healing(&mut self, amount: i32) -> i32 {
        let gained = amount.clamp(0, self.max_hit_points - self.current_hit_points);
        self.current_hit_points += gained;
        gained
    }

    /// Initiative total rolled at the start of combat.
    #[must_use]
    pub fn initiative(&self) -> i32 {
        self.initiative
    }

    /// Used its action this turn (and has no extra action left).
    #[must_use]
    pub fn has_acted(&self) -> bool {
        self.has_acted
    }

    /// Moved this turn.
    #[must_use]
    pub fn has_moved(&self) -> bool {
        self.has_moved
    }

    /// Extra actions still available this turn.
    #[must_use]
    pub fn extra_actions(&self) -> u8 {
        self.extra_actions
    }

    /// Whether an action is still available this turn.
    #[must_use]
    pub fn has_action_available(&self) -> bool {
        !self.has_acted || self.extra_actions > 0
    }

    /// Active conditions.
    #[must_use]
    pub fn conditions(&self) -> &ActiveConditions {
        &self.conditions
    }

    pub(crate) fn conditions_mut(&mut self) -> &mut ActiveConditions {
        &mut self.conditions
    }

    pub(crate) fn set_initiative(&mut self, initiative: i32) {
        self.initiative = initiative;
    }

    /// Clear what an earlier fight left behind: initiative, turn flags and
    /// the condition tick record. Active conditions carry over.
    pub(crate) fn reset_for_combat(&mut self) {
        self.initiative = 0;
        self.has_acted = false;
        self.has_moved = false;
        self.extra_actions = 0;
        self.conditions.reset_tick();
    }

    /// Reset per-turn flags at the start of this combatant's turn.
    pub(crate) fn begin_turn(&mut self, extra_actions: u8) {
        self.has_acted = false;
        self.has_moved = false;
        self.extra_actions = extra_actions;
    }

    /// Spend the action, or an extra action once the action is gone.
    pub(crate) fn spend_action(&mut self) {
        if self.has_acted {
            self.extra_actions = self.extra_actions.saturating_sub(1);
        } else {
            self.has_acted = true;
        }
    }

    pub(crate) fn spend_move(&mut self) {
        self.has_moved = true;
    }
}

impl AttributeProvider for Combatant {
    fn ability_score(&self, ability: Ability) -> i32 {
        self.attributes.ability_score(ability)
    }

    fn proficiency_bonus(&self) -> i32 {
        self.attributes.proficiency_bonus()
    }

    fn skill_proficiency(&self, skill: Skill) -> Proficiency {
        self.attributes.skill_proficiency(skill)
    }

    fn save_proficiency(&self, ability: Ability) -> bool {
        self.attributes.save_proficiency(ability)
    }

    fn armor_class(&self) -> i32 {
        self.attributes.armor_class()
    }
}
