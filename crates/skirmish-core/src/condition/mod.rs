//! Conditions: timed status effects on combatants.
//!
//! The [`ConditionSystem`] holds the [`ConditionRegistry`] and applies its
//! rules to the [`ActiveConditions`] carried by each [`Combatant`]. It never
//! stores per-combatant state itself, so one system serves any number of
//! sessions.
//!
//! # End of turn
//!
//! [`ConditionSystem::end_of_turn`] processes every instance on a target in
//! id order, and for each one:
//!
//! 1. rolls damage-per-turn and heal-per-turn effects
//! 2. counts down fixed-turn durations, marking them for removal at zero
//! 3. marks until-next-turn durations applied in an earlier tick for removal
//! 4. rolls the saving throw for until-saved durations, marking on success
//!
//! Marked instances are removed only after every instance has been
//! evaluated. Each target may be ticked once per tick.
//!
//! Until-next-turn conditions also end at [`ConditionSystem::start_of_turn`],
//! when their bearer's next turn begins.

mod definition;
mod instance;

pub use definition::{
    ConditionDefinition, ConditionId, ConditionRegistry, DurationPolicy, Effect, EffectTags,
};
pub use instance::{ActiveConditions, ApplyOptions, ConditionInstance};

use knucklebone::DiceEngine;
use thiserror::Error;
use tracing::{debug, warn};

use crate::check::{resolve_check, Check, Situation};
use crate::combatant::{Combatant, CombatantId};
use crate::event::{CombatEvent, RemovalReason};

/// Save DC used when neither the application nor the definition gives one.
pub const DEFAULT_SAVE_DC: i32 = 10;

/// Errors raised by the condition system.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConditionError {
    /// No definition with this id. Nothing was changed.
    #[error("unknown condition '{0}'")]
    UnknownCondition(String),

    /// `end_of_turn` ran twice for the same target in one tick.
    #[error("conditions on {target} already ticked in tick {tick}")]
    AlreadyTicked {
        /// Target that was ticked twice
        target: CombatantId,
        /// The repeated tick
        tick: u64,
    },

    /// Condition definitions could not be loaded.
    #[error("failed to load condition definitions: {0}")]
    Load(String),
}

/// Applies condition rules to combatants.
#[derive(Debug, Clone)]
pub struct ConditionSystem {
    registry: ConditionRegistry,
    default_save_dc: i32,
}

impl Default for ConditionSystem {
    fn default() -> Self {
        Self::new(ConditionRegistry::standard())
    }
}

impl ConditionSystem {
    /// A system over the given definitions.
    #[must_use]
    pub fn new(registry: ConditionRegistry) -> Self {
        Self {
            registry,
            default_save_dc: DEFAULT_SAVE_DC,
        }
    }

    /// Set the fallback save DC.
    #[must_use]
    pub fn with_default_save_dc(mut self, dc: i32) -> Self {
        self.default_save_dc = dc;
        self
    }

    /// The loaded definitions.
    #[must_use]
    pub fn registry(&self) -> &ConditionRegistry {
        &self.registry
    }

    /// Fallback save DC.
    #[must_use]
    pub fn default_save_dc(&self) -> i32 {
        self.default_save_dc
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Apply a condition, overwriting any instance of the same id.
    ///
    /// # Errors
    ///
    /// Returns [`ConditionError::UnknownCondition`] if `id` is not in the
    /// registry. The target is left untouched.
    pub fn apply(
        &self,
        target: &mut Combatant,
        id: &str,
        options: ApplyOptions,
        tick: u64,
    ) -> Result<CombatEvent, ConditionError> {
        let Some(def) = self.registry.get(id) else {
            warn!(combatant = %target.id(), condition = id, "unknown condition ignored");
            return Err(ConditionError::UnknownCondition(id.to_string()));
        };

        let duration = options.duration_override.unwrap_or(def.duration());
        let turns_remaining = match duration {
            DurationPolicy::FixedTurns(n) => Some(n),
            _ => None,
        };
        let instance = ConditionInstance {
            condition: def.id().clone(),
            duration,
            turns_remaining,
            source: options.source,
            dc: options.dc,
            applied_at_tick: tick,
        };
        let replaced = target.conditions_mut().insert(instance).is_some();

        debug!(combatant = %target.id(), condition = id, ?duration, replaced, "condition applied");

        Ok(CombatEvent::ConditionApplied {
            target: target.id(),
            condition: def.id().clone(),
            duration,
            source: options.source,
            replaced,
        })
    }

    /// Remove a condition. Returns `false` if it was not active.
    pub fn remove(&self, target: &mut Combatant, id: &str) -> bool {
        let removed = target.conditions_mut().remove(id).is_some();
        if removed {
            debug!(combatant = %target.id(), condition = id, "condition removed");
        }
        removed
    }

    /// Remove every concentration condition on the target.
    pub fn end_concentration(&self, target: &mut Combatant) -> Vec<ConditionId> {
        Self::drop_concentration(target, |_| true)
    }

    /// Remove the concentration conditions `source` maintains on the target.
    pub fn end_concentration_from(
        &self,
        target: &mut Combatant,
        source: CombatantId,
    ) -> Vec<ConditionId> {
        Self::drop_concentration(target, |instance| instance.source == Some(source))
    }

    fn drop_concentration(
        target: &mut Combatant,
        mut pred: impl FnMut(&ConditionInstance) -> bool,
    ) -> Vec<ConditionId> {
        let removed: Vec<ConditionId> = target
            .conditions_mut()
            .remove_where(|i| i.duration == DurationPolicy::Concentration && pred(i))
            .into_iter()
            .map(|i| i.condition)
            .collect();
        if !removed.is_empty() {
            debug!(combatant = %target.id(), ?removed, "concentration ended");
        }
        removed
    }

    /// End the target's until-next-turn conditions as its turn begins.
    pub fn start_of_turn(&self, target: &mut Combatant) -> Vec<CombatEvent> {
        let target_id = target.id();
        target
            .conditions_mut()
            .remove_where(|i| i.duration == DurationPolicy::UntilNextTurn)
            .into_iter()
            .map(|instance| {
                debug!(
                    combatant = %target_id,
                    condition = %instance.condition,
                    "condition ended at turn start"
                );
                CombatEvent::ConditionRemoved {
                    target: target_id,
                    condition: instance.condition,
                    reason: RemovalReason::Expired,
                }
            })
            .collect()
    }

    /// Process the target's conditions at the end of a turn.
    ///
    /// Returns the events produced, in order.
    ///
    /// # Errors
    ///
    /// Returns [`ConditionError::AlreadyTicked`] if the target was already
    /// processed in `tick`. Debug builds panic instead.
    pub fn end_of_turn<D: DiceEngine + ?Sized>(
        &self,
        dice: &mut D,
        target: &mut Combatant,
        tick: u64,
    ) -> Result<Vec<CombatEvent>, ConditionError> {
        let target_id = target.id();
        let fresh = target.conditions_mut().mark_ticked(tick);
        debug_assert!(fresh, "end_of_turn called twice for {target_id} in tick {tick}");
        if !fresh {
            return Err(ConditionError::AlreadyTicked {
                target: target_id,
                tick,
            });
        }

        let mut events = Vec::new();
        let mut expired: Vec<(ConditionId, RemovalReason)> = Vec::new();
        let instances: Vec<ConditionInstance> = target.conditions().iter().cloned().collect();

        for instance in instances {
            let Some(def) = self.registry.get(instance.condition.as_str()) else {
                warn!(
                    combatant = %target_id,
                    condition = %instance.condition,
                    "no definition for active condition"
                );
                continue;
            };

            // Damage and healing over time
            for effect in def.effects() {
                match effect {
                    Effect::DamagePerTurn { dice: expr } => {
                        let outcome = expr.roll(dice);
                        let amount = target.apply_damage(outcome.total());
                        events.push(CombatEvent::ConditionDamage {
                            target: target_id,
                            condition: instance.condition.clone(),
                            rolls: outcome.rolls().to_vec(),
                            amount,
                        });
                    }
                    Effect::HealPerTurn { dice: expr } => {
                        let outcome = expr.roll(dice);
                        let amount = target.apply_healing(outcome.total());
                        events.push(CombatEvent::ConditionHealing {
                            target: target_id,
                            condition: instance.condition.clone(),
                            rolls: outcome.rolls().to_vec(),
                            amount,
                        });
                    }
                    _ => {}
                }
            }

            match instance.duration {
                DurationPolicy::FixedTurns(_) => {
                    let live = target.conditions_mut().get_mut(instance.condition.as_str());
                    if let Some(live) = live {
                        let left = live.turns_remaining.unwrap_or(0).saturating_sub(1);
                        live.turns_remaining = Some(left);
                        if left == 0 {
                            expired.push((instance.condition.clone(), RemovalReason::Expired));
                        }
                    }
                }
                DurationPolicy::UntilNextTurn => {
                    // Survives the tick it was applied in
                    if instance.applied_at_tick < tick {
                        expired.push((instance.condition.clone(), RemovalReason::Expired));
                    }
                }
                DurationPolicy::UntilSaved => {
                    let Some(ability) = def.saving_ability() else {
                        warn!(
                            condition = %instance.condition,
                            "until-saved condition has no saving ability"
                        );
                        continue;
                    };
                    let dc = instance
                        .dc
                        .or(def.save_dc())
                        .unwrap_or(self.default_save_dc);
                    let check = Check::saving_throw(&*target, ability);
                    let situation = self.check_situation(target, &check);
                    let result = resolve_check(dice, &*target, check, Some(dc), situation);
                    let saved = result.succeeded();
                    events.push(CombatEvent::CheckRolled {
                        combatant: target_id,
                        condition: Some(instance.condition.clone()),
                        result,
                    });
                    if saved {
                        expired.push((instance.condition.clone(), RemovalReason::Saved));
                    }
                }
                DurationPolicy::Concentration => {}
            }
        }

        for (condition, reason) in expired {
            if target.conditions_mut().remove(condition.as_str()).is_some() {
                debug!(combatant = %target_id, %condition, ?reason, "condition ended");
                events.push(CombatEvent::ConditionRemoved {
                    target: target_id,
                    condition,
                    reason,
                });
            }
        }

        Ok(events)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    fn active_definitions<'a>(
        &'a self,
        target: &'a Combatant,
    ) -> impl Iterator<Item = &'a ConditionDefinition> + 'a {
        target
            .conditions()
            .iter()
            .filter_map(|instance| self.registry.get(instance.condition.as_str()))
    }

    /// Union of the effect tags of every active condition.
    #[must_use]
    pub fn effect_tags(&self, target: &Combatant) -> EffectTags {
        self.active_definitions(target)
            .fold(EffectTags::empty(), |tags, def| tags | def.tags())
    }

    /// Whether any active condition carries any of `tags`.
    #[must_use]
    pub fn has_effect(&self, target: &Combatant, tags: EffectTags) -> bool {
        self.effect_tags(target).intersects(tags)
    }

    /// Sum of armor class bonuses from active conditions.
    #[must_use]
    pub fn ac_bonus(&self, target: &Combatant) -> i32 {
        self.active_definitions(target)
            .flat_map(ConditionDefinition::effects)
            .map(|effect| match effect {
                Effect::AcBonus { amount } => *amount,
                _ => 0,
            })
            .sum()
    }

    /// Advantage and disadvantage on an attack from both sides' conditions.
    #[must_use]
    pub fn attack_modification(&self, attacker: &Combatant, target: &Combatant) -> Situation {
        let own = self.effect_tags(attacker);
        let theirs = self.effect_tags(target);
        Situation {
            advantage: own.contains(EffectTags::ATTACK_ADVANTAGE)
                || theirs.contains(EffectTags::GRANTS_ADVANTAGE_TO_ATTACKERS),
            disadvantage: own.contains(EffectTags::ATTACK_DISADVANTAGE)
                || theirs.contains(EffectTags::IMPOSES_DISADVANTAGE_ON_ATTACKERS),
            auto_fail: false,
        }
    }

    /// Situation for a non-attack check made by the target.
    ///
    /// Ability and skill checks pick up disadvantage; saving throws pick up
    /// auto-fail for the listed abilities. Attack rolls use
    /// [`ConditionSystem::attack_modification`] instead.
    #[must_use]
    pub fn check_situation(&self, target: &Combatant, check: &Check) -> Situation {
        match *check {
            Check::Ability { .. } | Check::Skill { .. } => Situation {
                disadvantage: self.has_effect(target, EffectTags::ABILITY_CHECK_DISADVANTAGE),
                ..Situation::NORMAL
            },
            Check::Save { ability, .. } => Situation {
                auto_fail: self.active_definitions(target).any(|def| {
                    def.effects().iter().any(|effect| match effect {
                        Effect::AutoFailSaves { abilities } => abilities.contains(&ability),
                        _ => false,
                    })
                }),
                ..Situation::NORMAL
            },
            Check::Attack { .. } => Situation::NORMAL,
        }
    }

    /// No condition prevents acting.
    #[must_use]
    pub fn can_act(&self, target: &Combatant) -> bool {
        !self.has_effect(target, EffectTags::CANNOT_ACT)
    }

    /// No condition prevents moving.
    #[must_use]
    pub fn can_move(&self, target: &Combatant) -> bool {
        !self.has_effect(target, EffectTags::CANNOT_MOVE)
    }

    /// Extra actions granted per turn.
    #[must_use]
    pub fn extra_actions(&self, target: &Combatant) -> u8 {
        let count = self
            .active_definitions(target)
            .flat_map(ConditionDefinition::effects)
            .filter(|effect| matches!(effect, Effect::ExtraAction))
            .count();
        u8::try_from(count).unwrap_or(u8::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::{Ability, AbilityScores};
    use crate::attributes::Attributes;
    use knucklebone::ScriptedDice;

    fn target(hp: i32) -> Combatant {
        Combatant::new(CombatantId::new(1), "Target", true, Attributes::default(), hp)
    }

    fn system() -> ConditionSystem {
        ConditionSystem::default()
    }

    mod apply_tests {
        use super::*;

        #[test]
        fn apply_inserts_instance() {
            let sys = system();
            let mut t = target(10);
            let event = sys
                .apply(&mut t, "burning", ApplyOptions::default(), 1)
                .unwrap();
            assert!(matches!(
                event,
                CombatEvent::ConditionApplied { replaced: false, .. }
            ));
            let inst = t.conditions().get("burning").unwrap();
            assert_eq!(inst.turns_remaining, Some(3));
            assert_eq!(inst.applied_at_tick, 1);
        }

        #[test]
        fn reapply_overwrites() {
            let sys = system();
            let mut t = target(10);
            sys.apply(&mut t, "poisoned", ApplyOptions::default().with_dc(12), 1)
                .unwrap();
            let event = sys
                .apply(&mut t, "poisoned", ApplyOptions::default().with_dc(15), 2)
                .unwrap();
            assert!(matches!(event, CombatEvent::ConditionApplied { replaced: true, .. }));
            assert_eq!(t.conditions().len(), 1);
            assert_eq!(t.conditions().get("poisoned").unwrap().dc, Some(15));
        }

        #[test]
        fn unknown_condition_is_rejected_without_change() {
            let sys = system();
            let mut t = target(10);
            let before = t.clone();
            let err = sys
                .apply(&mut t, "petrified-ish", ApplyOptions::default(), 1)
                .unwrap_err();
            assert_eq!(err, ConditionError::UnknownCondition("petrified-ish".into()));
            assert_eq!(t, before);
        }

        #[test]
        fn remove_is_idempotent() {
            let sys = system();
            let mut t = target(10);
            sys.apply(&mut t, "prone", ApplyOptions::default(), 1).unwrap();
            assert!(sys.remove(&mut t, "prone"));
            assert!(!sys.remove(&mut t, "prone"));
            assert!(!sys.remove(&mut t, "never-there"));
        }

        #[test]
        fn duration_override() {
            let sys = system();
            let mut t = target(10);
            sys.apply(
                &mut t,
                "blinded",
                ApplyOptions::default().with_duration(DurationPolicy::FixedTurns(4)),
                1,
            )
            .unwrap();
            assert_eq!(t.conditions().get("blinded").unwrap().turns_remaining, Some(4));
        }
    }

    mod tick_tests {
        use super::*;

        #[test]
        fn damage_over_time_and_countdown() {
            let sys = system();
            let mut t = target(20);
            sys.apply(&mut t, "burning", ApplyOptions::default(), 0).unwrap();
            let mut dice = ScriptedDice::constant(4);

            for tick in 1..=3 {
                sys.end_of_turn(&mut dice, &mut t, tick).unwrap();
            }
            assert_eq!(t.current_hit_points(), 8);
            assert!(!t.conditions().contains("burning"));
        }

        #[test]
        fn fixed_turns_counts_down() {
            let sys = system();
            let mut t = target(20);
            sys.apply(&mut t, "burning", ApplyOptions::default(), 0).unwrap();
            let mut dice = ScriptedDice::constant(1);
            sys.end_of_turn(&mut dice, &mut t, 1).unwrap();
            assert_eq!(t.conditions().get("burning").unwrap().turns_remaining, Some(2));
        }

        #[test]
        fn healing_over_time_clamps() {
            let sys = system();
            let mut t = target(20);
            t.apply_damage(3);
            sys.apply(&mut t, "regenerating", ApplyOptions::default(), 0)
                .unwrap();
            let mut dice = ScriptedDice::constant(4);
            let events = sys.end_of_turn(&mut dice, &mut t, 1).unwrap();
            assert_eq!(t.current_hit_points(), 20);
            assert!(events.iter().any(|e| matches!(
                e,
                CombatEvent::ConditionHealing { amount: 3, .. }
            )));
        }

        #[test]
        fn until_next_turn_survives_one_tick() {
            let sys = system();
            let mut t = target(10);
            sys.apply(&mut t, "prone", ApplyOptions::default(), 1).unwrap();
            let mut dice = ScriptedDice::constant(10);
            assert!(sys.end_of_turn(&mut dice, &mut t, 1).unwrap().is_empty());
            assert!(t.conditions().contains("prone"));

            let events = sys.end_of_turn(&mut dice, &mut t, 2).unwrap();
            assert!(!t.conditions().contains("prone"));
            assert!(events.iter().any(|e| matches!(
                e,
                CombatEvent::ConditionRemoved { reason: RemovalReason::Expired, .. }
            )));
        }

        #[test]
        fn start_of_turn_ends_until_next_turn_only() {
            let sys = system();
            let mut t = target(10);
            sys.apply(&mut t, "dodging", ApplyOptions::default(), 1).unwrap();
            sys.apply(&mut t, "shielded", ApplyOptions::default(), 1).unwrap();
            sys.apply(&mut t, "burning", ApplyOptions::default(), 1).unwrap();

            let events = sys.start_of_turn(&mut t);
            assert_eq!(events.len(), 2);
            assert!(events.iter().all(|e| matches!(
                e,
                CombatEvent::ConditionRemoved { reason: RemovalReason::Expired, .. }
            )));
            assert_eq!(t.conditions().len(), 1);
            assert!(t.conditions().contains("burning"));
            assert!(sys.start_of_turn(&mut t).is_empty());
        }

        #[test]
        fn concentration_ignores_ticks() {
            let sys = system();
            let mut t = target(10);
            sys.apply(&mut t, "hasted", ApplyOptions::default(), 1).unwrap();
            let mut dice = ScriptedDice::constant(10);
            for tick in 1..=5 {
                sys.end_of_turn(&mut dice, &mut t, tick).unwrap();
            }
            assert!(t.conditions().contains("hasted"));
            assert_eq!(sys.end_concentration(&mut t), vec![ConditionId::new("hasted")]);
            assert!(t.conditions().is_empty());
        }

        #[test]
        fn end_concentration_from_one_source() {
            let sys = system();
            let mut t = target(10);
            let caster = CombatantId::new(9);
            sys.apply(&mut t, "hasted", ApplyOptions::default().from_source(caster), 1)
                .unwrap();
            let other = ApplyOptions::default().from_source(CombatantId::new(8));
            sys.apply(&mut t, "invisible", other, 1).unwrap();
            let removed = sys.end_concentration_from(&mut t, caster);
            assert_eq!(removed, vec![ConditionId::new("hasted")]);
            assert!(t.conditions().contains("invisible"));
        }

        #[test]
        fn save_dc_falls_back() {
            let sys = system().with_default_save_dc(14);
            let mut t = target(10);
            sys.apply(&mut t, "poisoned", ApplyOptions::default(), 1).unwrap();
            // 13 fails against the fallback DC of 14
            let mut dice = ScriptedDice::constant(13);
            sys.end_of_turn(&mut dice, &mut t, 1).unwrap();
            assert!(t.conditions().contains("poisoned"));
            let mut dice = ScriptedDice::constant(14);
            sys.end_of_turn(&mut dice, &mut t, 2).unwrap();
            assert!(!t.conditions().contains("poisoned"));
        }

        #[test]
        fn removals_wait_for_all_instances() {
            // Prone expires in the same tick the burning damage is rolled;
            // both are still evaluated.
            let sys = system();
            let mut t = target(20);
            sys.apply(&mut t, "prone", ApplyOptions::default(), 0).unwrap();
            sys.apply(&mut t, "burning", ApplyOptions::default(), 0).unwrap();
            let mut dice = ScriptedDice::constant(2);
            let events = sys.end_of_turn(&mut dice, &mut t, 1).unwrap();
            let removed_at = events
                .iter()
                .position(|e| matches!(e, CombatEvent::ConditionRemoved { .. }))
                .unwrap();
            let damage_at = events
                .iter()
                .position(|e| matches!(e, CombatEvent::ConditionDamage { .. }))
                .unwrap();
            assert!(damage_at < removed_at);
            assert_eq!(t.current_hit_points(), 18);
        }

        #[test]
        #[cfg(debug_assertions)]
        #[should_panic(expected = "end_of_turn called twice")]
        fn double_tick_panics_in_debug() {
            let sys = system();
            let mut t = target(10);
            let mut dice = ScriptedDice::constant(10);
            sys.end_of_turn(&mut dice, &mut t, 1).unwrap();
            let _ = sys.end_of_turn(&mut dice, &mut t, 1);
        }

        #[test]
        #[cfg(not(debug_assertions))]
        fn double_tick_errors_in_release() {
            let sys = system();
            let mut t = target(10);
            let mut dice = ScriptedDice::constant(10);
            sys.end_of_turn(&mut dice, &mut t, 1).unwrap();
            assert_eq!(
                sys.end_of_turn(&mut dice, &mut t, 1),
                Err(ConditionError::AlreadyTicked {
                    target: CombatantId::new(1),
                    tick: 1
                })
            );
        }
    }

    mod query_tests {
        use super::*;

        #[test]
        fn ac_bonus_sums() {
            let sys = system();
            let mut t = target(10);
            sys.apply(&mut t, "hasted", ApplyOptions::default(), 1).unwrap();
            sys.apply(&mut t, "shielded", ApplyOptions::default(), 1).unwrap();
            assert_eq!(sys.ac_bonus(&t), 7);
        }

        #[test]
        fn attack_modification_from_both_sides() {
            let sys = system();
            let mut attacker = target(10);
            let mut defender =
                Combatant::new(CombatantId::new(2), "Defender", false, Attributes::default(), 10);

            assert_eq!(sys.attack_modification(&attacker, &defender), Situation::NORMAL);

            sys.apply(&mut defender, "prone", ApplyOptions::default(), 1).unwrap();
            let situation = sys.attack_modification(&attacker, &defender);
            assert!(situation.advantage && !situation.disadvantage);

            sys.apply(&mut attacker, "poisoned", ApplyOptions::default(), 1).unwrap();
            let situation = sys.attack_modification(&attacker, &defender);
            assert!(situation.advantage && situation.disadvantage);
            assert_eq!(situation.mode(), knucklebone::RollMode::Normal);
        }

        #[test]
        fn stunned_blocks_action_and_fails_dex_saves() {
            let sys = system();
            let mut t = Combatant::new(
                CombatantId::new(1),
                "Target",
                true,
                Attributes {
                    scores: AbilityScores::uniform(14),
                    ..Attributes::default()
                },
                10,
            );
            sys.apply(&mut t, "stunned", ApplyOptions::default(), 1).unwrap();
            assert!(!sys.can_act(&t));
            assert!(!sys.can_move(&t));

            let dex = Check::saving_throw(&t, Ability::Dexterity);
            assert!(sys.check_situation(&t, &dex).auto_fail);
            let con = Check::saving_throw(&t, Ability::Constitution);
            assert!(!sys.check_situation(&t, &con).auto_fail);
        }

        #[test]
        fn poisoned_checks_have_disadvantage() {
            let sys = system();
            let mut t = target(10);
            sys.apply(&mut t, "poisoned", ApplyOptions::default(), 1).unwrap();
            let situation = sys.check_situation(&t, &Check::Ability { ability: Ability::Strength });
            assert!(situation.disadvantage);
            assert!(sys.has_effect(&t, EffectTags::ATTACK_DISADVANTAGE));
        }

        #[test]
        fn extra_actions_counted() {
            let sys = system();
            let mut t = target(10);
            assert_eq!(sys.extra_actions(&t), 0);
            sys.apply(&mut t, "hasted", ApplyOptions::default(), 1).unwrap();
            assert_eq!(sys.extra_actions(&t), 1);
        }
    }
}
