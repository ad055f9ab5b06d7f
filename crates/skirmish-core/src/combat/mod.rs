//! Turn-based combat.
//!
//! [`CombatEngine`] owns the dice, the condition rules and the table rules.
//! The fight itself is a [`CombatSession`] value the caller keeps and passes
//! into every call, so one engine can run any number of sessions.
//!
//! # Turn loop
//!
//! 1. [`CombatEngine::start_combat`] rolls initiative and starts the first turn
//! 2. The current participant acts: attack, dodge, move, flee
//! 3. [`CombatEngine::end_turn`] passes to the next living participant
//! 4. After the last participant, conditions tick once for every living
//!    participant and the round advances
//!
//! Every operation either succeeds completely or returns a [`CombatError`]
//! without touching the session.
//!
//! # Example
//!
//! ```
//! use knucklebone::ScriptedDice;
//! use skirmish_core::{Attributes, CombatEngine, Combatant, CombatantId, Phase};
//!
//! let hero = Combatant::new(CombatantId::new(1), "Hero", true, Attributes::default(), 12);
//! let goblin = Combatant::new(CombatantId::new(2), "Goblin", false, Attributes::default(), 1);
//!
//! let mut engine = CombatEngine::new(ScriptedDice::constant(15));
//! let mut session = engine.start_combat(vec![hero, goblin]).unwrap();
//!
//! let outcome = engine
//!     .resolve_attack(&mut session, CombatantId::new(1), CombatantId::new(2))
//!     .unwrap();
//! assert!(outcome.hit);
//! assert_eq!(session.phase(), Phase::Victory);
//! ```

mod error;
mod session;

pub use error::CombatError;
pub use session::{CombatSession, CombatSummary, Phase};

use std::cmp::Reverse;
use std::collections::BTreeSet;

use knucklebone::{DiceEngine, RollMode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::ability::{Ability, Skill};
use crate::attributes::AttributeProvider;
use crate::check::{resolve_check, Check, CheckResult};
use crate::combatant::{Combatant, CombatantId};
use crate::condition::{ApplyOptions, ConditionError, ConditionId, ConditionSystem};
use crate::config::RulesConfig;
use crate::event::{CombatEvent, RemovalReason};

/// Condition applied by the dodge action. It lasts until the dodger's next
/// turn starts.
pub const DODGE_CONDITION: &str = "dodging";

/// Result of [`CombatEngine::resolve_attack`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackOutcome {
    /// The attack roll
    pub roll: CheckResult,
    /// Armor class the roll was made against, condition bonuses included
    pub armor_class: i32,
    /// Whether the attack hit
    pub hit: bool,
    /// Natural 20 that hit
    pub critical: bool,
    /// Damage dice faces (empty on a miss)
    pub damage_rolls: Vec<u32>,
    /// Hit points the target actually lost
    pub damage: i32,
    /// The target dropped to 0 hit points
    pub target_defeated: bool,
}

/// Runs combat sessions.
#[derive(Debug)]
pub struct CombatEngine<D: DiceEngine> {
    dice: D,
    conditions: ConditionSystem,
    config: RulesConfig,
}

impl<D: DiceEngine> CombatEngine<D> {
    /// An engine with the standard conditions and default rules.
    pub fn new(dice: D) -> Self {
        Self::with_rules(dice, ConditionSystem::default(), RulesConfig::default())
    }

    /// An engine with custom conditions and rules.
    ///
    /// The condition system's fallback save DC is taken from `config`.
    pub fn with_rules(dice: D, conditions: ConditionSystem, config: RulesConfig) -> Self {
        let conditions = conditions.with_default_save_dc(config.default_save_dc);
        Self {
            dice,
            conditions,
            config,
        }
    }

    /// The dice source.
    pub fn dice_mut(&mut self) -> &mut D {
        &mut self.dice
    }

    /// The condition rules.
    pub fn conditions(&self) -> &ConditionSystem {
        &self.conditions
    }

    /// The table rules.
    pub fn config(&self) -> &RulesConfig {
        &self.config
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Validate the roster, roll initiative and start the first turn.
    ///
    /// Participants may come from an earlier fight's summary: their
    /// conditions carry over, their turn state does not.
    ///
    /// Initiative is `d20 + Dexterity modifier`, highest first. Ties keep
    /// roster order.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::InvalidRoster`] if the roster is empty, repeats
    /// an id, or lacks a living participant on either side.
    pub fn start_combat(
        &mut self,
        mut participants: Vec<Combatant>,
    ) -> Result<CombatSession, CombatError> {
        validate_roster(&participants)?;

        let mut rolled = Vec::with_capacity(participants.len());
        for participant in &mut participants {
            participant.reset_for_combat();
            let roll = self.dice.roll_d20(RollMode::Normal);
            let natural = roll.natural();
            let total = i32::try_from(natural).unwrap_or(i32::MAX)
                + participant.modifier(Ability::Dexterity);
            participant.set_initiative(total);
            rolled.push(CombatEvent::InitiativeRolled {
                combatant: participant.id(),
                natural,
                total,
            });
        }

        // Stable: equal initiative keeps roster order
        let mut order: Vec<&Combatant> = participants.iter().collect();
        order.sort_by_key(|c| Reverse(c.initiative()));
        let turn_order: Vec<CombatantId> = order.iter().map(|c| c.id()).collect();

        let mut session = CombatSession::new(participants, turn_order.clone());
        for event in rolled {
            session.push_event(event);
        }
        session.push_event(CombatEvent::CombatStarted { turn_order });
        session.set_phase(Phase::InProgress);
        info!(participants = session.participants().len(), "combat started");

        match first_living(&session, 0) {
            Some(index) => {
                session.set_current_index(index);
                self.begin_turn(&mut session);
            }
            None => update_phase(&mut session),
        }
        Ok(session)
    }

    /// End the current turn and start the next.
    ///
    /// After the last living participant in the order, every living
    /// participant's conditions tick once and the round advances.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::NotInProgress`] outside a running fight.
    pub fn end_turn(&mut self, session: &mut CombatSession) -> Result<(), CombatError> {
        ensure_in_progress(session)?;

        if let Some(next) = first_living(session, session.current_index() + 1) {
            session.set_current_index(next);
            self.begin_turn(session);
            return Ok(());
        }

        self.end_round(session)?;
        if session.is_over() {
            return Ok(());
        }

        session.advance_round();
        match first_living(session, 0) {
            Some(index) => {
                session.set_current_index(index);
                self.begin_turn(session);
            }
            None => update_phase(session),
        }
        Ok(())
    }

    /// Consume a session and summarize it.
    #[must_use]
    pub fn finish(&self, session: CombatSession) -> CombatSummary {
        info!(outcome = ?session.phase(), rounds = session.round(), "combat finished");
        CombatSummary::from_session(session)
    }

    // =========================================================================
    // Actions
    // =========================================================================

    /// Whether the participant could take an action right now.
    #[must_use]
    pub fn can_act(&self, session: &CombatSession, id: CombatantId) -> bool {
        session.current() == Some(id)
            && session.participant(id).is_some_and(|c| {
                c.is_alive() && c.has_action_available() && self.conditions.can_act(c)
            })
    }

    /// Attack with the attacker's weapon.
    ///
    /// The roll is made against the target's armor class plus condition
    /// bonuses, with advantage and disadvantage from both sides'
    /// conditions. On a hit, damage is the weapon dice (multiplied in count
    /// on a critical) plus the ability modifier and equipment bonus,
    /// never below 0.
    ///
    /// # Errors
    ///
    /// Rejected with no change if the fight is not running, either id is
    /// unknown, it is not the attacker's turn, the attacker cannot act, or
    /// the target is already dead.
    pub fn resolve_attack(
        &mut self,
        session: &mut CombatSession,
        attacker: CombatantId,
        target: CombatantId,
    ) -> Result<AttackOutcome, CombatError> {
        self.ensure_can_act(session, attacker)?;
        let defender = session
            .participant(target)
            .ok_or(CombatError::TargetNotFound(target))?;
        if defender.is_dead() {
            return Err(CombatError::Dead(target));
        }
        let actor = session
            .participant(attacker)
            .ok_or(CombatError::TargetNotFound(attacker))?;

        let situation = self.conditions.attack_modification(actor, defender);
        let armor_class = defender.armor_class() + self.conditions.ac_bonus(defender);
        let profile = actor.attack().clone();
        let roll = resolve_check(
            &mut self.dice,
            actor,
            Check::attack(&profile),
            Some(armor_class),
            situation,
        );
        let ability_bonus = actor.modifier(profile.ability);

        let hit = if roll.critical() && self.config.natural_twenty_always_hits {
            true
        } else if roll.critical_failure() && self.config.natural_one_always_misses {
            false
        } else {
            roll.succeeded()
        };
        let critical = hit && roll.critical();

        let mut outcome = AttackOutcome {
            roll: roll.clone(),
            armor_class,
            hit,
            critical,
            damage_rolls: Vec::new(),
            damage: 0,
            target_defeated: false,
        };

        if hit {
            let dice = if critical {
                profile.damage.multiplied(self.config.critical_dice_multiplier)
            } else {
                profile.damage
            };
            let rolled = dice.roll(&mut self.dice);
            let amount = (rolled.total() + ability_bonus + profile.damage_bonus).max(0);

            let defender = session
                .participant_mut(target)
                .ok_or(CombatError::TargetNotFound(target))?;
            let lost = defender.apply_damage(amount);
            let remaining = defender.current_hit_points();
            outcome.damage_rolls = rolled.rolls().to_vec();
            outcome.damage = lost;
            outcome.target_defeated = defender.is_dead();

            debug!(
                %attacker,
                %target,
                natural = roll.natural(),
                critical,
                damage = lost,
                remaining,
                "attack hit"
            );
            session.push_event(CombatEvent::Hit {
                attacker,
                target,
                roll,
                damage_rolls: outcome.damage_rolls.clone(),
                damage: lost,
                remaining_hit_points: remaining,
            });
            if outcome.target_defeated {
                session.push_event(CombatEvent::Defeated { combatant: target });
            }
        } else {
            debug!(
                %attacker,
                %target,
                natural = roll.natural(),
                total = roll.total(),
                armor_class,
                "attack missed"
            );
            session.push_event(CombatEvent::Miss {
                attacker,
                target,
                roll,
            });
        }

        if let Some(actor) = session.participant_mut(attacker) {
            actor.spend_action();
        }
        update_phase(session);
        Ok(outcome)
    }

    /// Take the dodge action: attacks against the participant have
    /// disadvantage until their next turn starts.
    ///
    /// # Errors
    ///
    /// Rejected with no change if the participant cannot act now.
    pub fn dodge(
        &mut self,
        session: &mut CombatSession,
        id: CombatantId,
    ) -> Result<(), CombatError> {
        self.ensure_can_act(session, id)?;
        let tick = u64::from(session.round());
        let participant = session
            .participant_mut(id)
            .ok_or(CombatError::TargetNotFound(id))?;
        let applied = self.conditions.apply(
            participant,
            DODGE_CONDITION,
            ApplyOptions::default().from_source(id),
            tick,
        )?;
        participant.spend_action();
        session.push_event(applied);
        session.push_event(CombatEvent::Dodged { combatant: id });
        Ok(())
    }

    /// Use this turn's movement.
    ///
    /// # Errors
    ///
    /// Rejected with no change if it is not the participant's turn, they are
    /// dead, a condition prevents moving, or they already moved.
    pub fn move_participant(
        &mut self,
        session: &mut CombatSession,
        id: CombatantId,
    ) -> Result<(), CombatError> {
        let participant = ensure_turn(session, id)?;
        if !self.conditions.can_move(participant) {
            return Err(CombatError::Incapacitated(id));
        }
        if participant.has_moved() {
            return Err(CombatError::AlreadyMoved(id));
        }
        if let Some(participant) = session.participant_mut(id) {
            participant.spend_move();
        }
        session.push_event(CombatEvent::Moved { combatant: id });
        Ok(())
    }

    /// Try to flee. Returns whether the participant got away.
    ///
    /// With [`RulesConfig::flee_dc`] set, a Dexterity check decides and a
    /// failure spends the action. Without it, fleeing always works. Escaping
    /// ends the fight with [`Phase::Fled`].
    ///
    /// # Errors
    ///
    /// Rejected with no change for opponents or anyone who cannot act now.
    pub fn flee(
        &mut self,
        session: &mut CombatSession,
        id: CombatantId,
    ) -> Result<bool, CombatError> {
        self.ensure_can_act(session, id)?;
        let participant = session
            .participant(id)
            .ok_or(CombatError::TargetNotFound(id))?;
        if !participant.is_player_controlled() {
            return Err(CombatError::CannotFlee(id));
        }

        let roll = self.config.flee_dc.map(|dc| {
            let check = Check::Ability { ability: Ability::Dexterity };
            let situation = self.conditions.check_situation(participant, &check);
            resolve_check(&mut self.dice, participant, check, Some(dc), situation)
        });
        let escaped = roll.as_ref().map_or(true, CheckResult::succeeded);

        session.push_event(CombatEvent::FleeAttempted {
            combatant: id,
            roll,
            escaped,
        });
        if escaped {
            info!(combatant = %id, "fled combat");
            session.set_phase(Phase::Fled);
        } else if let Some(participant) = session.participant_mut(id) {
            participant.spend_action();
        }
        Ok(escaped)
    }

    // =========================================================================
    // Checks
    // =========================================================================

    /// Roll a saving throw for any living participant, on or off their turn.
    ///
    /// Save proficiency comes from the participant's attributes and
    /// conditions may force an automatic failure.
    ///
    /// # Errors
    ///
    /// Rejected if the fight is not running, the id is unknown, or the
    /// participant is dead.
    pub fn saving_throw(
        &mut self,
        session: &mut CombatSession,
        id: CombatantId,
        ability: Ability,
        dc: i32,
    ) -> Result<CheckResult, CombatError> {
        let check = Check::saving_throw(ensure_living(session, id)?, ability);
        self.roll_check(session, id, check, Some(dc))
    }

    /// Roll a skill check for any living participant. Does not use an action.
    ///
    /// # Errors
    ///
    /// See [`CombatEngine::saving_throw`].
    pub fn skill_check(
        &mut self,
        session: &mut CombatSession,
        id: CombatantId,
        skill: Skill,
        dc: Option<i32>,
    ) -> Result<CheckResult, CombatError> {
        self.roll_check(session, id, Check::Skill { skill }, dc)
    }

    fn roll_check(
        &mut self,
        session: &mut CombatSession,
        id: CombatantId,
        check: Check,
        dc: Option<i32>,
    ) -> Result<CheckResult, CombatError> {
        let participant = ensure_living(session, id)?;
        let situation = self.conditions.check_situation(participant, &check);
        let result = resolve_check(&mut self.dice, participant, check, dc, situation);
        session.push_event(CombatEvent::CheckRolled {
            combatant: id,
            condition: None,
            result: result.clone(),
        });
        Ok(result)
    }

    // =========================================================================
    // Hit points and conditions
    // =========================================================================

    /// Deal damage outside an attack (traps, spells). Returns the hit points
    /// actually lost.
    ///
    /// # Errors
    ///
    /// Rejected if the fight is not running or the id is unknown.
    pub fn apply_damage(
        &mut self,
        session: &mut CombatSession,
        target: CombatantId,
        amount: i32,
    ) -> Result<i32, CombatError> {
        ensure_in_progress(session)?;
        let participant = session
            .participant_mut(target)
            .ok_or(CombatError::TargetNotFound(target))?;
        let was_alive = participant.is_alive();
        let lost = participant.apply_damage(amount);
        let remaining = participant.current_hit_points();
        let defeated = was_alive && participant.is_dead();

        session.push_event(CombatEvent::Damaged {
            target,
            amount: lost,
            remaining_hit_points: remaining,
        });
        if defeated {
            session.push_event(CombatEvent::Defeated { combatant: target });
        }
        update_phase(session);
        Ok(lost)
    }

    /// Heal a living participant. Returns the hit points actually regained.
    ///
    /// # Errors
    ///
    /// Rejected if the fight is not running, the id is unknown, or the
    /// target is dead.
    pub fn apply_healing(
        &mut self,
        session: &mut CombatSession,
        target: CombatantId,
        amount: i32,
    ) -> Result<i32, CombatError> {
        ensure_living(session, target)?;
        let participant = session
            .participant_mut(target)
            .ok_or(CombatError::TargetNotFound(target))?;
        let gained = participant.apply_healing(amount);
        let current = participant.current_hit_points();
        session.push_event(CombatEvent::Healed {
            target,
            amount: gained,
            current_hit_points: current,
        });
        Ok(gained)
    }

    /// Apply a condition to a living participant.
    ///
    /// # Errors
    ///
    /// Rejected if the fight is not running, the id is unknown, the target
    /// is dead, or the condition is not defined.
    pub fn apply_condition(
        &mut self,
        session: &mut CombatSession,
        target: CombatantId,
        condition: &str,
        options: ApplyOptions,
    ) -> Result<(), CombatError> {
        ensure_living(session, target)?;
        let tick = u64::from(session.round());
        let participant = session
            .participant_mut(target)
            .ok_or(CombatError::TargetNotFound(target))?;
        let event = self.conditions.apply(participant, condition, options, tick)?;
        session.push_event(event);
        Ok(())
    }

    /// Remove a condition. Returns `false` if it was not active.
    ///
    /// # Errors
    ///
    /// Rejected if the fight is not running or the id is unknown.
    pub fn remove_condition(
        &mut self,
        session: &mut CombatSession,
        target: CombatantId,
        condition: &str,
    ) -> Result<bool, CombatError> {
        ensure_in_progress(session)?;
        let participant = session
            .participant_mut(target)
            .ok_or(CombatError::TargetNotFound(target))?;
        let removed = self.conditions.remove(participant, condition);
        if removed {
            session.push_event(CombatEvent::ConditionRemoved {
                target,
                condition: ConditionId::new(condition),
                reason: RemovalReason::Removed,
            });
        }
        Ok(removed)
    }

    /// End every concentration condition `source` maintains, across the
    /// whole roster. Returns what was removed from whom.
    ///
    /// # Errors
    ///
    /// Rejected if the fight is not running or `source` is unknown.
    pub fn break_concentration(
        &mut self,
        session: &mut CombatSession,
        source: CombatantId,
    ) -> Result<Vec<(CombatantId, ConditionId)>, CombatError> {
        ensure_in_progress(session)?;
        if session.participant(source).is_none() {
            return Err(CombatError::TargetNotFound(source));
        }

        let ids: Vec<CombatantId> = session.participants().iter().map(Combatant::id).collect();
        let mut removed = Vec::new();
        for id in ids {
            if let Some(participant) = session.participant_mut(id) {
                for condition in self.conditions.end_concentration_from(participant, source) {
                    removed.push((id, condition));
                }
            }
        }
        for (target, condition) in &removed {
            session.push_event(CombatEvent::ConditionRemoved {
                target: *target,
                condition: condition.clone(),
                reason: RemovalReason::ConcentrationEnded,
            });
        }
        debug!(%source, count = removed.len(), "concentration broken");
        Ok(removed)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn begin_turn(&mut self, session: &mut CombatSession) {
        let Some(id) = session.current() else {
            return;
        };
        let round = session.round();
        let mut expired = Vec::new();
        if let Some(participant) = session.participant_mut(id) {
            expired = self.conditions.start_of_turn(participant);
            let extra = self.conditions.extra_actions(participant);
            participant.begin_turn(extra);
        }
        debug!(round, combatant = %id, "turn started");
        session.push_event(CombatEvent::TurnStarted {
            round,
            combatant: id,
        });
        for event in expired {
            session.push_event(event);
        }
    }

    /// Tick conditions for every living participant, in turn order.
    ///
    /// Nothing is ticked if any living participant already was this round.
    fn end_round(&mut self, session: &mut CombatSession) -> Result<(), CombatError> {
        let tick = u64::from(session.round());
        let order: Vec<CombatantId> = session.turn_order().to_vec();
        let stale = order
            .iter()
            .filter_map(|id| session.participant(*id))
            .find(|c| c.is_alive() && c.conditions().last_ticked() == Some(tick));
        if let Some(stale) = stale {
            warn!(combatant = %stale.id(), tick, "conditions already ticked this round");
            return Err(ConditionError::AlreadyTicked {
                target: stale.id(),
                tick,
            }
            .into());
        }

        for id in order {
            let Some(participant) = session.participant_mut(id) else {
                continue;
            };
            if participant.is_dead() {
                continue;
            }
            let events = self.conditions.end_of_turn(&mut self.dice, participant, tick)?;
            let died = participant.is_dead();
            for event in events {
                session.push_event(event);
            }
            if died {
                session.push_event(CombatEvent::Defeated { combatant: id });
            }
        }
        session.push_event(CombatEvent::RoundEnded {
            round: session.round(),
        });
        update_phase(session);
        Ok(())
    }

    /// The participant, if they can spend an action now.
    fn ensure_can_act<'s>(
        &self,
        session: &'s CombatSession,
        id: CombatantId,
    ) -> Result<&'s Combatant, CombatError> {
        let participant = ensure_turn(session, id)?;
        if !self.conditions.can_act(participant) {
            return Err(CombatError::Incapacitated(id));
        }
        if !participant.has_action_available() {
            return Err(CombatError::AlreadyActed(id));
        }
        Ok(participant)
    }
}

/// Move to a terminal phase if one side is wiped out.
fn update_phase(session: &mut CombatSession) {
    if session.phase() != Phase::InProgress {
        return;
    }
    let players = session.living(true).count();
    let opponents = session.living(false).count();
    // Defeat takes precedence when both sides fall together
    if players == 0 {
        info!(round = session.round(), "defeat");
        session.set_phase(Phase::Defeat);
    } else if opponents == 0 {
        info!(round = session.round(), "victory");
        session.set_phase(Phase::Victory);
    }
}

/// The participant, if it is their turn and they are alive.
fn ensure_turn(session: &CombatSession, id: CombatantId) -> Result<&Combatant, CombatError> {
    ensure_in_progress(session)?;
    let participant = session
        .participant(id)
        .ok_or(CombatError::TargetNotFound(id))?;
    if session.current() != Some(id) {
        warn!(combatant = %id, "acted out of turn");
        return Err(CombatError::NotTheirTurn(id));
    }
    if participant.is_dead() {
        return Err(CombatError::Dead(id));
    }
    Ok(participant)
}

fn ensure_in_progress(session: &CombatSession) -> Result<(), CombatError> {
    if session.phase() == Phase::InProgress {
        Ok(())
    } else {
        Err(CombatError::NotInProgress(session.phase()))
    }
}

fn ensure_living(session: &CombatSession, id: CombatantId) -> Result<&Combatant, CombatError> {
    ensure_in_progress(session)?;
    let participant = session
        .participant(id)
        .ok_or(CombatError::TargetNotFound(id))?;
    if participant.is_dead() {
        return Err(CombatError::Dead(id));
    }
    Ok(participant)
}

/// Index of the first living participant in turn order at or after `from`.
fn first_living(session: &CombatSession, from: usize) -> Option<usize> {
    session
        .turn_order()
        .iter()
        .enumerate()
        .skip(from)
        .find(|(_, id)| session.participant(**id).is_some_and(Combatant::is_alive))
        .map(|(index, _)| index)
}

fn validate_roster(participants: &[Combatant]) -> Result<(), CombatError> {
    if participants.is_empty() {
        return Err(CombatError::InvalidRoster("no participants".to_string()));
    }
    let mut seen = BTreeSet::new();
    for participant in participants {
        if !seen.insert(participant.id()) {
            return Err(CombatError::InvalidRoster(format!(
                "duplicate id {}",
                participant.id()
            )));
        }
    }
    if !participants
        .iter()
        .any(|c| c.is_player_controlled() && c.is_alive())
    {
        return Err(CombatError::InvalidRoster(
            "no living player-controlled participant".to_string(),
        ));
    }
    if !participants
        .iter()
        .any(|c| !c.is_player_controlled() && c.is_alive())
    {
        return Err(CombatError::InvalidRoster("no living opponent".to_string()));
    }
    Ok(())
}
