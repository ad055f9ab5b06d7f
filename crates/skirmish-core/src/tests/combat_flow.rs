//! Turn flow, action economy and rejection rules.

use knucklebone::{RollMode, ScriptedDice};

use super::helpers::{
    goblin, goblin_with_id, hero, hero_first, plain, scripted_engine, GOBLIN, HERO, SECOND_GOBLIN,
};
use crate::ability::Skill;
use crate::combat::{CombatEngine, CombatError, Phase, DODGE_CONDITION};
use crate::combatant::CombatantId;
use crate::condition::{ApplyOptions, ConditionError, ConditionSystem, DurationPolicy};
use crate::config::RulesConfig;
use crate::event::{CombatEvent, RemovalReason};

// =============================================================================
// Rejections
// =============================================================================

mod rejection_tests {
    use super::*;

    #[test]
    fn out_of_turn_attack_changes_nothing() {
        let (mut engine, mut session) = hero_first([]);
        let before = session.clone();
        let err = engine.resolve_attack(&mut session, GOBLIN, HERO).unwrap_err();
        assert_eq!(err, CombatError::NotTheirTurn(GOBLIN));
        assert_eq!(session, before);
    }

    #[test]
    fn unknown_target() {
        let (mut engine, mut session) = hero_first([]);
        let before = session.clone();
        let missing = CombatantId::new(99);
        assert_eq!(
            engine.resolve_attack(&mut session, HERO, missing),
            Err(CombatError::TargetNotFound(missing))
        );
        assert_eq!(
            engine.apply_damage(&mut session, missing, 3),
            Err(CombatError::TargetNotFound(missing))
        );
        assert_eq!(session, before);
    }

    #[test]
    fn one_action_per_turn() {
        let (mut engine, mut session) = hero_first([10, 1]);
        engine.resolve_attack(&mut session, HERO, GOBLIN).unwrap();
        let before = session.clone();
        assert_eq!(
            engine.resolve_attack(&mut session, HERO, GOBLIN),
            Err(CombatError::AlreadyActed(HERO))
        );
        assert_eq!(session, before);
        assert!(!engine.can_act(&session, HERO));
    }

    #[test]
    fn stunned_cannot_act() {
        let (mut engine, mut session) = hero_first([]);
        engine
            .apply_condition(&mut session, HERO, "stunned", ApplyOptions::default().with_dc(30))
            .unwrap();
        assert!(!engine.can_act(&session, HERO));
        assert_eq!(
            engine.resolve_attack(&mut session, HERO, GOBLIN),
            Err(CombatError::Incapacitated(HERO))
        );
        assert_eq!(engine.dodge(&mut session, HERO), Err(CombatError::Incapacitated(HERO)));
    }

    #[test]
    fn dead_targets_cannot_be_attacked_or_healed() {
        // the second goblin keeps the fight going
        let mut engine = scripted_engine([18, 12, 5]);
        let mut session = engine
            .start_combat(vec![hero(), goblin(), goblin_with_id(SECOND_GOBLIN)])
            .unwrap();
        engine.apply_damage(&mut session, GOBLIN, 50).unwrap();
        assert_eq!(session.phase(), Phase::InProgress);
        assert_eq!(
            engine.resolve_attack(&mut session, HERO, GOBLIN),
            Err(CombatError::Dead(GOBLIN))
        );
        assert_eq!(
            engine.apply_healing(&mut session, GOBLIN, 5),
            Err(CombatError::Dead(GOBLIN))
        );
    }

    #[test]
    fn healing_caps_at_maximum() {
        let (mut engine, mut session) = hero_first([]);
        engine.apply_damage(&mut session, HERO, 5).unwrap();
        assert_eq!(engine.apply_healing(&mut session, HERO, 50), Ok(5));
        assert_eq!(session.participant(HERO).unwrap().current_hit_points(), 20);
    }

    #[test]
    fn unknown_condition_is_reported() {
        let (mut engine, mut session) = hero_first([]);
        let before = session.clone();
        let err = engine
            .apply_condition(&mut session, HERO, "cursed", ApplyOptions::default())
            .unwrap_err();
        assert_eq!(
            err,
            CombatError::Condition(ConditionError::UnknownCondition("cursed".into()))
        );
        assert_eq!(session, before);
    }

    #[test]
    fn invalid_rosters() {
        let mut engine = scripted_engine([10]);
        assert!(matches!(
            engine.start_combat(Vec::new()),
            Err(CombatError::InvalidRoster(_))
        ));
        assert!(matches!(
            engine.start_combat(vec![hero(), goblin(), goblin()]),
            Err(CombatError::InvalidRoster(_))
        ));
        assert!(matches!(
            engine.start_combat(vec![hero(), plain(5, true, 10)]),
            Err(CombatError::InvalidRoster(_))
        ));
        assert!(matches!(
            engine.start_combat(vec![hero(), plain(5, false, 0)]),
            Err(CombatError::InvalidRoster(_))
        ));
    }
}

// =============================================================================
// Turn order and rounds
// =============================================================================

mod turn_tests {
    use super::*;

    #[test]
    fn end_turn_walks_the_order_and_counts_rounds() {
        let (mut engine, mut session) = hero_first([]);
        engine.end_turn(&mut session).unwrap();
        assert_eq!(session.current(), Some(GOBLIN));
        assert_eq!(session.round(), 1);

        engine.end_turn(&mut session).unwrap();
        assert_eq!(session.current(), Some(HERO));
        assert_eq!(session.round(), 2);
        assert!(session
            .events()
            .iter()
            .any(|e| matches!(e, CombatEvent::RoundEnded { round: 1 })));
    }

    #[test]
    fn dead_participants_are_skipped() {
        let mut engine = scripted_engine([18, 12, 5]);
        let mut session = engine
            .start_combat(vec![hero(), goblin(), goblin_with_id(SECOND_GOBLIN)])
            .unwrap();
        assert_eq!(session.turn_order(), &[HERO, GOBLIN, SECOND_GOBLIN]);

        engine.apply_damage(&mut session, GOBLIN, 50).unwrap();
        engine.end_turn(&mut session).unwrap();
        assert_eq!(session.current(), Some(SECOND_GOBLIN));
    }

    #[test]
    fn conditions_tick_at_end_of_round() {
        let (mut engine, mut session) = hero_first([3]);
        engine
            .apply_condition(&mut session, GOBLIN, "burning", ApplyOptions::default())
            .unwrap();

        engine.end_turn(&mut session).unwrap();
        assert_eq!(session.participant(GOBLIN).unwrap().current_hit_points(), 7);

        engine.end_turn(&mut session).unwrap();
        let goblin = session.participant(GOBLIN).unwrap();
        assert_eq!(goblin.current_hit_points(), 4);
        assert_eq!(goblin.conditions().get("burning").unwrap().turns_remaining, Some(2));
    }

    #[test]
    fn damage_over_time_can_win() {
        let (mut engine, mut session) = hero_first([3]);
        engine.apply_damage(&mut session, GOBLIN, 5).unwrap();
        engine
            .apply_condition(&mut session, GOBLIN, "burning", ApplyOptions::default())
            .unwrap();
        engine.end_turn(&mut session).unwrap();
        engine.end_turn(&mut session).unwrap();

        assert_eq!(session.phase(), Phase::Victory);
        assert!(session
            .events()
            .iter()
            .any(|e| matches!(e, CombatEvent::Defeated { combatant } if *combatant == GOBLIN)));
        assert_eq!(engine.end_turn(&mut session), Err(CombatError::NotInProgress(Phase::Victory)));
    }

    #[test]
    fn simultaneous_wipe_is_a_defeat() {
        let mut engine = scripted_engine([10]);
        let mut session = engine
            .start_combat(vec![plain(1, true, 1), plain(2, false, 1)])
            .unwrap();
        for id in [CombatantId::new(1), CombatantId::new(2)] {
            engine
                .apply_condition(&mut session, id, "burning", ApplyOptions::default())
                .unwrap();
        }
        engine.end_turn(&mut session).unwrap();
        engine.end_turn(&mut session).unwrap();
        assert_eq!(session.phase(), Phase::Defeat);
    }

    #[test]
    fn until_next_turn_ends_when_the_bearer_starts_a_turn() {
        let (mut engine, mut session) = hero_first([]);
        engine
            .apply_condition(&mut session, HERO, "prone", ApplyOptions::default())
            .unwrap();
        engine.end_turn(&mut session).unwrap();
        assert!(session.participant(HERO).unwrap().conditions().contains("prone"));

        // survives the end-of-round tick, ends as the hero's round 2 turn starts
        engine.end_turn(&mut session).unwrap();
        assert_eq!(session.current(), Some(HERO));
        assert!(!session.participant(HERO).unwrap().conditions().contains("prone"));
        assert!(matches!(
            session.events().last(),
            Some(CombatEvent::ConditionRemoved {
                reason: RemovalReason::Expired,
                ..
            })
        ));
    }

    #[test]
    fn dead_participants_do_not_tick() {
        let mut engine = scripted_engine([18, 12, 5]);
        let mut session = engine
            .start_combat(vec![hero(), goblin(), goblin_with_id(SECOND_GOBLIN)])
            .unwrap();
        engine
            .apply_condition(&mut session, GOBLIN, "burning", ApplyOptions::default())
            .unwrap();
        engine.apply_damage(&mut session, GOBLIN, 50).unwrap();

        engine.end_turn(&mut session).unwrap();
        engine.end_turn(&mut session).unwrap();
        assert_eq!(session.round(), 2);

        let fallen = session.participant(GOBLIN).unwrap();
        assert_eq!(fallen.conditions().last_ticked(), None);
        assert_eq!(fallen.conditions().get("burning").unwrap().turns_remaining, Some(3));
        assert!(!session.events().iter().any(|e| matches!(
            e,
            CombatEvent::ConditionDamage { target, .. } if *target == GOBLIN
        )));
        assert_eq!(
            session.participant(SECOND_GOBLIN).unwrap().conditions().last_ticked(),
            Some(1)
        );
    }

    #[test]
    fn written_back_combatants_start_fresh() {
        let (mut engine, mut session) = hero_first([]);
        engine.end_turn(&mut session).unwrap();
        engine.end_turn(&mut session).unwrap();
        engine.apply_damage(&mut session, GOBLIN, 7).unwrap();
        let summary = engine.finish(session);
        assert_eq!(summary.outcome, Phase::Victory);

        let veteran = summary
            .participants
            .into_iter()
            .find(|c| c.id() == HERO)
            .unwrap();
        assert_eq!(veteran.conditions().last_ticked(), Some(1));

        let mut engine = scripted_engine([18, 12]);
        let mut session = engine.start_combat(vec![veteran, goblin()]).unwrap();
        assert_eq!(session.participant(HERO).unwrap().conditions().last_ticked(), None);
        engine.end_turn(&mut session).unwrap();
        engine.end_turn(&mut session).unwrap();
        assert_eq!(session.round(), 2);
        assert_eq!(session.current(), Some(HERO));
    }

    #[test]
    fn stale_tick_rejects_the_round_untouched() {
        let (mut engine, mut session) = hero_first([3]);
        engine
            .apply_condition(&mut session, HERO, "burning", ApplyOptions::default())
            .unwrap();
        engine.end_turn(&mut session).unwrap();
        session
            .participant_mut(GOBLIN)
            .unwrap()
            .conditions_mut()
            .mark_ticked(1);

        let before = session.clone();
        assert_eq!(
            engine.end_turn(&mut session),
            Err(CombatError::Condition(ConditionError::AlreadyTicked {
                target: GOBLIN,
                tick: 1
            }))
        );
        assert_eq!(session, before);
    }
}

// =============================================================================
// Actions
// =============================================================================

mod action_tests {
    use super::*;

    #[test]
    fn dodge_imposes_disadvantage() {
        // goblin rolls 15 and 2 under disadvantage: 2 + 4 misses AC 12
        let (mut engine, mut session) = hero_first([15, 2]);
        engine.dodge(&mut session, HERO).unwrap();
        assert_eq!(
            engine.resolve_attack(&mut session, HERO, GOBLIN),
            Err(CombatError::AlreadyActed(HERO))
        );
        engine.end_turn(&mut session).unwrap();

        let outcome = engine.resolve_attack(&mut session, GOBLIN, HERO).unwrap();
        assert_eq!(outcome.roll.mode(), RollMode::Disadvantage);
        assert_eq!(outcome.roll.rolls(), &[15, 2]);
        assert!(!outcome.hit);
    }

    #[test]
    fn dodge_by_the_last_in_order_lasts_into_the_next_round() {
        // hero rolls 10 and 4 under disadvantage: 4 + 5 misses AC 15
        let (mut engine, mut session) = hero_first([10, 4]);
        engine.end_turn(&mut session).unwrap();
        engine.dodge(&mut session, GOBLIN).unwrap();
        engine.end_turn(&mut session).unwrap();

        assert_eq!(session.round(), 2);
        assert!(session.participant(GOBLIN).unwrap().conditions().contains(DODGE_CONDITION));
        let outcome = engine.resolve_attack(&mut session, HERO, GOBLIN).unwrap();
        assert_eq!(outcome.roll.mode(), RollMode::Disadvantage);
        assert_eq!(outcome.roll.rolls(), &[10, 4]);
        assert!(!outcome.hit);

        engine.end_turn(&mut session).unwrap();
        assert_eq!(session.current(), Some(GOBLIN));
        assert!(!session.participant(GOBLIN).unwrap().conditions().contains(DODGE_CONDITION));
    }

    #[test]
    fn haste_grants_an_extra_action_next_turn() {
        let (mut engine, mut session) = hero_first([1]);
        engine
            .apply_condition(&mut session, HERO, "hasted", ApplyOptions::default())
            .unwrap();
        engine.end_turn(&mut session).unwrap();
        engine.end_turn(&mut session).unwrap();

        assert_eq!(session.participant(HERO).unwrap().extra_actions(), 1);
        engine.resolve_attack(&mut session, HERO, GOBLIN).unwrap();
        engine.resolve_attack(&mut session, HERO, GOBLIN).unwrap();
        assert_eq!(
            engine.resolve_attack(&mut session, HERO, GOBLIN),
            Err(CombatError::AlreadyActed(HERO))
        );
    }

    #[test]
    fn movement_once_per_turn() {
        let (mut engine, mut session) = hero_first([]);
        engine.move_participant(&mut session, HERO).unwrap();
        assert_eq!(
            engine.move_participant(&mut session, HERO),
            Err(CombatError::AlreadyMoved(HERO))
        );
        // moving does not use the action
        assert!(engine.can_act(&session, HERO));
    }

    #[test]
    fn restrained_cannot_move() {
        let (mut engine, mut session) = hero_first([]);
        engine
            .apply_condition(&mut session, HERO, "restrained", ApplyOptions::default())
            .unwrap();
        assert_eq!(
            engine.move_participant(&mut session, HERO),
            Err(CombatError::Incapacitated(HERO))
        );
    }

    #[test]
    fn flee_without_a_check() {
        let (mut engine, mut session) = hero_first([]);
        assert_eq!(engine.flee(&mut session, HERO), Ok(true));
        assert_eq!(session.phase(), Phase::Fled);
        assert!(session.is_over());
        assert_eq!(
            engine.resolve_attack(&mut session, HERO, GOBLIN),
            Err(CombatError::NotInProgress(Phase::Fled))
        );
    }

    #[test]
    fn opponents_cannot_flee() {
        let (mut engine, mut session) = hero_first([]);
        engine.end_turn(&mut session).unwrap();
        assert_eq!(engine.flee(&mut session, GOBLIN), Err(CombatError::CannotFlee(GOBLIN)));
    }

    #[test]
    fn failed_flee_check_spends_the_action() {
        let mut engine = CombatEngine::with_rules(
            ScriptedDice::new([18, 12, 5]),
            ConditionSystem::default(),
            RulesConfig::with_flee_dc(15),
        );
        let mut session = engine.start_combat(vec![hero(), goblin()]).unwrap();
        assert_eq!(engine.flee(&mut session, HERO), Ok(false));
        assert_eq!(session.phase(), Phase::InProgress);
        assert_eq!(engine.flee(&mut session, HERO), Err(CombatError::AlreadyActed(HERO)));
        assert!(matches!(
            session.events().last(),
            Some(CombatEvent::FleeAttempted { escaped: false, roll: Some(_), .. })
        ));
    }

    #[test]
    fn checks_off_turn() {
        // goblin stealth: DEX 2 + expertise 4
        let (mut engine, mut session) = hero_first([4]);
        let result = engine
            .skill_check(&mut session, GOBLIN, Skill::Stealth, Some(10))
            .unwrap();
        assert_eq!(result.total(), 10);
        assert!(result.succeeded());

        let save = engine
            .saving_throw(&mut session, GOBLIN, crate::Ability::Dexterity, 10)
            .unwrap();
        assert_eq!(save.total(), 6);
        assert!(!save.succeeded());
    }

    #[test]
    fn poisoned_skill_checks_roll_twice() {
        let (mut engine, mut session) = hero_first([17, 3]);
        engine
            .apply_condition(&mut session, HERO, "poisoned", ApplyOptions::default())
            .unwrap();
        let result = engine
            .skill_check(&mut session, HERO, Skill::Athletics, None)
            .unwrap();
        assert_eq!(result.mode(), RollMode::Disadvantage);
        assert_eq!(result.natural(), 3);
        assert_eq!(result.success(), None);
    }

    #[test]
    fn breaking_concentration_clears_the_roster() {
        let (mut engine, mut session) = hero_first([]);
        let from_hero = ApplyOptions::default().from_source(HERO);
        engine.apply_condition(&mut session, HERO, "hasted", from_hero).unwrap();
        engine.apply_condition(&mut session, GOBLIN, "invisible", from_hero).unwrap();
        engine
            .apply_condition(
                &mut session,
                GOBLIN,
                "blinded",
                from_hero.with_duration(DurationPolicy::FixedTurns(5)),
            )
            .unwrap();

        let removed = engine.break_concentration(&mut session, HERO).unwrap();
        assert_eq!(removed.len(), 2);
        assert!(session.participant(HERO).unwrap().conditions().is_empty());
        assert!(session.participant(GOBLIN).unwrap().conditions().contains("blinded"));
        let ended = session
            .events()
            .iter()
            .filter(|e| {
                matches!(
                    e,
                    CombatEvent::ConditionRemoved {
                        reason: RemovalReason::ConcentrationEnded,
                        ..
                    }
                )
            })
            .count();
        assert_eq!(ended, 2);
    }

    #[test]
    fn remove_condition_reports_whether_it_was_active() {
        let (mut engine, mut session) = hero_first([]);
        engine
            .apply_condition(&mut session, HERO, "prone", ApplyOptions::default())
            .unwrap();
        assert_eq!(engine.remove_condition(&mut session, HERO, "prone"), Ok(true));
        assert_eq!(engine.remove_condition(&mut session, HERO, "prone"), Ok(false));
    }

    #[test]
    fn finish_summarizes() {
        let (mut engine, mut session) = hero_first([]);
        engine.apply_damage(&mut session, GOBLIN, 7).unwrap();
        assert_eq!(session.phase(), Phase::Victory);

        let summary = engine.finish(session);
        assert_eq!(summary.outcome, Phase::Victory);
        assert_eq!(summary.rounds, 1);
        assert_eq!(summary.survivors, vec![HERO]);
        assert_eq!(summary.fallen, vec![GOBLIN]);
    }
}
