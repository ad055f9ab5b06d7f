//! Test helpers: stock combatants, engines and an auto-battle loop.

use knucklebone::{DiceEngine, DiceExpr, ScriptedDice};

use crate::ability::{Ability, AbilityScores};
use crate::attributes::{Attributes, MonsterStatBlock};
use crate::combat::{CombatEngine, CombatSession};
use crate::combatant::{AttackProfile, Combatant, CombatantId};

pub const HERO: CombatantId = CombatantId::new(1);
pub const GOBLIN: CombatantId = CombatantId::new(2);
pub const SECOND_GOBLIN: CombatantId = CombatantId::new(3);

/// Route engine logs to the test harness. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

// =============================================================================
// Combatants
// =============================================================================

/// STR 16, everything else 10: +5 to hit with a proficient longsword,
/// AC 12, 20 HP.
pub fn hero() -> Combatant {
    let attributes = Attributes {
        scores: AbilityScores::new(16, 10, 10, 10, 10, 10),
        proficiency_bonus: 2,
        armor_class: 12,
        ..Attributes::default()
    };
    Combatant::new(HERO, "Hero", true, attributes, 20).with_attack(
        AttackProfile::melee(Ability::Strength, DiceExpr::new(1, 8, 0)).named("longsword"),
    )
}

/// Stock goblin: DEX +2, AC 15, 7 HP, +4 scimitar for 1d6+2.
pub fn goblin() -> Combatant {
    MonsterStatBlock::goblin().to_combatant(GOBLIN)
}

pub fn goblin_with_id(id: CombatantId) -> Combatant {
    MonsterStatBlock::goblin().to_combatant(id)
}

/// A combatant with every score at 10 and the given hit points.
pub fn plain(id: u64, player_controlled: bool, hit_points: i32) -> Combatant {
    Combatant::new(
        CombatantId::new(id),
        if player_controlled { "Ally" } else { "Foe" },
        player_controlled,
        Attributes::default(),
        hit_points,
    )
}

// =============================================================================
// Engines and sessions
// =============================================================================

pub fn scripted_engine(faces: impl IntoIterator<Item = u32>) -> CombatEngine<ScriptedDice> {
    init_tracing();
    CombatEngine::new(ScriptedDice::new(faces))
}

/// Hero wins initiative 18 to 14 against one goblin; the rest of the script
/// is appended after the two initiative rolls.
pub fn hero_first(
    rest: impl IntoIterator<Item = u32>,
) -> (CombatEngine<ScriptedDice>, CombatSession) {
    let mut engine = scripted_engine([18, 12]);
    let session = engine
        .start_combat(vec![hero(), goblin()])
        .expect("valid roster");
    engine.dice_mut().extend(rest);
    (engine, session)
}

/// Every participant attacks the first living enemy until the fight ends
/// or `max_rounds` pass.
pub fn auto_battle<D: DiceEngine>(
    engine: &mut CombatEngine<D>,
    session: &mut CombatSession,
    max_rounds: u32,
) {
    while !session.is_over() && session.round() <= max_rounds {
        if let Some(actor) = session.current() {
            let side = session
                .participant(actor)
                .map(Combatant::is_player_controlled);
            let enemy = session
                .participants()
                .iter()
                .find(|c| Some(c.is_player_controlled()) != side && c.is_alive())
                .map(Combatant::id);
            if let Some(enemy) = enemy {
                let _ = engine.resolve_attack(session, actor, enemy);
            }
        }
        if !session.is_over() {
            engine.end_turn(session).expect("fight in progress");
        }
    }
}
