//! # Skirmish Core
//!
//! A deterministic d20 rules engine: checks, conditions and turn-based combat.
//!
//! The engine never owns presentation or character data. It reads creatures
//! through [`AttributeProvider`], rolls through a [`DiceEngine`], commits every
//! resolution synchronously and records what happened as [`CombatEvent`]s for
//! a presentation layer to replay at its own pace.
//!
//! ## Components
//!
//! - **Checks** ([`resolve_check`]): ability, skill, save and attack rolls
//!   against a DC, with proficiency, expertise, advantage and disadvantage
//! - **Conditions** ([`ConditionSystem`]): data-driven status effects with
//!   damage over time, countdowns and save-to-end
//! - **Combat** ([`CombatEngine`]): initiative, turn order, action economy and
//!   win/flee/defeat detection over a caller-owned [`CombatSession`]
//! - **Odds** ([`odds`]): exact and Monte Carlo success chances
//!
//! ## Usage
//!
//! ```
//! use knucklebone::SeededDice;
//! use skirmish_core::{CharacterSheet, CombatEngine, CombatantId, MonsterStatBlock};
//!
//! let hero = CharacterSheet::new("Aria", 3).to_combatant(CombatantId::new(1));
//! let goblin = MonsterStatBlock::goblin().to_combatant(CombatantId::new(2));
//!
//! let mut engine = CombatEngine::new(SeededDice::new(42));
//! let mut session = engine.start_combat(vec![hero, goblin]).unwrap();
//!
//! while !session.is_over() && session.round() < 50 {
//!     if let Some(actor) = session.current() {
//!         let foe = session
//!             .participants()
//!             .iter()
//!             .find(|c| c.id() != actor && c.is_alive())
//!             .map(|c| c.id());
//!         if let Some(foe) = foe {
//!             let _ = engine.resolve_attack(&mut session, actor, foe);
//!         }
//!     }
//!     if !session.is_over() {
//!         engine.end_turn(&mut session).unwrap();
//!     }
//! }
//! let events = session.take_events();
//! assert!(!events.is_empty());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod ability;
pub mod attributes;
pub mod check;
pub mod combat;
pub mod combatant;
pub mod condition;
pub mod config;
pub mod event;
pub mod odds;

#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use ability::{ability_modifier, Ability, AbilityScores, Proficiency, Skill};
pub use attributes::{ArmorWorn, AttributeProvider, Attributes, CharacterSheet, MonsterStatBlock};
pub use check::{resolve_check, Check, CheckResult, Situation};
pub use combat::{
    AttackOutcome, CombatEngine, CombatError, CombatSession, CombatSummary, Phase, DODGE_CONDITION,
};
pub use combatant::{AttackProfile, Combatant, CombatantId};
pub use condition::{
    ActiveConditions, ApplyOptions, ConditionDefinition, ConditionError, ConditionId,
    ConditionInstance, ConditionRegistry, ConditionSystem, DurationPolicy, Effect, EffectTags,
    DEFAULT_SAVE_DC,
};
pub use config::{ConfigError, RulesConfig};
pub use event::{CombatEvent, RemovalReason};
pub use knucklebone::{DiceEngine, DiceExpr, RollMode};
pub use odds::{estimate_check, success_probability, OddsEstimate};
