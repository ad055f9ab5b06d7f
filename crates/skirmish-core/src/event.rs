//! Combat events.
//!
//! Every resolution appends [`CombatEvent`]s to the session log. The engine
//! never waits on presentation: it commits state immediately and the caller
//! drains the log with [`CombatSession::take_events`](crate::CombatSession::take_events)
//! to replay it at whatever pace it likes.

use serde::{Deserialize, Serialize};

use crate::check::CheckResult;
use crate::combat::Phase;
use crate::combatant::CombatantId;
use crate::condition::{ConditionId, DurationPolicy};

/// Why a condition ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalReason {
    /// Its duration ran out
    Expired,
    /// The bearer made the saving throw
    Saved,
    /// Removed explicitly
    Removed,
    /// The source's concentration broke
    ConcentrationEnded,
}

/// Something that happened during combat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CombatEvent {
    /// Initiative rolled for one participant
    InitiativeRolled {
        /// Who rolled
        combatant: CombatantId,
        /// d20 face
        natural: u32,
        /// Face plus Dexterity modifier
        total: i32,
    },
    /// Combat began with this turn order
    CombatStarted {
        /// Participants, highest initiative first
        turn_order: Vec<CombatantId>,
    },
    /// A participant's turn began
    TurnStarted {
        /// Current round
        round: u32,
        /// Whose turn it is
        combatant: CombatantId,
    },
    /// Every participant has had a turn
    RoundEnded {
        /// Round that just ended
        round: u32,
    },
    /// An attack hit
    Hit {
        /// Attacker
        attacker: CombatantId,
        /// Target
        target: CombatantId,
        /// Attack roll
        roll: CheckResult,
        /// Damage dice faces
        damage_rolls: Vec<u32>,
        /// Hit points actually lost
        damage: i32,
        /// Target's hit points afterwards
        remaining_hit_points: i32,
    },
    /// An attack missed
    Miss {
        /// Attacker
        attacker: CombatantId,
        /// Target
        target: CombatantId,
        /// Attack roll
        roll: CheckResult,
    },
    /// Damage applied directly
    Damaged {
        /// Who took it
        target: CombatantId,
        /// Hit points lost
        amount: i32,
        /// Hit points afterwards
        remaining_hit_points: i32,
    },
    /// Healing applied directly
    Healed {
        /// Who was healed
        target: CombatantId,
        /// Hit points regained
        amount: i32,
        /// Hit points afterwards
        current_hit_points: i32,
    },
    /// A participant dropped to 0 hit points
    Defeated {
        /// Who fell
        combatant: CombatantId,
    },
    /// A check or saving throw was rolled
    CheckRolled {
        /// Who rolled
        combatant: CombatantId,
        /// Condition the save was against, if any
        condition: Option<ConditionId>,
        /// Full result
        result: CheckResult,
    },
    /// A condition was applied or reapplied
    ConditionApplied {
        /// Who it was applied to
        target: CombatantId,
        /// Which condition
        condition: ConditionId,
        /// Duration in force
        duration: DurationPolicy,
        /// Who applied it
        source: Option<CombatantId>,
        /// An existing instance was overwritten
        replaced: bool,
    },
    /// A condition ended
    ConditionRemoved {
        /// Who it was removed from
        target: CombatantId,
        /// Which condition
        condition: ConditionId,
        /// Why
        reason: RemovalReason,
    },
    /// A condition dealt its per-turn damage
    ConditionDamage {
        /// Who took it
        target: CombatantId,
        /// Which condition
        condition: ConditionId,
        /// Dice faces
        rolls: Vec<u32>,
        /// Hit points lost
        amount: i32,
    },
    /// A condition healed its bearer
    ConditionHealing {
        /// Who was healed
        target: CombatantId,
        /// Which condition
        condition: ConditionId,
        /// Dice faces
        rolls: Vec<u32>,
        /// Hit points regained
        amount: i32,
    },
    /// A participant took the dodge action
    Dodged {
        /// Who dodged
        combatant: CombatantId,
    },
    /// A participant moved
    Moved {
        /// Who moved
        combatant: CombatantId,
    },
    /// A participant tried to flee
    FleeAttempted {
        /// Who tried
        combatant: CombatantId,
        /// Dexterity check, when one was required
        roll: Option<CheckResult>,
        /// Whether they got away
        escaped: bool,
    },
    /// The session changed phase
    PhaseChanged {
        /// New phase
        phase: Phase,
    },
}

impl CombatEvent {
    /// The participant the event is mainly about, if any.
    #[must_use]
    pub fn subject(&self) -> Option<CombatantId> {
        match self {
            Self::InitiativeRolled { combatant, .. }
            | Self::TurnStarted { combatant, .. }
            | Self::Defeated { combatant }
            | Self::CheckRolled { combatant, .. }
            | Self::Dodged { combatant }
            | Self::Moved { combatant }
            | Self::FleeAttempted { combatant, .. } => Some(*combatant),
            Self::Hit { attacker, .. } | Self::Miss { attacker, .. } => Some(*attacker),
            Self::Damaged { target, .. }
            | Self::Healed { target, .. }
            | Self::ConditionApplied { target, .. }
            | Self::ConditionRemoved { target, .. }
            | Self::ConditionDamage { target, .. }
            | Self::ConditionHealing { target, .. } => Some(*target),
            Self::CombatStarted { .. } | Self::RoundEnded { .. } | Self::PhaseChanged { .. } => {
                None
            }
        }
    }
}
