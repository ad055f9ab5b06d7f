//! Errors from combat operations.
//!
//! Every rejected operation leaves the session exactly as it was.

use thiserror::Error;

use super::session::Phase;
use crate::combatant::CombatantId;
use crate::condition::ConditionError;

/// Reasons a combat operation was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CombatError {
    /// No participant with this id.
    #[error("combatant {0} not found")]
    TargetNotFound(CombatantId),

    /// The session is not accepting actions.
    #[error("combat is not in progress (phase: {0:?})")]
    NotInProgress(Phase),

    /// Someone acted out of turn.
    #[error("it is not {0}'s turn")]
    NotTheirTurn(CombatantId),

    /// No action left this turn.
    #[error("{0} has already acted this turn")]
    AlreadyActed(CombatantId),

    /// Already moved this turn.
    #[error("{0} has already moved this turn")]
    AlreadyMoved(CombatantId),

    /// A condition prevents the action.
    #[error("{0} is incapacitated")]
    Incapacitated(CombatantId),

    /// The participant is at 0 hit points.
    #[error("{0} is dead")]
    Dead(CombatantId),

    /// Only player-controlled participants can flee.
    #[error("{0} cannot flee")]
    CannotFlee(CombatantId),

    /// The roster cannot start a fight.
    #[error("invalid roster: {0}")]
    InvalidRoster(String),

    /// The condition system rejected the operation.
    #[error(transparent)]
    Condition(#[from] ConditionError),
}
