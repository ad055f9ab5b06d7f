//! The state of one fight.

use serde::{Deserialize, Serialize};

use crate::combatant::{Combatant, CombatantId};
use crate::event::CombatEvent;

/// Where a session is in its lifecycle.
///
/// `Victory`, `Defeat` and `Fled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Not started
    #[default]
    Setup,
    /// Turns are being taken
    InProgress,
    /// Every opponent is dead
    Victory,
    /// Every player-controlled participant is dead
    Defeat,
    /// The player side fled
    Fled,
}

impl Phase {
    /// No further turns are processed.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Victory | Self::Defeat | Self::Fled)
    }
}

/// One fight: roster, turn order, round counter, phase and event log.
///
/// A plain value owned by the caller and passed into every
/// [`CombatEngine`](super::CombatEngine) call. Sessions share nothing, so a
/// host can keep as many as it likes and snapshot them with serde.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CombatSession {
    participants: Vec<Combatant>,
    turn_order: Vec<CombatantId>,
    current_index: usize,
    round: u32,
    phase: Phase,
    events: Vec<CombatEvent>,
}

impl CombatSession {
    pub(crate) fn new(participants: Vec<Combatant>, turn_order: Vec<CombatantId>) -> Self {
        Self {
            participants,
            turn_order,
            current_index: 0,
            round: 1,
            phase: Phase::Setup,
            events: Vec::new(),
        }
    }

    /// Participants in roster order.
    #[must_use]
    pub fn participants(&self) -> &[Combatant] {
        &self.participants
    }

    /// Look up a participant.
    #[must_use]
    pub fn participant(&self, id: CombatantId) -> Option<&Combatant> {
        self.participants.iter().find(|c| c.id() == id)
    }

    /// Participant ids, highest initiative first.
    #[must_use]
    pub fn turn_order(&self) -> &[CombatantId] {
        &self.turn_order
    }

    /// Index into [`turn_order`](Self::turn_order) of whoever is acting.
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Whose turn it is, while the fight is running.
    #[must_use]
    pub fn current(&self) -> Option<CombatantId> {
        if self.phase == Phase::InProgress {
            self.turn_order.get(self.current_index).copied()
        } else {
            None
        }
    }

    /// Current round, starting at 1.
    #[must_use]
    pub fn round(&self) -> u32 {
        self.round
    }

    /// Lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether the fight has ended.
    #[must_use]
    pub fn is_over(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Events not yet drained.
    #[must_use]
    pub fn events(&self) -> &[CombatEvent] {
        &self.events
    }

    /// Drain the event log.
    pub fn take_events(&mut self) -> Vec<CombatEvent> {
        std::mem::take(&mut self.events)
    }

    /// Living participants on one side.
    pub fn living(&self, player_controlled: bool) -> impl Iterator<Item = &Combatant> {
        self.participants
            .iter()
            .filter(move |c| c.is_player_controlled() == player_controlled && c.is_alive())
    }

    pub(crate) fn participant_mut(&mut self, id: CombatantId) -> Option<&mut Combatant> {
        self.participants.iter_mut().find(|c| c.id() == id)
    }

    pub(crate) fn push_event(&mut self, event: CombatEvent) {
        self.events.push(event);
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        if self.phase != phase {
            self.phase = phase;
            self.events.push(CombatEvent::PhaseChanged { phase });
        }
    }

    pub(crate) fn set_current_index(&mut self, index: usize) {
        self.current_index = index;
    }

    pub(crate) fn advance_round(&mut self) {
        self.round += 1;
    }
}

/// What remains once a fight is over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatSummary {
    /// Final phase
    pub outcome: Phase,
    /// Rounds fought, counting the last one
    pub rounds: u32,
    /// Participants still standing
    pub survivors: Vec<CombatantId>,
    /// Participants at 0 hit points
    pub fallen: Vec<CombatantId>,
    /// The participants as they ended, for writing back to their owners
    pub participants: Vec<Combatant>,
    /// Events not drained before finishing
    pub events: Vec<CombatEvent>,
}

impl CombatSummary {
    /// Build a summary, consuming the session.
    #[must_use]
    pub fn from_session(session: CombatSession) -> Self {
        let (survivors, fallen): (Vec<&Combatant>, Vec<&Combatant>) =
            session.participants.iter().partition(|c| c.is_alive());
        Self {
            outcome: session.phase,
            rounds: session.round,
            survivors: survivors.iter().map(|c| c.id()).collect(),
            fallen: fallen.iter().map(|c| c.id()).collect(),
            participants: session.participants,
            events: session.events,
        }
    }
}
