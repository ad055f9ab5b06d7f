//! Active condition instances on a single combatant.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::definition::{ConditionId, DurationPolicy};
use crate::combatant::CombatantId;

/// Per-application options for [`ConditionSystem::apply`](super::ConditionSystem::apply).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ApplyOptions {
    /// Replaces the definition's duration policy
    pub duration_override: Option<DurationPolicy>,
    /// Who applied the condition (needed to break concentration)
    pub source: Option<CombatantId>,
    /// Save DC for this application
    pub dc: Option<i32>,
}

impl ApplyOptions {
    /// Override the duration.
    #[must_use]
    pub fn with_duration(mut self, duration: DurationPolicy) -> Self {
        self.duration_override = Some(duration);
        self
    }

    /// Record the source.
    #[must_use]
    pub fn from_source(mut self, source: CombatantId) -> Self {
        self.source = Some(source);
        self
    }

    /// Set the save DC.
    #[must_use]
    pub fn with_dc(mut self, dc: i32) -> Self {
        self.dc = Some(dc);
        self
    }
}

/// One application of a condition to a combatant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionInstance {
    /// Definition this instance was created from
    pub condition: ConditionId,
    /// Duration policy in force (definition default or override)
    pub duration: DurationPolicy,
    /// Turns left for fixed-turn durations; `None` otherwise
    pub turns_remaining: Option<u32>,
    /// Who applied it
    pub source: Option<CombatantId>,
    /// Save DC given at application
    pub dc: Option<i32>,
    /// Tick the condition was applied in
    pub applied_at_tick: u64,
}

/// The conditions currently affecting one combatant.
///
/// At most one instance per condition id; inserting again overwrites.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActiveConditions {
    instances: BTreeMap<ConditionId, ConditionInstance>,
    /// Last tick `end_of_turn` ran for this combatant
    last_ticked: Option<u64>,
}

impl ActiveConditions {
    /// No active conditions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Instance for a condition id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ConditionInstance> {
        self.instances.get(id)
    }

    /// Whether the condition is active.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.instances.contains_key(id)
    }

    /// Number of active conditions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// No active conditions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Instances in id order.
    pub fn iter(&self) -> impl Iterator<Item = &ConditionInstance> {
        self.instances.values()
    }

    /// Tick the conditions were last processed in.
    #[must_use]
    pub fn last_ticked(&self) -> Option<u64> {
        self.last_ticked
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut ConditionInstance> {
        self.instances.get_mut(id)
    }

    pub(crate) fn insert(&mut self, instance: ConditionInstance) -> Option<ConditionInstance> {
        self.instances.insert(instance.condition.clone(), instance)
    }

    pub(crate) fn remove(&mut self, id: &str) -> Option<ConditionInstance> {
        self.instances.remove(id)
    }

    /// Remove every instance matching `pred`, in id order.
    pub(crate) fn remove_where(
        &mut self,
        mut pred: impl FnMut(&ConditionInstance) -> bool,
    ) -> Vec<ConditionInstance> {
        let ids: Vec<ConditionId> = self
            .instances
            .values()
            .filter(|instance| pred(instance))
            .map(|instance| instance.condition.clone())
            .collect();
        ids.iter()
            .filter_map(|id| self.instances.remove(id.as_str()))
            .collect()
    }

    /// Forget the last tick, for reuse in a new fight.
    pub(crate) fn reset_tick(&mut self) {
        self.last_ticked = None;
    }

    /// Record a tick. Returns `false` if this tick was already recorded.
    pub(crate) fn mark_ticked(&mut self, tick: u64) -> bool {
        if self.last_ticked == Some(tick) {
            return false;
        }
        self.last_ticked = Some(tick);
        true
    }
}
