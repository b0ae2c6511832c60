//! Structured turn reports.
//!
//! Every quantity the turn engine touches is reported as a
//! [`ValueChange`] triple so callers never have to diff states themselves.

use std::ops::Sub;

use serde::{Deserialize, Serialize};

use crate::components::{Agent, AgentState, MissionSiteId, Turn};
use crate::factions::FactionId;
use crate::leads::LeadProgress;
use crate::math::Fixed;
use crate::missions::MissionOutcome;

/// Before/after pair with the difference precomputed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValueChange<T> {
    /// Value before the turn.
    pub previous: T,
    /// Value after the turn.
    pub current: T,
    /// `current - previous`.
    pub delta: T,
}

impl<T: Copy + Sub<Output = T>> ValueChange<T> {
    /// Record a change.
    pub fn new(previous: T, current: T) -> Self {
        Self {
            previous,
            current,
            delta: current - previous,
        }
    }
}

/// Agent counts per lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentCounts {
    /// Available.
    pub available: i64,
    /// In transit.
    pub in_transit: i64,
    /// Recovering.
    pub recovering: i64,
    /// On assignment.
    pub on_assignment: i64,
    /// On mission.
    pub on_mission: i64,
    /// In training.
    pub in_training: i64,
    /// Terminated.
    pub terminated: i64,
}

impl AgentCounts {
    /// Tally a roster.
    #[must_use]
    pub fn tally(agents: &[Agent]) -> Self {
        let mut counts = Self::default();
        for agent in agents {
            let bucket = match agent.state {
                AgentState::Available => &mut counts.available,
                AgentState::InTransit => &mut counts.in_transit,
                AgentState::Recovering => &mut counts.recovering,
                AgentState::OnAssignment => &mut counts.on_assignment,
                AgentState::OnMission => &mut counts.on_mission,
                AgentState::InTraining => &mut counts.in_training,
                AgentState::Terminated => &mut counts.terminated,
            };
            *bucket += 1;
        }
        counts
    }

    /// Non-terminated agents.
    #[must_use]
    pub const fn active(&self) -> i64 {
        self.available
            + self.in_transit
            + self.recovering
            + self.on_assignment
            + self.on_mission
            + self.in_training
    }
}

/// Per-state agent changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentsReport {
    /// Available.
    pub available: ValueChange<i64>,
    /// In transit.
    pub in_transit: ValueChange<i64>,
    /// Recovering.
    pub recovering: ValueChange<i64>,
    /// On assignment.
    pub on_assignment: ValueChange<i64>,
    /// On mission.
    pub on_mission: ValueChange<i64>,
    /// In training.
    pub in_training: ValueChange<i64>,
    /// Terminated.
    pub terminated: ValueChange<i64>,
    /// Non-terminated total.
    pub active: ValueChange<i64>,
    /// Agents whose recovery finished.
    pub recovered: usize,
}

impl AgentsReport {
    /// Compare two tallies.
    #[must_use]
    pub fn new(before: AgentCounts, after: AgentCounts, recovered: usize) -> Self {
        Self {
            available: ValueChange::new(before.available, after.available),
            in_transit: ValueChange::new(before.in_transit, after.in_transit),
            recovering: ValueChange::new(before.recovering, after.recovering),
            on_assignment: ValueChange::new(before.on_assignment, after.on_assignment),
            on_mission: ValueChange::new(before.on_mission, after.on_mission),
            in_training: ValueChange::new(before.in_training, after.in_training),
            terminated: ValueChange::new(before.terminated, after.terminated),
            active: ValueChange::new(before.active(), after.active()),
            recovered,
        }
    }
}

/// Money, intel and funding with their contributing terms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetsReport {
    /// Money.
    pub money: ValueChange<i64>,
    /// Intel.
    pub intel: ValueChange<i64>,
    /// Per-turn funding.
    pub funding: ValueChange<i64>,
    /// Upkeep paid.
    pub agent_upkeep: i64,
    /// Money earned by contracting.
    pub contracting_income: i64,
    /// Intel gathered by espionage.
    pub espionage_intel: i64,
    /// Funding received.
    pub funding_income: i64,
    /// Hire costs paid.
    pub hire_costs: i64,
    /// Money from mission rewards.
    pub mission_money: i64,
    /// Intel from mission rewards.
    pub mission_intel: i64,
    /// Funding change from mission rewards.
    pub mission_funding: i64,
}

/// Panic with its contributing terms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PanicReport {
    /// Panic.
    pub panic: ValueChange<Fixed>,
    /// Sum of faction contributions.
    pub faction_contribution: Fixed,
    /// Reduction from mission rewards.
    pub mission_reduction: Fixed,
}

/// One faction's change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FactionReport {
    /// Faction.
    pub id: FactionId,
    /// Threat level.
    pub threat_level: ValueChange<Fixed>,
    /// Suppression.
    pub suppression: ValueChange<Fixed>,
    /// Panic this faction added.
    pub panic_contribution: Fixed,
}

/// Lead progress plus the sites its completion spawned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeadReport {
    /// Roll and intel details.
    pub progress: LeadProgress,
    /// Intel after the update.
    pub intel_after: i64,
    /// Sites spawned on completion.
    pub spawned_sites: Vec<MissionSiteId>,
}

/// Everything that changed in one turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TurnReport {
    /// Turn that was just played.
    pub turn: Turn,
    /// Asset changes.
    pub assets: AssetsReport,
    /// Panic change.
    pub panic: PanicReport,
    /// Agent counts.
    pub agents: AgentsReport,
    /// Per-faction changes.
    pub factions: Vec<FactionReport>,
    /// Resolved mission sites.
    pub missions: Vec<MissionOutcome>,
    /// Lead investigation progress.
    pub leads: Vec<LeadReport>,
    /// Sites that expired undeployed.
    pub expired_sites: Vec<MissionSiteId>,
}
