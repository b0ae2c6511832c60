//! Lead investigations: intel accumulation and completion rolls.
//!
//! Each turn an active investigation rolls for completion against the intel
//! it held at the start of the turn:
//!
//! ```text
//! chance  = min(1, intel / difficulty)
//! success = roll >= 1 - chance
//! ```
//!
//! If it stays open, its intel decays and then grows:
//!
//! ```text
//! decay_pct = min(intel × decay_per_intel, decay_cap)
//! intel    -= floor(intel × decay_pct)
//! intel    += Σ floor(effective_skill / 100 × intel_per_agent)
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::agents::skill_scaled_yield;
use crate::components::{Agent, AgentId, AgentState, Assignment, LeadInvestigationId, Turn};
use crate::config::Rules;
use crate::data::LeadData;
use crate::math::Fixed;
use crate::random::{RandomSource, RollChannel};
use crate::skill::effective_skill;

/// Lead investigation lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LeadInvestigationState {
    /// Gathering intel.
    Active,
    /// Lead cracked.
    Successful,
    /// Dropped by the player.
    Abandoned,
}

impl fmt::Display for LeadInvestigationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Active => "Active",
            Self::Successful => "Successful",
            Self::Abandoned => "Abandoned",
        };
        f.write_str(name)
    }
}

/// An ongoing or finished investigation of a lead.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeadInvestigation {
    /// Unique id.
    pub id: LeadInvestigationId,
    /// Lead template id.
    pub lead_id: String,
    /// Intel gathered so far.
    pub accumulated_intel: i64,
    /// Agents working the investigation.
    pub agent_ids: Vec<AgentId>,
    /// Lifecycle state.
    pub state: LeadInvestigationState,
    /// Turn the investigation started.
    pub start_turn: Turn,
}

impl LeadInvestigation {
    /// Open a new investigation.
    #[must_use]
    pub fn new(id: LeadInvestigationId, lead_id: &str, agent_ids: Vec<AgentId>, turn: Turn) -> Self {
        Self {
            id,
            lead_id: lead_id.to_string(),
            accumulated_intel: 0,
            agent_ids,
            state: LeadInvestigationState::Active,
            start_turn: turn,
        }
    }

    /// Whether the investigation is still open.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == LeadInvestigationState::Active
    }
}

/// Intel lost to decay this turn.
#[must_use]
pub fn intel_decay(intel: i64, rules: &Rules) -> i64 {
    if intel <= 0 {
        return 0;
    }
    let pct = rules.intel_decay_per_intel.mul_int(intel).min(rules.intel_decay_cap);
    pct.mul_int(intel).floor()
}

/// Progress of one investigation over a turn.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeadProgress {
    /// Investigation id.
    pub investigation_id: LeadInvestigationId,
    /// Lead template id.
    pub lead_id: String,
    /// Intel before the update.
    pub intel_before: i64,
    /// Intel lost to decay.
    pub decay: i64,
    /// Intel contributed by agents.
    pub contributed: i64,
    /// Completion chance rolled against.
    pub success_chance: Fixed,
    /// Whether the lead was cracked.
    pub completed: bool,
}

/// Update one active investigation. The caller handles completion effects.
pub fn update_investigation(
    investigation: &mut LeadInvestigation,
    lead: &LeadData,
    agents: &mut [Agent],
    rules: &Rules,
    rng: &mut RandomSource,
) -> LeadProgress {
    let intel_before = investigation.accumulated_intel;
    let success_chance = lead.success_chance(intel_before);
    let roll = rng.get_fixed(RollChannel::LeadInvestigation);
    let completed = roll >= Fixed::ONE - success_chance;

    let working = agents.iter_mut().filter(|a| {
        a.state == AgentState::OnAssignment
            && a.assignment == Assignment::LeadInvestigation(investigation.id)
    });
    let mut contributed = 0;
    for agent in working {
        contributed += skill_scaled_yield(effective_skill(&agent.actor), rules.lead_intel_per_agent);
        agent.actor.exhaustion += rules.investigation_exhaustion;
    }

    let mut decay = 0;
    if completed {
        investigation.state = LeadInvestigationState::Successful;
        contributed = 0;
    } else {
        decay = intel_decay(intel_before, rules);
        investigation.accumulated_intel = intel_before - decay + contributed;
    }

    tracing::debug!(
        investigation = %investigation.id,
        lead = %investigation.lead_id,
        intel = investigation.accumulated_intel,
        chance = %success_chance,
        completed,
        "Lead investigation updated"
    );

    LeadProgress {
        investigation_id: investigation.id,
        lead_id: investigation.lead_id.clone(),
        intel_before,
        decay,
        contributed,
        success_chance,
        completed,
    }
}
