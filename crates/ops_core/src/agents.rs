//! Per-turn agent lifecycle updates.
//!
//! Each function handles the agents in one lifecycle state and is called by
//! the turn engine in a fixed order. Agents are never removed from the
//! roster; terminated agents are skipped.
//!
//! # Recovery schedule
//!
//! ```text
//! total_turns = ceil((lost / max_hp × 100) / recovery_pct)
//! hit_points  = max_hp - floor(lost × remaining / total_turns)
//! ```
//!
//! `remaining` counts down from `total_turns`, so hit points climb linearly
//! and reach `max_hp` exactly on the last recovery turn.

use serde::{Deserialize, Serialize};

use crate::components::{Agent, AgentState, Assignment};
use crate::config::Rules;
use crate::error::{GameError, Result};
use crate::math::Fixed;
use crate::skill::effective_skill;

/// Recovery turns needed to heal `lost` hit points out of `max_hit_points`.
pub fn recovery_turns_for(lost: Fixed, max_hit_points: Fixed, recovery_pct: Fixed) -> Result<u32> {
    if !max_hit_points.is_positive() || !recovery_pct.is_positive() {
        return Err(GameError::DivisionByZero(format!(
            "recovery of {lost} over {max_hit_points} at {recovery_pct}%"
        )));
    }
    let numerator = i128::from(lost.non_negative().raw()) * 100 * i128::from(Fixed::SCALE);
    let denominator = i128::from(max_hit_points.raw()) * i128::from(recovery_pct.raw());
    let turns = (numerator + denominator - 1) / denominator;
    Ok(turns as u32)
}

/// Hit points an agent should have with `remaining` of `total` recovery turns left.
pub fn scheduled_hit_points(
    max_hit_points: Fixed,
    lost: Fixed,
    remaining: u32,
    total: u32,
) -> Result<Fixed> {
    if remaining == 0 {
        return Ok(max_hit_points);
    }
    let outstanding = lost.mul_ratio(i64::from(remaining), i64::from(total))?;
    Ok(max_hit_points - outstanding)
}

/// Send a damaged survivor into recovery.
pub fn start_recovery(agent: &mut Agent, recovery_pct: Fixed) -> Result<()> {
    let lost = agent.actor.damage_taken();
    let turns = recovery_turns_for(lost, agent.actor.max_hit_points, recovery_pct)?;
    agent.hit_points_lost_before_recovery = lost;
    agent.recovery_turns = turns;
    agent.reassign(AgentState::Recovering, Assignment::Recovery);
    Ok(())
}

/// Money and intel produced by working agents in one turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkYield {
    /// Money from contracting.
    pub money: i64,
    /// Intel from espionage.
    pub intel: i64,
}

/// `floor(effective_skill / 100 × per_hundred)` in whole units.
#[must_use]
pub fn skill_scaled_yield(skill: Fixed, per_hundred: i64) -> i64 {
    let raw = i128::from(skill.non_negative().raw()) * i128::from(per_hundred);
    (raw / (100 * i128::from(Fixed::SCALE))) as i64
}

/// Upkeep owed for every non-terminated agent.
#[must_use]
pub fn upkeep_cost(agents: &[Agent], upkeep_per_agent: i64) -> i64 {
    agents.iter().filter(|a| a.is_active()).count() as i64 * upkeep_per_agent
}

fn reduce_exhaustion(agent: &mut Agent, amount: Fixed) {
    agent.actor.exhaustion = (agent.actor.exhaustion - amount).non_negative();
}

/// Available agents rest.
pub fn update_available(agents: &mut [Agent], exhaustion_recovery: Fixed) {
    for agent in agents.iter_mut().filter(|a| a.state == AgentState::Available) {
        reduce_exhaustion(agent, exhaustion_recovery);
    }
}

/// Recovering agents rest and heal one step along their schedule.
///
/// Returns the number of agents that finished recovery this turn.
pub fn update_recovering(
    agents: &mut [Agent],
    exhaustion_recovery: Fixed,
    recovery_pct: Fixed,
) -> Result<usize> {
    let mut recovered = 0;
    for agent in agents.iter_mut().filter(|a| a.state == AgentState::Recovering) {
        let lost = agent.hit_points_lost_before_recovery;
        let max = agent.actor.max_hit_points;
        let total = recovery_turns_for(lost, max, recovery_pct)?;

        reduce_exhaustion(agent, exhaustion_recovery);
        agent.recovery_turns = agent.recovery_turns.saturating_sub(1);
        agent.actor.hit_points = scheduled_hit_points(max, lost, agent.recovery_turns, total)?;

        if agent.recovery_turns == 0 {
            agent.actor.hit_points = max;
            agent.hit_points_lost_before_recovery = Fixed::ZERO;
            agent.reassign(AgentState::Available, Assignment::Standby);
            recovered += 1;
            tracing::debug!(agent = %agent.id, "Agent recovered");
        }
    }
    Ok(recovered)
}

/// Contracting, espionage and training agents do their work.
pub fn update_working(agents: &mut [Agent], rules: &Rules, training_skill_gain: Fixed) -> WorkYield {
    let mut produced = WorkYield::default();
    for agent in agents.iter_mut() {
        match (agent.state, agent.assignment) {
            (AgentState::OnAssignment, Assignment::Contracting) => {
                produced.money +=
                    skill_scaled_yield(effective_skill(&agent.actor), rules.contracting_income);
                agent.actor.exhaustion += rules.contracting_exhaustion;
            }
            (AgentState::OnAssignment, Assignment::Espionage) => {
                produced.intel +=
                    skill_scaled_yield(effective_skill(&agent.actor), rules.espionage_intel);
                agent.actor.exhaustion += rules.espionage_exhaustion;
            }
            (AgentState::InTraining, Assignment::Training) => {
                agent.actor.skill += training_skill_gain;
                agent.skill_from_training += training_skill_gain;
                agent.actor.exhaustion += rules.training_exhaustion;
            }
            _ => {}
        }
    }
    produced
}

/// State an agent in transit arrives in, given its assignment.
#[must_use]
pub const fn arrival_state(assignment: Assignment) -> AgentState {
    match assignment {
        Assignment::Standby => AgentState::Available,
        Assignment::Recovery => AgentState::Recovering,
        Assignment::Contracting | Assignment::Espionage | Assignment::LeadInvestigation(_) => {
            AgentState::OnAssignment
        }
        Assignment::Training => AgentState::InTraining,
        Assignment::MissionSite(_) => AgentState::OnMission,
        Assignment::Sacked | Assignment::Kia => AgentState::Terminated,
    }
}

/// Agents in transit reach their destination.
pub fn update_in_transit(agents: &mut [Agent]) {
    for agent in agents.iter_mut().filter(|a| a.state == AgentState::InTransit) {
        agent.state = arrival_state(agent.assignment);
    }
}

/// Release agents back to headquarters.
pub fn send_home<'a>(agents: impl IntoIterator<Item = &'a mut Agent>) {
    for agent in agents {
        agent.reassign(AgentState::InTransit, Assignment::Standby);
    }
}
