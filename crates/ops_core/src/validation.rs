//! Game-state invariant checks.
//!
//! [`validate_invariants`] runs at the start and end of every turn. A failure
//! means the engine (or whoever assembled the state) has a bug, so the first
//! violation found is reported and nothing is repaired.

use std::collections::BTreeSet;

use crate::agents::{recovery_turns_for, scheduled_hit_points};
use crate::components::{Agent, AgentState, Assignment};
use crate::error::{GameError, Result};
use crate::leads::LeadInvestigationState;
use crate::missions::{MissionSite, MissionSiteState};
use crate::state::GameState;

fn violation(message: String) -> GameError {
    GameError::InvariantViolation(message)
}

/// Check every invariant; return the first violation.
pub fn validate_invariants(state: &GameState) -> Result<()> {
    if state.turn == 0 {
        return Err(violation("turn must start at 1".to_string()));
    }
    if state.panic.is_negative() {
        return Err(violation(format!("negative panic {}", state.panic)));
    }
    if state.intel < 0 {
        return Err(violation(format!("negative intel {}", state.intel)));
    }
    if !state.hit_points_recovery_pct.is_positive() {
        return Err(violation("hit point recovery must be positive".to_string()));
    }

    for faction in &state.factions {
        if faction.threat_level.is_negative() || faction.suppression.is_negative() {
            return Err(violation(format!("{} has negative threat or suppression", faction.id)));
        }
    }

    let mut ids = BTreeSet::new();
    for agent in &state.agents {
        if !ids.insert(agent.id) {
            return Err(violation(format!("duplicate {}", agent.id)));
        }
        validate_agent(state, agent)?;
    }

    let active = state.active_agents().count();
    if active > state.agent_cap {
        return Err(violation(format!("{active} agents exceed cap {}", state.agent_cap)));
    }
    let training = state
        .agents
        .iter()
        .filter(|a| a.assignment == Assignment::Training && a.is_active())
        .count();
    if training > state.training_cap {
        return Err(violation(format!(
            "{training} agents in training exceed cap {}",
            state.training_cap
        )));
    }

    let mut site_ids = BTreeSet::new();
    for site in &state.mission_sites {
        if !site_ids.insert(site.id) {
            return Err(violation(format!("duplicate {}", site.id)));
        }
        validate_site(state, site)?;
    }

    for (id, investigation) in &state.lead_investigations {
        if *id != investigation.id {
            return Err(violation(format!("{} stored under {id}", investigation.id)));
        }
        if investigation.accumulated_intel < 0 {
            return Err(violation(format!("{id} has negative intel")));
        }
        if investigation.state == LeadInvestigationState::Active {
            for agent_id in &investigation.agent_ids {
                let agent = state
                    .agent(*agent_id)
                    .map_err(|_| violation(format!("{id} references missing {agent_id}")))?;
                if agent.assignment != Assignment::LeadInvestigation(*id) {
                    return Err(violation(format!("{id} lists {agent_id} assigned to {}", agent.assignment)));
                }
            }
        }
    }
    Ok(())
}

fn validate_agent(state: &GameState, agent: &Agent) -> Result<()> {
    let id = agent.id;
    let actor = &agent.actor;
    if actor.skill.is_negative() || actor.exhaustion.is_negative() {
        return Err(violation(format!("{id} has negative skill or exhaustion")));
    }
    if !actor.max_hit_points.is_positive() {
        return Err(violation(format!("{id} has no max hit points")));
    }
    if actor.hit_points.is_negative() || actor.hit_points > actor.max_hit_points {
        return Err(violation(format!(
            "{id} hit points {} outside [0, {}]",
            actor.hit_points, actor.max_hit_points
        )));
    }

    let terminated = agent.state == AgentState::Terminated;
    if !actor.is_alive() && !terminated {
        return Err(violation(format!("{id} has zero hit points but is {}", agent.state)));
    }
    if terminated != agent.assignment.is_terminal() {
        return Err(violation(format!("{id} is {} with assignment {}", agent.state, agent.assignment)));
    }
    match agent.assignment {
        Assignment::Kia if actor.is_alive() => {
            return Err(violation(format!("{id} is KIA with hit points left")));
        }
        Assignment::Sacked if actor.hit_points != actor.max_hit_points => {
            return Err(violation(format!("{id} was sacked while wounded")));
        }
        _ => {}
    }
    if terminated {
        return Ok(());
    }

    let wounded = actor.hit_points < actor.max_hit_points;
    if wounded != (agent.assignment == Assignment::Recovery) {
        return Err(violation(format!(
            "{id} has {}/{} hit points on {}",
            actor.hit_points, actor.max_hit_points, agent.assignment
        )));
    }

    let consistent = match agent.state {
        AgentState::Available => agent.assignment == Assignment::Standby,
        AgentState::Recovering => agent.assignment == Assignment::Recovery,
        AgentState::OnAssignment => matches!(
            agent.assignment,
            Assignment::Contracting | Assignment::Espionage | Assignment::LeadInvestigation(_)
        ),
        AgentState::InTraining => agent.assignment == Assignment::Training,
        AgentState::OnMission => matches!(agent.assignment, Assignment::MissionSite(_)),
        AgentState::InTransit => agent.assignment != Assignment::Recovery,
        AgentState::Terminated => false,
    };
    if !consistent {
        return Err(violation(format!("{id} is {} with assignment {}", agent.state, agent.assignment)));
    }

    match agent.assignment {
        Assignment::Recovery => validate_recovery(state, agent)?,
        Assignment::MissionSite(site_id) => {
            let site = state
                .mission_site(site_id)
                .map_err(|_| violation(format!("{id} assigned to missing {site_id}")))?;
            if site.state != MissionSiteState::Deployed || !site.agent_ids.contains(&id) {
                return Err(violation(format!("{id} assigned to {site_id} which is {}", site.state)));
            }
        }
        Assignment::LeadInvestigation(investigation_id) => {
            let investigation = state
                .investigation(investigation_id)
                .map_err(|_| violation(format!("{id} assigned to missing {investigation_id}")))?;
            if !investigation.is_active() || !investigation.agent_ids.contains(&id) {
                return Err(violation(format!(
                    "{id} assigned to {investigation_id} which is {}",
                    investigation.state
                )));
            }
        }
        _ => {}
    }
    Ok(())
}

fn validate_recovery(state: &GameState, agent: &Agent) -> Result<()> {
    let id = agent.id;
    let actor = &agent.actor;
    let lost = agent.hit_points_lost_before_recovery;
    if !lost.is_positive() || lost > actor.max_hit_points {
        return Err(violation(format!("{id} recovering from {lost} lost hit points")));
    }
    let total = recovery_turns_for(lost, actor.max_hit_points, state.hit_points_recovery_pct)?;
    if agent.recovery_turns == 0 || agent.recovery_turns > total {
        return Err(violation(format!(
            "{id} has {} recovery turns of {total}",
            agent.recovery_turns
        )));
    }
    let expected = scheduled_hit_points(actor.max_hit_points, lost, agent.recovery_turns, total)?;
    if actor.hit_points != expected {
        return Err(violation(format!(
            "{id} has {} hit points, recovery schedule expects {expected}",
            actor.hit_points
        )));
    }
    Ok(())
}

fn validate_site(state: &GameState, site: &MissionSite) -> Result<()> {
    let id = site.id;
    match site.state {
        MissionSiteState::Active if !site.agent_ids.is_empty() => {
            return Err(violation(format!("{id} is Active with agents")));
        }
        MissionSiteState::Deployed if site.agent_ids.is_empty() => {
            return Err(violation(format!("{id} is Deployed without agents")));
        }
        MissionSiteState::Expired if site.expires_in != Some(0) => {
            return Err(violation(format!("{id} expired with countdown {:?}", site.expires_in)));
        }
        _ => {}
    }
    if site.state != MissionSiteState::Expired && site.expires_in == Some(0) {
        return Err(violation(format!("{id} reached expiry but is {}", site.state)));
    }
    if site.state == MissionSiteState::Deployed {
        for agent_id in &site.agent_ids {
            let agent = state
                .agent(*agent_id)
                .map_err(|_| violation(format!("{id} lists missing {agent_id}")))?;
            if agent.assignment != Assignment::MissionSite(id) {
                return Err(violation(format!("{id} lists {agent_id} assigned to {}", agent.assignment)));
            }
        }
    }
    for enemy in &site.enemies {
        let actor = &enemy.actor;
        if actor.hit_points.is_negative() || actor.hit_points > actor.max_hit_points {
            return Err(violation(format!("{id} {} has invalid hit points", enemy.id)));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{AgentId, MissionSiteId};
    use crate::math::Fixed;
    use crate::state::{make_initial_state, InitialStateOptions};

    fn debug_state() -> GameState {
        make_initial_state(&InitialStateOptions {
            debug_roster: true,
            ..InitialStateOptions::default()
        })
        .unwrap()
    }

    #[test]
    fn test_initial_states_valid() {
        assert!(validate_invariants(&make_initial_state(&InitialStateOptions::default()).unwrap()).is_ok());
        assert_eq!(validate_invariants(&debug_state()), Ok(()));
    }

    #[test]
    fn test_zero_hp_alive_rejected() {
        let mut state = debug_state();
        state.agents[0].actor.hit_points = Fixed::ZERO;
        assert!(validate_invariants(&state).unwrap_err().is_invariant_violation());
    }

    #[test]
    fn test_wounded_without_recovery_rejected() {
        let mut state = debug_state();
        state.agents[0].actor.hit_points = Fixed::from_int(10);
        assert!(validate_invariants(&state).is_err());
    }

    #[test]
    fn test_broken_recovery_schedule_rejected() {
        let mut state = debug_state();
        let wounded = state
            .agents
            .iter_mut()
            .find(|a| a.state == AgentState::Recovering)
            .unwrap();
        wounded.recovery_turns += 100;
        assert!(validate_invariants(&state).is_err());
    }

    #[test]
    fn test_dangling_site_reference_rejected() {
        let mut state = debug_state();
        let agent = state.agent_mut(AgentId(1)).unwrap();
        agent.reassign(AgentState::OnMission, Assignment::MissionSite(MissionSiteId(99)));
        assert!(validate_invariants(&state).is_err());
    }

    #[test]
    fn test_negative_panic_rejected() {
        let mut state = debug_state();
        state.panic = -Fixed::ONE;
        assert!(validate_invariants(&state).is_err());
    }

    #[test]
    fn test_kia_with_hit_points_rejected() {
        let mut state = debug_state();
        let fallen = state
            .agents
            .iter_mut()
            .find(|a| a.assignment == Assignment::Kia)
            .unwrap();
        fallen.actor.hit_points = Fixed::ONE;
        assert!(validate_invariants(&state).is_err());
    }
}
