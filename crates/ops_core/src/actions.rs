//! Player actions between turns.
//!
//! Each action is validated in full before anything changes, so a rejected
//! action leaves the state untouched. Accepted actions bump
//! `actions_count`, which [`crate::turn::advance_turn`] resets.

use serde::{Deserialize, Serialize};

use crate::agents::send_home;
use crate::components::{AgentId, AgentState, Assignment, LeadInvestigationId, MissionSiteId};
use crate::data::Catalog;
use crate::error::{GameError, Result};
use crate::leads::LeadInvestigationState;
use crate::missions::MissionSiteState;
use crate::state::GameState;

/// Something the player can do during a turn.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerAction {
    /// Hire one agent; the cost is paid when the turn advances.
    HireAgent,
    /// Dismiss available agents.
    SackAgents(Vec<AgentId>),
    /// Send available agents to earn money.
    AssignToContracting(Vec<AgentId>),
    /// Send available agents to gather intel.
    AssignToEspionage(Vec<AgentId>),
    /// Send available agents to train.
    AssignToTraining(Vec<AgentId>),
    /// Pull agents off contracting, espionage, training or an investigation.
    RecallAgents(Vec<AgentId>),
    /// Deploy available agents to an active mission site.
    DeployAgents {
        /// Target site.
        site: MissionSiteId,
        /// Squad.
        agents: Vec<AgentId>,
    },
    /// Open an investigation of a discovered lead.
    StartInvestigation {
        /// Lead template id.
        lead: String,
        /// Investigators.
        agents: Vec<AgentId>,
    },
    /// Add available agents to an active investigation.
    AddToInvestigation {
        /// Target investigation.
        investigation: LeadInvestigationId,
        /// Investigators.
        agents: Vec<AgentId>,
    },
    /// Close an investigation without result.
    AbandonInvestigation(LeadInvestigationId),
}

fn invalid(message: impl Into<String>) -> GameError {
    GameError::InvalidAction(message.into())
}

/// Check that every agent exists, is listed once and is Available.
fn require_available(state: &GameState, agents: &[AgentId]) -> Result<()> {
    if agents.is_empty() {
        return Err(invalid("no agents selected"));
    }
    for (i, id) in agents.iter().enumerate() {
        if agents[..i].contains(id) {
            return Err(invalid(format!("{id} selected twice")));
        }
        let agent = state.agent(*id)?;
        if !agent.is_available() {
            return Err(invalid(format!("{id} is {}, not Available", agent.state)));
        }
    }
    Ok(())
}

fn dispatch(state: &mut GameState, agents: &[AgentId], assignment: Assignment) -> Result<()> {
    for id in agents {
        state.agent_mut(*id)?.reassign(AgentState::InTransit, assignment);
    }
    Ok(())
}

/// Apply one player action.
pub fn apply_action(state: &mut GameState, catalog: &Catalog, action: &PlayerAction) -> Result<()> {
    match action {
        PlayerAction::HireAgent => hire(state)?,
        PlayerAction::SackAgents(agents) => {
            require_available(state, agents)?;
            let turn = state.turn;
            for id in agents {
                state.agent_mut(*id)?.mark_sacked(turn);
            }
        }
        PlayerAction::AssignToContracting(agents) => {
            require_available(state, agents)?;
            dispatch(state, agents, Assignment::Contracting)?;
        }
        PlayerAction::AssignToEspionage(agents) => {
            require_available(state, agents)?;
            dispatch(state, agents, Assignment::Espionage)?;
        }
        PlayerAction::AssignToTraining(agents) => {
            require_available(state, agents)?;
            let training = state
                .active_agents()
                .filter(|a| a.assignment == Assignment::Training)
                .count();
            let available = state.training_cap.saturating_sub(training);
            if agents.len() > available {
                return Err(GameError::CapacityExceeded {
                    capability: "training".to_string(),
                    requested: agents.len(),
                    available,
                });
            }
            dispatch(state, agents, Assignment::Training)?;
        }
        PlayerAction::RecallAgents(agents) => recall(state, agents)?,
        PlayerAction::DeployAgents { site, agents } => deploy(state, *site, agents)?,
        PlayerAction::StartInvestigation { lead, agents } => {
            start_investigation(state, catalog, lead, agents)?;
        }
        PlayerAction::AddToInvestigation {
            investigation,
            agents,
        } => {
            require_available(state, agents)?;
            let target = state.investigation_mut(*investigation)?;
            if !target.is_active() {
                return Err(invalid(format!("{investigation} is {}", target.state)));
            }
            target.agent_ids.extend_from_slice(agents);
            dispatch(state, agents, Assignment::LeadInvestigation(*investigation))?;
        }
        PlayerAction::AbandonInvestigation(id) => {
            let investigation = state.investigation_mut(*id)?;
            if !investigation.is_active() {
                return Err(invalid(format!("{id} is {}", investigation.state)));
            }
            investigation.state = LeadInvestigationState::Abandoned;
            investigation.agent_ids.clear();
            send_home(
                state
                    .agents
                    .iter_mut()
                    .filter(|a| a.assignment == Assignment::LeadInvestigation(*id)),
            );
        }
    }

    state.actions_count += 1;
    tracing::debug!(?action, actions = state.actions_count, "Player action applied");
    Ok(())
}

fn hire(state: &mut GameState) -> Result<()> {
    let active = state.active_agents().count();
    if active >= state.agent_cap {
        return Err(GameError::CapacityExceeded {
            capability: "agents".to_string(),
            requested: 1,
            available: 0,
        });
    }
    let cost = state.rules.agent_hire_cost;
    let available = state.money - state.pending_hire_cost;
    if available < cost {
        return Err(GameError::InsufficientFunds {
            required: cost,
            available,
        });
    }
    state.pending_hire_cost += cost;
    state.hire_agent();
    Ok(())
}

fn recall(state: &mut GameState, agents: &[AgentId]) -> Result<()> {
    if agents.is_empty() {
        return Err(invalid("no agents selected"));
    }
    for id in agents {
        let agent = state.agent(*id)?;
        let recallable = matches!(
            (agent.state, agent.assignment),
            (
                AgentState::OnAssignment | AgentState::InTransit,
                Assignment::Contracting | Assignment::Espionage | Assignment::LeadInvestigation(_)
            ) | (AgentState::InTraining | AgentState::InTransit, Assignment::Training)
        );
        if !recallable {
            return Err(invalid(format!("{id} cannot be recalled from {}", agent.assignment)));
        }
    }

    for id in agents {
        if let Assignment::LeadInvestigation(investigation) = state.agent(*id)?.assignment {
            state
                .investigation_mut(investigation)?
                .agent_ids
                .retain(|agent| agent != id);
        }
        state
            .agent_mut(*id)?
            .reassign(AgentState::InTransit, Assignment::Standby);
    }
    Ok(())
}

fn deploy(state: &mut GameState, site_id: MissionSiteId, agents: &[AgentId]) -> Result<()> {
    let site = state.mission_site(site_id)?;
    if site.state != MissionSiteState::Active {
        return Err(invalid(format!("{site_id} is {}", site.state)));
    }
    require_available(state, agents)?;
    if agents.len() > state.transport_cap {
        return Err(GameError::CapacityExceeded {
            capability: "transport".to_string(),
            requested: agents.len(),
            available: state.transport_cap,
        });
    }

    let site = state.mission_site_mut(site_id)?;
    site.state = MissionSiteState::Deployed;
    site.agent_ids = agents.to_vec();
    dispatch(state, agents, Assignment::MissionSite(site_id))
}

fn start_investigation(
    state: &mut GameState,
    catalog: &Catalog,
    lead_id: &str,
    agents: &[AgentId],
) -> Result<()> {
    let lead = catalog.lead(lead_id)?;
    if !state.is_lead_discovered(catalog, lead_id)? {
        return Err(invalid(format!("lead '{lead_id}' is not discovered yet")));
    }
    if !lead.repeatable {
        if state.lead_completions(lead_id) > 0 {
            return Err(invalid(format!("lead '{lead_id}' is already completed")));
        }
        if state
            .lead_investigations
            .values()
            .any(|i| i.is_active() && i.lead_id == lead_id)
        {
            return Err(invalid(format!("lead '{lead_id}' is already under investigation")));
        }
    }
    require_available(state, agents)?;

    let id = state.open_investigation(lead_id, agents.to_vec());
    dispatch(state, agents, Assignment::LeadInvestigation(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{make_initial_state, InitialStateOptions};
    use crate::validation::validate_invariants;

    fn setup() -> (GameState, Catalog) {
        (
            make_initial_state(&InitialStateOptions::default()).unwrap(),
            Catalog::default(),
        )
    }

    #[test]
    fn test_hire_accrues_cost() {
        let (mut state, catalog) = setup();
        let before = state.agents.len();
        apply_action(&mut state, &catalog, &PlayerAction::HireAgent).unwrap();
        assert_eq!(state.agents.len(), before + 1);
        assert_eq!(state.pending_hire_cost, state.rules.agent_hire_cost);
        assert_eq!(state.actions_count, 1);
        assert_eq!(state.agents.last().unwrap().state, AgentState::InTransit);
    }

    #[test]
    fn test_hire_respects_funds_and_cap() {
        let (mut state, catalog) = setup();
        state.money = state.rules.agent_hire_cost - 1;
        assert!(matches!(
            apply_action(&mut state, &catalog, &PlayerAction::HireAgent),
            Err(GameError::InsufficientFunds { .. })
        ));

        state.money = 10_000;
        state.agent_cap = state.agents.len();
        assert!(matches!(
            apply_action(&mut state, &catalog, &PlayerAction::HireAgent),
            Err(GameError::CapacityExceeded { .. })
        ));
        assert_eq!(state.actions_count, 0);
    }

    #[test]
    fn test_sack_available_only() {
        let (mut state, catalog) = setup();
        apply_action(&mut state, &catalog, &PlayerAction::SackAgents(vec![AgentId(1)])).unwrap();
        assert_eq!(state.agent(AgentId(1)).unwrap().assignment, Assignment::Sacked);
        assert!(apply_action(&mut state, &catalog, &PlayerAction::SackAgents(vec![AgentId(1)])).is_err());
        assert!(validate_invariants(&state).is_ok());
    }

    #[test]
    fn test_training_cap() {
        let (mut state, catalog) = setup();
        let all: Vec<AgentId> = state.agents.iter().map(|a| a.id).collect();
        let result = apply_action(&mut state, &catalog, &PlayerAction::AssignToTraining(all));
        assert!(matches!(result, Err(GameError::CapacityExceeded { .. })));
        assert!(state.agents.iter().all(|a| a.is_available()));

        apply_action(
            &mut state,
            &catalog,
            &PlayerAction::AssignToTraining(vec![AgentId(1), AgentId(2)]),
        )
        .unwrap();
        assert_eq!(state.agent(AgentId(1)).unwrap().assignment, Assignment::Training);
    }

    #[test]
    fn test_deploy_and_transport_cap() {
        let (mut state, catalog) = setup();
        let site = state
            .spawn_mission_site(&catalog, "apprehend-red-dawn-member")
            .unwrap();
        state.transport_cap = 2;
        let too_many = PlayerAction::DeployAgents {
            site,
            agents: vec![AgentId(1), AgentId(2), AgentId(3)],
        };
        assert!(matches!(
            apply_action(&mut state, &catalog, &too_many),
            Err(GameError::CapacityExceeded { .. })
        ));

        let ok = PlayerAction::DeployAgents {
            site,
            agents: vec![AgentId(1), AgentId(2)],
        };
        apply_action(&mut state, &catalog, &ok).unwrap();
        assert_eq!(state.mission_site(site).unwrap().state, MissionSiteState::Deployed);
        assert_eq!(
            state.agent(AgentId(1)).unwrap().assignment,
            Assignment::MissionSite(site)
        );
        assert!(validate_invariants(&state).is_ok());
        // Site no longer Active
        assert!(apply_action(&mut state, &catalog, &ok).is_err());
    }

    #[test]
    fn test_investigation_requires_discovery() {
        let (mut state, catalog) = setup();
        let locked = PlayerAction::StartInvestigation {
            lead: "red-dawn-member".to_string(),
            agents: vec![AgentId(1)],
        };
        assert!(matches!(
            apply_action(&mut state, &catalog, &locked),
            Err(GameError::InvalidAction(_))
        ));

        state
            .lead_investigation_counts
            .insert("criminal-orgs".to_string(), 1);
        apply_action(&mut state, &catalog, &locked).unwrap();
        assert_eq!(state.lead_investigations.len(), 1);
        assert!(validate_invariants(&state).is_ok());
    }

    #[test]
    fn test_non_repeatable_lead_once() {
        let (mut state, catalog) = setup();
        let start = |agent| PlayerAction::StartInvestigation {
            lead: "criminal-orgs".to_string(),
            agents: vec![agent],
        };
        apply_action(&mut state, &catalog, &start(AgentId(1))).unwrap();
        assert!(apply_action(&mut state, &catalog, &start(AgentId(2))).is_err());
    }

    #[test]
    fn test_recall_and_abandon() {
        let (mut state, catalog) = setup();
        apply_action(
            &mut state,
            &catalog,
            &PlayerAction::StartInvestigation {
                lead: "criminal-orgs".to_string(),
                agents: vec![AgentId(1), AgentId(2)],
            },
        )
        .unwrap();
        let id = *state.lead_investigations.keys().next().unwrap();

        apply_action(&mut state, &catalog, &PlayerAction::RecallAgents(vec![AgentId(1)])).unwrap();
        assert_eq!(state.investigation(id).unwrap().agent_ids, vec![AgentId(2)]);
        assert_eq!(state.agent(AgentId(1)).unwrap().assignment, Assignment::Standby);

        apply_action(&mut state, &catalog, &PlayerAction::AbandonInvestigation(id)).unwrap();
        assert_eq!(
            state.investigation(id).unwrap().state,
            LeadInvestigationState::Abandoned
        );
        assert_eq!(state.agent(AgentId(2)).unwrap().state, AgentState::InTransit);
        assert!(validate_invariants(&state).is_ok());
        assert_eq!(state.actions_count, 3);
    }

    #[test]
    fn test_recall_rejects_idle_agents() {
        let (mut state, catalog) = setup();
        assert!(apply_action(&mut state, &catalog, &PlayerAction::RecallAgents(vec![AgentId(1)])).is_err());
    }
}
