//! The game state aggregate.
//!
//! [`GameState`] is plain data owned by a single caller. The turn engine
//! mutates it in place; snapshots for undo are taken with [`GameState::serialize`].
//!
//! # Determinism
//!
//! Every collection is ordered (`Vec` in creation order, `BTreeMap` by key),
//! so [`GameState::state_hash`] and the bincode encoding are stable for equal
//! states.

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::components::{
    Actor, Agent, AgentId, AgentState, Assignment, EnemyId, LeadInvestigationId, MissionSiteId,
    Turn, Weapon,
};
use crate::config::{GameConfig, Rules};
use crate::data::Catalog;
use crate::error::{GameError, Result};
use crate::factions::Faction;
use crate::leads::LeadInvestigation;
use crate::math::Fixed;
use crate::missions::{MissionSite, MissionSiteState};
use crate::report::TurnReport;

/// Root aggregate of a running game.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameState {
    /// Current turn, starting at 1.
    pub turn: Turn,
    /// Player actions taken this turn.
    pub actions_count: u32,
    /// Public panic.
    pub panic: Fixed,
    /// Hostile factions.
    pub factions: Vec<Faction>,

    /// Money.
    pub money: i64,
    /// Intel.
    pub intel: i64,
    /// Money granted every turn.
    pub funding: i64,
    /// Hire costs accrued this turn, paid when the turn advances.
    pub pending_hire_cost: i64,

    /// Maximum non-terminated agents.
    pub agent_cap: usize,
    /// Maximum agents per deployment.
    pub transport_cap: usize,
    /// Maximum agents in training.
    pub training_cap: usize,
    /// Skill gained per training turn.
    pub training_skill_gain: Fixed,
    /// Exhaustion removed per turn of rest.
    pub exhaustion_recovery: Fixed,
    /// Percent of max hit points healed per recovery turn.
    pub hit_points_recovery_pct: Fixed,
    /// Rules in force.
    pub rules: Rules,

    /// Every agent ever hired, in hire order.
    pub agents: Vec<Agent>,
    /// Completions per lead id.
    pub lead_investigation_counts: BTreeMap<String, u32>,
    /// Investigations by id.
    pub lead_investigations: BTreeMap<LeadInvestigationId, LeadInvestigation>,
    /// Every mission site ever spawned, in spawn order.
    pub mission_sites: Vec<MissionSite>,

    next_agent_id: u32,
    next_mission_site_id: u32,
    next_investigation_id: u32,

    /// Report of the most recent turn.
    pub last_report: Option<TurnReport>,
}

/// Options for [`make_initial_state`].
#[derive(Debug, Clone, Default)]
pub struct InitialStateOptions {
    /// Rules and starting settings.
    pub config: GameConfig,
    /// Seed a fixed roster covering every agent state for manual testing.
    pub debug_roster: bool,
}

impl GameState {
    /// Look up an agent.
    pub fn agent(&self, id: AgentId) -> Result<&Agent> {
        self.agents
            .iter()
            .find(|a| a.id == id)
            .ok_or_else(|| GameError::AgentNotFound(id.to_string()))
    }

    /// Look up an agent mutably.
    pub fn agent_mut(&mut self, id: AgentId) -> Result<&mut Agent> {
        self.agents
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| GameError::AgentNotFound(id.to_string()))
    }

    /// Look up a mission site.
    pub fn mission_site(&self, id: MissionSiteId) -> Result<&MissionSite> {
        self.mission_sites
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| GameError::MissionSiteNotFound(id.to_string()))
    }

    /// Look up a mission site mutably.
    pub fn mission_site_mut(&mut self, id: MissionSiteId) -> Result<&mut MissionSite> {
        self.mission_sites
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| GameError::MissionSiteNotFound(id.to_string()))
    }

    /// Look up a lead investigation.
    pub fn investigation(&self, id: LeadInvestigationId) -> Result<&LeadInvestigation> {
        self.lead_investigations
            .get(&id)
            .ok_or_else(|| GameError::LeadInvestigationNotFound(id.to_string()))
    }

    /// Look up a lead investigation mutably.
    pub fn investigation_mut(&mut self, id: LeadInvestigationId) -> Result<&mut LeadInvestigation> {
        self.lead_investigations
            .get_mut(&id)
            .ok_or_else(|| GameError::LeadInvestigationNotFound(id.to_string()))
    }

    /// Non-terminated agents.
    pub fn active_agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter().filter(|a| a.is_active())
    }

    /// Times `lead_id` has been completed.
    #[must_use]
    pub fn lead_completions(&self, lead_id: &str) -> u32 {
        self.lead_investigation_counts.get(lead_id).copied().unwrap_or(0)
    }

    /// Whether every lead `lead_id` depends on has been completed.
    pub fn is_lead_discovered(&self, catalog: &Catalog, lead_id: &str) -> Result<bool> {
        let lead = catalog.lead(lead_id)?;
        Ok(lead
            .depends_on
            .iter()
            .all(|dependency| self.lead_completions(dependency) > 0))
    }

    /// Add a freshly hired agent with the configured starting stats.
    pub fn hire_agent(&mut self) -> AgentId {
        self.next_agent_id += 1;
        let id = AgentId(self.next_agent_id);
        let actor = Actor::new(
            self.rules.agent_initial_skill,
            self.rules.agent_initial_hit_points,
            Weapon::new(self.rules.agent_weapon_damage),
        );
        self.agents.push(Agent::hired(id, self.turn, actor));
        id
    }

    /// Spawn a site for `mission_id`.
    pub fn spawn_mission_site(&mut self, catalog: &Catalog, mission_id: &str) -> Result<MissionSiteId> {
        let mission = catalog.mission(mission_id)?;
        let id = MissionSiteId(self.next_mission_site_id + 1);
        let site = MissionSite::spawn(id, mission, self.turn)?;
        self.next_mission_site_id += 1;
        self.mission_sites.push(site);
        Ok(id)
    }

    /// Open an investigation of `lead_id` with the given agents.
    pub fn open_investigation(&mut self, lead_id: &str, agent_ids: Vec<AgentId>) -> LeadInvestigationId {
        self.next_investigation_id += 1;
        let id = LeadInvestigationId(self.next_investigation_id);
        self.lead_investigations
            .insert(id, LeadInvestigation::new(id, lead_id, agent_ids, self.turn));
        id
    }

    /// Deterministic hash of the whole state.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }

    /// Encode the state with bincode.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| GameError::Serialization(e.to_string()))
    }

    /// Decode a state produced by [`GameState::serialize`].
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data).map_err(|e| GameError::Serialization(e.to_string()))
    }
}

/// Build a fresh game state.
pub fn make_initial_state(options: &InitialStateOptions) -> Result<GameState> {
    options.config.validate()?;
    let start = &options.config.start;

    let mut state = GameState {
        turn: 1,
        actions_count: 0,
        panic: start.panic,
        factions: start.factions.clone(),
        money: start.money,
        intel: start.intel,
        funding: start.funding,
        pending_hire_cost: 0,
        agent_cap: start.agent_cap,
        transport_cap: start.transport_cap,
        training_cap: start.training_cap,
        training_skill_gain: start.training_skill_gain,
        exhaustion_recovery: start.exhaustion_recovery,
        hit_points_recovery_pct: start.hit_points_recovery_pct,
        rules: options.config.rules.clone(),
        agents: Vec::new(),
        lead_investigation_counts: BTreeMap::new(),
        lead_investigations: BTreeMap::new(),
        mission_sites: Vec::new(),
        next_agent_id: 0,
        next_mission_site_id: 0,
        next_investigation_id: 0,
        last_report: None,
    };

    for _ in 0..start.agent_count {
        let id = state.hire_agent();
        state.agent_mut(id)?.state = AgentState::Available;
    }

    if options.debug_roster {
        seed_debug_roster(&mut state)?;
    }
    Ok(state)
}

/// Agents in every state, an active site and an open investigation.
fn seed_debug_roster(state: &mut GameState) -> Result<()> {
    let catalog = Catalog::default();
    let recovery_pct = state.hit_points_recovery_pct;

    let contractor = state.hire_agent();
    state
        .agent_mut(contractor)?
        .reassign(AgentState::OnAssignment, Assignment::Contracting);

    let spy = state.hire_agent();
    state
        .agent_mut(spy)?
        .reassign(AgentState::OnAssignment, Assignment::Espionage);

    let trainee = state.hire_agent();
    state
        .agent_mut(trainee)?
        .reassign(AgentState::InTraining, Assignment::Training);

    let wounded = state.hire_agent();
    {
        let agent = state.agent_mut(wounded)?;
        agent.actor.hit_points = agent.actor.max_hit_points.mul_ratio(1, 2)?;
        agent.missions_total = 1;
        crate::agents::start_recovery(agent, recovery_pct)?;
    }

    let veteran = state.hire_agent();
    {
        let agent = state.agent_mut(veteran)?;
        agent.actor.skill += Fixed::from_int(60);
        agent.actor.exhaustion = Fixed::from_int(3);
        agent.missions_total = 4;
        agent.state = AgentState::Available;
    }

    let sacked = state.hire_agent();
    let turn = state.turn;
    state.agent_mut(sacked)?.mark_sacked(turn);

    let fallen = state.hire_agent();
    let site = state.spawn_mission_site(&catalog, "apprehend-red-dawn-member")?;
    state
        .agent_mut(fallen)?
        .mark_kia(turn, Some(EnemyId(1)), site);
    state.mission_site_mut(site)?.state = MissionSiteState::Failed;
    state.mission_site_mut(site)?.agent_ids = vec![fallen];

    state.spawn_mission_site(&catalog, "apprehend-red-dawn-member")?;
    state.spawn_mission_site(&catalog, "apprehend-exalt-member")?;

    state.hire_agent();

    let investigator = state.hire_agent();
    let investigation = state.open_investigation("criminal-orgs", vec![investigator]);
    state
        .agent_mut(investigator)?
        .reassign(AgentState::OnAssignment, Assignment::LeadInvestigation(investigation));

    tracing::debug!(agents = state.agents.len(), "Seeded debug roster");
    Ok(())
}
