//! Mission sites: spawning, expiry and battle resolution.
//!
//! A site moves through `Active → Deployed → {Successful, Failed, Expired}`.
//! Once concluded its enemies are frozen as a record of the battle.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::agents::start_recovery;
use crate::combat::{resolve_battle, BattleReport};
use crate::components::{Agent, AgentId, AgentState, Assignment, MissionSiteId, Turn};
use crate::config::Rules;
use crate::data::{MissionData, MissionRewards};
use crate::enemies::{parse_enemy_roster, Enemy};
use crate::error::{GameError, Result};
use crate::math::Fixed;
use crate::random::RandomSource;

/// Mission site lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MissionSiteState {
    /// Waiting for a deployment.
    Active,
    /// Agents are on their way; the battle resolves this turn.
    Deployed,
    /// All enemies incapacitated.
    Successful,
    /// Agents retreated or were wiped out.
    Failed,
    /// Nobody deployed in time.
    Expired,
}

impl MissionSiteState {
    /// Whether the site is finished.
    #[must_use]
    pub const fn is_concluded(self) -> bool {
        matches!(self, Self::Successful | Self::Failed | Self::Expired)
    }
}

impl fmt::Display for MissionSiteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Active => "Active",
            Self::Deployed => "Deployed",
            Self::Successful => "Successful",
            Self::Failed => "Failed",
            Self::Expired => "Expired",
        };
        f.write_str(name)
    }
}

/// A concrete instance of a mission template.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MissionSite {
    /// Unique id.
    pub id: MissionSiteId,
    /// Template id.
    pub mission_id: String,
    /// Lifecycle state.
    pub state: MissionSiteState,
    /// Turns left before expiry. `None` never expires.
    pub expires_in: Option<u32>,
    /// Agents deployed to the site.
    pub agent_ids: Vec<AgentId>,
    /// Opposition.
    pub enemies: Vec<Enemy>,
    /// Turn the site appeared.
    pub turn_spawned: Turn,
}

impl MissionSite {
    /// Spawn a site from its template.
    pub fn spawn(id: MissionSiteId, mission: &MissionData, turn: Turn) -> Result<Self> {
        Ok(Self {
            id,
            mission_id: mission.id.clone(),
            state: MissionSiteState::Active,
            expires_in: mission.expires_in,
            agent_ids: Vec::new(),
            enemies: parse_enemy_roster(&mission.enemies)?,
            turn_spawned: turn,
        })
    }

    /// Whether the site is finished.
    #[must_use]
    pub const fn is_concluded(&self) -> bool {
        self.state.is_concluded()
    }
}

/// Count down every undeployed active site; return the ones that expired.
pub fn tick_expiry(sites: &mut [MissionSite]) -> Vec<MissionSiteId> {
    let mut expired = Vec::new();
    for site in sites.iter_mut().filter(|s| s.state == MissionSiteState::Active) {
        let Some(turns) = site.expires_in.as_mut() else {
            continue;
        };
        *turns = turns.saturating_sub(1);
        if *turns == 0 {
            site.state = MissionSiteState::Expired;
            tracing::info!(site = %site.id, mission = %site.mission_id, "Mission site expired");
            expired.push(site.id);
        }
    }
    expired
}

/// What happened at a resolved site.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MissionOutcome {
    /// Site resolved.
    pub site_id: MissionSiteId,
    /// Template id.
    pub mission_id: String,
    /// `Successful` or `Failed`.
    pub state: MissionSiteState,
    /// Battle statistics.
    pub battle: BattleReport,
    /// Agents killed in action.
    pub agents_kia: Vec<AgentId>,
    /// Agents sent to recovery.
    pub agents_wounded: Vec<AgentId>,
    /// Rewards earned, if successful.
    pub rewards: Option<MissionRewards>,
}

/// Context the resolver needs from the game state.
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    /// Current turn.
    pub turn: Turn,
    /// Rule set in force.
    pub rules: &'a Rules,
    /// Percent of max hit points healed per recovery turn.
    pub hit_points_recovery_pct: Fixed,
}

/// Fight the battle at a deployed site and settle its agents.
pub fn resolve_deployed_site(
    site: &mut MissionSite,
    agents: &mut [Agent],
    mission: &MissionData,
    ctx: ResolveContext<'_>,
    rng: &mut RandomSource,
) -> Result<MissionOutcome> {
    if site.state != MissionSiteState::Deployed {
        return Err(GameError::InvariantViolation(format!(
            "{} resolved while {}",
            site.id, site.state
        )));
    }

    let mut squad: Vec<&mut Agent> = agents
        .iter_mut()
        .filter(|a| site.agent_ids.contains(&a.id) && a.is_active())
        .collect();
    if squad.len() != site.agent_ids.len() {
        let missing = site
            .agent_ids
            .iter()
            .find(|id| !squad.iter().any(|a| a.id == **id))
            .map_or_else(|| site.id.to_string(), ToString::to_string);
        return Err(GameError::AgentNotFound(missing));
    }

    let battle = resolve_battle(&mut squad, &mut site.enemies, ctx.rules, rng);
    let terminated_teammates = battle.agents_terminated;

    let mut agents_kia = Vec::new();
    let mut agents_wounded = Vec::new();
    for agent in &mut squad {
        agent.missions_total += 1;
        if let Some(&gain) = battle.agent_skill_gains.get(&agent.id) {
            agent.actor.skill += gain;
        }

        if !agent.actor.is_alive() {
            let killer = battle.agent_killed_by.get(&agent.id).copied();
            agent.mark_kia(ctx.turn, killer, site.id);
            tracing::warn!(agent = %agent.id, site = %site.id, "Agent killed in action");
            agents_kia.push(agent.id);
            continue;
        }

        agent.actor.exhaustion += Fixed::from_int(terminated_teammates as i64);
        if agent.actor.damage_taken().is_positive() {
            start_recovery(agent, ctx.hit_points_recovery_pct)?;
            agents_wounded.push(agent.id);
        } else {
            agent.reassign(AgentState::Available, Assignment::Standby);
        }
    }

    let successful = battle.all_enemies_down();
    site.state = if successful {
        MissionSiteState::Successful
    } else {
        MissionSiteState::Failed
    };
    if battle.retreated {
        tracing::warn!(site = %site.id, rounds = battle.rounds, "Agents retreated");
    }
    tracing::info!(
        site = %site.id,
        mission = %site.mission_id,
        outcome = %site.state,
        rounds = battle.rounds,
        kia = agents_kia.len(),
        "Mission resolved"
    );

    Ok(MissionOutcome {
        site_id: site.id,
        mission_id: site.mission_id.clone(),
        state: site.state,
        battle,
        agents_kia,
        agents_wounded,
        rewards: successful.then(|| mission.rewards.clone()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Actor, Weapon};
    use crate::data::Catalog;
    use crate::random::RollChannel;

    fn site(expires_in: Option<u32>) -> MissionSite {
        let catalog = Catalog::default();
        let mut site = MissionSite::spawn(
            MissionSiteId(1),
            catalog.mission("apprehend-red-dawn-member").unwrap(),
            1,
        )
        .unwrap();
        site.expires_in = expires_in;
        site
    }

    fn deployed_agent(id: u32, skill: i64, damage: i64) -> Agent {
        let mut agent = Agent::hired(
            AgentId(id),
            1,
            Actor::new(Fixed::from_int(skill), Fixed::from_int(30), Weapon::new(damage)),
        );
        agent.reassign(AgentState::OnMission, Assignment::MissionSite(MissionSiteId(1)));
        agent
    }

    #[test]
    fn test_spawn_parses_roster() {
        let site = site(Some(3));
        assert_eq!(site.state, MissionSiteState::Active);
        assert_eq!(site.enemies.len(), 3);
        assert!(!site.is_concluded());
    }

    #[test]
    fn test_expiry_countdown() {
        let mut sites = vec![site(Some(2)), site(None)];
        sites[1].id = MissionSiteId(2);

        assert!(tick_expiry(&mut sites).is_empty());
        assert_eq!(sites[0].expires_in, Some(1));
        assert_eq!(tick_expiry(&mut sites), vec![MissionSiteId(1)]);
        assert_eq!(sites[0].state, MissionSiteState::Expired);
        assert_eq!(sites[0].expires_in, Some(0));
        assert_eq!(sites[1].state, MissionSiteState::Active);
        assert_eq!(sites[1].expires_in, None);
    }

    #[test]
    fn test_deployed_sites_do_not_expire() {
        let mut sites = vec![site(Some(1))];
        sites[0].state = MissionSiteState::Deployed;
        assert!(tick_expiry(&mut sites).is_empty());
        assert_eq!(sites[0].expires_in, Some(1));
    }

    #[test]
    fn test_resolve_success_releases_agents() {
        let rules = Rules::default();
        let catalog = Catalog::default();
        let mission = catalog.mission("apprehend-red-dawn-member").unwrap();
        let mut site = site(Some(3));
        site.state = MissionSiteState::Deployed;
        site.agent_ids = vec![AgentId(1), AgentId(2), AgentId(3)];
        // Three strong agents clear all three enemies before they can shoot back
        let mut agents = vec![
            deployed_agent(1, 300, 60),
            deployed_agent(2, 300, 60),
            deployed_agent(3, 300, 60),
        ];
        let mut rng = RandomSource::seeded(3);
        rng.set_all(1.0).unwrap();

        let ctx = ResolveContext {
            turn: 2,
            rules: &rules,
            hit_points_recovery_pct: Fixed::from_int(2),
        };
        let outcome = resolve_deployed_site(&mut site, &mut agents, mission, ctx, &mut rng).unwrap();

        assert_eq!(outcome.state, MissionSiteState::Successful);
        assert_eq!(site.state, MissionSiteState::Successful);
        assert_eq!(outcome.rewards.as_ref(), Some(&mission.rewards));
        for agent in &agents {
            assert_eq!(agent.state, AgentState::Available);
            assert_eq!(agent.missions_total, 1);
            assert!(agent.actor.skill > Fixed::from_int(300));
        }
    }

    #[test]
    fn test_resolve_failure_marks_kia() {
        let rules = Rules::default();
        let catalog = Catalog::default();
        let mission = catalog.mission("apprehend-red-dawn-member").unwrap();
        let mut site = site(Some(3));
        site.state = MissionSiteState::Deployed;
        site.agent_ids = vec![AgentId(1)];
        let mut agents = vec![deployed_agent(1, 1, 1)];
        let mut rng = RandomSource::seeded(3);
        rng.set_all(1.0).unwrap();
        // Agent attacks always fail once its skill is dwarfed; enemies always hit
        rng.set(RollChannel::ContestRoll, 0.99).unwrap();

        let ctx = ResolveContext {
            turn: 2,
            rules: &rules,
            hit_points_recovery_pct: Fixed::from_int(2),
        };
        let outcome = resolve_deployed_site(&mut site, &mut agents, mission, ctx, &mut rng).unwrap();

        assert_eq!(outcome.state, MissionSiteState::Failed);
        assert_eq!(outcome.agents_kia, vec![AgentId(1)]);
        assert_eq!(outcome.rewards, None);
        let agent = &agents[0];
        assert_eq!(agent.state, AgentState::Terminated);
        assert_eq!(agent.assignment, Assignment::Kia);
        assert_eq!(agent.terminated_on_mission_site, Some(MissionSiteId(1)));
        assert!(agent.terminated_by.is_some());
    }

    #[test]
    fn test_resolve_requires_deployed() {
        let rules = Rules::default();
        let catalog = Catalog::default();
        let mission = catalog.mission("apprehend-red-dawn-member").unwrap();
        let mut site = site(Some(3));
        let ctx = ResolveContext {
            turn: 2,
            rules: &rules,
            hit_points_recovery_pct: Fixed::from_int(2),
        };
        let result =
            resolve_deployed_site(&mut site, &mut [], mission, ctx, &mut RandomSource::seeded(0));
        assert!(matches!(result, Err(GameError::InvariantViolation(_))));
    }
}
