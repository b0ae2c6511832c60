//! Turn orchestrator.
//!
//! [`advance_turn`] runs every phase, in a fixed order, every turn:
//!
//! | # | Phase |
//! |---|-------|
//! | 1 | validate invariants |
//! | 2 | advance the turn counter, reset the action counter |
//! | 3 | snapshot upkeep from the pre-update roster |
//! | 4 | available agents rest |
//! | 5 | recovering agents heal |
//! | 6 | contracting, espionage and training agents work |
//! | 7 | agents in transit arrive |
//! | 8 | undeployed sites tick toward expiry |
//! | 8b | lead investigations roll, decay and accrue intel |
//! | 9 | deployed sites resolve their battles |
//! | 10 | assets settle |
//! | 11 | panic grows by unsuppressed threat, minus mission relief |
//! | 12 | factions drift and take mission rewards |
//! | 13 | validate invariants |
//! | 14 | assemble the report |
//!
//! A failed phase returns the error immediately and leaves the state part-way
//! through the turn. [`crate::campaign::Campaign`] restores a snapshot in that case.

use crate::agents::{
    send_home, update_available, update_in_transit, update_recovering, update_working,
    upkeep_cost,
};
use crate::components::{Assignment, LeadInvestigationId};
use crate::data::Catalog;
use crate::economy::AssetLedger;
use crate::error::{GameError, Result};
use crate::factions::Faction;
use crate::leads::update_investigation;
use crate::math::Fixed;
use crate::missions::{resolve_deployed_site, tick_expiry, MissionOutcome, MissionSiteState, ResolveContext};
use crate::random::RandomSource;
use crate::report::{AgentCounts, AgentsReport, FactionReport, LeadReport, PanicReport, TurnReport, ValueChange};
use crate::state::GameState;
use crate::validation::validate_invariants;

/// Compute one full turn, mutating `state` in place.
pub fn advance_turn(
    state: &mut GameState,
    catalog: &Catalog,
    rng: &mut RandomSource,
) -> Result<TurnReport> {
    // 1
    validate_invariants(state)?;
    let agents_before = AgentCounts::tally(&state.agents);
    let panic_before = state.panic;
    let factions_before: Vec<Faction> = state.factions.clone();

    // 2
    state.turn += 1;
    state.actions_count = 0;
    let _span = tracing::debug_span!("turn", turn = state.turn).entered();

    // 3
    let mut ledger = AssetLedger {
        upkeep: upkeep_cost(&state.agents, state.rules.agent_upkeep_cost),
        hire_costs: state.pending_hire_cost,
        ..AssetLedger::default()
    };

    // 4
    update_available(&mut state.agents, state.exhaustion_recovery);

    // 5
    let recovered = update_recovering(
        &mut state.agents,
        state.exhaustion_recovery,
        state.hit_points_recovery_pct,
    )?;

    // 6
    let work = update_working(&mut state.agents, &state.rules, state.training_skill_gain);
    ledger.contracting_income = work.money;
    ledger.espionage_intel = work.intel;

    // 7
    update_in_transit(&mut state.agents);
    tracing::debug!(
        recovered,
        contracting = work.money,
        espionage = work.intel,
        "Agent phases complete"
    );

    // 8
    let expired_sites = tick_expiry(&mut state.mission_sites);

    // 8b
    let leads = update_lead_investigations(state, catalog, rng)?;

    // 9
    let missions = resolve_mission_sites(state, catalog, rng)?;
    for outcome in &missions {
        if let Some(rewards) = &outcome.rewards {
            ledger.add_rewards(rewards);
        }
    }

    // 10
    let assets = ledger.settle(state);

    // 11
    let panic = update_panic(state, &missions);

    // 12
    let factions = update_factions(state, &factions_before, &missions);

    // 13
    validate_invariants(state)?;

    // 14
    let report = TurnReport {
        turn: state.turn,
        assets,
        panic: PanicReport {
            panic: ValueChange::new(panic_before, state.panic),
            ..panic
        },
        agents: AgentsReport::new(agents_before, AgentCounts::tally(&state.agents), recovered),
        factions,
        missions,
        leads,
        expired_sites,
    };
    state.last_report = Some(report.clone());

    tracing::debug!(turn = state.turn, state_hash = state.state_hash(), "Turn state hash");
    Ok(report)
}

fn update_lead_investigations(
    state: &mut GameState,
    catalog: &Catalog,
    rng: &mut RandomSource,
) -> Result<Vec<LeadReport>> {
    let active: Vec<LeadInvestigationId> = state
        .lead_investigations
        .values()
        .filter(|i| i.is_active())
        .map(|i| i.id)
        .collect();

    let mut reports = Vec::with_capacity(active.len());
    for id in active {
        let investigation = state
            .lead_investigations
            .get_mut(&id)
            .ok_or_else(|| GameError::LeadInvestigationNotFound(id.to_string()))?;
        let lead = catalog.lead(&investigation.lead_id)?;
        let progress = update_investigation(investigation, lead, &mut state.agents, &state.rules, rng);
        let intel_after = investigation.accumulated_intel;

        let mut spawned_sites = Vec::new();
        if progress.completed {
            *state
                .lead_investigation_counts
                .entry(progress.lead_id.clone())
                .or_insert(0) += 1;
            send_home(
                state
                    .agents
                    .iter_mut()
                    .filter(|a| a.assignment == Assignment::LeadInvestigation(id)),
            );
            for mission in catalog.missions_unlocked_by(&progress.lead_id) {
                spawned_sites.push(state.spawn_mission_site(catalog, &mission.id)?);
            }
            tracing::info!(
                investigation = %id,
                lead = %progress.lead_id,
                spawned = spawned_sites.len(),
                "Lead completed"
            );
        }

        reports.push(LeadReport {
            progress,
            intel_after,
            spawned_sites,
        });
    }
    Ok(reports)
}

fn resolve_mission_sites(
    state: &mut GameState,
    catalog: &Catalog,
    rng: &mut RandomSource,
) -> Result<Vec<MissionOutcome>> {
    let ctx = ResolveContext {
        turn: state.turn,
        rules: &state.rules,
        hit_points_recovery_pct: state.hit_points_recovery_pct,
    };
    let mut outcomes = Vec::new();
    for site in state
        .mission_sites
        .iter_mut()
        .filter(|s| s.state == MissionSiteState::Deployed)
    {
        let mission = catalog.mission(&site.mission_id)?;
        outcomes.push(resolve_deployed_site(site, &mut state.agents, mission, ctx, rng)?);
    }
    Ok(outcomes)
}

/// Panic grows by the pre-update faction contributions, then mission relief applies.
fn update_panic(state: &mut GameState, missions: &[MissionOutcome]) -> PanicReport {
    let faction_contribution: Fixed = state.factions.iter().map(Faction::panic_contribution).sum();
    let mission_reduction: Fixed = missions
        .iter()
        .filter_map(|m| m.rewards.as_ref())
        .map(|r| r.panic_reduction)
        .sum();
    state.panic = (state.panic + faction_contribution - mission_reduction).non_negative();
    tracing::debug!(panic = %state.panic, %faction_contribution, %mission_reduction, "Panic updated");

    PanicReport {
        panic: ValueChange::default(),
        faction_contribution,
        mission_reduction,
    }
}

fn update_factions(
    state: &mut GameState,
    before: &[Faction],
    missions: &[MissionOutcome],
) -> Vec<FactionReport> {
    let decay = state.rules.suppression_decay;
    for faction in &mut state.factions {
        faction.advance(decay);
    }

    for reward in missions
        .iter()
        .filter_map(|m| m.rewards.as_ref())
        .flat_map(|r| &r.factions)
    {
        match state.factions.iter_mut().find(|f| f.id == reward.faction) {
            Some(faction) => faction.apply_reward(reward.threat_reduction, reward.suppression),
            None => tracing::warn!(faction = %reward.faction, "Mission reward targets an absent faction"),
        }
    }

    state
        .factions
        .iter()
        .zip(before)
        .map(|(after, before)| FactionReport {
            id: after.id,
            threat_level: ValueChange::new(before.threat_level, after.threat_level),
            suppression: ValueChange::new(before.suppression, after.suppression),
            panic_contribution: before.panic_contribution(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{AgentState, MissionSiteId};
    use crate::random::RollChannel;
    use crate::state::{make_initial_state, InitialStateOptions};

    fn state() -> GameState {
        make_initial_state(&InitialStateOptions::default()).unwrap()
    }

    #[test]
    fn test_turn_counter_and_actions_reset() {
        let catalog = Catalog::default();
        let mut state = state();
        state.actions_count = 3;
        let report = advance_turn(&mut state, &catalog, &mut RandomSource::seeded(1)).unwrap();
        assert_eq!(state.turn, 2);
        assert_eq!(report.turn, 2);
        assert_eq!(state.actions_count, 0);
        assert_eq!(state.last_report.as_ref(), Some(&report));
    }

    #[test]
    fn test_upkeep_and_funding() {
        let catalog = Catalog::default();
        let mut state = state();
        let money = state.money;
        let agents = state.agents.len() as i64;
        let report = advance_turn(&mut state, &catalog, &mut RandomSource::seeded(1)).unwrap();
        let expected = money - agents * state.rules.agent_upkeep_cost + state.funding;
        assert_eq!(state.money, expected);
        assert_eq!(report.assets.money.delta, expected - money);
        assert_eq!(report.assets.agent_upkeep, agents * state.rules.agent_upkeep_cost);
    }

    #[test]
    fn test_panic_from_factions() {
        let catalog = Catalog::default();
        let mut state = state();
        let expected: Fixed = state.factions.iter().map(Faction::panic_contribution).sum();
        let report = advance_turn(&mut state, &catalog, &mut RandomSource::seeded(1)).unwrap();
        assert_eq!(state.panic, expected);
        assert_eq!(report.panic.panic.delta, expected);
        assert_eq!(report.factions.len(), state.factions.len());
    }

    #[test]
    fn test_lead_completion_spawns_sites() {
        let catalog = Catalog::default();
        let mut state = state();
        let id = state.open_investigation("criminal-orgs", Vec::new());
        let mut rng = RandomSource::seeded(1);
        rng.set(RollChannel::LeadInvestigation, 0.0).unwrap();

        // criminal-orgs has difficulty 0: completes on the first roll
        let report = advance_turn(&mut state, &catalog, &mut rng).unwrap();
        assert!(report.leads[0].progress.completed);
        assert_eq!(state.lead_completions("criminal-orgs"), 1);
        assert!(!state.investigation(id).unwrap().is_active());
        assert!(report.leads[0].spawned_sites.is_empty());
    }

    #[test]
    fn test_expiry_reported() {
        let catalog = Catalog::default();
        let mut state = state();
        let site = state
            .spawn_mission_site(&catalog, "apprehend-red-dawn-member")
            .unwrap();
        state.mission_site_mut(site).unwrap().expires_in = Some(1);

        let report = advance_turn(&mut state, &catalog, &mut RandomSource::seeded(1)).unwrap();
        assert_eq!(report.expired_sites, vec![MissionSiteId(1)]);
        let site = state.mission_site(site).unwrap();
        assert_eq!(site.state, MissionSiteState::Expired);
        assert_eq!(site.expires_in, Some(0));
    }

    #[test]
    fn test_invalid_state_rejected_before_mutation() {
        let catalog = Catalog::default();
        let mut state = state();
        state.agents[0].actor.hit_points = Fixed::ZERO;
        let before = state.clone();
        let result = advance_turn(&mut state, &catalog, &mut RandomSource::seeded(1));
        assert!(matches!(result, Err(GameError::InvariantViolation(_))));
        assert_eq!(state, before);
    }

    #[test]
    fn test_agents_report_tracks_transit() {
        let catalog = Catalog::default();
        let mut state = state();
        state.hire_agent();
        let report = advance_turn(&mut state, &catalog, &mut RandomSource::seeded(1)).unwrap();
        assert_eq!(report.agents.in_transit, ValueChange::new(1, 0));
        assert!(state.agents.iter().all(|a| a.state == AgentState::Available));
    }
}
