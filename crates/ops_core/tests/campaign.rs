//! Multi-turn campaigns driven through player actions.

use ops_core::actions::{apply_action, PlayerAction};
use ops_core::campaign::Campaign;
use ops_core::components::{AgentId, AgentState, Assignment};
use ops_core::data::Catalog;
use ops_core::factions::FactionId;
use ops_core::math::Fixed;
use ops_core::missions::MissionSiteState;
use ops_core::random::{RandomSource, RollChannel};
use ops_core::state::GameState;
use ops_core::turn::advance_turn;
use ops_core::validation::validate_invariants;
use ops_test_utils::determinism::{find_first_divergence, verify_campaign_determinism};
use ops_test_utils::fixtures::{self, fixed, fixed_str};

/// A state with three agents deployed to a Red Dawn member site.
fn deployed_state(catalog: &Catalog, skill: i64, damage: i64) -> GameState {
    let mut state = fixtures::initial_state();
    for id in 1..=3 {
        let actor = &mut state.agent_mut(AgentId(id)).unwrap().actor;
        actor.skill = fixed(skill);
        actor.weapon = ops_core::components::Weapon::new(damage);
    }
    let site = state
        .spawn_mission_site(catalog, "apprehend-red-dawn-member")
        .unwrap();
    apply_action(
        &mut state,
        catalog,
        &PlayerAction::DeployAgents {
            site,
            agents: vec![AgentId(1), AgentId(2), AgentId(3)],
        },
    )
    .unwrap();
    state
}

#[test]
fn test_deployed_squad_wins_and_collects_rewards() {
    let catalog = fixtures::catalog();
    let mut state = deployed_state(&catalog, 300, 60);
    let money = state.money;
    let funding = state.funding;
    let upkeep = 4 * state.rules.agent_upkeep_cost;
    let threat = state.factions[0].threat_level;
    let increase = state.factions[0].threat_increase;
    assert_eq!(state.factions[0].id, FactionId::RedDawn);

    let mut rng = RandomSource::seeded(21);
    rng.set(RollChannel::ContestRoll, 1.0).unwrap();
    rng.set(RollChannel::DamageRoll, 1.0).unwrap();
    let report = advance_turn(&mut state, &catalog, &mut rng).unwrap();

    let outcome = &report.missions[0];
    assert_eq!(outcome.state, MissionSiteState::Successful);
    assert_eq!(outcome.battle.rounds, 1);
    assert!(outcome.agents_kia.is_empty());
    assert_eq!(state.mission_sites[0].state, MissionSiteState::Successful);

    for id in 1..=3 {
        let agent = state.agent(AgentId(id)).unwrap();
        assert_eq!(agent.state, AgentState::Available);
        assert_eq!(agent.missions_total, 1);
        assert!(agent.actor.skill > fixed(300));
    }

    assert_eq!(state.money, money + funding - upkeep + 50);
    assert_eq!(report.assets.mission_money, 50);
    assert_eq!(state.intel, 10);
    assert_eq!(report.panic.mission_reduction, fixed_str("0.0005"));
    // Threat grows, then the reward removes 0.001 and adds 0.002 suppression
    assert_eq!(
        state.factions[0].threat_level,
        threat + increase - fixed_str("0.001")
    );
    assert_eq!(state.factions[0].suppression, fixed_str("0.002"));
}

#[test]
fn test_hopeless_squad_fails_mission() {
    let catalog = fixtures::catalog();
    let mut state = deployed_state(&catalog, 0, 1);
    let report = advance_turn(&mut state, &catalog, &mut RandomSource::seeded(4)).unwrap();

    let outcome = &report.missions[0];
    assert_eq!(outcome.state, MissionSiteState::Failed);
    assert!(outcome.rewards.is_none());
    assert_eq!(report.assets.mission_money, 0);
    for id in 1..=3 {
        let agent = state.agent(AgentId(id)).unwrap();
        assert!(!matches!(agent.assignment, Assignment::MissionSite(_)));
    }
    assert!(validate_invariants(&state).is_ok());
}

#[test]
fn test_turns_are_monotonic_and_roster_only_grows() {
    let catalog = fixtures::catalog();
    let mut state = fixtures::debug_state();
    let mut rng = RandomSource::seeded(99);

    for _ in 0..30 {
        let turn = state.turn;
        let roster = state.agents.len();
        let terminated: Vec<AgentId> = state
            .agents
            .iter()
            .filter(|a| a.state == AgentState::Terminated)
            .map(|a| a.id)
            .collect();

        let report = advance_turn(&mut state, &catalog, &mut rng).unwrap();
        assert_eq!(state.turn, turn + 1);
        assert_eq!(report.turn, state.turn);
        assert!(state.agents.len() >= roster);
        for id in terminated {
            assert_eq!(state.agent(id).unwrap().state, AgentState::Terminated);
        }
        assert!(!state.panic.is_negative());
    }
}

#[test]
fn test_same_seed_same_campaign() {
    let catalog = fixtures::catalog();
    let state = deployed_state(&catalog, 110, 12);

    verify_campaign_determinism(&state, &catalog, 1234, 4, 12).assert_deterministic();
    assert_eq!(find_first_divergence(&state, &catalog, 1234, 12), None);
}

#[test]
fn test_same_overrides_same_report() {
    let catalog = fixtures::catalog();
    let state = deployed_state(&catalog, 120, 14);

    let run = || {
        let mut state = state.clone();
        let mut rng = RandomSource::seeded(77);
        rng.set(RollChannel::TargetSelfRemoval, 0.3).unwrap();
        advance_turn(&mut state, &catalog, &mut rng).unwrap()
    };
    assert_eq!(run(), run());
}

#[test]
fn test_campaign_hire_then_undo() {
    let catalog = fixtures::catalog();
    let mut campaign = Campaign::new(fixtures::initial_state(), catalog, RandomSource::seeded(5));
    let hire_cost = campaign.state().rules.agent_hire_cost;
    let money = campaign.state().money;
    let funding = campaign.state().funding;
    let upkeep = campaign.state().rules.agent_upkeep_cost;

    campaign.apply(&PlayerAction::HireAgent).unwrap();
    assert_eq!(campaign.state().pending_hire_cost, hire_cost);

    let report = campaign.advance_turn().unwrap();
    assert_eq!(report.assets.hire_costs, hire_cost);
    // Upkeep covers the new hire as well
    assert_eq!(campaign.state().money, money + funding - 5 * upkeep - hire_cost);
    assert_eq!(campaign.state().agents.len(), 5);
    assert_eq!(
        campaign.state().agent(AgentId(5)).unwrap().state,
        AgentState::Available
    );

    assert!(campaign.undo().unwrap());
    assert!(campaign.undo().unwrap());
    assert_eq!(campaign.state().agents.len(), 4);
    assert_eq!(campaign.state().money, money);
    assert_eq!(campaign.state().panic, Fixed::ZERO);
}
