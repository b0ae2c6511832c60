//! Headless turn runner.
//!
//! Builds a [`Campaign`], plays the scripted actions of each turn and
//! advances, handing a [`TurnSummary`] to the caller after every turn.

use ops_core::campaign::Campaign;
use ops_core::config::GameConfig;
use ops_core::data::Catalog;
use ops_core::random::RandomSource;
use ops_core::state::{make_initial_state, InitialStateOptions};

use crate::scenario::{Scenario, ScenarioError};
use crate::summary::TurnSummary;

/// Headless run configuration.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Turns to advance.
    pub turns: u32,
    /// Seed for the random source.
    pub seed: u64,
    /// Rules and starting settings.
    pub config: GameConfig,
    /// Mission and lead templates.
    pub catalog: Catalog,
    /// Scripted player actions.
    pub scenario: Scenario,
    /// Start from the debug roster.
    pub debug_roster: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            turns: 10,
            seed: 0,
            config: GameConfig::default(),
            catalog: Catalog::default(),
            scenario: Scenario::default(),
            debug_roster: false,
        }
    }
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Summary of every turn, in order.
    pub summaries: Vec<TurnSummary>,
    /// Final campaign.
    pub campaign: Campaign,
}

/// Play `config.turns` turns, calling `on_turn` after each.
pub fn run<F>(config: RunConfig, mut on_turn: F) -> Result<RunOutcome, ScenarioError>
where
    F: FnMut(&TurnSummary),
{
    let RunConfig {
        turns,
        seed,
        config,
        catalog,
        scenario,
        debug_roster,
    } = config;

    let state = make_initial_state(&InitialStateOptions {
        config,
        debug_roster: debug_roster || scenario.debug_roster,
    })?;
    let mut campaign = Campaign::new(state, catalog, RandomSource::seeded(seed));
    tracing::info!(scenario = %scenario.name, seed, turns, "Starting headless run");

    let mut summaries = Vec::with_capacity(turns as usize);
    for _ in 0..turns {
        let turn = campaign.state().turn;
        for scripted in scenario.turn(turn) {
            for &(channel, value) in &scripted.overrides {
                campaign.rng_mut().set(channel, value)?;
            }
            for action in &scripted.actions {
                campaign
                    .apply(action)
                    .map_err(|source| ScenarioError::ActionRejected {
                        turn,
                        action: format!("{action:?}"),
                        source,
                    })?;
            }
        }

        let report = campaign.advance_turn()?;
        let summary = TurnSummary::new(&report, campaign.state());
        on_turn(&summary);
        summaries.push(summary);
    }

    tracing::info!(
        turn = campaign.state().turn,
        state_hash = campaign.state_hash(),
        "Headless run finished"
    );
    Ok(RunOutcome {
        summaries,
        campaign,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ops_core::actions::PlayerAction;
    use ops_core::components::AgentId;

    use crate::scenario::ScriptedTurn;

    #[test]
    fn test_idle_run() {
        let outcome = run(
            RunConfig {
                turns: 3,
                ..RunConfig::default()
            },
            |_| {},
        )
        .unwrap();
        assert_eq!(outcome.summaries.len(), 3);
        assert_eq!(outcome.campaign.state().turn, 4);
        assert_eq!(outcome.summaries[2].turn, 4);
    }

    #[test]
    fn test_same_seed_same_run() {
        let config = RunConfig {
            turns: 8,
            seed: 17,
            debug_roster: true,
            ..RunConfig::default()
        };
        let a = run(config.clone(), |_| {}).unwrap();
        let b = run(config, |_| {}).unwrap();
        assert_eq!(a.summaries, b.summaries);
    }

    #[test]
    fn test_scripted_actions_applied() {
        let scenario = Scenario {
            turns: vec![ScriptedTurn {
                turn: 1,
                actions: vec![PlayerAction::AssignToContracting(vec![AgentId(1), AgentId(2)])],
                overrides: Vec::new(),
            }],
            ..Scenario::default()
        };
        let mut seen = 0;
        let outcome = run(
            RunConfig {
                turns: 2,
                scenario,
                ..RunConfig::default()
            },
            |_| seen += 1,
        )
        .unwrap();
        assert_eq!(seen, 2);
        assert_eq!(outcome.campaign.state().actions_count, 0);
        assert_eq!(outcome.summaries[0].agents_available, 2);
    }

    #[test]
    fn test_rejected_action_reports_turn() {
        let scenario = Scenario {
            turns: vec![ScriptedTurn {
                turn: 2,
                actions: vec![PlayerAction::RecallAgents(vec![AgentId(1)])],
                overrides: Vec::new(),
            }],
            ..Scenario::default()
        };
        let err = run(
            RunConfig {
                turns: 3,
                scenario,
                ..RunConfig::default()
            },
            |_| {},
        )
        .unwrap_err();
        assert!(matches!(err, ScenarioError::ActionRejected { turn: 2, .. }));
    }
}
