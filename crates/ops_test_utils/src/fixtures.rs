//! Test fixtures and helpers.
//!
//! Pre-built agents, enemies and game states for consistent testing.
//! Everything here panics on bad input; fixtures are for tests only.

use ops_core::components::{Actor, Agent, AgentId, AgentState, Assignment, EnemyId, Weapon};
use ops_core::config::{GameConfig, Rules};
use ops_core::data::Catalog;
use ops_core::enemies::{Enemy, EnemyKind};
use ops_core::math::Fixed;
use ops_core::random::{RandomSource, RollChannel};
use ops_core::state::{make_initial_state, GameState, InitialStateOptions};

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i64) -> Fixed {
    Fixed::from_int(n)
}

/// Create a fixed-point number from a decimal literal such as `"0.0120"`.
///
/// # Panics
///
/// Panics if the literal does not parse or exceeds the fixed-point precision.
#[must_use]
pub fn fixed_str(literal: &str) -> Fixed {
    literal
        .parse()
        .unwrap_or_else(|e| panic!("bad fixed literal {literal:?}: {e}"))
}

/// An Available agent with the given stats and a fresh actor.
#[must_use]
pub fn agent(id: u32, skill: i64, hit_points: i64, damage: i64) -> Agent {
    let mut agent = Agent::hired(
        AgentId(id),
        1,
        Actor::new(fixed(skill), fixed(hit_points), Weapon::new(damage)),
    );
    agent.reassign(AgentState::Available, Assignment::Standby);
    agent
}

/// An enemy with custom stats, keeping the kind only as a label.
#[must_use]
pub fn enemy(id: u32, skill: i64, hit_points: i64, damage: i64) -> Enemy {
    let mut enemy = Enemy::new(EnemyId(id), EnemyKind::Initiate);
    enemy.actor = Actor::new(fixed(skill), fixed(hit_points), Weapon::new(damage));
    enemy
}

/// Parse a [`Rules`] override from RON. Unlisted fields keep their defaults.
///
/// # Panics
///
/// Panics if the RON does not parse.
#[must_use]
pub fn rules_from_ron(text: &str) -> Rules {
    ron::from_str(text).unwrap_or_else(|e| panic!("bad rules RON: {e}"))
}

/// A default initial state.
///
/// # Panics
///
/// Panics if the default configuration stops validating.
#[must_use]
pub fn initial_state() -> GameState {
    state_with_config(GameConfig::default())
}

/// An initial state built from `config`.
///
/// # Panics
///
/// Panics if `config` is rejected.
#[must_use]
pub fn state_with_config(config: GameConfig) -> GameState {
    make_initial_state(&InitialStateOptions {
        config,
        debug_roster: false,
    })
    .unwrap_or_else(|e| panic!("initial state rejected: {e}"))
}

/// The debug roster: agents in every state, sites and an investigation.
///
/// # Panics
///
/// Panics if the debug roster stops validating.
#[must_use]
pub fn debug_state() -> GameState {
    make_initial_state(&InitialStateOptions {
        debug_roster: true,
        ..InitialStateOptions::default()
    })
    .unwrap_or_else(|e| panic!("debug roster rejected: {e}"))
}

/// The built-in catalog.
#[must_use]
pub fn catalog() -> Catalog {
    Catalog::default()
}

/// A seeded random source with one channel forced to `value`.
///
/// # Panics
///
/// Panics if `value` is outside `[0, 1]`.
#[must_use]
pub fn rng_with(seed: u64, channel: RollChannel, value: f64) -> RandomSource {
    let mut rng = RandomSource::seeded(seed);
    rng.set(channel, value)
        .unwrap_or_else(|e| panic!("override rejected: {e}"));
    rng
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_helpers() {
        assert_eq!(fixed(3), Fixed::from_raw(3_000_000));
        assert_eq!(fixed_str("0.0120"), Fixed::from_raw(12_000));
    }

    #[test]
    fn test_agent_fixture_is_available() {
        let agent = agent(7, 120, 40, 14);
        assert!(agent.is_available());
        assert_eq!(agent.actor.hit_points, fixed(40));
        assert_eq!(agent.actor.weapon.max_damage, 21);
    }

    #[test]
    fn test_rules_from_ron_keeps_defaults() {
        let rules = rules_from_ron("(agent_upkeep_cost: 99)");
        assert_eq!(rules.agent_upkeep_cost, 99);
        assert_eq!(rules.agent_hire_cost, Rules::default().agent_hire_cost);
    }

    #[test]
    fn test_states_build() {
        assert_eq!(initial_state().turn, 1);
        assert!(debug_state().agents.len() > initial_state().agents.len());
    }
}
