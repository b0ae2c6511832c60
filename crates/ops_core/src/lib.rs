//! # Ops Core
//!
//! Deterministic turn engine for a covert-operations strategy game: the
//! player runs a roster of agents against hostile factions, and one call to
//! [`turn::advance_turn`] computes everything that happens between turns.
//!
//! This crate contains **only** game logic:
//! - No rendering
//! - No IO beyond (de)serializing in-memory values
//! - No ambient randomness (an injected [`random::RandomSource`])
//! - No floating-point simulation quantities (uses [`math::Fixed`])
//!
//! ## Crate Structure
//!
//! - [`components`] - Agents, actors, states and assignments
//! - [`combat`] - Contest rolls, battles and retreat
//! - [`missions`], [`leads`], [`agents`] - Per-turn resolvers
//! - [`turn`] - The turn orchestrator
//! - [`actions`] - Player actions between turns
//! - [`campaign`] - Snapshots and undo around the engine
//! - [`data`], [`enemies`], [`config`] - Static reference data and tunables

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod actions;
pub mod agents;
pub mod campaign;
pub mod combat;
pub mod components;
pub mod config;
pub mod data;
pub mod economy;
pub mod enemies;
pub mod error;
pub mod factions;
pub mod leads;
pub mod math;
pub mod missions;
pub mod random;
pub mod report;
pub mod skill;
pub mod state;
pub mod targeting;
pub mod turn;
pub mod validation;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::actions::{apply_action, PlayerAction};
    pub use crate::campaign::Campaign;
    pub use crate::combat::{resolve_battle, BattleReport};
    pub use crate::components::*;
    pub use crate::config::{GameConfig, Rules, StartSettings};
    pub use crate::data::{Catalog, LeadData, MissionData, MissionRewards};
    pub use crate::enemies::{parse_enemy_roster, Enemy, EnemyKind};
    pub use crate::error::{GameError, Result};
    pub use crate::factions::{Faction, FactionId};
    pub use crate::leads::{LeadInvestigation, LeadInvestigationState};
    pub use crate::math::Fixed;
    pub use crate::missions::{MissionSite, MissionSiteState};
    pub use crate::random::{RandomSource, RollChannel};
    pub use crate::report::{TurnReport, ValueChange};
    pub use crate::skill::effective_skill;
    pub use crate::state::{make_initial_state, GameState, InitialStateOptions};
    pub use crate::turn::advance_turn;
    pub use crate::validation::validate_invariants;
}
