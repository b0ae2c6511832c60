//! Scenario loading.
//!
//! A scenario scripts the player: which actions to take on which turn, and
//! optionally which random channels to force. Anything not listed is left to
//! the seeded random source.

use std::path::Path;

use ops_core::actions::PlayerAction;
use ops_core::components::Turn;
use ops_core::error::GameError;
use ops_core::random::RollChannel;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// A scripted action was rejected by the engine.
    #[error("Turn {turn}: action {action} rejected: {source}")]
    ActionRejected {
        /// Turn the action was scheduled for.
        turn: Turn,
        /// The action, debug-formatted.
        action: String,
        /// Engine error.
        source: GameError,
    },
    /// Engine failure outside a scripted action.
    #[error(transparent)]
    Game(#[from] GameError),
}

/// Actions and overrides for one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedTurn {
    /// Turn on which the actions are taken, before it advances.
    pub turn: Turn,
    /// Actions in order.
    #[serde(default)]
    pub actions: Vec<PlayerAction>,
    /// Random channels forced from this turn on.
    #[serde(default)]
    pub overrides: Vec<(RollChannel, f64)>,
}

/// A complete scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Seed used when the command line gives none.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Start from the debug roster instead of a fresh roster.
    #[serde(default)]
    pub debug_roster: bool,
    /// Scripted turns, in any order.
    #[serde(default)]
    pub turns: Vec<ScriptedTurn>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            name: "Idle".to_string(),
            description: "No player actions".to_string(),
            seed: None,
            debug_roster: false,
            turns: Vec::new(),
        }
    }
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        Ok(scenario)
    }

    /// Scripted entries for `turn`.
    pub fn turn(&self, turn: Turn) -> impl Iterator<Item = &ScriptedTurn> {
        self.turns.iter().filter(move |t| t.turn == turn)
    }

    /// Last turn with a scripted entry.
    #[must_use]
    pub fn last_scripted_turn(&self) -> Option<Turn> {
        self.turns.iter().map(|t| t.turn).max()
    }
}
