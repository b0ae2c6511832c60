//! A running game: state, catalog, random source and undo history.
//!
//! [`advance_turn`](crate::turn::advance_turn) leaves the state half-updated
//! when a phase fails. [`Campaign`] snapshots the state with bincode before
//! every mutation and puts the snapshot back on error, so callers see either
//! the whole turn or nothing.
//!
//! # Example
//!
//! ```
//! use ops_core::campaign::Campaign;
//! use ops_core::data::Catalog;
//! use ops_core::random::RandomSource;
//! use ops_core::state::{make_initial_state, InitialStateOptions};
//!
//! let state = make_initial_state(&InitialStateOptions::default()).unwrap();
//! let mut campaign = Campaign::new(state, Catalog::default(), RandomSource::seeded(7));
//! let report = campaign.advance_turn().unwrap();
//! assert_eq!(report.turn, 2);
//! campaign.undo().unwrap();
//! assert_eq!(campaign.state().turn, 1);
//! ```

use crate::actions::{apply_action, PlayerAction};
use crate::data::Catalog;
use crate::error::Result;
use crate::random::RandomSource;
use crate::report::TurnReport;
use crate::state::GameState;
use crate::turn::advance_turn;

/// Snapshots kept for undo; the oldest is dropped beyond this.
pub const MAX_UNDO_HISTORY: usize = 64;

/// Owns everything needed to play turns.
#[derive(Debug, Clone)]
pub struct Campaign {
    state: GameState,
    catalog: Catalog,
    rng: RandomSource,
    history: Vec<Vec<u8>>,
}

impl Campaign {
    /// Start a campaign from an existing state.
    pub fn new(state: GameState, catalog: Catalog, rng: RandomSource) -> Self {
        Self {
            state,
            catalog,
            rng,
            history: Vec::new(),
        }
    }

    /// Current state.
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Mission and lead templates.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Random source, e.g. to install overrides.
    pub fn rng_mut(&mut self) -> &mut RandomSource {
        &mut self.rng
    }

    /// Number of snapshots available to [`Campaign::undo`].
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Apply a player action. A rejected action changes nothing.
    pub fn apply(&mut self, action: &PlayerAction) -> Result<()> {
        let snapshot = self.state.serialize()?;
        // apply_action validates before mutating
        apply_action(&mut self.state, &self.catalog, action)?;
        self.push_history(snapshot);
        Ok(())
    }

    /// Advance one turn, restoring the previous state if any phase fails.
    pub fn advance_turn(&mut self) -> Result<TurnReport> {
        let snapshot = self.state.serialize()?;
        match advance_turn(&mut self.state, &self.catalog, &mut self.rng) {
            Ok(report) => {
                self.push_history(snapshot);
                Ok(report)
            }
            Err(error) => {
                tracing::error!(%error, turn = self.state.turn, "Turn failed, restoring snapshot");
                self.state = GameState::deserialize(&snapshot)?;
                Err(error)
            }
        }
    }

    /// Revert the last action or turn. Returns `false` when there is nothing to undo.
    ///
    /// The random source is not rewound.
    pub fn undo(&mut self) -> Result<bool> {
        let Some(snapshot) = self.history.pop() else {
            return Ok(false);
        };
        self.state = GameState::deserialize(&snapshot)?;
        tracing::debug!(turn = self.state.turn, "Undo");
        Ok(true)
    }

    /// Hash of the current state.
    pub fn state_hash(&self) -> u64 {
        self.state.state_hash()
    }

    /// Give up ownership of the state.
    pub fn into_state(self) -> GameState {
        self.state
    }

    fn push_history(&mut self, snapshot: Vec<u8>) {
        if self.history.len() == MAX_UNDO_HISTORY {
            self.history.remove(0);
        }
        self.history.push(snapshot);
    }
}
