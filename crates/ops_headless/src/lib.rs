//! Headless campaign runner for CI and balance checks.
//!
//! Plays a campaign without any interface: scripted player actions come from
//! a RON scenario, turn summaries go to stdout as JSON lines, and logs go to
//! stderr.
//!
//! # Example
//!
//! ```bash
//! # Twenty idle turns
//! cargo run -p ops_headless -- run --turns 20 --seed 7
//!
//! # A scripted scenario on the debug roster
//! cargo run -p ops_headless -- run --scenario crates/ops_headless/scenarios/red_dawn_sweep.ron
//!
//! # Check a data file before shipping it
//! cargo run -p ops_headless -- validate --catalog crates/ops_headless/data/catalog.ron
//! ```

pub mod runner;
pub mod scenario;
pub mod summary;

pub use runner::{run, RunConfig, RunOutcome};
pub use scenario::{Scenario, ScenarioError, ScriptedTurn};
pub use summary::{FactionSummary, MissionSummary, TurnSummary};
