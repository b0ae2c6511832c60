//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the turn engine produces identical
//! results given identical inputs.
//!
//! # Testing Strategy
//!
//! Two campaigns built from the same state, catalog and seed must stay
//! identical turn after turn. Sources of non-determinism include:
//!
//! - **Floating-point math**: simulation quantities use [`ops_core::math::Fixed`];
//!   the only floats are random draws, floored to the fixed scale at once.
//!
//! - **HashMap iteration order**: the state only holds `Vec` and `BTreeMap`.
//!
//! - **Ambient randomness**: every roll comes from an injected
//!   [`ops_core::random::RandomSource`] seeded by the caller.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: individual resolvers (combat, leads, recovery)
//! 2. **Property tests**: random inputs must still produce deterministic outputs
//! 3. **Integration tests**: full campaigns are reproducible turn by turn

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use ops_core::data::Catalog;
use ops_core::random::RandomSource;
use ops_core::state::GameState;
use ops_core::turn::advance_turn;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of turns simulated.
    pub turns: u32,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic engine).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the engine was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Turn engine is non-deterministic!\n\
                 Runs: {}\n\
                 Turns: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.turns,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a setup-and-step process multiple times and compare final hashes.
///
/// # Example
///
/// ```
/// use ops_test_utils::determinism::verify_determinism;
///
/// let result = verify_determinism(3, 100, || 0u64, |n| *n += 1, |n| *n);
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    turns: u32,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();
        for _ in 0..turns {
            step(&mut state);
        }
        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        turns,
    }
}

/// Advance a copy of `state` for `turns` turns and return the final hash.
///
/// A turn that fails stops the run; the hash of the state at that point is
/// returned so failures are compared too.
#[must_use]
pub fn run_turns(state: &GameState, catalog: &Catalog, seed: u64, turns: u32) -> u64 {
    let mut state = state.clone();
    let mut rng = RandomSource::seeded(seed);
    for _ in 0..turns {
        if let Err(error) = advance_turn(&mut state, catalog, &mut rng) {
            tracing::debug!(%error, turn = state.turn, "Run stopped early");
            break;
        }
    }
    state.state_hash()
}

/// Verify that `runs` copies of the same campaign end in the same state.
#[must_use]
pub fn verify_campaign_determinism(
    state: &GameState,
    catalog: &Catalog,
    seed: u64,
    runs: usize,
    turns: u32,
) -> DeterminismResult {
    let hashes: Vec<u64> = (0..runs)
        .map(|_| run_turns(state, catalog, seed, turns))
        .collect();
    DeterminismResult {
        is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
        turns,
    }
}

/// Compare two runs turn by turn, finding the first divergence.
///
/// # Returns
///
/// `None` if the runs match, `Some(n)` if they differ after `n` turns
/// (`0` for differing inputs).
#[must_use]
pub fn find_first_divergence(
    state: &GameState,
    catalog: &Catalog,
    seed: u64,
    turns: u32,
) -> Option<u32> {
    let mut first = state.clone();
    let mut second = state.clone();
    let mut rng1 = RandomSource::seeded(seed);
    let mut rng2 = RandomSource::seeded(seed);

    if first.state_hash() != second.state_hash() {
        return Some(0);
    }

    for turn in 1..=turns {
        let a = advance_turn(&mut first, catalog, &mut rng1);
        let b = advance_turn(&mut second, catalog, &mut rng2);
        if a != b || first.state_hash() != second.state_hash() {
            tracing::debug!(turn, "Runs diverged");
            return Some(turn);
        }
    }

    None
}

/// Verify that a bincode round trip after `turns` turns preserves the state exactly.
#[must_use]
pub fn verify_serialization_determinism(
    state: &GameState,
    catalog: &Catalog,
    seed: u64,
    turns: u32,
) -> bool {
    let mut state = state.clone();
    let mut rng = RandomSource::seeded(seed);
    for _ in 0..turns {
        if advance_turn(&mut state, catalog, &mut rng).is_err() {
            return false;
        }
    }

    let hash_before = state.state_hash();
    let Ok(bytes) = state.serialize() else {
        return false;
    };
    let Ok(restored) = GameState::deserialize(&bytes) else {
        return false;
    };
    restored == state && restored.state_hash() == hash_before
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for engine inputs.
pub mod strategies {
    use ops_core::components::{Actor, Weapon};
    use ops_core::math::Fixed;
    use proptest::prelude::*;

    /// Any fixed-point value within ±1e9 whole units.
    pub fn arb_fixed() -> impl Strategy<Value = Fixed> {
        (-1_000_000_000_000_000i64..1_000_000_000_000_000i64).prop_map(Fixed::from_raw)
    }

    /// A non-negative skill value (0 to 500).
    pub fn arb_skill() -> impl Strategy<Value = Fixed> {
        (0i64..=500_000_000).prop_map(Fixed::from_raw)
    }

    /// Maximum hit points (1 to 200 whole units).
    pub fn arb_max_hit_points() -> impl Strategy<Value = i64> {
        1i64..=200
    }

    /// Exhaustion (0 to 150).
    pub fn arb_exhaustion() -> impl Strategy<Value = Fixed> {
        (0i64..=150).prop_map(Fixed::from_int)
    }

    /// Weapon damage (1 to 40).
    pub fn arb_damage() -> impl Strategy<Value = i64> {
        1i64..=40
    }

    /// A valid actor: `0 < hp <= max_hp`, non-negative skill and exhaustion.
    pub fn arb_actor() -> impl Strategy<Value = Actor> {
        (arb_skill(), arb_max_hit_points(), arb_exhaustion(), arb_damage())
            .prop_flat_map(|(skill, max_hp, exhaustion, damage)| {
                (1..=max_hp).prop_map(move |hp| {
                    let mut actor = Actor::new(skill, Fixed::from_int(max_hp), Weapon::new(damage));
                    actor.hit_points = Fixed::from_int(hp);
                    actor.exhaustion = exhaustion;
                    actor
                })
            })
    }

    /// A squad of actors.
    pub fn arb_squad(max_len: usize) -> impl Strategy<Value = Vec<Actor>> {
        proptest::collection::vec(arb_actor(), 1..max_len)
    }
}
