//! Overridable random source.
//!
//! Every random draw in the engine names a [`RollChannel`]. In normal play
//! the draw comes from a ChaCha generator; tests (and replays of a specific
//! outcome) register a fixed value per channel instead.

use std::collections::BTreeMap;
use std::fmt;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::math::Fixed;

/// Largest `f64` strictly below 1.0.
pub const JUST_BELOW_ONE: f64 = 1.0 - f64::EPSILON / 2.0;

/// Named source of randomness inside the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RollChannel {
    /// Attacker-vs-defender contest roll.
    ContestRoll,
    /// Weapon damage within `[min, max]`.
    DamageRoll,
    /// Damaged target dropping out of consideration for one selection.
    TargetSelfRemoval,
    /// Uniform pick among least-attacked targets.
    TargetFallback,
    /// Lead investigation completion.
    LeadInvestigation,
}

impl RollChannel {
    /// All channels, for bulk overrides.
    pub const ALL: [Self; 5] = [
        Self::ContestRoll,
        Self::DamageRoll,
        Self::TargetSelfRemoval,
        Self::TargetFallback,
        Self::LeadInvestigation,
    ];

    /// Stable name used in logs and error messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ContestRoll => "contest_roll",
            Self::DamageRoll => "damage_roll",
            Self::TargetSelfRemoval => "target_self_removal",
            Self::TargetFallback => "target_fallback",
            Self::LeadInvestigation => "lead_investigation",
        }
    }
}

impl fmt::Display for RollChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Random value provider with per-channel overrides.
#[derive(Debug, Clone)]
pub struct RandomSource {
    rng: ChaCha8Rng,
    overrides: BTreeMap<RollChannel, f64>,
}

impl RandomSource {
    /// Provider seeded from operating-system entropy.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
            overrides: BTreeMap::new(),
        }
    }

    /// Provider with a reproducible stream.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            overrides: BTreeMap::new(),
        }
    }

    /// Draw a value in `[0, 1)` for `channel`.
    pub fn get(&mut self, channel: RollChannel) -> f64 {
        match self.overrides.get(&channel) {
            Some(&value) => value.min(JUST_BELOW_ONE),
            None => self.rng.gen::<f64>(),
        }
    }

    /// Draw a value for `channel`, floored to the fixed-point scale.
    pub fn get_fixed(&mut self, channel: RollChannel) -> Fixed {
        Fixed::from_f64_floor(self.get(channel))
    }

    /// Draw an index in `0..len` for `channel`. `len` must be non-zero.
    pub fn index(&mut self, channel: RollChannel, len: usize) -> usize {
        let roll = self.get(channel);
        ((roll * len as f64) as usize).min(len.saturating_sub(1))
    }

    /// Draw a whole number uniformly in `[min, max]` for `channel`.
    pub fn int_inclusive(&mut self, channel: RollChannel, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let span = (max - min + 1) as f64;
        let offset = (self.get(channel) * span) as i64;
        (min + offset).min(max)
    }

    /// Register a fixed value for `channel`. `value` must lie in `[0, 1]`.
    pub fn set(&mut self, channel: RollChannel, value: f64) -> Result<()> {
        if !(0.0..=1.0).contains(&value) {
            return Err(GameError::InvalidRandomOverride {
                channel: channel.to_string(),
                value: value.to_string(),
            });
        }
        self.overrides.insert(channel, value);
        Ok(())
    }

    /// Register the same fixed value on every channel.
    pub fn set_all(&mut self, value: f64) -> Result<()> {
        for channel in RollChannel::ALL {
            self.set(channel, value)?;
        }
        Ok(())
    }

    /// Remove the override for one channel.
    pub fn clear(&mut self, channel: RollChannel) {
        self.overrides.remove(&channel);
    }

    /// Remove every override.
    pub fn reset(&mut self) {
        self.overrides.clear();
    }

    /// Currently registered override for `channel`, if any.
    #[must_use]
    pub fn override_for(&self, channel: RollChannel) -> Option<f64> {
        self.overrides.get(&channel).copied()
    }
}

impl Default for RandomSource {
    fn default() -> Self {
        Self::from_entropy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_returned() {
        let mut rng = RandomSource::seeded(1);
        rng.set(RollChannel::ContestRoll, 0.25).unwrap();
        assert_eq!(rng.get(RollChannel::ContestRoll), 0.25);
        assert_eq!(rng.get(RollChannel::ContestRoll), 0.25);
    }

    #[test]
    fn test_one_clamped_below_one() {
        let mut rng = RandomSource::seeded(1);
        rng.set(RollChannel::DamageRoll, 1.0).unwrap();
        let value = rng.get(RollChannel::DamageRoll);
        assert!(value < 1.0);
        assert!(value > 0.999_999);
    }

    #[test]
    fn test_out_of_range_override_rejected() {
        let mut rng = RandomSource::seeded(1);
        assert!(rng.set(RollChannel::ContestRoll, 1.5).is_err());
        assert!(rng.set(RollChannel::ContestRoll, -0.1).is_err());
        assert!(rng.set(RollChannel::ContestRoll, f64::NAN).is_err());
    }

    #[test]
    fn test_reset_restores_randomness() {
        let mut rng = RandomSource::seeded(7);
        rng.set_all(0.5).unwrap();
        rng.reset();
        assert!(rng.override_for(RollChannel::LeadInvestigation).is_none());
        let value = rng.get(RollChannel::LeadInvestigation);
        assert!((0.0..1.0).contains(&value));
    }

    #[test]
    fn test_seeded_streams_match() {
        let mut a = RandomSource::seeded(42);
        let mut b = RandomSource::seeded(42);
        for _ in 0..16 {
            assert_eq!(a.get(RollChannel::ContestRoll), b.get(RollChannel::ContestRoll));
        }
    }

    #[test]
    fn test_int_inclusive_bounds() {
        let mut rng = RandomSource::seeded(3);
        rng.set(RollChannel::DamageRoll, 0.0).unwrap();
        assert_eq!(rng.int_inclusive(RollChannel::DamageRoll, 5, 15), 5);
        rng.set(RollChannel::DamageRoll, 1.0).unwrap();
        assert_eq!(rng.int_inclusive(RollChannel::DamageRoll, 5, 15), 15);
        assert_eq!(rng.int_inclusive(RollChannel::DamageRoll, 4, 4), 4);
    }

    #[test]
    fn test_index_bounds() {
        let mut rng = RandomSource::seeded(3);
        rng.set(RollChannel::TargetFallback, 1.0).unwrap();
        assert_eq!(rng.index(RollChannel::TargetFallback, 3), 2);
        rng.set(RollChannel::TargetFallback, 0.0).unwrap();
        assert_eq!(rng.index(RollChannel::TargetFallback, 3), 0);
    }
}
