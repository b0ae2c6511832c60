//! Tunable rules and starting settings.
//!
//! Configuration is plain data loaded from RON. Every field has a default so
//! a config file only needs to list what it changes. Fixed-point fields are
//! written as raw scaled integers (`1000000` = 1.0), matching how they are
//! serialized everywhere else.
//!
//! # Example RON
//!
//! ```ron
//! GameConfig(
//!     rules: (
//!         agent_upkeep_cost: 12,
//!         suppression_decay: 150000, // 15% per turn
//!     ),
//!     start: (
//!         money: 1000,
//!     ),
//! )
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::factions::{default_factions, Faction};
use crate::math::Fixed;

/// Per-turn rules consulted by the turn engine.
///
/// A copy lives on every [`crate::state::GameState`] so that a state carries
/// the rules it was created under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Rules {
    /// Money paid per non-terminated agent per turn.
    pub agent_upkeep_cost: i64,
    /// Money charged per hired agent.
    pub agent_hire_cost: i64,
    /// Starting skill of a hired agent.
    pub agent_initial_skill: Fixed,
    /// Starting hit points of a hired agent.
    pub agent_initial_hit_points: Fixed,
    /// Base weapon damage of a hired agent.
    pub agent_weapon_damage: i64,

    /// Money per turn from a contracting agent at effective skill 100.
    pub contracting_income: i64,
    /// Intel per turn from an espionage agent at effective skill 100.
    pub espionage_intel: i64,
    /// Intel per turn added to a lead by an investigating agent at effective skill 100.
    pub lead_intel_per_agent: i64,

    /// Exhaustion gained per turn of contracting.
    pub contracting_exhaustion: Fixed,
    /// Exhaustion gained per turn of espionage.
    pub espionage_exhaustion: Fixed,
    /// Exhaustion gained per turn of lead investigation.
    pub investigation_exhaustion: Fixed,
    /// Exhaustion gained per turn of training.
    pub training_exhaustion: Fixed,

    /// Skill reward for a successful attack.
    pub successful_attack_skill_reward: Fixed,
    /// Skill reward for a failed attack.
    pub failed_attack_skill_reward: Fixed,
    /// Skill reward for a successful defense.
    pub successful_defense_skill_reward: Fixed,
    /// Skill reward for a failed defense.
    pub failed_defense_skill_reward: Fixed,

    /// Proportional intel decay per point of accumulated intel.
    pub intel_decay_per_intel: Fixed,
    /// Upper bound on the proportional intel decay.
    pub intel_decay_cap: Fixed,

    /// Fraction of suppression lost each turn.
    pub suppression_decay: Fixed,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            agent_upkeep_cost: 10,
            agent_hire_cost: 50,
            agent_initial_skill: Fixed::from_int(100),
            agent_initial_hit_points: Fixed::from_int(30),
            agent_weapon_damage: 10,

            contracting_income: 30,
            espionage_intel: 5,
            lead_intel_per_agent: 10,

            contracting_exhaustion: Fixed::ONE,
            espionage_exhaustion: Fixed::ONE,
            investigation_exhaustion: Fixed::ONE,
            training_exhaustion: Fixed::ONE,

            successful_attack_skill_reward: Fixed::ONE,
            failed_attack_skill_reward: Fixed::from_raw(200_000),
            successful_defense_skill_reward: Fixed::from_raw(500_000),
            failed_defense_skill_reward: Fixed::from_raw(200_000),

            intel_decay_per_intel: Fixed::from_raw(500),
            intel_decay_cap: Fixed::from_raw(200_000),

            suppression_decay: Fixed::from_raw(100_000),
        }
    }
}

/// Values a new game starts with.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct StartSettings {
    /// Starting money.
    pub money: i64,
    /// Starting intel.
    pub intel: i64,
    /// Money granted every turn.
    pub funding: i64,
    /// Starting panic.
    pub panic: Fixed,
    /// Agents on the roster at turn 1.
    pub agent_count: u32,
    /// Maximum non-terminated agents.
    pub agent_cap: usize,
    /// Maximum agents deployed to one mission site.
    pub transport_cap: usize,
    /// Maximum agents in training at once.
    pub training_cap: usize,
    /// Skill gained per turn of training.
    pub training_skill_gain: Fixed,
    /// Exhaustion removed per turn from resting agents.
    pub exhaustion_recovery: Fixed,
    /// Percent of maximum hit points restored per recovery turn.
    pub hit_points_recovery_pct: Fixed,
    /// Hostile factions at turn 1.
    pub factions: Vec<Faction>,
}

impl Default for StartSettings {
    fn default() -> Self {
        Self {
            money: 500,
            intel: 0,
            funding: 20,
            panic: Fixed::ZERO,
            agent_count: 4,
            agent_cap: 20,
            transport_cap: 4,
            training_cap: 2,
            training_skill_gain: Fixed::ONE,
            exhaustion_recovery: Fixed::from_int(2),
            hit_points_recovery_pct: Fixed::from_int(2),
            factions: default_factions(),
        }
    }
}

/// Complete configuration: rules plus starting settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Per-turn rules.
    pub rules: Rules,
    /// Starting settings.
    pub start: StartSettings,
}

impl GameConfig {
    /// Load a configuration from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| GameError::DataParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::parse(&contents, &path.display().to_string())
    }

    /// Load a configuration from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        Self::parse(ron, "<inline>")
    }

    fn parse(ron: &str, origin: &str) -> Result<Self> {
        let config: Self = ron::from_str(ron).map_err(|e| GameError::DataParseError {
            path: origin.to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        let invalid = |field: &str, reason: &str| GameError::DataParseError {
            path: "<config>".to_string(),
            message: format!("{field}: {reason}"),
        };
        if !self.start.hit_points_recovery_pct.is_positive() {
            return Err(invalid("hit_points_recovery_pct", "must be positive"));
        }
        if !self.rules.agent_initial_hit_points.is_positive() {
            return Err(invalid("agent_initial_hit_points", "must be positive"));
        }
        if self.rules.agent_initial_skill.is_negative() {
            return Err(invalid("agent_initial_skill", "must not be negative"));
        }
        if self.rules.suppression_decay.is_negative() || self.rules.suppression_decay > Fixed::ONE {
            return Err(invalid("suppression_decay", "must be within [0, 1]"));
        }
        if self.rules.intel_decay_cap.is_negative() || self.rules.intel_decay_cap > Fixed::ONE {
            return Err(invalid("intel_decay_cap", "must be within [0, 1]"));
        }
        if self.start.agent_count as usize > self.start.agent_cap {
            return Err(invalid("agent_count", "exceeds agent_cap"));
        }
        if self.start.transport_cap == 0 {
            return Err(invalid("transport_cap", "must be positive"));
        }
        if self.start.factions.iter().any(|f| {
            f.threat_level.is_negative() || f.threat_increase.is_negative() || f.suppression.is_negative()
        }) {
            return Err(invalid("factions", "threat and suppression must not be negative"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(GameConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_ron_overrides() {
        let config = GameConfig::from_ron_str(
            "(rules: (agent_upkeep_cost: 12, suppression_decay: 150000), start: (money: 1000))",
        )
        .unwrap();
        assert_eq!(config.rules.agent_upkeep_cost, 12);
        assert_eq!(config.rules.suppression_decay, Fixed::from_raw(150_000));
        assert_eq!(config.start.money, 1000);
        // Untouched fields keep defaults
        assert_eq!(config.rules.agent_hire_cost, Rules::default().agent_hire_cost);
        assert_eq!(config.start.funding, StartSettings::default().funding);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = GameConfig::from_ron_str("(start: (hit_points_recovery_pct: 0))").unwrap_err();
        assert!(matches!(err, GameError::DataParseError { .. }));
        assert!(GameConfig::from_ron_str("(rules: (suppression_decay: 2000000))").is_err());
        assert!(GameConfig::from_ron_str("(start: (agent_count: 5, agent_cap: 2))").is_err());
    }

    #[test]
    fn test_parse_error_reported() {
        assert!(matches!(
            GameConfig::from_ron_str("(rules: oops"),
            Err(GameError::DataParseError { .. })
        ));
    }
}
