//! Lead template definitions.

use serde::{Deserialize, Serialize};

use crate::math::Fixed;

/// Static definition of a lead.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeadData {
    /// Unique string identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Intel needed for a guaranteed completion. Zero completes on the first roll.
    pub difficulty: i64,
    /// Leads that must be completed before this one is discovered.
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// Whether the lead can be investigated again after completion.
    #[serde(default)]
    pub repeatable: bool,
}

impl LeadData {
    /// Completion chance for the given intel: `min(1, intel / difficulty)`.
    #[must_use]
    pub fn success_chance(&self, intel: i64) -> Fixed {
        if self.difficulty <= 0 {
            return Fixed::ONE;
        }
        Fixed::from_ratio(intel.max(0), self.difficulty)
            .map_or(Fixed::ONE, |chance| chance.min(Fixed::ONE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lead(difficulty: i64) -> LeadData {
        LeadData {
            id: "lead".to_string(),
            name: "Lead".to_string(),
            difficulty,
            depends_on: Vec::new(),
            repeatable: false,
        }
    }

    #[test]
    fn test_success_chance() {
        assert_eq!(lead(100).success_chance(50), "0.5".parse().unwrap());
        assert_eq!(lead(100).success_chance(250), Fixed::ONE);
        assert_eq!(lead(100).success_chance(0), Fixed::ZERO);
        assert_eq!(lead(0).success_chance(0), Fixed::ONE);
        // 1/3 floors
        assert_eq!(lead(3).success_chance(1), Fixed::from_raw(333_333));
    }
}
