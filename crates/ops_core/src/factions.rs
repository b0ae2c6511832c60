//! Hostile factions and their threat dynamics.
//!
//! Every turn each faction's threat grows by its `threat_increase` and its
//! suppression decays proportionally. Panic grows by whatever threat is not
//! held back by suppression.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::math::Fixed;

/// Faction identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FactionId {
    /// Militant revolutionary cells.
    RedDawn,
    /// Corporate-backed technocrats.
    Exalt,
    /// Smuggling syndicate.
    BlackLotus,
}

impl FactionId {
    /// All factions.
    pub const ALL: [Self; 3] = [Self::RedDawn, Self::Exalt, Self::BlackLotus];

    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::RedDawn => "Red Dawn",
            Self::Exalt => "Exalt",
            Self::BlackLotus => "Black Lotus",
        }
    }
}

impl fmt::Display for FactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Runtime state of a hostile faction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Faction {
    /// Which faction.
    pub id: FactionId,
    /// Current threat level.
    pub threat_level: Fixed,
    /// Threat added every turn.
    pub threat_increase: Fixed,
    /// Threat currently held back by player operations.
    pub suppression: Fixed,
    /// Lead ids that must all be completed before the faction is known.
    #[serde(default)]
    pub discovery_prerequisite: Vec<String>,
}

impl Faction {
    /// Create a faction with no suppression.
    #[must_use]
    pub fn new(id: FactionId, threat_level: Fixed, threat_increase: Fixed) -> Self {
        Self {
            id,
            threat_level,
            threat_increase,
            suppression: Fixed::ZERO,
            discovery_prerequisite: Vec::new(),
        }
    }

    /// Panic added by this faction in one turn: `max(0, threat - suppression)`.
    #[must_use]
    pub fn panic_contribution(&self) -> Fixed {
        (self.threat_level - self.suppression).non_negative()
    }

    /// Whether every prerequisite lead has been completed at least once.
    #[must_use]
    pub fn is_discovered(&self, lead_counts: &BTreeMap<String, u32>) -> bool {
        self.discovery_prerequisite
            .iter()
            .all(|lead| lead_counts.get(lead).copied().unwrap_or(0) > 0)
    }

    /// Per-turn drift: threat grows, suppression decays.
    ///
    /// Suppression becomes `floor(suppression × (1 - decay))` so that it
    /// reaches exactly zero in finitely many turns.
    pub fn advance(&mut self, suppression_decay: Fixed) {
        self.threat_level += self.threat_increase;
        let retained = (Fixed::ONE - suppression_decay).non_negative();
        self.suppression = (self.suppression * retained).non_negative();
    }

    /// Apply a mission reward against this faction.
    pub fn apply_reward(&mut self, threat_reduction: Fixed, suppression: Fixed) {
        self.threat_level = (self.threat_level - threat_reduction).non_negative();
        self.suppression += suppression;
    }
}

/// Factions a new game starts with.
#[must_use]
pub fn default_factions() -> Vec<Faction> {
    let faction = |id, threat: i64, increase: i64, prerequisite: &str| Faction {
        discovery_prerequisite: vec![prerequisite.to_string()],
        ..Faction::new(id, Fixed::from_raw(threat), Fixed::from_raw(increase))
    };
    vec![
        faction(FactionId::RedDawn, 10_000, 1_000, "red-dawn-member"),
        faction(FactionId::Exalt, 8_000, 1_200, "exalt-member"),
        faction(FactionId::BlackLotus, 6_000, 800, "black-lotus-member"),
    ]
}
