//! Mission template definitions.

use serde::{Deserialize, Serialize};

use crate::factions::FactionId;
use crate::math::Fixed;

/// Reward applied against one faction when a mission succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FactionReward {
    /// Target faction.
    pub faction: FactionId,
    /// Threat removed (threat never drops below zero).
    #[serde(default)]
    pub threat_reduction: Fixed,
    /// Suppression added.
    #[serde(default)]
    pub suppression: Fixed,
}

/// Rewards for a successful mission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct MissionRewards {
    /// Money granted.
    pub money: i64,
    /// Intel granted.
    pub intel: i64,
    /// Permanent change to per-turn funding.
    pub funding: i64,
    /// Panic removed.
    pub panic_reduction: Fixed,
    /// Faction-specific rewards.
    pub factions: Vec<FactionReward>,
}

/// Static definition of a mission.
///
/// # Example RON
///
/// ```ron
/// MissionData(
///     id: "raid-red-dawn-safehouse",
///     name: "Raid Red Dawn safehouse",
///     faction: RedDawn,
///     depends_on: ["red-dawn-safehouse"],
///     expires_in: Some(5),
///     enemies: "4 Initiate, 2 Operative, 1 Handler",
///     rewards: (
///         money: 150,
///         intel: 30,
///         panic_reduction: 2000,
///         factions: [(faction: RedDawn, threat_reduction: 2000, suppression: 5000)],
///     ),
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MissionData {
    /// Unique string identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Faction the mission targets.
    pub faction: FactionId,
    /// Leads whose completion spawns a site for this mission.
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// Turns before an undeployed site expires. `None` never expires.
    #[serde(default)]
    pub expires_in: Option<u32>,
    /// Enemy composition, e.g. `"3 Initiate, 1 Handler"`.
    pub enemies: String,
    /// Rewards on success.
    #[serde(default)]
    pub rewards: MissionRewards,
}

impl MissionData {
    /// Whether completing `lead_id` spawns this mission.
    #[must_use]
    pub fn unlocked_by(&self, lead_id: &str) -> bool {
        self.depends_on.iter().any(|lead| lead == lead_id)
    }
}
