//! Static reference data: mission and lead templates.
//!
//! The [`Catalog`] is a read-only lookup service for the turn engine. It can
//! be loaded from RON or taken from the built-in default.
//!
//! **Note:** [`Catalog::load`] and [`crate::config::GameConfig::load`] are the
//! only file IO in this crate.

mod lead_data;
mod mission_data;

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub use lead_data::LeadData;
pub use mission_data::{FactionReward, MissionData, MissionRewards};

use crate::enemies::parse_enemy_roster;
use crate::error::{GameError, Result};
use crate::factions::FactionId;
use crate::math::Fixed;

/// Mission and lead templates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Catalog {
    /// Mission templates.
    #[serde(default)]
    pub missions: Vec<MissionData>,
    /// Lead templates.
    #[serde(default)]
    pub leads: Vec<LeadData>,
}

impl Catalog {
    /// Load a catalog from a RON file and validate it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let origin = path.display().to_string();
        let contents = std::fs::read_to_string(path).map_err(|e| GameError::DataParseError {
            path: origin.clone(),
            message: e.to_string(),
        })?;
        Self::parse(&contents, &origin)
    }

    /// Parse a catalog from a RON string and validate it.
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        Self::parse(ron, "<inline>")
    }

    fn parse(ron: &str, origin: &str) -> Result<Self> {
        let catalog: Self = ron::from_str(ron).map_err(|e| GameError::DataParseError {
            path: origin.to_string(),
            message: e.to_string(),
        })?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Look up a mission template.
    pub fn mission(&self, id: &str) -> Result<&MissionData> {
        self.missions
            .iter()
            .find(|m| m.id == id)
            .ok_or_else(|| GameError::UnknownMission(id.to_string()))
    }

    /// Look up a lead template.
    pub fn lead(&self, id: &str) -> Result<&LeadData> {
        self.leads
            .iter()
            .find(|l| l.id == id)
            .ok_or_else(|| GameError::UnknownLead(id.to_string()))
    }

    /// Missions spawned when `lead_id` completes, in catalog order.
    pub fn missions_unlocked_by<'a>(
        &'a self,
        lead_id: &'a str,
    ) -> impl Iterator<Item = &'a MissionData> + 'a {
        self.missions.iter().filter(move |m| m.unlocked_by(lead_id))
    }

    /// Check for duplicate ids, dangling references and unparsable rosters.
    pub fn validate(&self) -> Result<()> {
        let mut lead_ids = BTreeSet::new();
        for lead in &self.leads {
            if !lead_ids.insert(lead.id.as_str()) {
                return Err(invalid(format!("duplicate lead id '{}'", lead.id)));
            }
            if lead.difficulty < 0 {
                return Err(invalid(format!("lead '{}' has negative difficulty", lead.id)));
            }
        }
        for lead in &self.leads {
            for dependency in &lead.depends_on {
                if !lead_ids.contains(dependency.as_str()) {
                    return Err(GameError::UnknownLead(format!(
                        "{dependency} (required by lead '{}')",
                        lead.id
                    )));
                }
            }
        }

        let mut mission_ids = BTreeSet::new();
        for mission in &self.missions {
            if !mission_ids.insert(mission.id.as_str()) {
                return Err(invalid(format!("duplicate mission id '{}'", mission.id)));
            }
            for dependency in &mission.depends_on {
                if !lead_ids.contains(dependency.as_str()) {
                    return Err(GameError::UnknownLead(format!(
                        "{dependency} (required by mission '{}')",
                        mission.id
                    )));
                }
            }
            parse_enemy_roster(&mission.enemies)?;
        }
        Ok(())
    }
}

fn invalid(message: String) -> GameError {
    GameError::DataParseError {
        path: "<catalog>".to_string(),
        message,
    }
}

fn lead(id: &str, name: &str, difficulty: i64, depends_on: &[&str], repeatable: bool) -> LeadData {
    LeadData {
        id: id.to_string(),
        name: name.to_string(),
        difficulty,
        depends_on: depends_on.iter().map(ToString::to_string).collect(),
        repeatable,
    }
}

#[allow(clippy::too_many_arguments)]
fn mission(
    id: &str,
    name: &str,
    faction: FactionId,
    lead: &str,
    expires_in: Option<u32>,
    enemies: &str,
    (money, intel, funding): (i64, i64, i64),
    (panic_reduction, threat_reduction, suppression): (i64, i64, i64),
) -> MissionData {
    MissionData {
        id: id.to_string(),
        name: name.to_string(),
        faction,
        depends_on: vec![lead.to_string()],
        expires_in,
        enemies: enemies.to_string(),
        rewards: MissionRewards {
            money,
            intel,
            funding,
            panic_reduction: Fixed::from_raw(panic_reduction),
            factions: vec![FactionReward {
                faction,
                threat_reduction: Fixed::from_raw(threat_reduction),
                suppression: Fixed::from_raw(suppression),
            }],
        },
    }
}

impl Default for Catalog {
    /// The built-in campaign.
    fn default() -> Self {
        use FactionId::{BlackLotus, Exalt, RedDawn};

        let leads = vec![
            lead("criminal-orgs", "Criminal organizations", 0, &[], false),
            lead("red-dawn-member", "Locate Red Dawn member", 50, &["criminal-orgs"], true),
            lead("red-dawn-safehouse", "Trace Red Dawn safehouse", 120, &["red-dawn-member"], true),
            lead("red-dawn-hq", "Find Red Dawn headquarters", 300, &["red-dawn-safehouse"], false),
            lead("exalt-member", "Locate Exalt member", 60, &["criminal-orgs"], true),
            lead("exalt-hq", "Find Exalt headquarters", 350, &["exalt-member"], false),
            lead("black-lotus-member", "Locate Black Lotus member", 70, &["criminal-orgs"], true),
        ];

        let missions = vec![
            mission(
                "apprehend-red-dawn-member",
                "Apprehend Red Dawn member",
                RedDawn,
                "red-dawn-member",
                Some(3),
                "2 Initiate, 1 Operative",
                (50, 10, 0),
                (500, 1_000, 2_000),
            ),
            mission(
                "raid-red-dawn-safehouse",
                "Raid Red Dawn safehouse",
                RedDawn,
                "red-dawn-safehouse",
                Some(5),
                "4 Initiate, 2 Operative, 1 Handler",
                (150, 30, 5),
                (2_000, 2_000, 5_000),
            ),
            mission(
                "raid-red-dawn-hq",
                "Raid Red Dawn headquarters",
                RedDawn,
                "red-dawn-hq",
                None,
                "4 Soldier, 2 Elite, 1 Lieutenant, 1 Commander, 1 CultLeader",
                (1_000, 100, 20),
                (10_000, 10_000, 20_000),
            ),
            mission(
                "apprehend-exalt-member",
                "Apprehend Exalt member",
                Exalt,
                "exalt-member",
                Some(3),
                "1 Operative, 1 Soldier",
                (60, 10, 0),
                (500, 1_000, 2_000),
            ),
            mission(
                "raid-exalt-hq",
                "Raid Exalt headquarters",
                Exalt,
                "exalt-hq",
                None,
                "4 Soldier, 3 Elite, 2 Lieutenant, 1 HighCommander",
                (1_200, 120, 25),
                (10_000, 10_000, 20_000),
            ),
            mission(
                "apprehend-black-lotus-member",
                "Apprehend Black Lotus member",
                BlackLotus,
                "black-lotus-member",
                Some(4),
                "2 Operative, 1 Handler",
                (80, 15, 0),
                (500, 1_000, 2_000),
            ),
        ];

        Self { missions, leads }
    }
}
