//! JSON-friendly turn summaries.
//!
//! A [`TurnSummary`] condenses a [`TurnReport`] into one line of JSON:
//! fixed-point values are rendered as decimal strings, ids as their display form.

use ops_core::report::TurnReport;
use ops_core::state::GameState;
use serde::{Deserialize, Serialize};

/// One resolved mission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionSummary {
    /// Site id.
    pub site: String,
    /// Template id.
    pub mission: String,
    /// `Successful` or `Failed`.
    pub outcome: String,
    /// Rounds fought.
    pub rounds: u32,
    /// Whether the squad withdrew.
    pub retreated: bool,
    /// Agents killed.
    pub kia: usize,
    /// Agents wounded.
    pub wounded: usize,
}

/// Threat and suppression of one faction after the turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactionSummary {
    /// Faction name.
    pub faction: String,
    /// Threat level.
    pub threat: String,
    /// Suppression.
    pub suppression: String,
    /// Whether the player has uncovered the faction.
    pub discovered: bool,
}

/// Condensed view of one turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnSummary {
    /// Turn just played.
    pub turn: u32,
    /// Money after the turn.
    pub money: i64,
    /// Intel after the turn.
    pub intel: i64,
    /// Funding after the turn.
    pub funding: i64,
    /// Panic as a percentage.
    pub panic: String,
    /// Non-terminated agents.
    pub agents_active: i64,
    /// Agents at headquarters.
    pub agents_available: i64,
    /// Agents recovering.
    pub agents_recovering: i64,
    /// Agents terminated so far.
    pub agents_terminated: i64,
    /// Missions resolved this turn.
    pub missions: Vec<MissionSummary>,
    /// Leads completed this turn.
    pub leads_completed: Vec<String>,
    /// Sites spawned by completed leads.
    pub sites_spawned: usize,
    /// Sites that expired.
    pub sites_expired: Vec<String>,
    /// Faction standings.
    pub factions: Vec<FactionSummary>,
    /// State hash after the turn.
    pub state_hash: u64,
}

impl TurnSummary {
    /// Summarize `report`, taking the hash from `state`.
    #[must_use]
    pub fn new(report: &TurnReport, state: &GameState) -> Self {
        let agents = &report.agents;
        Self {
            turn: report.turn,
            money: report.assets.money.current,
            intel: report.assets.intel.current,
            funding: report.assets.funding.current,
            panic: report.panic.panic.current.to_percent_string(2),
            agents_active: agents.active.current,
            agents_available: agents.available.current,
            agents_recovering: agents.recovering.current,
            agents_terminated: agents.terminated.current,
            missions: report
                .missions
                .iter()
                .map(|m| MissionSummary {
                    site: m.site_id.to_string(),
                    mission: m.mission_id.clone(),
                    outcome: m.state.to_string(),
                    rounds: m.battle.rounds,
                    retreated: m.battle.retreated,
                    kia: m.agents_kia.len(),
                    wounded: m.agents_wounded.len(),
                })
                .collect(),
            leads_completed: report
                .leads
                .iter()
                .filter(|l| l.progress.completed)
                .map(|l| l.progress.lead_id.clone())
                .collect(),
            sites_spawned: report.leads.iter().map(|l| l.spawned_sites.len()).sum(),
            sites_expired: report.expired_sites.iter().map(ToString::to_string).collect(),
            factions: report
                .factions
                .iter()
                .map(|f| FactionSummary {
                    faction: f.id.to_string(),
                    threat: f.threat_level.current.to_percent_string(2),
                    suppression: f.suppression.current.to_percent_string(2),
                    discovered: state.factions.iter().any(|faction| {
                        faction.id == f.id
                            && faction.is_discovered(&state.lead_investigation_counts)
                    }),
                })
                .collect(),
            state_hash: state.state_hash(),
        }
    }

    /// Render as a single JSON line.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ops_core::data::Catalog;
    use ops_core::random::RandomSource;
    use ops_core::turn::advance_turn;
    use ops_test_utils::fixtures;

    #[test]
    fn test_summary_reflects_report() {
        let mut state = fixtures::initial_state();
        let report = advance_turn(&mut state, &Catalog::default(), &mut RandomSource::seeded(1)).unwrap();
        let summary = TurnSummary::new(&report, &state);

        assert_eq!(summary.turn, 2);
        assert_eq!(summary.money, state.money);
        assert_eq!(summary.agents_active, 4);
        assert_eq!(summary.factions.len(), 3);
        assert_eq!(summary.state_hash, state.state_hash());
        // Default factions add 0.024 panic on the first turn
        assert_eq!(summary.panic, "2.40%");
        assert!(summary.factions.iter().all(|f| !f.discovered));
    }

    #[test]
    fn test_faction_discovered_after_lead() {
        let mut state = fixtures::initial_state();
        state
            .lead_investigation_counts
            .insert("exalt-member".to_string(), 1);
        let report = advance_turn(&mut state, &Catalog::default(), &mut RandomSource::seeded(1)).unwrap();
        let summary = TurnSummary::new(&report, &state);

        let discovered: Vec<&str> = summary
            .factions
            .iter()
            .filter(|f| f.discovered)
            .map(|f| f.faction.as_str())
            .collect();
        let exalt = state.factions[1].id.to_string();
        assert_eq!(discovered, vec![exalt.as_str()]);
    }

    #[test]
    fn test_json_line() {
        let mut state = fixtures::initial_state();
        let report = advance_turn(&mut state, &Catalog::default(), &mut RandomSource::seeded(1)).unwrap();
        let json = TurnSummary::new(&report, &state).to_json().unwrap();
        assert!(!json.contains('\n'));
        let parsed: TurnSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.turn, 2);
    }
}
