//! Asset accounting.
//!
//! Phases before the asset phase only record what they earned or owe in an
//! [`AssetLedger`]; the ledger is settled against the state in one step so
//! the report can show every contributing term.

use crate::data::MissionRewards;
use crate::report::{AssetsReport, ValueChange};
use crate::state::GameState;

/// Money, intel and funding terms collected during a turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssetLedger {
    /// Upkeep owed, snapshotted from the pre-update roster.
    pub upkeep: i64,
    /// Contracting income.
    pub contracting_income: i64,
    /// Espionage intel.
    pub espionage_intel: i64,
    /// Hire costs accrued by player actions.
    pub hire_costs: i64,
    /// Mission money rewards.
    pub mission_money: i64,
    /// Mission intel rewards.
    pub mission_intel: i64,
    /// Mission funding rewards.
    pub mission_funding: i64,
}

impl AssetLedger {
    /// Record the rewards of a successful mission.
    pub fn add_rewards(&mut self, rewards: &MissionRewards) {
        self.mission_money += rewards.money;
        self.mission_intel += rewards.intel;
        self.mission_funding += rewards.funding;
    }

    /// Apply every term to the state and report the result.
    ///
    /// Funding is received at its pre-update value; mission funding rewards
    /// take effect from the next turn.
    pub fn settle(&self, state: &mut GameState) -> AssetsReport {
        let money_before = state.money;
        let intel_before = state.intel;
        let funding_before = state.funding;

        state.money += self.contracting_income + funding_before + self.mission_money
            - self.upkeep
            - self.hire_costs;
        state.intel += self.espionage_intel + self.mission_intel;
        state.funding += self.mission_funding;
        state.pending_hire_cost = 0;

        tracing::debug!(
            money = state.money,
            intel = state.intel,
            funding = state.funding,
            upkeep = self.upkeep,
            "Assets settled"
        );

        AssetsReport {
            money: ValueChange::new(money_before, state.money),
            intel: ValueChange::new(intel_before, state.intel),
            funding: ValueChange::new(funding_before, state.funding),
            agent_upkeep: self.upkeep,
            contracting_income: self.contracting_income,
            espionage_intel: self.espionage_intel,
            funding_income: funding_before,
            hire_costs: self.hire_costs,
            mission_money: self.mission_money,
            mission_intel: self.mission_intel,
            mission_funding: self.mission_funding,
        }
    }
}
