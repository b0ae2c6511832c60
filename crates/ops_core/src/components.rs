//! Actor and agent data.
//!
//! Plain data with small helpers. Behavior over a whole roster lives in
//! [`crate::agents`]; combat behavior lives in [`crate::combat`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::math::Fixed;

/// Turn number. Turn 1 is the first playable turn.
pub type Turn = u32;

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            /// Numeric suffix of the id.
            #[must_use]
            pub const fn number(self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "-{:03}"), self.0)
            }
        }
    };
}

numeric_id!(
    /// Unique identifier for agents.
    AgentId,
    "agent"
);
numeric_id!(
    /// Identifier for an enemy, unique within its mission site.
    EnemyId,
    "enemy"
);
numeric_id!(
    /// Unique identifier for mission sites.
    MissionSiteId,
    "mission-site"
);
numeric_id!(
    /// Unique identifier for lead investigations.
    LeadInvestigationId,
    "investigation"
);

// ============================================================================
// Actor
// ============================================================================

/// Weapon carried by an actor.
///
/// Damage rolls are uniform in `[min_damage, max_damage]`, a symmetric
/// ±50% band around `damage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Weapon {
    /// Base damage.
    pub damage: i64,
    /// Lowest possible damage roll.
    pub min_damage: i64,
    /// Highest possible damage roll.
    pub max_damage: i64,
}

impl Weapon {
    /// Create a weapon with the standard ±50% damage band.
    #[must_use]
    pub const fn new(damage: i64) -> Self {
        let spread = damage / 2;
        Self {
            damage,
            min_damage: damage - spread,
            max_damage: damage + spread,
        }
    }
}

/// Combat-relevant state shared by agents and enemies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    /// Base skill before damage and exhaustion penalties.
    pub skill: Fixed,
    /// Current hit points.
    pub hit_points: Fixed,
    /// Maximum hit points.
    pub max_hit_points: Fixed,
    /// Accumulated exhaustion. The first five points carry no penalty.
    pub exhaustion: Fixed,
    /// Equipped weapon.
    pub weapon: Weapon,
}

impl Actor {
    /// Create an unhurt, rested actor.
    #[must_use]
    pub fn new(skill: Fixed, max_hit_points: Fixed, weapon: Weapon) -> Self {
        Self {
            skill,
            hit_points: max_hit_points,
            max_hit_points,
            exhaustion: Fixed::ZERO,
            weapon,
        }
    }

    /// Whether the actor still has hit points.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.hit_points.is_positive()
    }

    /// Hit points currently missing.
    #[must_use]
    pub fn damage_taken(&self) -> Fixed {
        self.max_hit_points - self.hit_points
    }

    /// Remove hit points, flooring at zero. Returns the damage actually dealt.
    pub fn take_damage(&mut self, amount: Fixed) -> Fixed {
        let dealt = amount.min(self.hit_points).non_negative();
        self.hit_points -= dealt;
        dealt
    }
}

/// Anything that can fight: gives the combat engine access to an [`Actor`]
/// plus a numeric id for tie-breaking.
pub trait Combatant {
    /// Numeric id suffix, used to break ties deterministically.
    fn ordinal(&self) -> u32;

    /// Shared combat state.
    fn actor(&self) -> &Actor;

    /// Mutable combat state.
    fn actor_mut(&mut self) -> &mut Actor;
}

impl<T: Combatant + ?Sized> Combatant for &mut T {
    fn ordinal(&self) -> u32 {
        (**self).ordinal()
    }

    fn actor(&self) -> &Actor {
        (**self).actor()
    }

    fn actor_mut(&mut self) -> &mut Actor {
        (**self).actor_mut()
    }
}

// ============================================================================
// Agent
// ============================================================================

/// Where an agent currently is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AgentState {
    /// At headquarters, ready for orders.
    Available,
    /// Travelling toward the destination implied by its assignment.
    InTransit,
    /// Healing from combat damage.
    Recovering,
    /// Working a contracting, espionage or lead-investigation assignment.
    OnAssignment,
    /// Deployed to a mission site awaiting battle.
    OnMission,
    /// Improving skill in training.
    InTraining,
    /// Sacked or killed in action. Kept in the roster for history.
    Terminated,
}

impl AgentState {
    /// Every state, in report order.
    pub const ALL: [Self; 7] = [
        Self::Available,
        Self::InTransit,
        Self::Recovering,
        Self::OnAssignment,
        Self::OnMission,
        Self::InTraining,
        Self::Terminated,
    ];
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Available => "Available",
            Self::InTransit => "InTransit",
            Self::Recovering => "Recovering",
            Self::OnAssignment => "OnAssignment",
            Self::OnMission => "OnMission",
            Self::InTraining => "InTraining",
            Self::Terminated => "Terminated",
        };
        f.write_str(name)
    }
}

/// What an agent has been told to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Assignment {
    /// Idle at headquarters.
    Standby,
    /// Healing.
    Recovery,
    /// Earning money.
    Contracting,
    /// Gathering intel.
    Espionage,
    /// Improving skill.
    Training,
    /// Deployed to a mission site.
    MissionSite(MissionSiteId),
    /// Working a lead investigation.
    LeadInvestigation(LeadInvestigationId),
    /// Dismissed. Terminal.
    Sacked,
    /// Killed in action. Terminal.
    Kia,
}

impl Assignment {
    /// Whether this assignment ends the agent's career.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Sacked | Self::Kia)
    }
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standby => f.write_str("Standby"),
            Self::Recovery => f.write_str("Recovery"),
            Self::Contracting => f.write_str("Contracting"),
            Self::Espionage => f.write_str("Espionage"),
            Self::Training => f.write_str("Training"),
            Self::MissionSite(id) => write!(f, "{id}"),
            Self::LeadInvestigation(id) => write!(f, "{id}"),
            Self::Sacked => f.write_str("Sacked"),
            Self::Kia => f.write_str("KIA"),
        }
    }
}

/// A member of the player's roster.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Agent {
    /// Unique id.
    pub id: AgentId,
    /// Combat state.
    pub actor: Actor,
    /// Turn the agent was hired.
    pub turn_hired: Turn,
    /// Turn the agent was sacked or killed.
    #[serde(default)]
    pub turn_terminated: Option<Turn>,
    /// Enemy that landed the killing blow.
    #[serde(default)]
    pub terminated_by: Option<EnemyId>,
    /// Mission site the agent died on.
    #[serde(default)]
    pub terminated_on_mission_site: Option<MissionSiteId>,
    /// Lifecycle state.
    pub state: AgentState,
    /// Current assignment.
    pub assignment: Assignment,
    /// Damage taken in the battle that sent the agent to recovery.
    pub hit_points_lost_before_recovery: Fixed,
    /// Turns of recovery remaining.
    pub recovery_turns: u32,
    /// Missions the agent fought in.
    pub missions_total: u32,
    /// Skill accumulated through training.
    pub skill_from_training: Fixed,
}

impl Agent {
    /// A freshly hired agent, travelling to headquarters.
    #[must_use]
    pub fn hired(id: AgentId, turn: Turn, actor: Actor) -> Self {
        Self {
            id,
            actor,
            turn_hired: turn,
            turn_terminated: None,
            terminated_by: None,
            terminated_on_mission_site: None,
            state: AgentState::InTransit,
            assignment: Assignment::Standby,
            hit_points_lost_before_recovery: Fixed::ZERO,
            recovery_turns: 0,
            missions_total: 0,
            skill_from_training: Fixed::ZERO,
        }
    }

    /// Whether the agent is still on the roster in any living capacity.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state != AgentState::Terminated
    }

    /// Whether the agent is at headquarters awaiting orders.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.state == AgentState::Available
    }

    /// Put the agent in a state with an assignment.
    pub fn reassign(&mut self, state: AgentState, assignment: Assignment) {
        self.state = state;
        self.assignment = assignment;
    }

    /// Mark the agent killed in action.
    pub fn mark_kia(&mut self, turn: Turn, by: Option<EnemyId>, site: MissionSiteId) {
        self.reassign(AgentState::Terminated, Assignment::Kia);
        self.actor.hit_points = Fixed::ZERO;
        self.turn_terminated = Some(turn);
        self.terminated_by = by;
        self.terminated_on_mission_site = Some(site);
        self.recovery_turns = 0;
        self.hit_points_lost_before_recovery = Fixed::ZERO;
    }

    /// Mark the agent dismissed.
    pub fn mark_sacked(&mut self, turn: Turn) {
        self.reassign(AgentState::Terminated, Assignment::Sacked);
        self.turn_terminated = Some(turn);
    }
}

impl Combatant for Agent {
    fn ordinal(&self) -> u32 {
        self.id.number()
    }

    fn actor(&self) -> &Actor {
        &self.actor
    }

    fn actor_mut(&mut self) -> &mut Actor {
        &mut self.actor
    }
}
