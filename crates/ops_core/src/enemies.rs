//! Enemy roster: stat table and composition parser.
//!
//! Mission templates describe their opposition as text such as
//! `"3 Initiate, 2 Operative, 1 Handler"`. [`parse_enemy_roster`] turns that
//! into concrete [`Enemy`] values with ids numbered from 1 within the site.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::components::{Actor, Combatant, EnemyId, Weapon};
use crate::error::{GameError, Result};
use crate::math::Fixed;

/// Enemy type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Fresh recruit.
    Initiate,
    /// Field operative.
    Operative,
    /// Trained soldier.
    Soldier,
    /// Veteran soldier.
    Elite,
    /// Officer running a cell of operatives.
    Handler,
    /// Officer commanding soldiers.
    Lieutenant,
    /// Regional commander.
    Commander,
    /// Top of the military hierarchy.
    HighCommander,
    /// Faction figurehead.
    CultLeader,
}

/// Static stats for one enemy kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnemyStats {
    /// Base skill.
    pub skill: i64,
    /// Maximum hit points.
    pub hit_points: i64,
    /// Base weapon damage.
    pub damage: i64,
    /// Whether the kind is an officer.
    pub is_officer: bool,
}

impl EnemyKind {
    /// Every kind, in ascending threat order.
    pub const ALL: [Self; 9] = [
        Self::Initiate,
        Self::Operative,
        Self::Soldier,
        Self::Elite,
        Self::Handler,
        Self::Lieutenant,
        Self::Commander,
        Self::HighCommander,
        Self::CultLeader,
    ];

    /// Stat table lookup.
    #[must_use]
    pub const fn stats(self) -> EnemyStats {
        let (skill, hit_points, damage, is_officer) = match self {
            Self::Initiate => (40, 20, 8, false),
            Self::Operative => (60, 25, 10, false),
            Self::Soldier => (100, 30, 12, false),
            Self::Elite => (140, 40, 14, false),
            Self::Handler => (80, 25, 10, true),
            Self::Lieutenant => (120, 35, 14, true),
            Self::Commander => (170, 45, 16, true),
            Self::HighCommander => (220, 60, 18, true),
            Self::CultLeader => (300, 80, 20, true),
        };
        EnemyStats {
            skill,
            hit_points,
            damage,
            is_officer,
        }
    }

    /// Name used in roster strings.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Initiate => "Initiate",
            Self::Operative => "Operative",
            Self::Soldier => "Soldier",
            Self::Elite => "Elite",
            Self::Handler => "Handler",
            Self::Lieutenant => "Lieutenant",
            Self::Commander => "Commander",
            Self::HighCommander => "HighCommander",
            Self::CultLeader => "CultLeader",
        }
    }
}

impl fmt::Display for EnemyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EnemyKind {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| GameError::UnknownEnemyType(s.to_string()))
    }
}

/// A hostile combatant at a mission site.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Enemy {
    /// Id, unique within the mission site.
    pub id: EnemyId,
    /// Type tag.
    pub kind: EnemyKind,
    /// Officer flag from the stat table.
    pub is_officer: bool,
    /// Combat state.
    pub actor: Actor,
}

impl Enemy {
    /// Create a fresh enemy from the stat table.
    #[must_use]
    pub fn new(id: EnemyId, kind: EnemyKind) -> Self {
        let stats = kind.stats();
        Self {
            id,
            kind,
            is_officer: stats.is_officer,
            actor: Actor::new(
                Fixed::from_int(stats.skill),
                Fixed::from_int(stats.hit_points),
                Weapon::new(stats.damage),
            ),
        }
    }
}

impl Combatant for Enemy {
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

/// Parse a `"<count> <Kind>, ..."` composition into enemies numbered from 1.
pub fn parse_enemy_roster(roster: &str) -> Result<Vec<Enemy>> {
    let malformed = |reason: String| GameError::MalformedRoster {
        roster: roster.to_string(),
        reason,
    };

    let mut enemies = Vec::new();
    for entry in roster.split(',').map(str::trim) {
        if entry.is_empty() {
            return Err(malformed("empty entry".to_string()));
        }
        let (count, kind) = entry
            .split_once(char::is_whitespace)
            .ok_or_else(|| malformed(format!("expected '<count> <Kind>', got '{entry}'")))?;
        let count: u32 = count
            .parse()
            .map_err(|_| malformed(format!("invalid count '{count}'")))?;
        if count == 0 {
            return Err(malformed(format!("zero count for '{}'", kind.trim())));
        }
        let kind: EnemyKind = kind.trim().parse()?;
        for _ in 0..count {
            let id = EnemyId(enemies.len() as u32 + 1);
            enemies.push(Enemy::new(id, kind));
        }
    }
    Ok(enemies)
}
