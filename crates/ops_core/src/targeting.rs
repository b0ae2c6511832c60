//! Target selection for squad combat.
//!
//! Attackers prefer targets they can beat without wasting effort on a
//! trivial one: frozen effective skill within `[0.2, 0.8]` of their own,
//! closest to half. Attack counts spread fire across the enemy squad, and
//! badly damaged targets sometimes drop out of consideration so a squad
//! does not pile onto one wounded defender.
//!
//! # Algorithm
//!
//! 1. Each candidate drops out with probability `(max_hp - hp) / max_hp`.
//!    If that removes everyone, all candidates are restored.
//! 2. Candidates are grouped by attacks received this round, lowest first.
//! 3. The first group holding any candidate in the skill window wins; within
//!    it the candidate closest to `0.5 × attacker` is picked, ties broken by
//!    lower skill, then lower id.
//! 4. If no group has a windowed candidate, pick uniformly among the
//!    least-attacked candidates.

use std::collections::BTreeMap;

use crate::math::Fixed;
use crate::random::{RandomSource, RollChannel};

/// One potential target, as seen at selection time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetCandidate {
    /// Caller's index for this target (returned on selection).
    pub index: usize,
    /// Numeric id suffix for tie-breaks.
    pub ordinal: u32,
    /// Effective skill frozen at the start of the round.
    pub frozen_skill: Fixed,
    /// Current hit points.
    pub hit_points: Fixed,
    /// Maximum hit points.
    pub max_hit_points: Fixed,
    /// Attacks already directed at this target this round.
    pub attack_count: u32,
}

impl TargetCandidate {
    /// Fraction of hit points missing, in `[0, 1]`.
    fn damage_ratio(&self) -> Fixed {
        if !self.max_hit_points.is_positive() {
            return Fixed::ZERO;
        }
        (self.max_hit_points - self.hit_points)
            .non_negative()
            .checked_div(self.max_hit_points)
            .unwrap_or(Fixed::ZERO)
    }
}

/// Whether `skill` lies in `[0.2 × attacker, 0.8 × attacker]`.
fn in_skill_window(skill: Fixed, attacker_skill: Fixed) -> bool {
    let skill = i128::from(skill.raw()) * 10;
    let attacker = i128::from(attacker_skill.raw());
    skill >= attacker * 2 && skill <= attacker * 8
}

/// Twice the distance from `0.5 × attacker`, kept integral.
fn preference_distance(skill: Fixed, attacker_skill: Fixed) -> i128 {
    (i128::from(skill.raw()) * 2 - i128::from(attacker_skill.raw())).abs()
}

/// Pick the next target. Returns the chosen candidate's `index`, or `None`
/// when `candidates` is empty.
pub fn select_target(
    candidates: &[TargetCandidate],
    attacker_skill: Fixed,
    rng: &mut RandomSource,
) -> Option<usize> {
    if candidates.is_empty() {
        return None;
    }

    let mut remaining: Vec<&TargetCandidate> = candidates
        .iter()
        .filter(|candidate| {
            let roll = rng.get_fixed(RollChannel::TargetSelfRemoval);
            roll >= candidate.damage_ratio()
        })
        .collect();
    if remaining.is_empty() {
        remaining = candidates.iter().collect();
    }

    let mut groups: BTreeMap<u32, Vec<&TargetCandidate>> = BTreeMap::new();
    for candidate in remaining {
        groups.entry(candidate.attack_count).or_default().push(candidate);
    }

    for group in groups.values() {
        let preferred = group
            .iter()
            .filter(|c| in_skill_window(c.frozen_skill, attacker_skill))
            .min_by_key(|c| {
                (
                    preference_distance(c.frozen_skill, attacker_skill),
                    c.frozen_skill,
                    c.ordinal,
                )
            });
        if let Some(target) = preferred {
            return Some(target.index);
        }
    }

    // No windowed candidate anywhere: uniform among the least attacked.
    let (_, least_attacked) = groups.into_iter().next()?;
    let mut least_attacked = least_attacked;
    least_attacked.sort_by_key(|c| c.ordinal);
    let pick = rng.index(RollChannel::TargetFallback, least_attacked.len());
    Some(least_attacked[pick].index)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(index: usize, skill: i64, attack_count: u32) -> TargetCandidate {
        TargetCandidate {
            index,
            ordinal: index as u32 + 1,
            frozen_skill: Fixed::from_int(skill),
            hit_points: Fixed::from_int(30),
            max_hit_points: Fixed::from_int(30),
            attack_count,
        }
    }

    fn rng() -> RandomSource {
        let mut rng = RandomSource::seeded(0);
        rng.set(RollChannel::TargetSelfRemoval, 1.0).unwrap();
        rng.set(RollChannel::TargetFallback, 0.0).unwrap();
        rng
    }

    #[test]
    fn test_empty_candidates() {
        assert_eq!(select_target(&[], Fixed::from_int(100), &mut rng()), None);
    }

    #[test]
    fn test_prefers_half_skill() {
        let candidates = [candidate(0, 75, 0), candidate(1, 52, 0), candidate(2, 30, 0)];
        assert_eq!(
            select_target(&candidates, Fixed::from_int(100), &mut rng()),
            Some(1)
        );
    }

    #[test]
    fn test_tie_breaks_by_lower_skill_then_id() {
        // 40 and 60 are both 10 away from 50
        let candidates = [candidate(0, 60, 0), candidate(1, 40, 0)];
        assert_eq!(
            select_target(&candidates, Fixed::from_int(100), &mut rng()),
            Some(1)
        );
        let same = [candidate(0, 50, 0), candidate(1, 50, 0)];
        assert_eq!(select_target(&same, Fixed::from_int(100), &mut rng()), Some(0));
    }

    #[test]
    fn test_fairness_before_preference() {
        // The ideal target was already attacked; an acceptable one was not.
        let candidates = [candidate(0, 50, 1), candidate(1, 75, 0)];
        assert_eq!(
            select_target(&candidates, Fixed::from_int(100), &mut rng()),
            Some(1)
        );
    }

    #[test]
    fn test_escalates_when_group_has_no_window() {
        // Unattacked candidate is out of window (too strong); escalate.
        let candidates = [candidate(0, 95, 0), candidate(1, 50, 2)];
        assert_eq!(
            select_target(&candidates, Fixed::from_int(100), &mut rng()),
            Some(1)
        );
    }

    #[test]
    fn test_fallback_uniform_among_least_attacked() {
        let candidates = [candidate(0, 500, 1), candidate(1, 400, 0), candidate(2, 300, 0)];
        let mut low = rng();
        assert_eq!(select_target(&candidates, Fixed::from_int(100), &mut low), Some(1));
        let mut high = rng();
        high.set(RollChannel::TargetFallback, 1.0).unwrap();
        assert_eq!(select_target(&candidates, Fixed::from_int(100), &mut high), Some(2));
    }

    #[test]
    fn test_damaged_target_may_drop_out() {
        let mut wounded = candidate(0, 50, 0);
        wounded.hit_points = Fixed::from_int(3);
        let candidates = [wounded, candidate(1, 70, 0)];
        let mut rng = rng();
        // Roll 0.5 < damage ratio 0.9 removes the wounded target only
        rng.set(RollChannel::TargetSelfRemoval, 0.5).unwrap();
        assert_eq!(select_target(&candidates, Fixed::from_int(100), &mut rng), Some(1));
    }

    #[test]
    fn test_filter_restored_when_everyone_drops_out() {
        let mut wounded = candidate(0, 50, 0);
        wounded.hit_points = Fixed::from_int(1);
        let mut rng = rng();
        rng.set(RollChannel::TargetSelfRemoval, 0.0).unwrap();
        assert_eq!(select_target(&[wounded], Fixed::from_int(100), &mut rng), Some(0));
    }
}
