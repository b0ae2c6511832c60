//! Effective skill: base skill degraded by damage and exhaustion.
//!
//! ```text
//! hp_factor         = max(1 - (max_hp - hp) / max_hp, 0)     (1 when max_hp == 0)
//! exhaustion_factor = max(1 - max(exhaustion - 5, 0) / 100, 0)
//! effective_skill   = floor(skill * hp_factor * exhaustion_factor)
//! ```
//!
//! The product is computed in one step on the raw scaled integers and floored
//! once, to whole units.

use crate::components::Actor;
use crate::math::Fixed;

/// Exhaustion points that carry no combat penalty.
pub const FREE_EXHAUSTION: i64 = 5;

/// Exhaustion penalty percentage points at which skill reaches zero.
const EXHAUSTION_PENALTY_CEILING: i64 = 100;

/// Exhaustion factor as a fixed fraction in `[0, 1]`.
#[must_use]
pub fn exhaustion_factor(exhaustion: Fixed) -> Fixed {
    let penalty = (exhaustion - Fixed::from_int(FREE_EXHAUSTION)).non_negative();
    let remaining = (Fixed::from_int(EXHAUSTION_PENALTY_CEILING) - penalty).non_negative();
    Fixed::from_raw(remaining.raw() / EXHAUSTION_PENALTY_CEILING)
}

/// Current combat-effective skill, floored to whole units and never negative.
#[must_use]
pub fn effective_skill(actor: &Actor) -> Fixed {
    let skill = i128::from(actor.skill.non_negative().raw());
    let hp = i128::from(actor.hit_points.non_negative().raw());
    let max_hp = i128::from(actor.max_hit_points.raw());
    let exhaustion = i128::from(exhaustion_factor(actor.exhaustion).raw());
    let scale = i128::from(Fixed::SCALE);

    // skill * (hp / max_hp) * exhaustion_factor, then floor to whole units
    let (numerator, denominator) = if max_hp > 0 {
        (skill * hp.min(max_hp) * exhaustion, max_hp * scale * scale)
    } else {
        (skill * exhaustion, scale * scale)
    };
    let whole = numerator / denominator;
    Fixed::from_int(whole as i64)
}
