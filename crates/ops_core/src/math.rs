//! Fixed-point math for deterministic turn computation.
//!
//! Every quantity that compounds across turns (skill, hit points,
//! exhaustion, panic, threat, suppression, decay percentages) is stored
//! as a [`Fixed`]: an `i64` holding the value scaled by one million.
//! Native floats appear only at the edges (random rolls, display ratios)
//! and are floored back into `Fixed` immediately.
//!
//! Every lossy operation floors. Derived and displayed values therefore
//! never overstate the true magnitude.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};

/// Fixed-point decimal with six fractional digits.
///
/// Represents decimal values as integers: 0.25 → 250_000, 1.0 → 1_000_000.
/// Serialized as the raw scaled integer to preserve exact precision.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Fixed(i64);

/// Floor division on `i128` (rounds toward negative infinity).
fn floor_div(numerator: i128, denominator: i128) -> i128 {
    let quotient = numerator / denominator;
    if numerator % denominator != 0 && ((numerator < 0) != (denominator < 0)) {
        quotient - 1
    } else {
        quotient
    }
}

impl Fixed {
    /// Number of fractional decimal digits.
    pub const DECIMALS: u32 = 6;

    /// Scale factor: 1_000_000 = 1.0
    pub const SCALE: i64 = 1_000_000;

    /// Zero.
    pub const ZERO: Self = Self(0);

    /// One whole unit.
    pub const ONE: Self = Self(Self::SCALE);

    /// Create from a raw scaled value.
    #[must_use]
    pub const fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    /// Raw scaled value.
    #[must_use]
    pub const fn raw(self) -> i64 {
        self.0
    }

    /// Create from a whole number (5 → 5_000_000).
    #[must_use]
    pub const fn from_int(value: i64) -> Self {
        Self(value * Self::SCALE)
    }

    /// Create from a ratio of whole numbers, flooring to the scale.
    pub fn from_ratio(numerator: i64, denominator: i64) -> Result<Self> {
        if denominator == 0 {
            return Err(GameError::DivisionByZero(numerator.to_string()));
        }
        let raw = floor_div(
            i128::from(numerator) * i128::from(Self::SCALE),
            i128::from(denominator),
        );
        Ok(Self(raw as i64))
    }

    /// Convert from a plain decimal, failing if it carries more precision
    /// than six fractional digits.
    pub fn from_f64(value: f64) -> Result<Self> {
        if !value.is_finite() {
            return Err(GameError::ExcessPrecision(value.to_string()));
        }
        let scaled = value * Self::SCALE as f64;
        let rounded = scaled.round();
        // Tolerate binary representation error, not real extra digits.
        if (scaled - rounded).abs() > 1e-9 * scaled.abs().max(1.0) {
            return Err(GameError::ExcessPrecision(value.to_string()));
        }
        Ok(Self(rounded as i64))
    }

    /// Convert from a plain decimal, flooring any extra precision.
    ///
    /// Used for random rolls and display ratios. Non-finite input maps to zero.
    #[must_use]
    pub fn from_f64_floor(value: f64) -> Self {
        if !value.is_finite() {
            return Self::ZERO;
        }
        Self((value * Self::SCALE as f64).floor() as i64)
    }

    /// Convert to f64 (display and ratio derivation only).
    #[must_use]
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / Self::SCALE as f64
    }

    /// Multiply by a plain integer (exact).
    #[must_use]
    pub const fn mul_int(self, factor: i64) -> Self {
        Self(self.0 * factor)
    }

    /// Multiply by `numerator / denominator`, flooring to the scale.
    pub fn mul_ratio(self, numerator: i64, denominator: i64) -> Result<Self> {
        if denominator == 0 {
            return Err(GameError::DivisionByZero(format!("{self} * {numerator}")));
        }
        let raw = floor_div(
            i128::from(self.0) * i128::from(numerator),
            i128::from(denominator),
        );
        Ok(Self(raw as i64))
    }

    /// Divide by another fixed value, flooring to the scale.
    pub fn checked_div(self, divisor: Self) -> Result<Self> {
        if divisor.0 == 0 {
            return Err(GameError::DivisionByZero(self.to_string()));
        }
        let raw = floor_div(
            i128::from(self.0) * i128::from(Self::SCALE),
            i128::from(divisor.0),
        );
        Ok(Self(raw as i64))
    }

    /// Largest whole number not greater than this value.
    #[must_use]
    pub fn floor(self) -> i64 {
        self.0.div_euclid(Self::SCALE)
    }

    /// Smallest whole number not less than this value.
    #[must_use]
    pub fn ceil(self) -> i64 {
        let floor = self.floor();
        if self.0.rem_euclid(Self::SCALE) == 0 {
            floor
        } else {
            floor + 1
        }
    }

    /// Nearest whole number, halves rounded up.
    #[must_use]
    pub fn round(self) -> i64 {
        (self.0 + Self::SCALE / 2).div_euclid(Self::SCALE)
    }

    /// This value floored to whole units, kept as `Fixed`.
    #[must_use]
    pub fn floor_to_int(self) -> Self {
        Self::from_int(self.floor())
    }

    /// Clamp negative values to zero.
    #[must_use]
    pub fn non_negative(self) -> Self {
        self.max(Self::ZERO)
    }

    /// Whether the value is strictly greater than zero.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Whether the value is strictly less than zero.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Render as a whole number (floored).
    #[must_use]
    pub fn to_int_string(self) -> String {
        self.floor().to_string()
    }

    /// Render with `decimals` fractional digits (floored, at most six).
    #[must_use]
    pub fn to_decimal_string(self, decimals: u32) -> String {
        let decimals = decimals.min(Self::DECIMALS);
        let step = 10_i128.pow(Self::DECIMALS - decimals);
        let units = floor_div(i128::from(self.0), step);
        let sign = if units < 0 { "-" } else { "" };
        let magnitude = units.unsigned_abs();
        if decimals == 0 {
            return format!("{sign}{magnitude}");
        }
        let divisor = 10_u128.pow(decimals);
        format!(
            "{sign}{}.{:0width$}",
            magnitude / divisor,
            magnitude % divisor,
            width = decimals as usize
        )
    }

    /// Render as a percentage with `decimals` fractional digits (floored).
    ///
    /// `0.0125` with two decimals renders as `1.25%`.
    #[must_use]
    pub fn to_percent_string(self, decimals: u32) -> String {
        format!("{}%", Self(self.0 * 100).to_decimal_string(decimals))
    }
}

impl Add for Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Fixed {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Fixed {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Neg for Fixed {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

/// Product floored to the scale.
impl Mul for Fixed {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        let raw = floor_div(
            i128::from(self.0) * i128::from(rhs.0),
            i128::from(Self::SCALE),
        );
        Self(raw as i64)
    }
}

impl Sum for Fixed {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Fixed> for Fixed {
    fn sum<I: Iterator<Item = &'a Fixed>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl From<i64> for Fixed {
    fn from(value: i64) -> Self {
        Self::from_int(value)
    }
}

impl FromStr for Fixed {
    type Err = GameError;

    /// Parse decimal text exactly (`"0.0120"`, `"-3"`, `"15.5"`).
    fn from_str(s: &str) -> Result<Self> {
        let text = s.trim();
        let invalid = || GameError::DataParseError {
            path: "<fixed>".to_string(),
            message: format!("not a decimal number: '{s}'"),
        };

        let (negative, digits) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text.strip_prefix('+').unwrap_or(text)),
        };
        let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        if !whole.chars().all(|c| c.is_ascii_digit())
            || !fraction.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }

        let fraction = fraction.trim_end_matches('0');
        if fraction.len() > Self::DECIMALS as usize {
            return Err(GameError::ExcessPrecision(s.to_string()));
        }

        let whole_value: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let fraction_value: i64 = if fraction.is_empty() {
            0
        } else {
            let padded = format!("{fraction:0<width$}", width = Self::DECIMALS as usize);
            padded.parse().map_err(|_| invalid())?
        };

        let raw = whole_value
            .checked_mul(Self::SCALE)
            .and_then(|w| w.checked_add(fraction_value))
            .ok_or_else(invalid)?;
        Ok(Self(if negative { -raw } else { raw }))
    }
}

impl fmt::Debug for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fixed({} = {})", self.0, self)
    }
}

/// Shortest exact decimal form (`0.012`, `15`, `-2.5`).
impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let full = self.to_decimal_string(Self::DECIMALS);
        let trimmed = full.trim_end_matches('0').trim_end_matches('.');
        f.write_str(trimmed)
    }
}
