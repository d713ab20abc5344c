//! Parts-Per-Million Fixed-Point Rates
//!
//! Every rate and score in the economy (inflation, UBI share, staking APY,
//! proof score, thresholds) is a `Rate`: an unsigned integer count of
//! millionths. Policy arithmetic stays integer-only, so the same inputs
//! produce the same balances on every platform.
//!
//! ## Format
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Rate(u64) = value × 1_000_000                              │
//! ├─────────────────────────────────────────────────────────────┤
//! │  1.0   -> 1_000_000                                         │
//! │  0.08  ->    80_000   (8% staking APY)                      │
//! │  0.70  ->   700_000   (proof threshold)                     │
//! │  Precision: 0.000001                                        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Products widen to `u128` and truncate toward zero (floor).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Number of rate units in 1.0.
pub const RATE_SCALE: u64 = 1_000_000;

/// Fixed-point rate in parts-per-million.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rate(u64);

impl Rate {
    /// 0.0
    pub const ZERO: Rate = Rate(0);

    /// 1.0
    pub const ONE: Rate = Rate(RATE_SCALE);

    /// Create from a raw parts-per-million value.
    pub const fn from_ppm(ppm: u64) -> Self {
        Self(ppm)
    }

    /// Raw parts-per-million value.
    pub const fn ppm(self) -> u64 {
        self.0
    }

    /// `numerator / denominator`, floored. A zero denominator yields zero.
    pub fn from_ratio(numerator: u64, denominator: u64) -> Self {
        if denominator == 0 {
            return Self::ZERO;
        }
        let wide = numerator as u128 * RATE_SCALE as u128 / denominator as u128;
        Self(saturate(wide))
    }

    /// `amount × self`, floored.
    #[inline]
    pub fn apply(self, amount: u64) -> u64 {
        saturate(amount as u128 * self.0 as u128 / RATE_SCALE as u128)
    }

    /// `self × other`, floored.
    #[inline]
    pub fn mul_rate(self, other: Rate) -> Rate {
        Rate(saturate(self.0 as u128 * other.0 as u128 / RATE_SCALE as u128))
    }

    /// Clamp into `[min, max]`.
    pub fn clamp_to(self, min: Rate, max: Rate) -> Rate {
        Rate(self.0.clamp(min.0, max.0))
    }

    /// Whether `numerator / denominator >= self`, decided exactly by
    /// cross-multiplication rather than on a rounded ratio.
    pub fn is_met_by(self, numerator: u64, denominator: u64) -> bool {
        numerator as u128 * RATE_SCALE as u128 >= self.0 as u128 * denominator as u128
    }

    /// Convert to float for display.
    ///
    /// # Warning
    /// Only for logging and presentation. Never feed the result back into
    /// balance arithmetic.
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / RATE_SCALE as f64
    }
}

#[inline]
fn saturate(wide: u128) -> u64 {
    u64::try_from(wide).unwrap_or(u64::MAX)
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / RATE_SCALE;
        let frac = self.0 % RATE_SCALE;
        if frac == 0 {
            return write!(f, "{}", whole);
        }
        let digits = format!("{:06}", frac);
        write!(f, "{}.{}", whole, digits.trim_end_matches('0'))
    }
}

/// Error parsing a decimal rate string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid rate {0:?}: expected a non-negative decimal with at most 6 fractional digits")]
pub struct ParseRateError(pub String);

impl FromStr for Rate {
    type Err = ParseRateError;

    /// Parse a decimal such as `"0.08"` or `"1"` without going through floats.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseRateError(s.to_string());
        let trimmed = s.trim();
        let (whole, frac) = match trimmed.split_once('.') {
            Some((w, f)) => (w, f),
            None => (trimmed, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(err());
        }
        if frac.len() > 6 || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(err());
        }
        let whole: u64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| err())?
        };
        let frac_ppm: u64 = if frac.is_empty() {
            0
        } else {
            format!("{:0<6}", frac).parse().map_err(|_| err())?
        };
        whole
            .checked_mul(RATE_SCALE)
            .and_then(|w| w.checked_add(frac_ppm))
            .map(Rate)
            .ok_or_else(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_ratio() {
        assert_eq!(Rate::from_ratio(7, 10), Rate::from_ppm(700_000));
        assert_eq!(Rate::from_ratio(1, 3), Rate::from_ppm(333_333));
        assert_eq!(Rate::from_ratio(5, 5), Rate::ONE);
        assert_eq!(Rate::from_ratio(1, 0), Rate::ZERO);
    }

    #[test]
    fn test_apply_floors() {
        let apy = Rate::from_ppm(80_000);
        assert_eq!(apy.apply(1000), 80);
        assert_eq!(Rate::from_ppm(10_000).apply(99), 0);
        assert_eq!(Rate::ONE.apply(u64::MAX), u64::MAX);
    }

    #[test]
    fn test_mul() {
        let rate = Rate::from_ppm(20_000);
        let up = Rate::from_ppm(1_100_000);
        assert_eq!(rate.mul_rate(up), Rate::from_ppm(22_000));
    }

    #[test]
    fn test_is_met_by_is_exact() {
        let threshold = Rate::from_ppm(700_000);
        assert!(threshold.is_met_by(7, 10));
        assert!(threshold.is_met_by(70, 100));
        assert!(!threshold.is_met_by(6999, 10000));
        assert!(!threshold.is_met_by(2, 3));
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!("0.08".parse::<Rate>().unwrap(), Rate::from_ppm(80_000));
        assert_eq!("1".parse::<Rate>().unwrap(), Rate::ONE);
        assert_eq!(".5".parse::<Rate>().unwrap(), Rate::from_ppm(500_000));
        assert_eq!("0.000001".parse::<Rate>().unwrap(), Rate::from_ppm(1));
        assert!("0.0000001".parse::<Rate>().is_err());
        assert!("-0.1".parse::<Rate>().is_err());
        assert!("abc".parse::<Rate>().is_err());
        assert!("".parse::<Rate>().is_err());

        assert_eq!(Rate::from_ppm(80_000).to_string(), "0.08");
        assert_eq!(Rate::ONE.to_string(), "1");
        assert_eq!(Rate::from_ppm(1_250_000).to_string(), "1.25");
    }

    #[test]
    fn test_clamp() {
        let min = Rate::from_ppm(10_000);
        let max = Rate::from_ppm(50_000);
        assert_eq!(Rate::from_ppm(60_000).clamp_to(min, max), max);
        assert_eq!(Rate::from_ppm(5_000).clamp_to(min, max), min);
    }
}
