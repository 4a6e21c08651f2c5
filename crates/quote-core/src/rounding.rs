//! # Rounding Module
//!
//! Rounding policy for the payable amount, plus the percentage helper used
//! by every tax and discount calculation.
//!
//! ## Where Rounding Happens
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ROUND ONCE, AT THE END                                                 │
//! │                                                                         │
//! │  line amount ──► line tax ──► Σ aggregates ──► grand total ──► round   │
//! │     exact          exact          exact           exact        ▲       │
//! │                                                                │       │
//! │                                             RoundingMode ──────┘       │
//! │                                                                         │
//! │  Rounding each of 200 lines to a whole unit would drift the total by   │
//! │  up to 200 units. Rounding only the grand total bounds drift to < 1.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use quote_core::rounding::{percent_of, RoundingMode};
//!
//! assert_eq!(percent_of(50000.0, 9.0), 4500.0);
//! assert_eq!(RoundingMode::Up.apply(49999.4), 50000.0);
//! assert_eq!(RoundingMode::Down.apply(49999.4), 49999.0);
//! assert_eq!(RoundingMode::None.apply(49999.4), 49999.4);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Rounding Mode
// =============================================================================

/// How the grand total is rounded to a whole currency unit.
///
/// Serialized as `"none"`, `"up"` or `"down"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum RoundingMode {
    /// Leave the amount exact.
    #[default]
    None,
    /// Ceiling to the next whole unit.
    Up,
    /// Floor to the previous whole unit.
    Down,
}

impl RoundingMode {
    /// Applies this rounding mode to an amount.
    ///
    /// Non-finite amounts come back unchanged in every mode.
    #[inline]
    pub fn apply(self, amount: f64) -> f64 {
        match self {
            RoundingMode::None => amount,
            RoundingMode::Up => amount.ceil(),
            RoundingMode::Down => amount.floor(),
        }
    }
}

impl fmt::Display for RoundingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundingMode::None => write!(f, "none"),
            RoundingMode::Up => write!(f, "up"),
            RoundingMode::Down => write!(f, "down"),
        }
    }
}

impl FromStr for RoundingMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" | "" => Ok(RoundingMode::None),
            "up" | "ceil" => Ok(RoundingMode::Up),
            "down" | "floor" => Ok(RoundingMode::Down),
            other => Err(ValidationError::InvalidFormat {
                field: "roundingType".to_string(),
                reason: format!("unknown rounding mode '{}'", other),
            }),
        }
    }
}

// =============================================================================
// Percentage Helper
// =============================================================================

/// Returns `pct` percent of `amount`.
///
/// Negative and non-finite values pass straight through the arithmetic.
#[inline]
pub fn percent_of(amount: f64, pct: f64) -> f64 {
    amount * (pct / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_modes() {
        assert_eq!(RoundingMode::None.apply(10.25), 10.25);
        assert_eq!(RoundingMode::Up.apply(10.25), 11.0);
        assert_eq!(RoundingMode::Down.apply(10.25), 10.0);
    }

    #[test]
    fn test_whole_amounts_are_fixed_points() {
        for mode in [RoundingMode::None, RoundingMode::Up, RoundingMode::Down] {
            assert_eq!(mode.apply(59000.0), 59000.0);
        }
    }

    #[test]
    fn test_negative_amounts() {
        assert_eq!(RoundingMode::Up.apply(-10.5), -10.0);
        assert_eq!(RoundingMode::Down.apply(-10.5), -11.0);
    }

    #[test]
    fn test_non_finite_passes_through() {
        assert!(RoundingMode::Up.apply(f64::NAN).is_nan());
        assert_eq!(RoundingMode::Down.apply(f64::INFINITY), f64::INFINITY);
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&RoundingMode::Up).unwrap(), "\"up\"");
        let mode: RoundingMode = serde_json::from_str("\"down\"").unwrap();
        assert_eq!(mode, RoundingMode::Down);
        assert_eq!(RoundingMode::default(), RoundingMode::None);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("UP".parse::<RoundingMode>().unwrap(), RoundingMode::Up);
        assert_eq!("floor".parse::<RoundingMode>().unwrap(), RoundingMode::Down);
        assert!("sideways".parse::<RoundingMode>().is_err());
    }

    #[test]
    fn test_percent_of() {
        assert_eq!(percent_of(50000.0, 9.0), 4500.0);
        assert_eq!(percent_of(-200.0, 50.0), -100.0);
        assert_eq!(percent_of(1000.0, 0.0), 0.0);
    }
}
