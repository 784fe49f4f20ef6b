//! Tier calculation from cumulative deposits

use crate::{Error, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Default tier thresholds, in units of the underlying asset
pub fn default_thresholds() -> Vec<Decimal> {
    vec![
        dec!(0),
        dec!(0.005),
        dec!(0.01),
        dec!(0.02),
        dec!(0.05),
        dec!(0.1),
        dec!(0.2),
        dec!(0.5),
        dec!(1),
        dec!(2),
        dec!(5),
    ]
}

/// Maps a cumulative deposit to a tier
///
/// The tier is the index of the highest threshold not exceeding the input.
#[derive(Debug, Clone)]
pub struct LevelCalculator {
    thresholds: Vec<Decimal>,
}

impl LevelCalculator {
    /// Create calculator from an ascending threshold table starting at zero
    pub fn new(thresholds: Vec<Decimal>) -> Result<Self> {
        validate_thresholds(&thresholds)?;
        Ok(Self { thresholds })
    }

    /// Tier for a cumulative deposit
    pub fn level(&self, cumulative: Decimal) -> u32 {
        let reached = self.thresholds.partition_point(|t| *t <= cumulative);
        reached.saturating_sub(1) as u32
    }

    /// Highest reachable tier
    pub fn max_level(&self) -> u32 {
        (self.thresholds.len() - 1) as u32
    }

    /// Threshold table
    pub fn thresholds(&self) -> &[Decimal] {
        &self.thresholds
    }
}

impl Default for LevelCalculator {
    fn default() -> Self {
        Self {
            thresholds: default_thresholds(),
        }
    }
}

/// Check a threshold table: non-empty, starts at zero, strictly ascending
pub fn validate_thresholds(thresholds: &[Decimal]) -> Result<()> {
    match thresholds.first() {
        None => {
            return Err(Error::Config("Level thresholds must not be empty".to_string()));
        }
        Some(first) if !first.is_zero() => {
            return Err(Error::Config(format!(
                "First level threshold must be 0, got {}",
                first
            )));
        }
        _ => {}
    }

    if let Some(pair) = thresholds.windows(2).find(|w| w[0] >= w[1]) {
        return Err(Error::Config(format!(
            "Level thresholds must be strictly ascending ({} >= {})",
            pair[0], pair[1]
        )));
    }

    Ok(())
}
