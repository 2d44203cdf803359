//! Spot ladder
//!
//! Price and Greeks evaluated over an evenly spaced range of spot prices
//! around the current spot and strike. Feeds sensitivity charts and tables.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::black_scholes::{value_with, Valuation};
use crate::core::{BsmError, BsmResult, GreeksConvention, OptionParameters};

/// Ladder range and resolution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LadderConfig {
    /// Range extends this fraction below min(S, K) and above max(S, K)
    /// Default: 0.30
    pub range_percent: f64,
    /// Number of spot points
    /// Default: 50
    pub steps: usize,
    /// Convention for the reported Greeks
    pub convention: GreeksConvention,
}

impl Default for LadderConfig {
    fn default() -> Self {
        Self {
            range_percent: 0.30,
            steps: 50,
            convention: GreeksConvention::per_unit(),
        }
    }
}

/// One rung of the ladder
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LadderPoint {
    pub spot: f64,
    #[serde(flatten)]
    pub valuation: Valuation,
}

/// Spot grid [min(S,K)·(1−p), max(S,K)·(1+p)]
pub fn spot_grid(params: &OptionParameters, range_percent: f64, steps: usize) -> BsmResult<Array1<f64>> {
    if !range_percent.is_finite() || range_percent < 0.0 {
        return Err(BsmError::invalid_parameter(
            "range_percent",
            format!("must be non-negative and finite, got {}", range_percent),
        ));
    }
    if steps < 2 {
        return Err(BsmError::invalid_parameter(
            "steps",
            format!("must be at least 2, got {}", steps),
        ));
    }

    let lower = params.spot().min(params.strike());
    let upper = params.spot().max(params.strike());
    Ok(Array1::linspace(lower * (1.0 - range_percent), upper * (1.0 + range_percent), steps))
}

/// Evaluate price and Greeks along the spot grid
///
/// Rungs that cannot be valued (non-positive spot when the range exceeds
/// 100%, overflow) are skipped with a warning.
pub fn spot_ladder(params: &OptionParameters, config: &LadderConfig) -> BsmResult<Vec<LadderPoint>> {
    let grid = spot_grid(params, config.range_percent, config.steps)?;

    let points = grid
        .iter()
        .filter_map(|&spot| {
            let rung = params
                .with_spot(spot)
                .and_then(|p| value_with(&p, config.convention));
            match rung {
                Ok(valuation) => Some(LadderPoint { spot, valuation }),
                Err(e) => {
                    tracing::warn!("Could not value ladder rung at spot {:.2}: {}", spot, e);
                    None
                }
            }
        })
        .collect();

    Ok(points)
}
