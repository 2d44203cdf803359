//! Configuration for pricing floors and the implied volatility solver

use serde::{Deserialize, Serialize};

use super::error::{BsmError, BsmResult};

/// Degenerate-input floors applied during parameter validation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricingConfig {
    /// ε_T: time to expiry below this is treated as exactly at expiry
    /// Default: 1e-8 years
    pub time_floor: f64,

    /// ε_σ: volatility below this is treated as zero volatility
    /// Default: 1e-8
    pub vol_floor: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            time_floor: 1e-8,
            vol_floor: 1e-8,
        }
    }
}

impl PricingConfig {
    pub fn validate(&self) -> BsmResult<()> {
        if !self.time_floor.is_finite() || self.time_floor <= 0.0 {
            return Err(BsmError::invalid_parameter(
                "time_floor",
                format!("must be positive and finite, got {}", self.time_floor),
            ));
        }
        if !self.vol_floor.is_finite() || self.vol_floor <= 0.0 {
            return Err(BsmError::invalid_parameter(
                "vol_floor",
                format!("must be positive and finite, got {}", self.vol_floor),
            ));
        }
        Ok(())
    }
}

/// Implied volatility solver configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Absolute price tolerance |model - market|
    /// Default: 1e-6
    pub tolerance: f64,

    /// Iteration cap (Newton and bisection steps combined)
    /// Default: 100
    pub max_iterations: usize,

    /// Lower edge of the safety bracket
    /// Default: 1e-6
    pub vol_min: f64,

    /// Upper edge of the safety bracket
    /// Default: 5.0
    pub vol_max: f64,

    /// Vega below this falls back to bisection
    /// Default: 1e-12
    pub vega_epsilon: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            max_iterations: 100,
            vol_min: 1e-6,
            vol_max: 5.0,
            vega_epsilon: 1e-12,
        }
    }
}

impl SolverConfig {
    /// Tight tolerance for fixtures and calibration inputs
    pub fn precise() -> Self {
        Self {
            tolerance: 1e-10,
            max_iterations: 200,
            ..Default::default()
        }
    }

    /// Wide bracket for markets quoting vols far above 500%
    pub fn extreme_regime() -> Self {
        Self {
            vol_max: 20.0,
            ..Default::default()
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn validate(&self) -> BsmResult<()> {
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(BsmError::invalid_parameter(
                "tolerance",
                format!("must be positive and finite, got {}", self.tolerance),
            ));
        }
        if self.max_iterations == 0 {
            return Err(BsmError::invalid_parameter(
                "max_iterations",
                "must be at least 1",
            ));
        }
        if !self.vol_min.is_finite() || self.vol_min <= 0.0 {
            return Err(BsmError::invalid_parameter(
                "vol_min",
                format!("must be positive and finite, got {}", self.vol_min),
            ));
        }
        if !self.vol_max.is_finite() || self.vol_max <= self.vol_min {
            return Err(BsmError::invalid_parameter(
                "vol_max",
                format!("must exceed vol_min {}, got {}", self.vol_min, self.vol_max),
            ));
        }
        if !self.vega_epsilon.is_finite() || self.vega_epsilon < 0.0 {
            return Err(BsmError::invalid_parameter(
                "vega_epsilon",
                format!("must be non-negative and finite, got {}", self.vega_epsilon),
            ));
        }
        Ok(())
    }
}
