//! Option Greeks
//!
//! First and second order sensitivities, tagged with the scaling
//! convention they are reported in.

use serde::{Deserialize, Serialize};

use super::error::{BsmError, BsmResult};

/// Scale for vega and rho
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensitivityScale {
    /// dV per unit change (σ = 1.0 means 100%)
    #[default]
    PerUnit,
    /// dV per 1 percentage point
    PerPercent,
}

impl SensitivityScale {
    /// Multiplier applied to a per-unit sensitivity
    pub fn factor(&self) -> f64 {
        match self {
            SensitivityScale::PerUnit => 1.0,
            SensitivityScale::PerPercent => 0.01,
        }
    }
}

/// Scale for theta
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThetaScale {
    /// dV per year of calendar time
    #[default]
    PerYear,
    /// dV per day, with the given day count per year
    PerDay { days_per_year: f64 },
}

impl ThetaScale {
    /// Multiplier applied to a per-year theta
    pub fn factor(&self) -> f64 {
        match self {
            ThetaScale::PerYear => 1.0,
            ThetaScale::PerDay { days_per_year } => 1.0 / days_per_year,
        }
    }
}

/// Scaling convention of a [`Greeks`] value
///
/// Delta and gamma are always reported per unit of spot.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GreeksConvention {
    pub vega: SensitivityScale,
    pub rho: SensitivityScale,
    pub theta: ThetaScale,
}

impl GreeksConvention {
    /// Per unit σ and r, per year theta
    pub fn per_unit() -> Self {
        Self::default()
    }

    /// Desk convention: vega and rho per 1%, theta per calendar day
    pub fn per_percent_per_day() -> Self {
        Self {
            vega: SensitivityScale::PerPercent,
            rho: SensitivityScale::PerPercent,
            theta: ThetaScale::PerDay {
                days_per_year: 365.0,
            },
        }
    }

    /// Reject day counts that would blow up or flip the sign of theta
    pub fn validate(&self) -> BsmResult<()> {
        if let ThetaScale::PerDay { days_per_year } = self.theta {
            if !days_per_year.is_finite() || days_per_year <= 0.0 {
                return Err(BsmError::invalid_parameter(
                    "days_per_year",
                    format!("must be positive and finite, got {}", days_per_year),
                ));
            }
        }
        Ok(())
    }
}

/// Option Greeks (sensitivities)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Greeks {
    /// Delta: dV/dS (sensitivity to spot)
    pub delta: f64,
    /// Gamma: d²V/dS² (sensitivity of delta to spot)
    pub gamma: f64,
    /// Vega: dV/dσ (sensitivity to volatility)
    pub vega: f64,
    /// Theta: dV/dt (time decay)
    pub theta: f64,
    /// Rho: dV/dr (sensitivity to interest rate)
    pub rho: f64,
    /// Vanna: d²V/dSdσ, per unit σ
    pub vanna: Option<f64>,
    /// Volga/Vomma: d²V/dσ², per unit σ
    pub volga: Option<f64>,
    /// Convention the values above are expressed in
    pub convention: GreeksConvention,
}

impl Greeks {
    /// Greeks in the per-unit / per-year convention
    pub fn new(delta: f64, gamma: f64, vega: f64, theta: f64, rho: f64) -> Self {
        Self {
            delta,
            gamma,
            vega,
            theta,
            rho,
            vanna: None,
            volga: None,
            convention: GreeksConvention::per_unit(),
        }
    }

    /// Re-express in another convention
    ///
    /// Both conventions are expected to pass [`GreeksConvention::validate`].
    pub fn with_convention(&self, convention: GreeksConvention) -> Self {
        let from = self.convention;
        Self {
            vega: self.vega / from.vega.factor() * convention.vega.factor(),
            rho: self.rho / from.rho.factor() * convention.rho.factor(),
            theta: self.theta / from.theta.factor() * convention.theta.factor(),
            convention,
            ..*self
        }
    }

    /// All components finite
    pub fn is_finite(&self) -> bool {
        [self.delta, self.gamma, self.vega, self.theta, self.rho]
            .iter()
            .chain(self.vanna.iter())
            .chain(self.volga.iter())
            .all(|v| v.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_convention_is_per_unit() {
        let g = Greeks::new(0.5, 0.02, 37.5, -6.4, 53.2);
        assert_eq!(g.convention, GreeksConvention::per_unit());
        assert_eq!(g.convention.vega, SensitivityScale::PerUnit);
        assert_eq!(g.convention.theta, ThetaScale::PerYear);
    }

    #[test]
    fn test_desk_convention_rescales() {
        let g = Greeks::new(0.5, 0.02, 37.5, -6.57, 53.2);
        let desk = g.with_convention(GreeksConvention::per_percent_per_day());

        assert_eq!(desk.delta, g.delta);
        assert_eq!(desk.gamma, g.gamma);
        assert!((desk.vega - 0.375).abs() < 1e-12);
        assert!((desk.rho - 0.532).abs() < 1e-12);
        assert!((desk.theta - (-0.018)).abs() < 1e-12);

        // And back again
        let unit = desk.with_convention(GreeksConvention::per_unit());
        assert!((unit.vega - g.vega).abs() < 1e-12);
        assert!((unit.theta - g.theta).abs() < 1e-12);
    }

    #[test]
    fn test_is_finite() {
        let mut g = Greeks::new(0.5, 0.02, 37.5, -6.4, 53.2);
        assert!(g.is_finite());
        g.volga = Some(f64::NAN);
        assert!(!g.is_finite());
    }

    #[test]
    fn test_day_count_must_be_positive() {
        assert!(GreeksConvention::per_unit().validate().is_ok());
        assert!(GreeksConvention::per_percent_per_day().validate().is_ok());

        for days_per_year in [0.0, -365.0, f64::NAN, f64::INFINITY] {
            let conv = GreeksConvention {
                theta: ThetaScale::PerDay { days_per_year },
                ..GreeksConvention::per_unit()
            };
            let err = conv.validate().unwrap_err();
            assert_eq!(err.field(), Some("days_per_year"));
        }

        // Deserialized input goes through the same check
        let json = r#"{"vega":"per_unit","rho":"per_unit","theta":{"per_day":{"days_per_year":0.0}}}"#;
        let conv: GreeksConvention = serde_json::from_str(json).unwrap();
        assert!(conv.validate().is_err());
    }

    #[test]
    fn test_convention_json() {
        let json = serde_json::to_string(&GreeksConvention::per_percent_per_day()).unwrap();
        let back: GreeksConvention = serde_json::from_str(&json).unwrap();
        assert_eq!(back, GreeksConvention::per_percent_per_day());
    }
}
