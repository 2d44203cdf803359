//! Implied volatility solver
//!
//! Newton-Raphson on σ with the Greeks engine's vega as derivative, falling
//! back to bisection inside a bracket that always straddles the sign change
//! of the residual. The price is monotone increasing in σ, so every
//! evaluated point tightens the bracket from one side.
//!
//! Out-of-bounds market prices fail fast with [`BsmError::Convergence`].
//! Running out of iterations is not an error: the result carries
//! `converged = false` together with the best σ seen and its residual.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::{debug, trace, warn};

use super::black_scholes::{greeks_from_pricing, price};
use crate::core::{BsmError, BsmResult, OptionParameters, OptionType, SolverConfig};

/// How a solve ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// |model − market| < tolerance
    Converged,
    /// Iteration cap reached first, or the bracket shrank to a point that
    /// still misses the price, so further iterations cannot move σ
    MaxIterationsExceeded,
    /// Vega vanished and the bisection bracket shrank to a point: the price
    /// does not depend on σ (e.g. at expiry)
    VegaCollapsed,
}

/// Outcome of one solver invocation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpliedVolatilityResult {
    /// Solved σ; the best σ seen when not converged, absent when vega collapsed
    pub volatility: Option<f64>,
    /// Price evaluations performed
    pub iterations: usize,
    pub converged: bool,
    /// Model price − market price at `volatility`
    pub residual: f64,
    pub reason: TerminationReason,
}

/// No-arbitrage price range for a European option
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoArbitrageBounds {
    /// Discounted intrinsic (the σ → 0 price)
    pub lower: f64,
    /// S·e^(−qT) for a call, K·e^(−rT) for a put (the σ → ∞ price)
    pub upper: f64,
}

impl NoArbitrageBounds {
    pub fn contains(&self, market_price: f64) -> bool {
        self.contains_within(market_price, 0.0)
    }

    /// Bounds widened by `slack` on both sides
    pub fn contains_within(&self, market_price: f64, slack: f64) -> bool {
        market_price >= self.lower - slack && market_price <= self.upper + slack
    }
}

/// Compute the no-arbitrage bounds; the volatility in `params` is ignored
pub fn no_arbitrage_bounds(params: &OptionParameters) -> BsmResult<NoArbitrageBounds> {
    let lower = price(&params.with_volatility(0.0)?)?.price;
    let upper = match params.option_type() {
        OptionType::Call => params.spot() * params.dividend_factor(),
        OptionType::Put => params.strike() * params.discount_factor(),
    };
    if !upper.is_finite() {
        return Err(BsmError::overflow(format!(
            "upper no-arbitrage bound is not finite ({})",
            upper
        )));
    }
    Ok(NoArbitrageBounds { lower, upper })
}

/// Brenner–Subrahmanyam seed on the time value, clamped into the bracket
pub fn initial_guess(market_price: f64, params: &OptionParameters, bounds: &NoArbitrageBounds, config: &SolverConfig) -> f64 {
    let time_value = (market_price - bounds.lower).max(0.0);
    let discounted_spot = params.spot() * params.dividend_factor();
    let guess = (2.0 * PI / params.time_to_expiry()).sqrt() * time_value / discounted_spot;
    if guess.is_finite() {
        guess.clamp(config.vol_min, config.vol_max)
    } else {
        config.vol_max
    }
}

/// Implied volatility with explicit tolerance and iteration cap
///
/// The volatility held by `params` is ignored; build it with
/// [`OptionParameters::without_volatility`].
pub fn implied_volatility(
    market_price: f64,
    params: &OptionParameters,
    tolerance: f64,
    max_iterations: usize,
) -> BsmResult<ImpliedVolatilityResult> {
    let config = SolverConfig::default()
        .with_tolerance(tolerance)
        .with_max_iterations(max_iterations);
    implied_volatility_with(market_price, params, &config)
}

/// Implied volatility using a full solver configuration
pub fn implied_volatility_with(
    market_price: f64,
    params: &OptionParameters,
    config: &SolverConfig,
) -> BsmResult<ImpliedVolatilityResult> {
    config.validate()?;
    if !market_price.is_finite() {
        return Err(BsmError::invalid_parameter(
            "market_price",
            format!("must be finite, got {}", market_price),
        ));
    }

    // Model prices can round a few ULPs past a bound; within tolerance they
    // are still reachable at the bracket edge
    let bounds = no_arbitrage_bounds(params)?;
    if !bounds.contains_within(market_price, config.tolerance) {
        debug!(
            market_price,
            lower = bounds.lower,
            upper = bounds.upper,
            "market price outside no-arbitrage bounds"
        );
        return Err(BsmError::out_of_bounds(market_price, bounds.lower, bounds.upper));
    }

    let mut sigma = initial_guess(market_price, params, &bounds, config);
    let mut lo = config.vol_min;
    let mut hi = config.vol_max;
    // (σ, residual) with the smallest |residual| so far
    let mut best: Option<(f64, f64)> = None;
    let mut iterations = config.max_iterations;

    for iteration in 1..=config.max_iterations {
        let trial = params.with_volatility(sigma)?;
        let priced = price(&trial)?;
        let residual = priced.price - market_price;

        if best.map_or(true, |(_, r)| residual.abs() < r.abs()) {
            best = Some((sigma, residual));
        }

        if residual.abs() < config.tolerance {
            debug!(sigma, iteration, residual, "implied volatility converged");
            return Ok(ImpliedVolatilityResult {
                volatility: Some(sigma),
                iterations: iteration,
                converged: true,
                residual,
                reason: TerminationReason::Converged,
            });
        }

        // Price is increasing in σ: too rich means σ is an upper edge
        if residual > 0.0 {
            hi = sigma;
        } else {
            lo = sigma;
        }
        let midpoint = 0.5 * (lo + hi);
        let collapsed = hi - lo <= f64::EPSILON * hi;

        let vega = greeks_from_pricing(&trial, &priced)?.vega;
        if vega < config.vega_epsilon {
            if collapsed {
                let residual = best.map_or(residual, |(_, r)| r);
                warn!(iteration, residual, "vega collapsed, price insensitive to volatility");
                return Ok(ImpliedVolatilityResult {
                    volatility: None,
                    iterations: iteration,
                    converged: false,
                    residual,
                    reason: TerminationReason::VegaCollapsed,
                });
            }
            trace!(iteration, sigma, vega, lo, hi, "vega below epsilon, bisecting");
            sigma = midpoint;
            continue;
        }
        if collapsed {
            debug!(iteration, sigma, residual, "bracket collapsed without convergence");
            iterations = iteration;
            break;
        }

        // A Newton step landing on or outside the bracket edge yields to the midpoint
        let newton = sigma - residual / vega;
        sigma = if newton > lo && newton < hi {
            trace!(iteration, sigma = newton, residual, vega, "newton step");
            newton
        } else {
            trace!(iteration, sigma = midpoint, lo, hi, "newton left bracket, bisecting");
            midpoint
        };
    }

    // max_iterations >= 1, so at least one point was evaluated
    let (sigma, residual) = best.unwrap_or((sigma, f64::NAN));
    warn!(iterations, sigma, residual, "implied volatility did not converge");
    Ok(ImpliedVolatilityResult {
        volatility: Some(sigma),
        iterations,
        converged: false,
        residual,
        reason: TerminationReason::MaxIterationsExceeded,
    })
}
