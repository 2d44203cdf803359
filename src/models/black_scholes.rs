//! Black-Scholes-Merton Model
//!
//! Provides:
//! - European option pricing with continuous dividend yield
//! - Greeks computed from the same d1/d2 as the price
//!
//! Degenerate inputs (T or σ at its floor) never reach the closed form:
//! σ√T → 0 makes d1/d2 blow up, so the exact limits are returned instead.

use serde::{Deserialize, Serialize};

use super::normal::{norm_cdf, norm_pdf};
use crate::core::{BsmError, BsmResult, Greeks, GreeksConvention, OptionParameters, OptionType};

/// Which branch of the kernel produced a price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingRegime {
    /// Standard closed form
    ClosedForm,
    /// T at its floor: discounted intrinsic value
    AtExpiry,
    /// σ at its floor: discounted deterministic forward payoff
    ZeroVolatility,
}

/// Kernel output
///
/// `d1` and `d2` are kept for the Greeks engine. In a degenerate regime they
/// hold their limits: ±∞ on either side of the money, 0 exactly at it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricingResult {
    pub price: f64,
    pub d1: f64,
    pub d2: f64,
    pub regime: PricingRegime,
}

/// Price plus Greeks for one contract
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Valuation {
    pub price: f64,
    pub greeks: Greeks,
}

/// Black-Scholes d1 and d2
pub fn d1_d2(params: &OptionParameters) -> (f64, f64) {
    let vol = params.volatility();
    let time = params.time_to_expiry();
    let total_vol = params.total_vol();
    let d1 = ((params.spot() / params.strike()).ln()
        + (params.rate() - params.dividend_yield() + 0.5 * vol * vol) * time)
        / total_vol;
    (d1, d1 - total_vol)
}

/// Black-Scholes-Merton European option price
pub fn price(params: &OptionParameters) -> BsmResult<PricingResult> {
    let df = checked(params.discount_factor(), "discount factor e^(-rT)")?;
    let div_factor = checked(params.dividend_factor(), "dividend factor e^(-qT)")?;
    let discounted_spot = checked(params.spot() * div_factor, "discounted spot S·e^(-qT)")?;
    let discounted_strike = checked(params.strike() * df, "discounted strike K·e^(-rT)")?;
    let option_type = params.option_type();

    if params.is_at_expiry() {
        let price = df * option_type.intrinsic(params.spot(), params.strike());
        let d = limit_d(params.spot() - params.strike());
        return Ok(PricingResult {
            price: checked(price, "intrinsic value")?,
            d1: d,
            d2: d,
            regime: PricingRegime::AtExpiry,
        });
    }

    if params.is_zero_vol() {
        // e^(−rT)·max(±(F−K), 0) without forming F, which can overflow on its own
        let price = option_type.intrinsic(discounted_spot, discounted_strike);
        let d = limit_d(discounted_spot - discounted_strike);
        return Ok(PricingResult {
            price: checked(price, "forward payoff")?,
            d1: d,
            d2: d,
            regime: PricingRegime::ZeroVolatility,
        });
    }

    let (d1, d2) = d1_d2(params);
    let price = match option_type {
        OptionType::Call => discounted_spot * norm_cdf(d1) - discounted_strike * norm_cdf(d2),
        OptionType::Put => discounted_strike * norm_cdf(-d2) - discounted_spot * norm_cdf(-d1),
    };

    Ok(PricingResult {
        price: checked(price, "option price")?.max(0.0),
        d1,
        d2,
        regime: PricingRegime::ClosedForm,
    })
}

/// Black-Scholes Greeks (per unit σ and r, per year theta)
pub fn greeks(params: &OptionParameters) -> BsmResult<Greeks> {
    let priced = price(params)?;
    greeks_from_pricing(params, &priced)
}

/// Greeks reusing the d1/d2 of an existing kernel result
///
/// `priced` must come from [`price`] on the same `params`.
pub fn greeks_from_pricing(params: &OptionParameters, priced: &PricingResult) -> BsmResult<Greeks> {
    let spot = params.spot();
    let strike = params.strike();
    let rate = params.rate();
    let div = params.dividend_yield();
    let time = params.time_to_expiry();
    let vol = params.volatility();
    let df = params.discount_factor();
    let div_factor = params.dividend_factor();
    let (d1, d2) = (priced.d1, priced.d2);

    // Delta
    let delta = match params.option_type() {
        OptionType::Call => div_factor * norm_cdf(d1),
        OptionType::Put => div_factor * (norm_cdf(d1) - 1.0),
    };

    // Rho
    let rho = match params.option_type() {
        OptionType::Call => strike * time * df * norm_cdf(d2),
        OptionType::Put => -strike * time * df * norm_cdf(-d2),
    };

    // Carry part of theta; the diffusion term is added below when σ√T > 0
    let carry = match params.option_type() {
        OptionType::Call => -rate * strike * df * norm_cdf(d2) + div * spot * div_factor * norm_cdf(d1),
        OptionType::Put => rate * strike * df * norm_cdf(-d2) - div * spot * div_factor * norm_cdf(-d1),
    };

    let greeks = if priced.regime == PricingRegime::ClosedForm {
        let sqrt_t = time.sqrt();
        let pdf_d1 = norm_pdf(d1);

        // Gamma and vega are the same for call and put
        let gamma = div_factor * pdf_d1 / (spot * vol * sqrt_t);
        let vega = spot * div_factor * pdf_d1 * sqrt_t;
        let theta = -spot * div_factor * pdf_d1 * vol / (2.0 * sqrt_t) + carry;

        let mut greeks = Greeks::new(delta, gamma, vega, theta, rho);
        greeks.vanna = Some(-div_factor * pdf_d1 * d2 / vol);
        greeks.volga = Some(vega * d1 * d2 / vol);
        greeks
    } else {
        // Payoff is locally flat almost everywhere at the floors
        let mut greeks = Greeks::new(delta, 0.0, 0.0, carry, rho);
        greeks.vanna = Some(0.0);
        greeks.volga = Some(0.0);
        greeks
    };

    if !greeks.is_finite() {
        return Err(BsmError::overflow(format!(
            "non-finite Greeks for spot={} strike={} rate={} div={} time={}",
            spot, strike, rate, div, time
        )));
    }
    Ok(greeks)
}

/// Price and Greeks in one pass
pub fn value(params: &OptionParameters) -> BsmResult<Valuation> {
    value_with(params, GreeksConvention::per_unit())
}

/// Price and Greeks, Greeks expressed in `convention`
pub fn value_with(params: &OptionParameters, convention: GreeksConvention) -> BsmResult<Valuation> {
    convention.validate()?;
    let priced = price(params)?;
    let greeks = greeks_from_pricing(params, &priced)?.with_convention(convention);
    Ok(Valuation {
        price: priced.price,
        greeks,
    })
}

/// Limit of d1/d2 as σ√T → 0, given the sign of the relevant moneyness
fn limit_d(moneyness: f64) -> f64 {
    if moneyness > 0.0 {
        f64::INFINITY
    } else if moneyness < 0.0 {
        f64::NEG_INFINITY
    } else {
        0.0
    }
}

fn checked(value: f64, what: &str) -> BsmResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(BsmError::overflow(format!("{} is not finite ({})", what, value)))
    }
}
