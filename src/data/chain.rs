//! Option chain valuation
//!
//! Turns an already-fetched quote chain into per-contract implied
//! volatilities, model prices and Greeks, with calls and puts merged side by
//! side on strike. A contract that cannot be valued is logged and left
//! empty; it never aborts the rest of the chain.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::{
    BsmError, BsmResult, ChainQuote, GreeksConvention, OptionParameters, OptionType,
    PricingConfig, QuoteChain, SolverConfig,
};
use crate::models::{implied_volatility_with, value_with, ImpliedVolatilityResult, Valuation};

/// Settings for valuing a chain
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ChainConfig {
    pub pricing: PricingConfig,
    pub solver: SolverConfig,
    pub convention: GreeksConvention,
}

/// Valuation of a single contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractValuation {
    pub contract_symbol: String,
    pub option_type: OptionType,
    pub strike: f64,
    pub bid: Option<f64>,
    pub ask: Option<f64>,
    /// ask − bid
    pub spread: Option<f64>,
    pub in_the_money: bool,
    /// Best available market price (mid > last > bid)
    pub market_price: Option<f64>,
    /// Solve of the market price for σ
    pub implied_volatility: Option<ImpliedVolatilityResult>,
    /// σ behind `valuation`: provider IV if quoted, otherwise the solved one
    pub volatility_used: Option<f64>,
    pub valuation: Option<Valuation>,
}

/// Calls and puts sharing a strike
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainRow {
    pub strike: f64,
    pub call: Option<ContractValuation>,
    pub put: Option<ContractValuation>,
}

/// Year fraction between two dates (calendar days / 365); past expiries give 0
pub fn time_to_expiry(valuation_date: NaiveDate, expiry: NaiveDate) -> f64 {
    let days = (expiry - valuation_date).num_days();
    days.max(0) as f64 / 365.0
}

/// Value every contract in the chain
///
/// Fails only when the chain-wide inputs (spot, rate, dividend yield) are
/// unusable.
pub fn value_chain(chain: &QuoteChain, config: &ChainConfig) -> BsmResult<Vec<ChainRow>> {
    if !chain.spot.is_finite() || chain.spot <= 0.0 {
        return Err(BsmError::invalid_parameter(
            "spot",
            format!("must be positive and finite, got {}", chain.spot),
        ));
    }
    if !chain.risk_free_rate.is_finite() {
        return Err(BsmError::invalid_parameter(
            "risk_free_rate",
            format!("must be finite, got {}", chain.risk_free_rate),
        ));
    }
    if !chain.dividend_yield.is_finite() {
        return Err(BsmError::invalid_parameter(
            "dividend_yield",
            format!("must be finite, got {}", chain.dividend_yield),
        ));
    }

    let mut rows: Vec<ChainRow> = Vec::new();
    let mut valued = 0usize;

    for option_type in [OptionType::Call, OptionType::Put] {
        for (symbol, quote) in chain.side(option_type) {
            let contract = value_contract(chain, symbol, option_type, quote, config);
            if contract.valuation.is_some() {
                valued += 1;
            }

            let idx = match rows.iter().position(|r| r.strike == quote.strike) {
                Some(idx) => idx,
                None => {
                    rows.push(ChainRow {
                        strike: quote.strike,
                        call: None,
                        put: None,
                    });
                    rows.len() - 1
                }
            };
            let slot = match option_type {
                OptionType::Call => &mut rows[idx].call,
                OptionType::Put => &mut rows[idx].put,
            };
            if let Some(previous) = slot.replace(contract) {
                tracing::warn!(
                    "Duplicate {} at strike {}: {} replaced by {}",
                    option_type,
                    quote.strike,
                    previous.contract_symbol,
                    symbol
                );
            }
        }
    }

    rows.sort_by(|a, b| a.strike.total_cmp(&b.strike));
    tracing::info!(
        "Valued {} of {} contracts for {} expiring {}",
        valued,
        chain.len(),
        chain.underlying,
        chain.expiry
    );
    Ok(rows)
}

fn value_contract(
    chain: &QuoteChain,
    symbol: &str,
    option_type: OptionType,
    quote: &ChainQuote,
    config: &ChainConfig,
) -> ContractValuation {
    let market_price = quote.best_price();
    let mut contract = ContractValuation {
        contract_symbol: symbol.to_string(),
        option_type,
        strike: quote.strike,
        bid: quote.bid,
        ask: quote.ask,
        spread: quote.spread(),
        in_the_money: option_type.intrinsic(chain.spot, quote.strike) > 0.0,
        market_price,
        implied_volatility: None,
        volatility_used: None,
        valuation: None,
    };

    let time = time_to_expiry(chain.valuation_date, quote.expiry_date);
    let base = match OptionParameters::with_config(
        chain.spot,
        quote.strike,
        time,
        chain.risk_free_rate,
        chain.dividend_yield,
        0.0,
        option_type,
        config.pricing,
    ) {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!("Skipping {}: {}", symbol, e);
            return contract;
        }
    };

    if let Some(price) = market_price {
        match implied_volatility_with(price, &base, &config.solver) {
            Ok(iv) => contract.implied_volatility = Some(iv),
            Err(e) => tracing::warn!("No implied volatility for {} at {}: {}", symbol, price, e),
        }
    }

    let provider_vol = quote
        .implied_volatility
        .filter(|v| v.is_finite() && *v >= 0.0);
    let solved_vol = contract
        .implied_volatility
        .filter(|iv| iv.converged)
        .and_then(|iv| iv.volatility);
    let Some(vol) = provider_vol.or(solved_vol) else {
        tracing::debug!("No volatility available for {}", symbol);
        return contract;
    };

    match base
        .with_volatility(vol)
        .and_then(|p| value_with(&p, config.convention))
    {
        Ok(valuation) => {
            contract.volatility_used = Some(vol);
            contract.valuation = Some(valuation);
        }
        Err(e) => tracing::warn!("Could not value {}: {}", symbol, e),
    }
    contract
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::price;

    fn dates() -> (NaiveDate, NaiveDate) {
        (
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
        )
    }

    fn quote_at(strike: f64, vol: f64, option_type: OptionType) -> ChainQuote {
        let (_, expiry) = dates();
        let p = OptionParameters::new(100.0, strike, 1.0, 0.04, 0.01, vol, option_type).unwrap();
        let fair = price(&p).unwrap().price;
        let mut quote = ChainQuote::new(strike, expiry);
        quote.bid = Some(fair - 0.05);
        quote.ask = Some(fair + 0.05);
        quote
    }

    fn sample_chain() -> QuoteChain {
        let (today, expiry) = dates();
        let mut chain = QuoteChain::new("TEST", 100.0, expiry, today).with_rates(0.04, 0.01);
        chain.insert("TEST260101C00090000", OptionType::Call, quote_at(90.0, 0.25, OptionType::Call));
        chain.insert("TEST260101C00110000", OptionType::Call, quote_at(110.0, 0.22, OptionType::Call));
        chain.insert("TEST260101P00090000", OptionType::Put, quote_at(90.0, 0.28, OptionType::Put));
        chain
    }

    #[test]
    fn test_time_to_expiry() {
        let (today, expiry) = dates();
        assert!((time_to_expiry(today, expiry) - 1.0).abs() < 1e-12);
        assert_eq!(time_to_expiry(expiry, today), 0.0);
    }

    #[test]
    fn test_chain_rows_merge_on_strike() {
        let rows = value_chain(&sample_chain(), &ChainConfig::default()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].strike, 90.0);
        assert!(rows[0].call.is_some());
        assert!(rows[0].put.is_some());
        assert_eq!(rows[1].strike, 110.0);
        assert!(rows[1].put.is_none());
    }

    #[test]
    fn test_chain_recovers_quoted_vols() {
        let rows = value_chain(&sample_chain(), &ChainConfig::default()).unwrap();

        let call = rows[0].call.as_ref().unwrap();
        assert!(call.in_the_money);
        assert!((call.spread.unwrap() - 0.1).abs() < 1e-9);
        let iv = call.implied_volatility.unwrap();
        assert!(iv.converged);
        assert!((iv.volatility.unwrap() - 0.25).abs() < 1e-6);
        assert_eq!(call.volatility_used, iv.volatility);
        assert!(call.valuation.unwrap().greeks.delta > 0.5);

        let put = rows[0].put.as_ref().unwrap();
        assert!(!put.in_the_money);
        assert!((put.implied_volatility.unwrap().volatility.unwrap() - 0.28).abs() < 1e-6);
        assert!(put.valuation.unwrap().greeks.delta < 0.0);
    }

    #[test]
    fn test_provider_vol_preferred() {
        let mut chain = sample_chain();
        if let Some(q) = chain.calls.get_mut("TEST260101C00110000") {
            q.implied_volatility = Some(0.5);
        }
        let rows = value_chain(&chain, &ChainConfig::default()).unwrap();
        let call = rows[1].call.as_ref().unwrap();
        assert_eq!(call.volatility_used, Some(0.5));
    }

    #[test]
    fn test_bad_contract_does_not_abort_chain() {
        let (_, expiry) = dates();
        let mut chain = sample_chain();
        // No quote at all, and a price below intrinsic
        chain.insert("EMPTY", OptionType::Put, ChainQuote::new(120.0, expiry));
        let mut cheap = ChainQuote::new(50.0, expiry);
        cheap.last_price = Some(1.0);
        chain.insert("CHEAP", OptionType::Call, cheap);

        let rows = value_chain(&chain, &ChainConfig::default()).unwrap();
        assert_eq!(rows.len(), 4);

        let cheap = rows[0].call.as_ref().unwrap();
        assert_eq!(cheap.strike, 50.0);
        assert!(cheap.implied_volatility.is_none());
        assert!(cheap.valuation.is_none());

        let empty = rows[3].put.as_ref().unwrap();
        assert_eq!(empty.market_price, None);
        assert!(empty.valuation.is_none());
    }

    #[test]
    fn test_rejects_bad_spot() {
        let mut chain = sample_chain();
        chain.spot = 0.0;
        let err = value_chain(&chain, &ChainConfig::default()).unwrap_err();
        assert_eq!(err.field(), Some("spot"));
    }
}
