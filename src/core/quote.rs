//! Option chain quotes
//!
//! Already-resolved market data handed over by the option-chain provider.
//! Retrieval itself happens outside this crate.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::option::OptionType;

/// One contract as supplied by the chain provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainQuote {
    /// Strike price
    pub strike: f64,
    /// Expiration date
    pub expiry_date: NaiveDate,
    /// Bid price
    #[serde(default)]
    pub bid: Option<f64>,
    /// Ask price
    #[serde(default)]
    pub ask: Option<f64>,
    /// Last traded price
    #[serde(default)]
    pub last_price: Option<f64>,
    /// Implied volatility quoted by the provider, if any
    #[serde(default)]
    pub implied_volatility: Option<f64>,
}

impl ChainQuote {
    pub fn new(strike: f64, expiry_date: NaiveDate) -> Self {
        Self {
            strike,
            expiry_date,
            bid: None,
            ask: None,
            last_price: None,
            implied_volatility: None,
        }
    }

    /// Mid price from a two-sided, non-crossed quote
    pub fn mid(&self) -> Option<f64> {
        match (self.bid, self.ask) {
            (Some(b), Some(a)) if b > 0.0 && a >= b => Some((b + a) / 2.0),
            _ => None,
        }
    }

    /// Get the best available price (mid > last > bid)
    pub fn best_price(&self) -> Option<f64> {
        self.mid()
            .or(self.last_price.filter(|p| *p > 0.0))
            .or(self.bid.filter(|p| *p > 0.0))
    }

    /// Bid-ask spread
    pub fn spread(&self) -> Option<f64> {
        match (self.bid, self.ask) {
            (Some(b), Some(a)) => Some(a - b),
            _ => None,
        }
    }
}

/// Chain of quotes for a single expiry, keyed by contract symbol
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteChain {
    /// Underlying symbol
    pub underlying: String,
    /// Underlying spot price
    pub spot: f64,
    /// Expiry date
    pub expiry: NaiveDate,
    /// Date the chain is valued on
    pub valuation_date: NaiveDate,
    /// Risk-free rate used
    pub risk_free_rate: f64,
    /// Dividend yield used
    #[serde(default)]
    pub dividend_yield: f64,
    /// Call quotes by contract symbol
    #[serde(default)]
    pub calls: BTreeMap<String, ChainQuote>,
    /// Put quotes by contract symbol
    #[serde(default)]
    pub puts: BTreeMap<String, ChainQuote>,
}

impl QuoteChain {
    pub fn new(
        underlying: impl Into<String>,
        spot: f64,
        expiry: NaiveDate,
        valuation_date: NaiveDate,
    ) -> Self {
        Self {
            underlying: underlying.into(),
            spot,
            expiry,
            valuation_date,
            risk_free_rate: 0.0,
            dividend_yield: 0.0,
            calls: BTreeMap::new(),
            puts: BTreeMap::new(),
        }
    }

    pub fn with_rates(mut self, risk_free_rate: f64, dividend_yield: f64) -> Self {
        self.risk_free_rate = risk_free_rate;
        self.dividend_yield = dividend_yield;
        self
    }

    /// Add a quote on the given side
    pub fn insert(&mut self, symbol: impl Into<String>, option_type: OptionType, quote: ChainQuote) {
        match option_type {
            OptionType::Call => self.calls.insert(symbol.into(), quote),
            OptionType::Put => self.puts.insert(symbol.into(), quote),
        };
    }

    /// Quotes on one side
    pub fn side(&self, option_type: OptionType) -> &BTreeMap<String, ChainQuote> {
        match option_type {
            OptionType::Call => &self.calls,
            OptionType::Put => &self.puts,
        }
    }

    /// Get all strikes, sorted and deduplicated
    pub fn strikes(&self) -> Vec<f64> {
        let mut strikes: Vec<f64> = self
            .calls
            .values()
            .chain(self.puts.values())
            .map(|q| q.strike)
            .collect();
        strikes.sort_by(|a, b| a.total_cmp(b));
        strikes.dedup();
        strikes
    }

    /// Total number of quotes
    pub fn len(&self) -> usize {
        self.calls.len() + self.puts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty() && self.puts.is_empty()
    }
}
