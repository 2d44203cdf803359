//! # BSM Options - Black-Scholes-Merton Pricing Kernel
//!
//! Prices European options and their sensitivities under the
//! Black-Scholes-Merton closed form, and inverts the model to recover
//! implied volatility from an observed market price.
//!
//! ## Key Components
//!
//! - **Parameters**: validated spot, strike, expiry, rate, dividend yield, vol
//! - **Pricing Kernel**: closed form plus exact limits at expiry / zero vol
//! - **Greeks Engine**: delta, gamma, vega, theta, rho (and vanna, volga)
//! - **Implied Vol**: Newton-Raphson with bisection fallback
//! - **Chains**: per-contract IV and Greeks for a fetched option chain
//!
//! ## Usage
//!
//! ```rust
//! use bsm_options::prelude::*;
//!
//! let params = OptionParameters::new(100.0, 100.0, 1.0, 0.05, 0.0, 0.2, OptionType::Call)?;
//! let priced = bs_price(&params)?;
//! let greeks = bs_greeks(&params)?;
//! assert!((priced.price - 10.4506).abs() < 1e-4);
//! assert!((greeks.delta - 0.6368).abs() < 1e-4);
//!
//! let unpriced = OptionParameters::without_volatility(100.0, 100.0, 1.0, 0.05, 0.0, OptionType::Call)?;
//! let iv = implied_volatility(priced.price, &unpriced, 1e-6, 100)?;
//! assert!(iv.converged);
//! # Ok::<(), bsm_options::BsmError>(())
//! ```
//!
//! ## What This Crate Does NOT Do
//!
//! - American exercise
//! - Stochastic or local volatility
//! - Monte Carlo or lattice methods
//! - Portfolio aggregation
//! - Fetching market data (callers pass resolved numbers in)
//!
//! Every pricing function is pure: no global state, safe to call from any
//! number of threads.

pub mod core;
pub mod data;
pub mod models;

/// Prelude with commonly used types
pub mod prelude {
    // Core types
    pub use crate::core::{
        BsmError, BsmResult, ChainQuote, Greeks, GreeksConvention, OptionParameters,
        OptionRecord, OptionType, PricingConfig, QuoteChain, SensitivityScale, SolverConfig,
        ThetaScale,
    };

    // Chains and caching
    pub use crate::data::{
        time_to_expiry, value_chain, CacheConfig, CacheStats, ChainConfig, ChainRow,
        ContractValuation, ValuationCache,
    };

    // Models
    pub use crate::models::{
        greeks as bs_greeks,
        greeks_from_pricing,
        implied_volatility,
        implied_volatility_with,
        no_arbitrage_bounds,
        norm_cdf,
        norm_pdf,

        // Black-Scholes-Merton
        price as bs_price,
        spot_ladder,
        value as bs_value,
        value_with as bs_value_with,
        ImpliedVolatilityResult,
        LadderConfig,
        LadderPoint,
        NoArbitrageBounds,
        PricingRegime,
        PricingResult,
        TerminationReason,
        Valuation,
    };
}

// Re-export main types at crate root
pub use crate::core::{BsmError, BsmResult, OptionParameters, OptionType};
