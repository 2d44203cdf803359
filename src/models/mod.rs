//! Pricing Models
//!
//! Implements:
//! - Standard normal distribution (erfc-based)
//! - Black-Scholes-Merton pricing kernel and Greeks engine
//! - Implied volatility solver (Newton-Raphson with bisection fallback)
//! - Spot ladder for sensitivity tables

pub mod black_scholes;
pub mod implied_vol;
pub mod ladder;
pub mod normal;

pub use black_scholes::*;
pub use implied_vol::*;
pub use ladder::*;
pub use normal::*;
