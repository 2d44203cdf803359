//! Market data handling
//!
//! Handles:
//! - Valuation of option chains supplied by an external provider
//! - Caller-owned caching of repeated valuations

pub mod cache;
pub mod chain;

pub use cache::*;
pub use chain::*;
