//! Core data types for BSM Options
//!
//! Defines fundamental types:
//! - OptionParameters: validated spot, strike, expiry, rates, vol, kind
//! - Greeks: sensitivities and their scaling convention
//! - QuoteChain: option-chain quotes supplied by the caller
//! - Configuration and errors

pub mod config;
pub mod error;
pub mod greeks;
pub mod option;
pub mod quote;

pub use config::*;
pub use error::*;
pub use greeks::*;
pub use option::*;
pub use quote::*;
