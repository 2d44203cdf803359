//! Error types for BSM Options

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BsmError {
    /// Rejected input, naming the offending field
    #[error("Invalid parameter `{field}`: {message}")]
    InvalidParameter {
        field: &'static str,
        message: String,
    },

    /// Exponential overflow for an extreme (S, r, q, T) combination
    #[error("Numeric overflow: {message}")]
    NumericOverflow { message: String },

    /// Market price outside the no-arbitrage bounds; no σ ≥ 0 reproduces it
    #[error(
        "Market price {market_price} outside no-arbitrage bounds [{lower_bound}, {upper_bound}]"
    )]
    Convergence {
        market_price: f64,
        lower_bound: f64,
        upper_bound: f64,
    },

    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type BsmResult<T> = Result<T, BsmError>;

impl BsmError {
    pub fn invalid_parameter(field: &'static str, msg: impl Into<String>) -> Self {
        Self::InvalidParameter {
            field,
            message: msg.into(),
        }
    }

    pub fn overflow(msg: impl Into<String>) -> Self {
        Self::NumericOverflow {
            message: msg.into(),
        }
    }

    pub fn out_of_bounds(market_price: f64, lower_bound: f64, upper_bound: f64) -> Self {
        Self::Convergence {
            market_price,
            lower_bound,
            upper_bound,
        }
    }

    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Name of the offending field for parameter errors
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::InvalidParameter { field, .. } => Some(field),
            _ => None,
        }
    }
}
