//! Option parameter definitions
//!
//! Validates and normalizes the five BSM inputs plus the option kind.
//! Time to expiry and volatility are clamped at small positive floors so
//! σ√T never vanishes; the clamped state is remembered so the pricing
//! kernel can switch to the exact degenerate limits.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::config::PricingConfig;
use super::error::{BsmError, BsmResult};

/// Option type (Call or Put)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    #[serde(alias = "CALL", alias = "Call")]
    Call,
    #[serde(alias = "PUT", alias = "Put")]
    Put,
}

impl OptionType {
    /// Payoff direction: +1 for call, -1 for put
    pub fn phi(&self) -> f64 {
        match self {
            OptionType::Call => 1.0,
            OptionType::Put => -1.0,
        }
    }

    /// Intrinsic value at given spot (or forward)
    pub fn intrinsic(&self, spot: f64, strike: f64) -> f64 {
        match self {
            OptionType::Call => (spot - strike).max(0.0),
            OptionType::Put => (strike - spot).max(0.0),
        }
    }

    /// Accepted spellings, sorted
    pub fn values() -> [&'static str; 2] {
        ["call", "put"]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OptionType::Call => "call",
            OptionType::Put => "put",
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptionType {
    type Err = BsmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "call" => Ok(OptionType::Call),
            "put" => Ok(OptionType::Put),
            _ => Err(BsmError::invalid_parameter(
                "option_kind",
                format!("'{}' is not a valid option kind, must be one of {:?}", s, Self::values()),
            )),
        }
    }
}

/// Validated BSM inputs
///
/// Immutable once built. `time_to_expiry` and `volatility` hold the clamped
/// values; [`is_at_expiry`](Self::is_at_expiry) and
/// [`is_zero_vol`](Self::is_zero_vol) report whether a floor was hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptionParameters {
    spot: f64,
    strike: f64,
    time: f64,
    rate: f64,
    div: f64,
    vol: f64,
    option_type: OptionType,
    at_expiry: bool,
    zero_vol: bool,
    config: PricingConfig,
}

impl OptionParameters {
    /// Validate inputs with the default floors
    pub fn new(
        spot: f64,
        strike: f64,
        time: f64,
        rate: f64,
        div: f64,
        vol: f64,
        option_type: OptionType,
    ) -> BsmResult<Self> {
        Self::with_config(spot, strike, time, rate, div, vol, option_type, PricingConfig::default())
    }

    /// Parameters for an implied volatility solve; σ is replaced on every iteration
    pub fn without_volatility(
        spot: f64,
        strike: f64,
        time: f64,
        rate: f64,
        div: f64,
        option_type: OptionType,
    ) -> BsmResult<Self> {
        Self::new(spot, strike, time, rate, div, 0.0, option_type)
    }

    /// Validate inputs with explicit floors
    #[allow(clippy::too_many_arguments)]
    pub fn with_config(
        spot: f64,
        strike: f64,
        time: f64,
        rate: f64,
        div: f64,
        vol: f64,
        option_type: OptionType,
        config: PricingConfig,
    ) -> BsmResult<Self> {
        config.validate()?;
        let spot = positive(spot, "spot")?;
        let strike = positive(strike, "strike")?;
        let rate = finite(rate, "risk_free_rate")?;
        let div = finite(div, "dividend_yield")?;
        let (time, at_expiry) = floored(time, config.time_floor, "time_to_expiry")?;
        let (vol, zero_vol) = floored(vol, config.vol_floor, "volatility")?;

        Ok(Self {
            spot,
            strike,
            time,
            rate,
            div,
            vol,
            option_type,
            at_expiry,
            zero_vol,
            config,
        })
    }

    /// Same contract at a different volatility
    pub fn with_volatility(&self, vol: f64) -> BsmResult<Self> {
        let (vol, zero_vol) = floored(vol, self.config.vol_floor, "volatility")?;
        Ok(Self {
            vol,
            zero_vol,
            ..*self
        })
    }

    /// Same contract at a different spot
    pub fn with_spot(&self, spot: f64) -> BsmResult<Self> {
        let spot = positive(spot, "spot")?;
        Ok(Self { spot, ..*self })
    }

    /// Same inputs, other side
    pub fn with_option_type(&self, option_type: OptionType) -> Self {
        Self {
            option_type,
            ..*self
        }
    }

    pub fn spot(&self) -> f64 {
        self.spot
    }

    pub fn strike(&self) -> f64 {
        self.strike
    }

    /// Time to expiry in years (clamped)
    pub fn time_to_expiry(&self) -> f64 {
        self.time
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn dividend_yield(&self) -> f64 {
        self.div
    }

    /// Volatility (clamped)
    pub fn volatility(&self) -> f64 {
        self.vol
    }

    pub fn option_type(&self) -> OptionType {
        self.option_type
    }

    pub fn pricing_config(&self) -> PricingConfig {
        self.config
    }

    /// Time to expiry hit its floor
    pub fn is_at_expiry(&self) -> bool {
        self.at_expiry
    }

    /// Volatility hit its floor
    pub fn is_zero_vol(&self) -> bool {
        self.zero_vol
    }

    /// Either floor is active; closed form must not be evaluated
    pub fn is_degenerate(&self) -> bool {
        self.at_expiry || self.zero_vol
    }

    /// e^(−rT)
    pub fn discount_factor(&self) -> f64 {
        (-self.rate * self.time).exp()
    }

    /// e^(−qT)
    pub fn dividend_factor(&self) -> f64 {
        (-self.div * self.time).exp()
    }

    /// F = S·e^((r−q)T)
    pub fn forward(&self) -> f64 {
        self.spot * ((self.rate - self.div) * self.time).exp()
    }

    /// σ√T
    pub fn total_vol(&self) -> f64 {
        self.vol * self.time.sqrt()
    }

    /// S/K
    pub fn moneyness(&self) -> f64 {
        self.spot / self.strike
    }

    /// Undiscounted intrinsic value at the current spot
    pub fn intrinsic(&self) -> f64 {
        self.option_type.intrinsic(self.spot, self.strike)
    }

    /// Is this option in the money at the current spot?
    pub fn is_itm(&self) -> bool {
        match self.option_type {
            OptionType::Call => self.spot > self.strike,
            OptionType::Put => self.spot < self.strike,
        }
    }

    pub fn to_record(&self) -> OptionRecord {
        OptionRecord::from(self)
    }
}

fn finite(value: f64, field: &'static str) -> BsmResult<f64> {
    if !value.is_finite() {
        return Err(BsmError::invalid_parameter(
            field,
            format!("must be finite, got {}", value),
        ));
    }
    Ok(value)
}

fn positive(value: f64, field: &'static str) -> BsmResult<f64> {
    if !value.is_finite() || value <= 0.0 {
        return Err(BsmError::invalid_parameter(
            field,
            format!("must be positive and finite, got {}", value),
        ));
    }
    Ok(value)
}

/// Clamp values at or below `floor` up to it; reject genuinely negative ones.
/// Returns the clamped value and whether the floor is active.
fn floored(value: f64, floor: f64, field: &'static str) -> BsmResult<(f64, bool)> {
    let value = finite(value, field)?;
    if value <= -floor {
        return Err(BsmError::invalid_parameter(
            field,
            format!("must be non-negative, got {}", value),
        ));
    }
    if value <= floor {
        Ok((floor, true))
    } else {
        Ok((value, false))
    }
}

/// Canonical interchange record
///
/// ```json
/// { "spot": 100.0, "strike": 100.0, "timeToExpiryYears": 1.0,
///   "riskFreeRate": 0.05, "dividendYield": 0.0,
///   "volatility": 0.2, "optionKind": "call" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionRecord {
    pub spot: f64,
    pub strike: f64,
    pub time_to_expiry_years: f64,
    pub risk_free_rate: f64,
    #[serde(default)]
    pub dividend_yield: f64,
    pub volatility: f64,
    /// Kept as text so an unknown kind surfaces as a parameter error
    pub option_kind: String,
}

impl TryFrom<&OptionRecord> for OptionParameters {
    type Error = BsmError;

    fn try_from(record: &OptionRecord) -> BsmResult<Self> {
        let option_type: OptionType = record.option_kind.parse()?;
        OptionParameters::new(
            record.spot,
            record.strike,
            record.time_to_expiry_years,
            record.risk_free_rate,
            record.dividend_yield,
            record.volatility,
            option_type,
        )
    }
}

impl TryFrom<OptionRecord> for OptionParameters {
    type Error = BsmError;

    fn try_from(record: OptionRecord) -> BsmResult<Self> {
        OptionParameters::try_from(&record)
    }
}

impl From<&OptionParameters> for OptionRecord {
    fn from(params: &OptionParameters) -> Self {
        Self {
            spot: params.spot,
            strike: params.strike,
            time_to_expiry_years: params.time,
            risk_free_rate: params.rate,
            dividend_yield: params.div,
            volatility: params.vol,
            option_kind: params.option_type.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atm_call() -> OptionParameters {
        OptionParameters::new(100.0, 100.0, 1.0, 0.05, 0.0, 0.2, OptionType::Call).unwrap()
    }

    #[test]
    fn test_option_type() {
        assert_eq!(OptionType::Call.phi(), 1.0);
        assert_eq!(OptionType::Put.phi(), -1.0);

        assert_eq!(OptionType::Call.intrinsic(110.0, 100.0), 10.0);
        assert_eq!(OptionType::Put.intrinsic(90.0, 100.0), 10.0);
        assert_eq!(OptionType::Call.intrinsic(90.0, 100.0), 0.0);
    }

    #[test]
    fn test_option_type_parsing() {
        assert_eq!("call".parse::<OptionType>().unwrap(), OptionType::Call);
        assert_eq!(" PUT ".parse::<OptionType>().unwrap(), OptionType::Put);
        assert_eq!("Call".parse::<OptionType>().unwrap(), OptionType::Call);

        let err = "straddle".parse::<OptionType>().unwrap_err();
        assert_eq!(err.field(), Some("option_kind"));
        assert!(err.to_string().contains("straddle"));
    }

    #[test]
    fn test_rejects_non_positive_spot_and_strike() {
        let err = OptionParameters::new(0.0, 100.0, 1.0, 0.05, 0.0, 0.2, OptionType::Call);
        assert_eq!(err.unwrap_err().field(), Some("spot"));

        let err = OptionParameters::new(100.0, -5.0, 1.0, 0.05, 0.0, 0.2, OptionType::Put);
        assert_eq!(err.unwrap_err().field(), Some("strike"));

        let err = OptionParameters::new(f64::NAN, 100.0, 1.0, 0.05, 0.0, 0.2, OptionType::Put);
        assert_eq!(err.unwrap_err().field(), Some("spot"));
    }

    #[test]
    fn test_rejects_non_finite_rates() {
        let err = OptionParameters::new(100.0, 100.0, 1.0, f64::INFINITY, 0.0, 0.2, OptionType::Call);
        assert_eq!(err.unwrap_err().field(), Some("risk_free_rate"));

        let err = OptionParameters::new(100.0, 100.0, 1.0, 0.05, f64::NAN, 0.2, OptionType::Call);
        assert_eq!(err.unwrap_err().field(), Some("dividend_yield"));
    }

    #[test]
    fn test_negative_rate_and_dividend_allowed() {
        let p = OptionParameters::new(100.0, 100.0, 1.0, -0.01, -0.02, 0.2, OptionType::Call);
        assert!(p.is_ok());
    }

    #[test]
    fn test_clamps_near_zero_time_and_vol() {
        let p = OptionParameters::new(100.0, 100.0, 0.0, 0.05, 0.0, 0.0, OptionType::Call).unwrap();
        assert!(p.is_at_expiry());
        assert!(p.is_zero_vol());
        assert_eq!(p.time_to_expiry(), 1e-8);
        assert_eq!(p.volatility(), 1e-8);
        assert!(p.total_vol() > 0.0);

        // Rounding noise below zero is clamped, not rejected
        let p = OptionParameters::new(100.0, 100.0, -1e-12, 0.05, 0.0, -1e-15, OptionType::Put).unwrap();
        assert!(p.is_at_expiry());
        assert!(p.is_zero_vol());
    }

    #[test]
    fn test_rejects_negative_time_and_vol() {
        let err = OptionParameters::new(100.0, 100.0, -0.5, 0.05, 0.0, 0.2, OptionType::Call);
        assert_eq!(err.unwrap_err().field(), Some("time_to_expiry"));

        let err = OptionParameters::new(100.0, 100.0, 0.5, 0.05, 0.0, -0.2, OptionType::Call);
        assert_eq!(err.unwrap_err().field(), Some("volatility"));
    }

    #[test]
    fn test_custom_floors() {
        let config = PricingConfig {
            time_floor: 1.0 / 365.0,
            vol_floor: 1e-4,
        };
        let p = OptionParameters::with_config(
            100.0, 100.0, 0.001, 0.05, 0.0, 0.2, OptionType::Call, config,
        )
        .unwrap();
        assert!(p.is_at_expiry());
        assert!(!p.is_zero_vol());
        assert_eq!(p.pricing_config(), config);
    }

    #[test]
    fn test_with_volatility_reclamps() {
        let p = atm_call();
        assert!(!p.is_zero_vol());

        let z = p.with_volatility(0.0).unwrap();
        assert!(z.is_zero_vol());
        assert_eq!(z.spot(), p.spot());

        let back = z.with_volatility(0.3).unwrap();
        assert!(!back.is_zero_vol());
        assert_eq!(back.volatility(), 0.3);

        assert!(p.with_volatility(-1.0).is_err());
    }

    #[test]
    fn test_forward_and_factors() {
        let p = OptionParameters::new(100.0, 100.0, 2.0, 0.05, 0.02, 0.2, OptionType::Call).unwrap();
        assert!((p.forward() - 100.0 * (0.06_f64).exp()).abs() < 1e-12);
        assert!((p.discount_factor() - (-0.1_f64).exp()).abs() < 1e-15);
        assert!((p.dividend_factor() - (-0.04_f64).exp()).abs() < 1e-15);
        assert!((p.moneyness() - 1.0).abs() < 1e-15);
    }

    #[test]
    fn test_record_json_field_names() {
        let record = atm_call().to_record();
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"timeToExpiryYears\":1.0"));
        assert!(json.contains("\"riskFreeRate\":0.05"));
        assert!(json.contains("\"dividendYield\":0.0"));
        assert!(json.contains("\"optionKind\":\"call\""));

        let parsed: OptionRecord = serde_json::from_str(&json).unwrap();
        let params = OptionParameters::try_from(&parsed).unwrap();
        assert_eq!(params, atm_call());
    }

    #[test]
    fn test_record_unknown_kind() {
        let json = r#"{"spot":100,"strike":100,"timeToExpiryYears":1,"riskFreeRate":0.05,
                       "dividendYield":0,"volatility":0.2,"optionKind":"binary"}"#;
        let record: OptionRecord = serde_json::from_str(json).unwrap();
        let err = OptionParameters::try_from(record).unwrap_err();
        assert_eq!(err.field(), Some("option_kind"));
    }

    #[test]
    fn test_moneyness_flags() {
        let p = atm_call().with_spot(110.0).unwrap();
        assert!(p.is_itm());
        assert_eq!(p.intrinsic(), 10.0);
        assert!(!p.with_option_type(OptionType::Put).is_itm());
    }
}
