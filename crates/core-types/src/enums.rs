use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifies one of the built-in signal generators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum FactorId {
    Momentum,
    Rsi,
    SmaCrossover,
    Volatility,
    MacdHistogram,
}

impl FactorId {
    pub fn as_str(&self) -> &'static str {
        match self {
            FactorId::Momentum => "momentum",
            FactorId::Rsi => "rsi",
            FactorId::SmaCrossover => "sma_crossover",
            FactorId::Volatility => "volatility",
            FactorId::MacdHistogram => "macd_histogram",
        }
    }
}

impl fmt::Display for FactorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How often a portfolio is reset to its target allocation.
///
/// The string tokens follow the usual resampling aliases: `D`, `W`, `ME`
/// (month end) and `QE` (quarter end). `M` and `Q` are accepted as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum RebalanceFrequency {
    #[serde(rename = "D")]
    #[cfg_attr(feature = "clap", value(name = "D"))]
    Daily,
    #[serde(rename = "W")]
    #[cfg_attr(feature = "clap", value(name = "W"))]
    Weekly,
    #[default]
    #[serde(rename = "ME", alias = "M")]
    #[cfg_attr(feature = "clap", value(name = "ME", alias = "M"))]
    Monthly,
    #[serde(rename = "QE", alias = "Q")]
    #[cfg_attr(feature = "clap", value(name = "QE", alias = "Q"))]
    Quarterly,
}

impl RebalanceFrequency {
    pub fn token(&self) -> &'static str {
        match self {
            RebalanceFrequency::Daily => "D",
            RebalanceFrequency::Weekly => "W",
            RebalanceFrequency::Monthly => "ME",
            RebalanceFrequency::Quarterly => "QE",
        }
    }
}

impl fmt::Display for RebalanceFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for RebalanceFrequency {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "D" => Ok(RebalanceFrequency::Daily),
            "W" => Ok(RebalanceFrequency::Weekly),
            "ME" | "M" => Ok(RebalanceFrequency::Monthly),
            "QE" | "Q" => Ok(RebalanceFrequency::Quarterly),
            other => Err(CoreError::InvalidInput(
                "rebalance_frequency".to_string(),
                format!("unknown frequency token '{other}' (expected D, W, ME or QE)"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_frequency_tokens() {
        assert_eq!("D".parse::<RebalanceFrequency>().unwrap(), RebalanceFrequency::Daily);
        assert_eq!("w".parse::<RebalanceFrequency>().unwrap(), RebalanceFrequency::Weekly);
        assert_eq!("ME".parse::<RebalanceFrequency>().unwrap(), RebalanceFrequency::Monthly);
        assert_eq!("M".parse::<RebalanceFrequency>().unwrap(), RebalanceFrequency::Monthly);
        assert_eq!("QE".parse::<RebalanceFrequency>().unwrap(), RebalanceFrequency::Quarterly);
        assert!("Y".parse::<RebalanceFrequency>().is_err());
    }

    #[test]
    fn default_frequency_is_monthly() {
        assert_eq!(RebalanceFrequency::default(), RebalanceFrequency::Monthly);
        assert_eq!(RebalanceFrequency::default().to_string(), "ME");
    }
}
