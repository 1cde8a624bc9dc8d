//! Striked payoffs for rate options.

use ql_core::{Rate, Real};
use std::fmt;

/// Option type (call or put).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OptionType {
    /// Pays when the rate ends above the strike.
    Call,
    /// Pays when the rate ends below the strike.
    Put,
}

impl OptionType {
    /// +1 for Call, −1 for Put.
    pub fn sign(self) -> Real {
        match self {
            OptionType::Call => 1.0,
            OptionType::Put => -1.0,
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionType::Call => write!(f, "Call"),
            OptionType::Put => write!(f, "Put"),
        }
    }
}

/// `max(φ(f − K), 0)` with `φ = +1` for calls and `−1` for puts.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlainVanillaPayoff {
    /// Option type.
    pub option_type: OptionType,
    /// Strike rate.
    pub strike: Rate,
}

impl PlainVanillaPayoff {
    /// Create a payoff.
    pub fn new(option_type: OptionType, strike: Rate) -> Self {
        Self { option_type, strike }
    }

    /// Payoff at `rate`.
    pub fn value(&self, rate: Rate) -> Real {
        (self.option_type.sign() * (rate - self.strike)).max(0.0)
    }
}

impl fmt::Display for PlainVanillaPayoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}", self.option_type, self.strike)
    }
}
