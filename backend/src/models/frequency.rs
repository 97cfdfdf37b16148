//! Calendar periodicities and their ordering.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConversionError;

/// Periodicity of a period index.
///
/// Variants are declared from finest to coarsest so the derived ordering
/// reads as "coarseness": `Day < Month < Quarter < Year`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Frequency {
    #[serde(rename = "D", alias = "d", alias = "day")]
    Day,
    #[serde(rename = "M", alias = "m", alias = "month")]
    Month,
    #[serde(rename = "Q", alias = "q", alias = "quarter")]
    Quarter,
    #[serde(rename = "Y", alias = "y", alias = "A", alias = "a", alias = "year", alias = "annual")]
    Year,
}

impl Frequency {
    /// Single-letter code (`D`, `M`, `Q`, `Y`).
    pub fn code(self) -> &'static str {
        match self {
            Frequency::Day => "D",
            Frequency::Month => "M",
            Frequency::Quarter => "Q",
            Frequency::Year => "Y",
        }
    }

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            Frequency::Day => "day",
            Frequency::Month => "month",
            Frequency::Quarter => "quarter",
            Frequency::Year => "year",
        }
    }

    /// True if `self` describes shorter periods than `other`.
    pub fn is_finer_than(self, other: Frequency) -> bool {
        self < other
    }

    /// True if `self` describes longer periods than `other`.
    pub fn is_coarser_than(self, other: Frequency) -> bool {
        self > other
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Frequency {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "d" | "day" | "daily" => Ok(Frequency::Day),
            "m" | "month" | "monthly" => Ok(Frequency::Month),
            "q" | "quarter" | "quarterly" => Ok(Frequency::Quarter),
            "y" | "a" | "year" | "yearly" | "annual" => Ok(Frequency::Year),
            _ => Err(ConversionError::UnsupportedFrequency(s.to_string())),
        }
    }
}
