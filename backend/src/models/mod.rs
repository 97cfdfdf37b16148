//! Domain models for the periodshift conversion engine.
//!
//! - [`Frequency`] - Year / Quarter / Month / Day hierarchy
//! - [`Period`] - Calendar interval with parent/child arithmetic
//! - [`PeriodTable`] - Period-indexed table of numeric series
//! - [`AggregationMethod`] - Sum or mean reduction

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConversionError;

pub mod frequency;
pub mod period;
pub mod table;

pub use frequency::Frequency;
pub use period::Period;
pub use table::{Cell, PeriodTable};

// =============================================================================
// Aggregation Method
// =============================================================================

/// Reduction applied to each aggregation group.
///
/// Mirrors the SUMMED / AVERAGED conventions of statistical time-series
/// packages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum AggregationMethod {
    /// Sum of present values.
    Sum,
    /// Mean of present values (denominator = count of present values).
    Mean,
}

impl AggregationMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            AggregationMethod::Sum => "sum",
            AggregationMethod::Mean => "mean",
        }
    }

    /// Reduce the present values of a group; `None` if nothing is present.
    pub fn reduce(self, values: impl IntoIterator<Item = f64>) -> Option<f64> {
        let (sum, count) = values
            .into_iter()
            .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
        if count == 0 {
            return None;
        }
        Some(match self {
            AggregationMethod::Sum => sum,
            AggregationMethod::Mean => sum / count as f64,
        })
    }
}

impl fmt::Display for AggregationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AggregationMethod {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sum" | "summed" => Ok(AggregationMethod::Sum),
            "mean" | "avg" | "average" | "averaged" => Ok(AggregationMethod::Mean),
            _ => Err(ConversionError::InvalidAggregationMethod(s.to_string())),
        }
    }
}

impl TryFrom<String> for AggregationMethod {
    type Error = ConversionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_parsing() {
        assert_eq!("sum".parse::<AggregationMethod>().unwrap(), AggregationMethod::Sum);
        assert_eq!("MEAN".parse::<AggregationMethod>().unwrap(), AggregationMethod::Mean);
        assert_eq!(
            "median".parse::<AggregationMethod>().unwrap_err(),
            ConversionError::InvalidAggregationMethod("median".into())
        );
    }

    #[test]
    fn test_method_serde() {
        assert_eq!(serde_json::to_string(&AggregationMethod::Mean).unwrap(), "\"mean\"");
        let m: AggregationMethod = serde_json::from_str("\"sum\"").unwrap();
        assert_eq!(m, AggregationMethod::Sum);
        assert!(serde_json::from_str::<AggregationMethod>("\"max\"").is_err());
    }

    #[test]
    fn test_reduce() {
        assert_eq!(AggregationMethod::Sum.reduce([1.0, 2.0, 3.0]), Some(6.0));
        assert_eq!(AggregationMethod::Mean.reduce([1.0, 2.0, 3.0]), Some(2.0));
        assert_eq!(AggregationMethod::Mean.reduce(std::iter::empty()), None);
    }
}
