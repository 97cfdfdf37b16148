//! Conversion plans: a serialisable description of one engine run.
//!
//! ```json
//! { "operation": "disaggregate", "from": "Y", "to": "Q" }
//! { "operation": "aggregate", "to": "Y", "method": "mean", "ignoreIncomplete": false }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::aggregate::{aggregate, Aggregation};
use super::disaggregate::disaggregate;
use crate::error::{ConversionResult, PipelineError};
use crate::models::{AggregationMethod, Frequency, Period, PeriodTable};
use crate::validation::validate_conversion_plan;

/// One conversion to run against a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "lowercase")]
pub enum ConversionPlan {
    /// Copy-down to a finer frequency.
    Disaggregate { from: Frequency, to: Frequency },

    /// Group-and-reduce to a coarser frequency.
    Aggregate {
        to: Frequency,
        method: AggregationMethod,
        #[serde(default = "default_ignore_incomplete", rename = "ignoreIncomplete")]
        ignore_incomplete: bool,
    },
}

fn default_ignore_incomplete() -> bool {
    true
}

/// Outcome of applying a plan.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanOutput {
    pub table: PeriodTable,
    /// Parent periods reduced despite gaps (aggregation only).
    pub incomplete: Vec<Period>,
}

impl ConversionPlan {
    /// Parse a plan from JSON, checking it against the plan schema first.
    pub fn from_json(json: &str) -> Result<Self, PipelineError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Same as [`ConversionPlan::from_json`] for an already-parsed value.
    pub fn from_value(value: Value) -> Result<Self, PipelineError> {
        validate_conversion_plan(&value).map_err(PipelineError::InvalidPlan)?;
        Ok(serde_json::from_value(value)?)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Frequency of the tables this plan produces.
    pub fn output_frequency(&self) -> Frequency {
        match self {
            ConversionPlan::Disaggregate { to, .. } | ConversionPlan::Aggregate { to, .. } => *to,
        }
    }

    /// Run the plan against `table`.
    pub fn apply(&self, table: &PeriodTable) -> ConversionResult<PlanOutput> {
        match *self {
            ConversionPlan::Disaggregate { from, to } => Ok(PlanOutput {
                table: disaggregate(table, from, to)?,
                incomplete: Vec::new(),
            }),
            ConversionPlan::Aggregate {
                to,
                method,
                ignore_incomplete,
            } => {
                let Aggregation { table, incomplete } =
                    aggregate(table, to, method, ignore_incomplete)?;
                Ok(PlanOutput {
                    table,
                    incomplete: incomplete.into_iter().map(|g| g.period).collect(),
                })
            }
        }
    }

    /// Short description for logs, e.g. `aggregate M -> Q (sum, ...)`.
    /// Aggregation plans do not record their input frequency; pass it when
    /// the table is known.
    pub fn describe(&self, input: Option<Frequency>) -> String {
        match self {
            ConversionPlan::Disaggregate { from, to } => format!("disaggregate {} -> {}", from, to),
            ConversionPlan::Aggregate {
                to,
                method,
                ignore_incomplete,
            } => format!(
                "aggregate {}-> {} ({}, {} incomplete groups)",
                input.map(|f| format!("{} ", f)).unwrap_or_default(),
                to,
                method,
                if *ignore_incomplete { "dropping" } else { "keeping" }
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_describe() {
        let plan = ConversionPlan::Aggregate {
            to: Frequency::Quarter,
            method: AggregationMethod::Sum,
            ignore_incomplete: true,
        };
        assert_eq!(
            plan.describe(Some(Frequency::Month)),
            "aggregate M -> Q (sum, dropping incomplete groups)"
        );
        assert_eq!(plan.describe(None), "aggregate -> Q (sum, dropping incomplete groups)");

        let plan = ConversionPlan::Disaggregate {
            from: Frequency::Year,
            to: Frequency::Month,
        };
        assert_eq!(plan.describe(None), "disaggregate Y -> M");
    }

    #[test]
    fn test_plan_json_shapes() {
        let plan = ConversionPlan::from_value(json!({
            "operation": "aggregate",
            "to": "Y",
            "method": "mean",
            "ignoreIncomplete": false
        }))
        .unwrap();
        assert_eq!(
            plan,
            ConversionPlan::Aggregate {
                to: Frequency::Year,
                method: AggregationMethod::Mean,
                ignore_incomplete: false
            }
        );

        let plan = ConversionPlan::from_json(r#"{"operation":"disaggregate","from":"Q","to":"M"}"#)
            .unwrap();
        assert_eq!(
            plan,
            ConversionPlan::Disaggregate {
                from: Frequency::Quarter,
                to: Frequency::Month
            }
        );
    }

    #[test]
    fn test_ignore_incomplete_defaults_to_true() {
        let plan =
            ConversionPlan::from_value(json!({ "operation": "aggregate", "to": "Q", "method": "sum" }))
                .unwrap();
        assert!(matches!(
            plan,
            ConversionPlan::Aggregate {
                ignore_incomplete: true,
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_method_rejected_by_schema() {
        let err = ConversionPlan::from_value(json!({
            "operation": "aggregate",
            "to": "Y",
            "method": "median"
        }))
        .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidPlan(_)));
    }

    #[test]
    fn test_apply_dispatches() {
        let table = PeriodTable::from_rows(
            vec!["v".into()],
            vec![("2020Q1".parse().unwrap(), vec![Some(1.0)])],
        )
        .unwrap();

        let plan = ConversionPlan::Disaggregate {
            from: Frequency::Quarter,
            to: Frequency::Month,
        };
        let out = plan.apply(&table).unwrap();
        assert_eq!(out.table.len(), 3);

        let plan = ConversionPlan::Aggregate {
            to: Frequency::Year,
            method: AggregationMethod::Sum,
            ignore_incomplete: false,
        };
        let out = plan.apply(&table).unwrap();
        assert_eq!(out.incomplete, vec!["2020".parse().unwrap()]);
        assert_eq!(out.table.value(&"2020".parse().unwrap(), "v"), Some(Some(1.0)));
    }

    #[test]
    fn test_round_trip_json() {
        let plan = ConversionPlan::Aggregate {
            to: Frequency::Quarter,
            method: AggregationMethod::Sum,
            ignore_incomplete: true,
        };
        let json = plan.to_json().unwrap();
        assert!(json.contains("\"ignoreIncomplete\": true"));
        assert_eq!(ConversionPlan::from_json(&json).unwrap(), plan);
    }
}
