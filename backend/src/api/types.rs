//! REST API types.
//!
//! Converted tables are returned in the [`PeriodTable`] serde shape so a
//! client can post them straight back to `/api/convert/json`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::models::{Frequency, Period, PeriodTable};
use crate::transform::pipeline::{ConversionReport, CsvInfo};

/// Job status reported to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Ready,
    Warning,
    Error,
}

/// Response sent after a conversion.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertResponse {
    /// Unique job identifier
    pub job_id: String,

    /// `warning` when incomplete periods were aggregated
    pub status: JobStatus,

    /// Converted table
    pub table: PeriodTable,

    pub metadata: ResponseMetadata,
}

/// Metadata about the conversion
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    /// CSV info (absent for JSON input)
    pub csv_info: Option<CsvInfo>,
    pub input_frequency: Frequency,
    pub output_frequency: Frequency,
    pub input_rows: usize,
    pub output_rows: usize,
    /// Parent periods aggregated from partial data
    pub incomplete_periods: Vec<Period>,
}

/// Body of `POST /api/convert/json`.
#[derive(Debug, Clone, Deserialize)]
pub struct ConvertJsonRequest {
    pub table: PeriodTable,
    /// Conversion plan, validated against the plan schema.
    pub plan: Value,
}

impl From<ConversionReport> for ConvertResponse {
    fn from(report: ConversionReport) -> Self {
        let status = if report.has_warnings() {
            JobStatus::Warning
        } else {
            JobStatus::Ready
        };

        ConvertResponse {
            job_id: Uuid::new_v4().to_string(),
            status,
            metadata: ResponseMetadata {
                csv_info: report.csv_info,
                input_frequency: report.input.frequency(),
                output_frequency: report.output.frequency(),
                input_rows: report.input.len(),
                output_rows: report.output.len(),
                incomplete_periods: report.incomplete,
            },
            table: report.output,
        }
    }
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": JobStatus::Error,
        "error": error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AggregationMethod;
    use crate::transform::{convert_table, ConversionPlan};

    fn monthly() -> PeriodTable {
        PeriodTable::from_rows(
            vec!["a".into()],
            vec![
                ("2020M1".parse().unwrap(), vec![Some(1.0)]),
                ("2020M2".parse().unwrap(), vec![Some(2.0)]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_warning_status_for_incomplete_periods() {
        let plan = ConversionPlan::Aggregate {
            to: Frequency::Quarter,
            method: AggregationMethod::Sum,
            ignore_incomplete: false,
        };
        let report = convert_table(monthly(), &plan).unwrap();
        let json = serde_json::to_value(ConvertResponse::from(report)).unwrap();

        assert_eq!(json["status"], "warning");
        assert_eq!(json["metadata"]["inputFrequency"], "M");
        assert_eq!(json["metadata"]["outputFrequency"], "Q");
        assert_eq!(json["metadata"]["inputRows"], 2);
        assert_eq!(json["metadata"]["incompletePeriods"], json!(["2020Q1"]));
        assert!(json["metadata"]["csvInfo"].is_null());
        assert_eq!(json["table"]["rows"][0]["values"], json!([3.0]));
    }

    #[test]
    fn test_ready_status() {
        let plan = ConversionPlan::Disaggregate {
            from: Frequency::Month,
            to: Frequency::Day,
        };
        // Month -> Day is not a supported pair.
        assert!(convert_table(monthly(), &plan).is_err());

        let plan = ConversionPlan::Aggregate {
            to: Frequency::Quarter,
            method: AggregationMethod::Sum,
            ignore_incomplete: true,
        };
        let report = convert_table(monthly(), &plan).unwrap();
        let response = ConvertResponse::from(report);
        assert_eq!(response.status, JobStatus::Ready);
        assert!(response.table.is_empty());
    }

    #[test]
    fn test_error_response_shape() {
        let json = error_response("boom");
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"], "boom");
        assert!(Uuid::parse_str(json["jobId"].as_str().unwrap()).is_ok());
    }
}
