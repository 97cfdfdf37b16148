//! Render a [`PeriodTable`] as CSV or JSON.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::PipelineError;
use crate::models::PeriodTable;

/// Name of the index column in exported CSV.
pub const INDEX_HEADER: &str = "period";

/// Output format for converted tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format '{}' (expected csv or json)", other)),
        }
    }
}

/// Write the table as CSV: `period` header, one column per series,
/// empty fields for missing values.
pub fn table_to_csv(table: &PeriodTable, delimiter: char) -> Result<String, PipelineError> {
    let delimiter = u8::try_from(delimiter)
        .ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| {
            PipelineError::Output(format!(
                "delimiter '{}' is not a single ASCII character",
                delimiter
            ))
        })?;
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());

    let header = std::iter::once(INDEX_HEADER).chain(table.columns().iter().map(String::as_str));
    writer
        .write_record(header)
        .map_err(|e| PipelineError::Output(e.to_string()))?;

    for (period, values) in table.rows() {
        let record = std::iter::once(period.to_string())
            .chain(values.iter().map(|v| v.map(|x| x.to_string()).unwrap_or_default()));
        writer
            .write_record(record)
            .map_err(|e| PipelineError::Output(e.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| PipelineError::Output(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| PipelineError::Output(e.to_string()))
}

/// Pretty JSON in the table's serde shape.
pub fn table_to_json(table: &PeriodTable) -> Result<String, PipelineError> {
    Ok(serde_json::to_string_pretty(table)?)
}

/// Render in the requested format.
pub fn render(
    table: &PeriodTable,
    format: OutputFormat,
    delimiter: char,
) -> Result<String, PipelineError> {
    match format {
        OutputFormat::Csv => table_to_csv(table, delimiter),
        OutputFormat::Json => table_to_json(table),
    }
}
