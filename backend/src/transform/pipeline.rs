//! High-level pipeline API: CSV in, converted table out.
//!
//! Combines parsing, plan execution and progress logging.
//!
//! # Example
//!
//! ```rust,ignore
//! use periodshift::parser::ParseOptions;
//! use periodshift::transform::{convert_file, ConversionPlan};
//! use std::path::Path;
//!
//! let plan = ConversionPlan::from_json(r#"{"operation":"aggregate","to":"Q","method":"sum"}"#)?;
//! let report = convert_file(Path::new("turnover.csv"), &ParseOptions::default(), &plan)?;
//! println!("{} quarters", report.output.len());
//! ```

use serde::Serialize;
use std::path::Path;

use super::plan::ConversionPlan;
use crate::api::logs::{log_info, log_info_indent, log_success, log_warning};
use crate::error::{PipelineError, PipelineResult};
use crate::models::{Frequency, Period, PeriodTable};
use crate::parser::{parse_table_bytes_auto, parse_table_file_auto, ParseOptions, ParsedTable};

/// Incomplete periods listed individually in logs before summarising.
const MAX_LOGGED_PERIODS: usize = 5;

/// CSV file information
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvInfo {
    pub encoding: String,
    pub delimiter: char,
    pub headers: Vec<String>,
    pub row_count: usize,
}

/// Result of one pipeline run
#[derive(Debug, Clone)]
pub struct ConversionReport {
    /// Table as read from the input
    pub input: PeriodTable,
    /// Converted table
    pub output: PeriodTable,
    /// CSV parsing metadata (absent for JSON table input)
    pub csv_info: Option<CsvInfo>,
    /// Parent periods reduced despite gaps
    pub incomplete: Vec<Period>,
}

impl ConversionReport {
    pub fn input_frequency(&self) -> Frequency {
        self.input.frequency()
    }

    pub fn output_frequency(&self) -> Frequency {
        self.output.frequency()
    }

    pub fn has_warnings(&self) -> bool {
        !self.incomplete.is_empty()
    }
}

/// Convert a CSV file.
pub fn convert_file(
    path: &Path,
    options: &ParseOptions,
    plan: &ConversionPlan,
) -> PipelineResult<ConversionReport> {
    log_info(format!("📖 Reading {}...", path.display()));
    let parsed = parse_table_file_auto(path, options)?;
    convert_parsed(parsed, plan)
}

/// Convert CSV bytes (e.g. an upload).
pub fn convert_bytes(
    bytes: &[u8],
    options: &ParseOptions,
    plan: &ConversionPlan,
) -> PipelineResult<ConversionReport> {
    log_info("📖 Reading uploaded CSV...");
    let parsed = parse_table_bytes_auto(bytes, options)?;
    convert_parsed(parsed, plan)
}

/// Convert an already-built table.
pub fn convert_table(table: PeriodTable, plan: &ConversionPlan) -> PipelineResult<ConversionReport> {
    run(table, None, plan)
}

fn convert_parsed(parsed: ParsedTable, plan: &ConversionPlan) -> PipelineResult<ConversionReport> {
    log_success(format!("Detected encoding: {}", parsed.encoding));
    log_success(format!("Detected separator: '{}'", format_delimiter(parsed.delimiter)));
    log_success(format!(
        "Read {} rows at frequency {}",
        parsed.table.len(),
        parsed.table.frequency().name()
    ));

    let csv_info = CsvInfo {
        encoding: parsed.encoding,
        delimiter: parsed.delimiter,
        headers: parsed.headers,
        row_count: parsed.table.len(),
    };
    run(parsed.table, Some(csv_info), plan)
}

fn run(
    table: PeriodTable,
    csv_info: Option<CsvInfo>,
    plan: &ConversionPlan,
) -> PipelineResult<ConversionReport> {
    if table.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    if let Some((first, last)) = table.span() {
        log_info_indent(format!("{} columns, {} .. {}", table.columns().len(), first, last), 1);
    }
    log_info(format!("⚙️  Running {}...", plan.describe(Some(table.frequency()))));

    let out = plan.apply(&table)?;

    if !out.incomplete.is_empty() {
        log_warning(format!(
            "{} incomplete period(s) aggregated from partial data: {}",
            out.incomplete.len(),
            summarize_periods(&out.incomplete)
        ));
    }
    log_success(format!(
        "{} rows -> {} rows ({} -> {})",
        table.len(),
        out.table.len(),
        table.frequency(),
        out.table.frequency()
    ));

    Ok(ConversionReport {
        input: table,
        output: out.table,
        csv_info,
        incomplete: out.incomplete,
    })
}

fn summarize_periods(periods: &[Period]) -> String {
    let shown: Vec<String> = periods
        .iter()
        .take(MAX_LOGGED_PERIODS)
        .map(Period::to_string)
        .collect();
    if periods.len() > MAX_LOGGED_PERIODS {
        format!("{}... +{}", shown.join(", "), periods.len() - MAX_LOGGED_PERIODS)
    } else {
        shown.join(", ")
    }
}

/// Format delimiter for display
fn format_delimiter(d: char) -> &'static str {
    match d {
        ';' => ";",
        ',' => ",",
        '\t' => "TAB",
        '|' => "|",
        _ => "?",
    }
}
