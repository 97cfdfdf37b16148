//! Error types for the periodshift conversion pipeline.
//!
//! - [`ConversionError`] - Frequency-model and engine errors
//! - [`RegistryError`] - Plan registry errors
//! - [`PipelineError`] - Top-level orchestration errors
//! - [`ServerError`] - HTTP layer errors
//!
//! CSV parsing errors live next to the parser ([`crate::parser::CsvError`])
//! because they carry line/column context.
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

use crate::models::{Frequency, Period};
use crate::parser::CsvError;

// =============================================================================
// Conversion Errors
// =============================================================================

/// Errors raised by the frequency model, the disaggregator and the aggregator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    /// The frequency combination is invalid for the requested direction.
    #[error("Unsupported frequency pair {from} -> {to}: {reason}")]
    UnsupportedFrequencyPair {
        from: Frequency,
        to: Frequency,
        reason: &'static str,
    },

    /// A frequency code outside of Y/Q/M/D.
    #[error("Unsupported frequency '{0}' (expected one of Y, Q, M, D)")]
    UnsupportedFrequency(String),

    /// Aggregation method is neither sum nor mean.
    #[error("Invalid aggregation method '{0}' (expected 'sum' or 'mean')")]
    InvalidAggregationMethod(String),

    /// Index is not period-typed, has mixed periodicities or duplicates.
    #[error("Malformed index: {0}")]
    MalformedIndex(String),

    /// A caller-supplied parameter is out of range.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A row does not carry one value per column.
    #[error("Row {period} has {found} values, table has {expected} columns")]
    ColumnMismatch {
        period: Period,
        expected: usize,
        found: usize,
    },
}

// =============================================================================
// Registry Errors
// =============================================================================

/// Errors from the conversion plan registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Plan not found.
    #[error("Plan not found: {0}")]
    NotFound(String),

    /// Plan JSON does not satisfy the plan schema.
    #[error("Invalid plan: {}", .0.join("; "))]
    InvalidPlan(Vec<String>),

    /// IO error.
    #[error("Registry IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON error.
    #[error("Registry JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the main error type returned by [`crate::transform::pipeline::convert_file`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// CSV parsing error.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// Engine error.
    #[error("Conversion error: {0}")]
    Conversion(#[from] ConversionError),

    /// Registry error.
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Plan failed schema validation.
    #[error("Invalid plan: {}", .0.join("; "))]
    InvalidPlan(Vec<String>),

    /// Writing the converted table failed.
    #[error("Output error: {0}")]
    Output(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No rows to convert.
    #[error("No rows to convert")]
    EmptyInput,
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for engine operations.
pub type ConversionResult<T> = Result<T, ConversionError>;

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
